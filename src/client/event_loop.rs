//! Event task: availability tracking, response handling, command arming.
//!
//! This task is the client-side stand-in for the middleware's delivery
//! context. It is also where the (possibly slow, possibly interactive)
//! command build runs, so the dispatcher is never blocked on an operator.

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::source::CommandSource;
use crate::transport::ServiceEndpoint;
use crate::wire;

use super::{DispatchEvent, Notification, TransportEvent};

/// Consume transport events until cancellation, channel closure, or an
/// operator quit.
pub(crate) async fn event_task<S: CommandSource>(
    mut events: mpsc::Receiver<TransportEvent>,
    dispatch_tx: mpsc::Sender<DispatchEvent>,
    notify: mpsc::Sender<Notification>,
    mut source: S,
    endpoint: ServiceEndpoint,
    cancel: CancellationToken,
) {
    // Availability of the target service, as this task last saw it.
    // The dispatcher keeps its own snapshot, fed through the inbox.
    let mut available = false;

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            TransportEvent::Availability {
                endpoint: reported,
                available: is_available,
            } => {
                let _ = notify
                    .send(Notification::Availability {
                        endpoint: reported,
                        available: is_available,
                    })
                    .await;

                if reported != endpoint {
                    tracing::debug!(%reported, "availability report for another service");
                    continue;
                }
                if is_available == available {
                    continue;
                }
                available = is_available;
                tracing::info!(%endpoint, available, "service availability changed");

                if dispatch_tx
                    .send(DispatchEvent::Availability(available))
                    .await
                    .is_err()
                {
                    break;
                }
                // First sight of the service: build and arm the first request.
                if available && arm_next(&mut source, &dispatch_tx, &cancel).await.is_break() {
                    break;
                }
            }
            TransportEvent::Response { payload } => {
                match wire::parse_response(&payload) {
                    Ok(frame) => {
                        let _ = notify
                            .send(Notification::ResponseReceived {
                                seq: frame.seq,
                                success: frame.is_success(),
                            })
                            .await;
                        // The response is the trigger for the next command,
                        // but only while the service is still reachable.
                        if available && arm_next(&mut source, &dispatch_tx, &cancel).await.is_break()
                        {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "dropping response");
                        if let Error::MalformedResponse { len } = err {
                            let _ = notify.send(Notification::MalformedResponse { len }).await;
                        }
                    }
                }
            }
        }
    }
    tracing::debug!("event task stopped");
}

/// Pull the next command from the source and hand it to the dispatcher.
///
/// A `None` from the source is the operator quit: cancel the whole client.
async fn arm_next<S: CommandSource>(
    source: &mut S,
    dispatch_tx: &mpsc::Sender<DispatchEvent>,
    cancel: &CancellationToken,
) -> ControlFlow<()> {
    match source.next_command().await {
        Some(command) => {
            if dispatch_tx.send(DispatchEvent::Arm(command)).await.is_err() {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
        None => {
            tracing::info!("command source finished, shutting down");
            cancel.cancel();
            ControlFlow::Break(())
        }
    }
}
