//! Cyclic dispatcher: the only sender, availability-gated and
//! rate-floored.
//!
//! One request per cycle at most. The `floor` instant is the earliest
//! permitted next send; it moves one cycle forward on every send attempt,
//! successful or not, so the configured cycle is a hard floor on request
//! rate regardless of how fast replies (and therefore new commands)
//! arrive.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::transport::{ServiceEndpoint, Transport};
use crate::wire;

use super::state::DispatcherState;
use super::{DispatchEvent, Notification};

/// Run the dispatch loop until cancellation or inbox closure.
pub(crate) async fn dispatch_task<T: Transport>(
    mut inbox: mpsc::Receiver<DispatchEvent>,
    mut transport: T,
    notify: mpsc::Sender<Notification>,
    endpoint: ServiceEndpoint,
    cycle: Duration,
    cancel: CancellationToken,
) {
    let mut state = DispatcherState::new();
    let mut floor = Instant::now();

    loop {
        if state.available && Instant::now() >= floor {
            if let Some(command) = state.armed.take() {
                let seq = state.seq.current();
                let payload = wire::encode_request(&command, seq);
                match transport.send(endpoint, payload).await {
                    Ok(()) => {
                        tracing::debug!(seq, %command, "request sent");
                        let _ = notify
                            .send(Notification::RequestSent { seq, command })
                            .await;
                        state.seq.advance();
                    }
                    Err(err) => {
                        tracing::error!(error = %err, seq, "send failed, request stays armed");
                        state.armed = Some(command);
                    }
                }
                floor = Instant::now() + cycle;
            }
        }

        tokio::select! {
            () = cancel.cancelled() => break,
            event = inbox.recv() => match event {
                Some(event) => state.apply(event),
                None => break,
            },
            // Wakes exactly when the rate floor expires with work pending;
            // the send itself happens at the top of the loop.
            () = time::sleep_until(floor), if state.has_work() => {}
        }
    }
    tracing::debug!("dispatcher stopped");
}
