//! The LED client: event intake, response handling, cyclic dispatch.
//!
//! ## Structure
//!
//! Two background tasks, all communication over bounded channels, no
//! shared mutable state:
//!
//! ```text
//!  middleware delivery context          event task               dispatcher task
//!  ┌──────────────────────┐   events  ┌───────────────┐  inbox  ┌──────────────┐
//!  │ EventSender          │ ────────▶ │ availability  │ ──────▶ │ seq counter  │
//!  │  .availability_…()   │           │ response rpt  │         │ armed slot   │
//!  │  .response_…()       │           │ CommandSource │         │ cycle floor  │
//!  └──────────────────────┘           └───────────────┘         │ Transport    │
//!                                                               └──────────────┘
//! ```
//!
//! - [`event_loop`]: consumes [`TransportEvent`]s, tracks availability,
//!   decodes and reports responses, drives the command source.
//! - [`dispatch`]: sole owner of the sequence counter and the armed
//!   command, sole caller of [`Transport::send`]; enforces the
//!   availability gate and the cycle-duration floor between sends.
//! - [`state`]: the dispatcher's single-owner state.
//!
//! Shutdown is a [`CancellationToken`] handed to both tasks at
//! construction. An operator quit cancels it from the event task;
//! [`LedClient::shutdown`] cancels it from outside. Either way both tasks
//! observe it cooperatively and exit.

pub(crate) mod dispatch;
pub(crate) mod event_loop;
pub(crate) mod state;

use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command::LedCommand;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::source::CommandSource;
use crate::transport::{ServiceEndpoint, Transport};
use crate::wire::RESPONSE_LEN;

const EVENT_CHANNEL_CAPACITY: usize = 32;
const DISPATCH_CHANNEL_CAPACITY: usize = 8;
const NOTIFY_CHANNEL_CAPACITY: usize = 64;

/// Event pushed in by the middleware's delivery context.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The reachability of a service changed.
    Availability {
        /// Which service the report is about.
        endpoint: ServiceEndpoint,
        /// Whether it is now reachable.
        available: bool,
    },
    /// A response payload arrived.
    Response {
        /// Raw payload bytes.
        payload: Bytes,
    },
}

/// Dispatcher inbox message, produced only by the event task.
#[derive(Debug)]
pub(crate) enum DispatchEvent {
    /// Availability snapshot for the target service.
    Availability(bool),
    /// A freshly built command, ready to send.
    Arm(LedCommand),
}

/// Outward report stream.
///
/// `Display` renders the operator-facing console lines; the library never
/// prints them itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A service availability report was received.
    Availability {
        /// Which service the report is about.
        endpoint: ServiceEndpoint,
        /// Whether it is now reachable.
        available: bool,
    },
    /// A request went out on the transport.
    RequestSent {
        /// Sequence number attached to the request.
        seq: u16,
        /// The command that was sent.
        command: LedCommand,
    },
    /// A well-formed response arrived.
    ResponseReceived {
        /// Sequence number echoed by the service.
        seq: u16,
        /// Whether the service reported success.
        success: bool,
    },
    /// A response payload had the wrong length and was dropped.
    MalformedResponse {
        /// Actual payload length in bytes.
        len: usize,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Availability {
                endpoint,
                available,
            } => {
                let state = if *available { "available" } else { "NOT available" };
                write!(f, "Service {endpoint} is {state}.")
            }
            Self::RequestSent { seq, command } => {
                write!(f, "Sending request [{seq}] : {command}")
            }
            Self::ResponseReceived { seq, success } => {
                let result = if *success {
                    "was done successfully !"
                } else {
                    "has failed !"
                };
                write!(f, "Request [{seq}] {result}")
            }
            Self::MalformedResponse { len } => write!(
                f,
                "Error: Response payload size is incorrect. Expected {RESPONSE_LEN} bytes, got {len} bytes."
            ),
        }
    }
}

/// Inbound half of the event channel, handed to [`LedClient::spawn`].
pub struct EventReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

/// Handle the middleware's delivery context uses to push events into the
/// client. Cheap to clone.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<TransportEvent>,
}

impl EventSender {
    /// Report a change in a service's reachability.
    ///
    /// Errors with [`Error::Shutdown`] once the client is gone.
    pub async fn availability_changed(
        &self,
        endpoint: ServiceEndpoint,
        available: bool,
    ) -> Result<()> {
        self.tx
            .send(TransportEvent::Availability {
                endpoint,
                available,
            })
            .await
            .map_err(|_| Error::Shutdown)
    }

    /// Deliver a raw response payload.
    ///
    /// Errors with [`Error::Shutdown`] once the client is gone.
    pub async fn response_received(&self, payload: Bytes) -> Result<()> {
        self.tx
            .send(TransportEvent::Response { payload })
            .await
            .map_err(|_| Error::Shutdown)
    }
}

/// Create the event channel connecting a middleware binding to a client.
///
/// The [`EventSender`] goes to the binding; the [`EventReceiver`] goes to
/// [`LedClient::spawn`].
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSender { tx }, EventReceiver { rx })
}

/// A running LED request client.
///
/// Created with [`spawn`](Self::spawn); owns the two background tasks.
/// The client stops on its own when the operator quits; stop it from
/// outside with [`shutdown`](Self::shutdown).
pub struct LedClient {
    cancel: CancellationToken,
    event_task: JoinHandle<()>,
    dispatch_task: JoinHandle<()>,
}

impl LedClient {
    /// Spawn the client's tasks.
    ///
    /// Returns the client handle and the [`Notification`] stream. The
    /// stream should be consumed; dropping the receiver silently discards
    /// reports but does not affect operation.
    pub fn spawn<T, S>(
        config: ClientConfig,
        events: EventReceiver,
        transport: T,
        source: S,
    ) -> (Self, mpsc::Receiver<Notification>)
    where
        T: Transport,
        S: CommandSource,
    {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(DISPATCH_CHANNEL_CAPACITY);
        let (notify_tx, notify_rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let event_task = tokio::spawn(event_loop::event_task(
            events.rx,
            dispatch_tx,
            notify_tx.clone(),
            source,
            config.endpoint,
            cancel.clone(),
        ));
        let dispatch_task = tokio::spawn(dispatch::dispatch_task(
            dispatch_rx,
            transport,
            notify_tx,
            config.endpoint,
            config.cycle,
            cancel.clone(),
        ));

        (
            Self {
                cancel,
                event_task,
                dispatch_task,
            },
            notify_rx,
        )
    }

    /// Token cancelled when the client should stop. Clone it to hook
    /// external shutdown signals (e.g. ctrl-c) to the client.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait until both tasks have exited (e.g. after an operator quit).
    pub async fn wait(self) {
        let _ = self.event_task.await;
        let _ = self.dispatch_task.await;
    }

    /// Cancel the client and wait for its tasks to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.wait().await;
    }
}
