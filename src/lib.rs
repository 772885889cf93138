//! # ledctl
//!
//! An **availability-gated request client** for a remote LED actuator
//! service reached over a service-oriented middleware.
//!
//! The operator repeatedly issues LED-control commands (on, off,
//! custom-flash, standard-flash) to a single remote service instance;
//! each command is paired with its asynchronous result through a
//! wrapping 16-bit sequence number embedded in both payloads.
//!
//! ## Features
//!
//! - **Single-in-flight dispatch**: at most one request is ever armed;
//!   the next is built only when the previous response arrives.
//! - **Availability gating**: nothing is sent while the service is
//!   unreachable; an armed request survives outages and goes out when
//!   the service returns.
//! - **Cyclic rate floor**: consecutive sends are separated by at least
//!   the configured cycle duration, however fast replies arrive.
//! - **Injectable collaborators**: the middleware binding
//!   ([`Transport`] + [`EventSender`]) and the operator
//!   ([`CommandSource`]) are traits, so the core runs identically
//!   against a terminal, a script, or a test double.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ledctl::{
//!     client, ClientConfig, LedClient, LoopbackService, ScriptedSource,
//!     LedCommand, LedTarget, Operation,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientConfig::default();
//!     let (events, intake) = client::event_channel();
//!
//!     // Stand-in service; swap for a real middleware binding.
//!     let service = LoopbackService::connect(events, config.endpoint);
//!
//!     let script = ScriptedSource::new(vec![LedCommand::new(
//!         Operation::SwitchOn,
//!         LedTarget::default(),
//!     )]);
//!
//!     let (led_client, mut notifications) = LedClient::spawn(config, intake, service, script);
//!     while let Some(report) = notifications.recv().await {
//!         println!("{report}");
//!     }
//!     led_client.wait().await;
//! }
//! ```
//!
//! ## Architecture
//!
//! The middleware's delivery context pushes typed [`TransportEvent`]s
//! through an [`EventSender`] into the client. An **event task** tracks
//! availability, decodes and reports responses, and drives the
//! [`CommandSource`] to build the next command. Built commands and
//! availability snapshots flow over an ordered inbox to the
//! **dispatcher task**, the sole owner of the sequence counter and the
//! only caller of [`Transport::send`]. All state is task-local; there
//! are no locks. See [`client`] for the full picture.

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod source;
pub mod transport;
pub mod wire;

pub use client::{EventReceiver, EventSender, LedClient, Notification, TransportEvent};
pub use command::{
    CommandBuilder, FlashPeriod, LedCommand, LedTarget, Operation, Prompt, Step,
};
pub use config::{ClientConfig, Protocol};
pub use error::{Error, Result};
pub use source::{CommandSource, ScriptedSource, StdinSource};
pub use transport::{LoopbackService, ServiceEndpoint, Transport};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::{
        ClientConfig, CommandSource, Error, EventSender, LedClient, LedCommand, LedTarget,
        Notification, Operation, Protocol, Result, ServiceEndpoint, Transport,
    };
}
