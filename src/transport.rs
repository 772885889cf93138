//! Transport abstraction between the client and the middleware.
//!
//! The middleware stack itself (discovery, connections, serialization) is
//! an external collaborator. The client only needs two things from it:
//!
//! - a way to hand a request payload to the remote service — the
//!   [`Transport`] trait, implemented by the real middleware binding;
//! - a way for the middleware's delivery context to push availability
//!   changes and response payloads back in — the
//!   [`EventSender`](crate::client::EventSender) handle.
//!
//! The trait split keeps the client runnable against anything: a real
//! binding, the bundled [`LoopbackService`], or a recording double in
//! tests.

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::Bytes;

use crate::client::EventSender;
use crate::wire::{REQUEST_LEN, RESULT_OK};

/// Well-known service id of the LED actuator service.
pub const LED_SERVICE_ID: u16 = 0x1234;

/// Well-known instance id of the LED actuator service.
pub const LED_INSTANCE_ID: u16 = 0x5678;

/// Identity of the remote service instance. Immutable for the process
/// lifetime and known at startup.
///
/// Displays in the `[service.instance]` hex form used in availability
/// report lines, e.g. `[1234.5678]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceEndpoint {
    /// Service id.
    pub service_id: u16,
    /// Instance id.
    pub instance_id: u16,
}

impl ServiceEndpoint {
    /// Create an endpoint from raw ids.
    pub fn new(service_id: u16, instance_id: u16) -> Self {
        Self {
            service_id,
            instance_id,
        }
    }

    /// The well-known LED actuator service endpoint.
    pub fn led_service() -> Self {
        Self::new(LED_SERVICE_ID, LED_INSTANCE_ID)
    }
}

impl std::fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:04x}.{:04x}]", self.service_id, self.instance_id)
    }
}

/// Outbound half of the middleware binding.
///
/// Implementations deliver a request payload to the given endpoint.
/// Delivery is fire-and-forget from the client's point of view: the
/// response, if any, comes back asynchronously through the
/// [`EventSender`](crate::client::EventSender).
pub trait Transport: Send + 'static {
    /// Send a request payload to the remote service.
    fn send(
        &mut self,
        endpoint: ServiceEndpoint,
        payload: Bytes,
    ) -> impl Future<Output = io::Result<()>> + Send;
}

/// How long the loopback service waits before announcing itself.
const LOOPBACK_STARTUP_DELAY: Duration = Duration::from_millis(500);

/// How long the loopback service takes to answer a request.
const LOOPBACK_RESPONSE_DELAY: Duration = Duration::from_millis(20);

/// In-process stand-in for the remote LED service.
///
/// Announces availability shortly after [`connect`](Self::connect) and
/// answers every well-formed request with success and the echoed sequence
/// number. Lets the binary run end-to-end without a deployed middleware
/// and backs the integration tests.
pub struct LoopbackService {
    events: EventSender,
}

impl LoopbackService {
    /// Connect the loopback service to a client's event channel.
    ///
    /// Spawns the availability announcement for `endpoint` in the
    /// background.
    pub fn connect(events: EventSender, endpoint: ServiceEndpoint) -> Self {
        let announce = events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(LOOPBACK_STARTUP_DELAY).await;
            if announce.availability_changed(endpoint, true).await.is_err() {
                tracing::debug!("client gone before loopback service came up");
            }
        });
        Self { events }
    }
}

impl Transport for LoopbackService {
    async fn send(&mut self, endpoint: ServiceEndpoint, payload: Bytes) -> io::Result<()> {
        if payload.len() != REQUEST_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("request payload must be {REQUEST_LEN} bytes, got {}", payload.len()),
            ));
        }

        tracing::debug!(
            %endpoint,
            operation = payload[0],
            led = payload[1],
            "loopback service accepted request"
        );

        let events = self.events.clone();
        let reply = Bytes::copy_from_slice(&[RESULT_OK, payload[4], payload[5]]);
        tokio::spawn(async move {
            tokio::time::sleep(LOOPBACK_RESPONSE_DELAY).await;
            let _ = events.response_received(reply).await;
        });
        Ok(())
    }
}
