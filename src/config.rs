//! Client configuration.
//!
//! For most uses the defaults work out of the box:
//!
//! ```
//! use ledctl::ClientConfig;
//!
//! let config = ClientConfig::default();
//! assert_eq!(config.cycle.as_millis(), 1000);
//! ```
//!
//! For custom setups, use the builder:
//!
//! ```
//! use ledctl::{ClientConfig, Protocol, ServiceEndpoint};
//!
//! let config = ClientConfig::builder()
//!     .endpoint(ServiceEndpoint::new(0x1234, 0x0001))
//!     .cycle_ms(250)
//!     .preferred_protocol(Protocol::Tcp)
//!     .build();
//! ```

use std::fmt;
use std::time::Duration;

use crate::transport::ServiceEndpoint;

/// Transport protocol preference handed to the middleware binding.
///
/// Which protocol is actually used is the binding's business; the client
/// only records and reports the preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Datagram transport (default).
    #[default]
    Udp,
    /// Stream transport.
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => write!(f, "UDP"),
            Self::Tcp => write!(f, "TCP"),
        }
    }
}

/// Configuration for a [`LedClient`](crate::client::LedClient).
///
/// | Option | Default | Description |
/// |--------|---------|-------------|
/// | `endpoint` | `[1234.5678]` | Remote service identity |
/// | `cycle` | 1000 ms | Minimum delay between consecutive sends |
/// | `preferred_protocol` | UDP | Transport preference for the binding |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity of the remote service instance.
    pub endpoint: ServiceEndpoint,
    /// Minimum delay between consecutive sends. A hard floor on request
    /// rate, not a retry backoff.
    pub cycle: Duration,
    /// Transport protocol preference.
    pub preferred_protocol: Protocol,
}

impl ClientConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: ServiceEndpoint::led_service(),
            cycle: Duration::from_millis(1000),
            preferred_protocol: Protocol::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
#[must_use]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the remote service endpoint.
    pub fn endpoint(mut self, endpoint: ServiceEndpoint) -> Self {
        self.config.endpoint = endpoint;
        self
    }

    /// Set the send cycle duration.
    pub fn cycle(mut self, cycle: Duration) -> Self {
        self.config.cycle = cycle;
        self
    }

    /// Set the send cycle duration in milliseconds.
    pub fn cycle_ms(self, ms: u64) -> Self {
        self.cycle(Duration::from_millis(ms))
    }

    /// Set the transport protocol preference.
    pub fn preferred_protocol(mut self, protocol: Protocol) -> Self {
        self.config.preferred_protocol = protocol;
        self
    }

    /// Finish building.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
