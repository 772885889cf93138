//! Dispatcher-owned state.
//!
//! The dispatcher task owns this exclusively; nothing here is shared or
//! locked. Other tasks influence it only through
//! [`DispatchEvent`](super::DispatchEvent) messages.

use crate::command::LedCommand;

use super::DispatchEvent;

/// Wrapping 16-bit request sequence counter.
///
/// Starts at 0, advanced by exactly 1 after each successful send, wraps
/// silently at 2^16. No matching table is kept: requests and responses
/// alternate strictly, so correlation is by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SequenceCounter(u16);

impl SequenceCounter {
    pub(crate) fn new() -> Self {
        Self(0)
    }

    #[cfg(test)]
    pub(crate) fn starting_at(value: u16) -> Self {
        Self(value)
    }

    /// The number the next request will carry.
    pub(crate) fn current(self) -> u16 {
        self.0
    }

    /// Step to the next number. Call only after a successful send.
    pub(crate) fn advance(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Everything the dispatcher tracks between wakes.
#[derive(Debug)]
pub(crate) struct DispatcherState {
    /// Sequence number source for outgoing requests.
    pub(crate) seq: SequenceCounter,
    /// The command waiting to be sent, if any. `Some` is the armed state;
    /// never more than one command waits (no pipelining).
    pub(crate) armed: Option<LedCommand>,
    /// Availability snapshot, fed by the event task.
    pub(crate) available: bool,
}

impl DispatcherState {
    pub(crate) fn new() -> Self {
        Self {
            seq: SequenceCounter::new(),
            armed: None,
            available: false,
        }
    }

    /// Fold one inbox message into the state.
    pub(crate) fn apply(&mut self, event: DispatchEvent) {
        match event {
            DispatchEvent::Availability(available) => {
                tracing::debug!(available, "dispatcher availability snapshot updated");
                self.available = available;
            }
            DispatchEvent::Arm(command) => {
                if self.armed.replace(command).is_some() {
                    // Happens when an availability recovery rebuilds while
                    // a command armed through the outage is still waiting.
                    // The newest command wins.
                    tracing::debug!("unsent armed command replaced");
                }
            }
        }
    }

    /// Whether a send is pending and permitted by availability.
    pub(crate) fn has_work(&self) -> bool {
        self.available && self.armed.is_some()
    }
}
