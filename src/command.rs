//! LED command model and the interactive build state machine.
//!
//! A [`LedCommand`] is the validated product of the operator dialogue:
//! an [`Operation`] plus the [`LedTarget`] it acts on. The dialogue itself
//! is a pure, line-fed state machine ([`CommandBuilder`]) with no I/O of
//! its own — command sources (see [`crate::source`]) feed it lines and
//! render its prompts, which keeps the dialogue testable without a
//! terminal.
//!
//! ## Dialogue
//!
//! ```text
//! AwaitOperation ──1/2/4──▶ AwaitTarget ──────────────▶ Complete
//!       │                        │
//!       └────3──▶ AwaitTarget ──▶ AwaitPeriod ─────────▶ Complete
//! ```
//!
//! At every step a line starting with `q` quits; unrecognized input
//! re-prompts and is never fatal.

use std::fmt;

/// What the remote service should do with an LED.
///
/// The wire tag (byte 0 of a request) is 1–4 in declaration order.
/// The flash period only exists for [`Operation::CustomFlash`] and rides
/// inside the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Switch the LED on (tag 1).
    SwitchOn,
    /// Switch the LED off (tag 2).
    SwitchOff,
    /// Flash the LED with an operator-chosen period (tag 3).
    CustomFlash(FlashPeriod),
    /// Flash the LED with the service's built-in period (tag 4).
    StandardFlash,
}

impl Operation {
    /// Wire tag for byte 0 of the request payload.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::SwitchOn => 1,
            Self::SwitchOff => 2,
            Self::CustomFlash(_) => 3,
            Self::StandardFlash => 4,
        }
    }

    /// Flash period for bytes 2–3 of the request payload; 0 when the
    /// operation has none.
    pub(crate) fn period_ms(self) -> u16 {
        match self {
            Self::CustomFlash(period) => period.value(),
            _ => 0,
        }
    }
}

/// Which of the service's LEDs a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedTarget(u8);

impl LedTarget {
    /// Create a new `LedTarget`. Returns `None` outside 1–8.
    pub fn new(position: u8) -> Option<Self> {
        match position {
            1..=8 => Some(Self(position)),
            _ => None,
        }
    }

    /// Get the raw position.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for LedTarget {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for LedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flash period in milliseconds for [`Operation::CustomFlash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlashPeriod(u16);

impl FlashPeriod {
    /// Create a new `FlashPeriod`. Returns `None` outside 100–5000 ms.
    pub fn new(ms: u16) -> Option<Self> {
        match ms {
            100..=5000 => Some(Self(ms)),
            _ => None,
        }
    }

    /// Get the period in milliseconds.
    pub fn value(self) -> u16 {
        self.0
    }
}

impl Default for FlashPeriod {
    fn default() -> Self {
        Self(250)
    }
}

/// A fully validated command, ready to be armed for dispatch.
///
/// The sequence number is not part of the command: the dispatcher attaches
/// it at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCommand {
    /// What to do.
    pub operation: Operation,
    /// Which LED to do it to.
    pub target: LedTarget,
}

impl LedCommand {
    /// Create a command.
    pub fn new(operation: Operation, target: LedTarget) -> Self {
        Self { operation, target }
    }
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Operation::SwitchOn => write!(f, "Switch on LED {}", self.target),
            Operation::SwitchOff => write!(f, "Switch off LED {}", self.target),
            Operation::CustomFlash(period) => {
                write!(f, "Flash LED {} ({} ms)", self.target, period.value())
            }
            Operation::StandardFlash => write!(f, "Flash LED {} (standard)", self.target),
        }
    }
}

/// The question the dialogue is currently asking.
///
/// `Display` renders the prompt text shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Choose an operation (1–4) or quit.
    Operation,
    /// Choose an LED (1–8), default 1.
    Target,
    /// Choose a flash period (100–5000 ms), default 250.
    Period,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation => write!(
                f,
                "1 = switch LED on, 2 = switch LED off, 3 = custom flash LED, 4 = standard flash LED\n\
                 Please enter your operation or q to quit : "
            ),
            Self::Target => write!(f, "which LED (1-8) [1] (q to quit) ? "),
            Self::Period => write!(f, "which period (100-5000 ms) [250] (q to quit) ? "),
        }
    }
}

/// Outcome of feeding one input line to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Input accepted; ask the given question next.
    Ask(Prompt),
    /// Input not recognized; ask the same question again.
    Rejected(Prompt),
    /// Dialogue finished with a validated command.
    Complete(LedCommand),
    /// The operator asked to quit.
    Quit,
}

#[derive(Debug, Clone, Copy)]
enum State {
    AwaitOperation,
    AwaitTarget { op_tag: u8 },
    AwaitPeriod { target: LedTarget },
}

/// Line-fed state machine assembling one [`LedCommand`].
///
/// Only the first character of a line is significant for the operation and
/// target questions; the period question parses the whole line as an
/// integer. An empty line picks the default where one exists.
///
/// # Example
///
/// ```
/// use ledctl::command::{CommandBuilder, Operation, Step};
///
/// let mut builder = CommandBuilder::new();
/// assert!(matches!(builder.feed("2"), Step::Ask(_)));
/// match builder.feed("4") {
///     Step::Complete(command) => {
///         assert_eq!(command.operation, Operation::SwitchOff);
///         assert_eq!(command.target.value(), 4);
///     }
///     step => panic!("unexpected step: {step:?}"),
/// }
/// ```
#[derive(Debug)]
pub struct CommandBuilder {
    state: State,
}

impl CommandBuilder {
    /// Start a fresh dialogue at the operation question.
    pub fn new() -> Self {
        Self {
            state: State::AwaitOperation,
        }
    }

    /// The question currently being asked.
    pub fn prompt(&self) -> Prompt {
        match self.state {
            State::AwaitOperation => Prompt::Operation,
            State::AwaitTarget { .. } => Prompt::Target,
            State::AwaitPeriod { .. } => Prompt::Period,
        }
    }

    /// Feed one input line and advance the dialogue.
    ///
    /// After [`Step::Complete`] or [`Step::Quit`] the builder is reset to
    /// the operation question.
    pub fn feed(&mut self, line: &str) -> Step {
        let first = line.chars().next();
        if first == Some('q') {
            self.state = State::AwaitOperation;
            return Step::Quit;
        }

        match self.state {
            State::AwaitOperation => match first {
                Some(c @ '1'..='4') => {
                    self.state = State::AwaitTarget { op_tag: c as u8 - b'0' };
                    Step::Ask(Prompt::Target)
                }
                _ => Step::Rejected(Prompt::Operation),
            },
            State::AwaitTarget { op_tag } => {
                let target = match first {
                    None => LedTarget::default(),
                    Some(c @ '1'..='8') => match LedTarget::new(c as u8 - b'0') {
                        Some(target) => target,
                        None => return Step::Rejected(Prompt::Target),
                    },
                    Some(_) => return Step::Rejected(Prompt::Target),
                };
                if op_tag == 3 {
                    self.state = State::AwaitPeriod { target };
                    Step::Ask(Prompt::Period)
                } else {
                    let operation = match op_tag {
                        1 => Operation::SwitchOn,
                        2 => Operation::SwitchOff,
                        _ => Operation::StandardFlash,
                    };
                    self.state = State::AwaitOperation;
                    Step::Complete(LedCommand::new(operation, target))
                }
            }
            State::AwaitPeriod { target } => {
                let period = if line.is_empty() {
                    FlashPeriod::default()
                } else {
                    match line.trim().parse::<u16>().ok().and_then(FlashPeriod::new) {
                        Some(period) => period,
                        None => return Step::Rejected(Prompt::Period),
                    }
                };
                self.state = State::AwaitOperation;
                Step::Complete(LedCommand::new(Operation::CustomFlash(period), target))
            }
        }
    }
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}
