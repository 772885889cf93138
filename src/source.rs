//! Command sources: where new requests come from.
//!
//! The dispatch loop never reads a terminal itself. It asks a
//! [`CommandSource`] for the next command whenever one may be armed —
//! after the service first becomes available and after each response
//! while it still is. Swapping the source swaps the operator:
//! [`StdinSource`] for an interactive terminal, [`ScriptedSource`] for
//! tests and non-interactive runs.

use std::future::Future;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::command::{CommandBuilder, LedCommand, Prompt, Step};

/// Produces the next command to arm, or `None` to quit the client.
pub trait CommandSource: Send + 'static {
    /// Build the next command.
    ///
    /// May take arbitrarily long (e.g. waiting for operator input).
    /// Returning `None` shuts the client down.
    fn next_command(&mut self) -> impl Future<Output = Option<LedCommand>> + Send;
}

/// Interactive command source reading the operator's terminal.
///
/// Runs the [`CommandBuilder`] dialogue over stdin, printing prompts and
/// re-prompting on invalid input. EOF counts as a quit.
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSource {
    /// Create a source reading from this process's stdin.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    fn show(prompt: Prompt) {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSource for StdinSource {
    async fn next_command(&mut self) -> Option<LedCommand> {
        let mut builder = CommandBuilder::new();
        loop {
            Self::show(builder.prompt());
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read operator input");
                    return None;
                }
            };
            match builder.feed(&line) {
                Step::Ask(_) => {}
                Step::Rejected(Prompt::Operation) => {
                    tracing::debug!(input = %line, "unrecognized operation");
                    eprint!("Error: Invalid input.");
                    println!("\n*************************************");
                }
                Step::Rejected(_) => {
                    tracing::debug!(input = %line, "unrecognized input");
                }
                Step::Complete(command) => return Some(command),
                Step::Quit => return None,
            }
        }
    }
}

/// Fixed command sequence, mainly for tests and demos.
///
/// Quits once the script runs out.
pub struct ScriptedSource {
    commands: std::vec::IntoIter<LedCommand>,
}

impl ScriptedSource {
    /// Create a source that yields `commands` in order.
    pub fn new(commands: Vec<LedCommand>) -> Self {
        Self {
            commands: commands.into_iter(),
        }
    }
}

impl CommandSource for ScriptedSource {
    async fn next_command(&mut self) -> Option<LedCommand> {
        self.commands.next()
    }
}
