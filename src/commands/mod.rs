//! Asynchronous commands served by the capture engine.
//!
//! Each controller depends only on the trait for its own slice of the
//! engine, so a window can be driven by the real host or by an in-memory
//! fake.

mod config;
mod export;
mod scroll;
mod selector;

pub use config::*;
pub use export::*;
pub use scroll::*;
pub use selector::*;

/// Failure of a command issued to the engine or the window host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{command} failed: {message}")]
    Failed {
        command: &'static str,
        message: String,
    },
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
}

impl CommandError {
    pub fn failed(command: &'static str, message: impl Into<String>) -> Self {
        CommandError::Failed {
            command,
            message: message.into(),
        }
    }

    /// Message suitable for an inline error label.
    pub fn message(&self) -> String {
        match self {
            CommandError::Failed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
