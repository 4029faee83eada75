//! Agent: prompt + provider invocation and the stdio protocol around it
//!
//! Every failure the bridge can hit is classified into an [`ErrorKind`],
//! and each kind has one recovery policy:
//!
//! | kind | policy |
//! |---|---|
//! | `RemoteUnavailable` | recovered inside the prompt fetcher by reading the local copy |
//! | `LocalMissing`, `MalformedDocument`, `Io` | fatal |
//! | `MalformedFraming` | single-shot: exit 1; daemon: skip the line |
//! | `ProviderFailure`, `Timeout` | single-shot: exit 2; daemon: skip the line |
//!
//! A missing provider credential is the one provider failure treated as
//! fatal, since every later line would fail the same way.

use std::time::Duration;
use thiserror::Error;

use machina_prompt::PromptError;
use machina_provider::ProviderError;

pub mod invoker;
pub mod protocol;
pub mod wire;

pub use invoker::{Agent, AgentSettings, Invocation, Invoke};
pub use protocol::{run_daemon, run_single, DaemonStats};
pub use wire::{decode_messages, encode_invocation, FramingError};

/// Closed set of failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RemoteUnavailable,
    LocalMissing,
    MalformedDocument,
    MalformedFraming,
    ProviderFailure,
    Timeout,
    Io,
}

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Prompt(PromptError::LocalMissing { .. }) => ErrorKind::LocalMissing,
            AgentError::Prompt(PromptError::Timeout(_)) => ErrorKind::Timeout,
            AgentError::Prompt(e) if e.is_malformed() => ErrorKind::MalformedDocument,
            AgentError::Prompt(_) => ErrorKind::RemoteUnavailable,
            AgentError::Provider(_) => ErrorKind::ProviderFailure,
            AgentError::Timeout(_) => ErrorKind::Timeout,
            AgentError::Framing(_) => ErrorKind::MalformedFraming,
            AgentError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether a long-running loop must stop on this error
    pub fn is_fatal(&self) -> bool {
        match self.kind() {
            ErrorKind::LocalMissing | ErrorKind::MalformedDocument | ErrorKind::Io => true,
            ErrorKind::ProviderFailure => {
                matches!(self, AgentError::Provider(ProviderError::NoApiKey))
            }
            ErrorKind::RemoteUnavailable | ErrorKind::MalformedFraming | ErrorKind::Timeout => {
                false
            }
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::MalformedFraming => 1,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
