use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Error type user hooks return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("exec: command not initialized")]
    NotInitialized,
    #[error("exec: {0} already set")]
    AlreadySet(&'static str),
    #[error("exec: already started")]
    AlreadyStarted,
    #[error("exec: not started")]
    NotStarted,
    #[error("exec: wait was already called")]
    AlreadyWaited,
    #[error("exec: before hook failed: {0}")]
    BeforeHook(#[source] BoxError),
    #[error("exec: after hook failed: {0}")]
    AfterHook(#[source] BoxError),
    #[error("exec: {name}: executable not found")]
    NotFound {
        name: String,
        #[source]
        source: which::Error,
    },
    #[error("exec: failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("exec: cannot open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("exec: wait failed")]
    Wait(#[source] io::Error),
    #[error("exec: {status}")]
    Exit { status: ExitStatus },
    #[error("exec: relaying {stream} failed")]
    Relay {
        stream: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Exit code of a child that terminated unsuccessfully. `None` for
    /// every other error, and for children killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Exit { status } => status.code(),
            _ => None,
        }
    }

    pub fn is_exit(&self) -> bool { matches!(self, Error::Exit { .. }) }
}
