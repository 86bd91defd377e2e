//! cmdexec: option-driven launching of child processes.
//!
//! A [`Command`] is built once from a program and its arguments, then
//! configured at launch time by a list of [`Opt`]s: working directory,
//! stream bindings, environment overrides and before/after hooks.
//!
//! ```no_run
//! use cmdexec::prelude::*;
//!
//! let mut cmd = cmd!("git", "status");
//! let (out, result) = cmd.output([dir("/tmp")]);
//! result?;
//! print!("{}", String::from_utf8_lossy(&out));
//! # Ok::<(), cmdexec::Error>(())
//! ```

pub mod error;
pub mod cmd;
pub mod opts;
pub mod stdio;
pub mod exec;
pub mod render;
pub mod prelude;
pub mod macros;

pub use cmd::{Command, Hook};
pub use error::{BoxError, Error, Result};
pub use exec::{look_path, split_command_line, system};
pub use opts::{after_func, before_func, dir, setenv, stderr, stdin, stdout, Opt};
pub use stdio::{Sink, Source};
