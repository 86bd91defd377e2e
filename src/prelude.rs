//! cmdexec::prelude - grab-and-go imports for launching commands

pub use crate::cmd;
pub use crate::cmd::Command;
pub use crate::error::{Error, Result};
pub use crate::exec::{look_path, system};
pub use crate::opts::{after_func, before_func, dir, setenv, stderr, stdin, stdout, Opt};
pub use crate::stdio::{Sink, Source};
