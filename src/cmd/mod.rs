//! The `Command` entity: one external-process invocation.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Child;

use crate::error::BoxError;
use crate::render::render_cmdline;
use crate::stdio::{Relay, Sink, Source};

/// Callback run around the child's lifetime. See `before_func` and `after_func`.
pub type Hook = Box<dyn FnMut(&Command) -> Result<(), BoxError> + Send>;

/// A command to be run.
///
/// A `Command` must be built with [`Command::new`], [`Command::with_args`]
/// or [`cmd!`](crate::cmd!). `Command::default()` is an uninitialized
/// value on which every operation fails. A `Command` cannot be reused
/// once started.
#[derive(Default)]
pub struct Command {
    pub(crate) program: OsString,
    pub(crate) args: Vec<OsString>,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) env: Option<Vec<(OsString, OsString)>>,
    pub(crate) stdin: Option<Source>,
    pub(crate) stdout: Option<Sink>,
    pub(crate) stderr: Option<Sink>,
    pub(crate) before: Option<Hook>,
    pub(crate) after: Option<Hook>,
    pub(crate) initialized: bool,
    pub(crate) started: bool,
    pub(crate) waited: bool,
    pub(crate) child: Option<Child>,
    pub(crate) relays: Vec<Relay>,
}

impl Command {
    pub fn new<P: AsRef<OsStr>>(program: P) -> Self {
        Command::with_args(program, Vec::<OsString>::new())
    }

    pub fn with_args<P, I, S>(program: P, args: I) -> Self
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command {
            program: program.as_ref().to_os_string(),
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
            initialized: true,
            ..Default::default()
        }
    }

    pub fn program(&self) -> &OsStr { &self.program }
    pub fn args(&self) -> &[OsString] { &self.args }
    pub fn dir(&self) -> Option<&Path> { self.dir.as_deref() }

    /// The child's environment. `None` until `start` materializes it from
    /// the calling process.
    pub fn env(&self) -> Option<&[(OsString, OsString)]> { self.env.as_deref() }

    /// Value of `key` in the materialized environment.
    pub fn env_var<K: AsRef<OsStr>>(&self, key: K) -> Option<&OsStr> {
        let key = key.as_ref();
        self.env.as_ref()?.iter().find(|(k, _)| k.as_os_str() == key).map(|(_, v)| v.as_os_str())
    }

    /// OS process id, once started and until waited.
    pub fn id(&self) -> Option<u32> { self.child.as_ref().map(Child::id) }
    pub fn is_started(&self) -> bool { self.started }
    pub fn is_waited(&self) -> bool { self.waited }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_cmdline(&self.program, &self.args))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("dir", &self.dir)
            .field("env", &self.env.as_ref().map(Vec::len))
            .field("stdin", &self.stdin)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("initialized", &self.initialized)
            .field("started", &self.started)
            .field("waited", &self.waited)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_initialize() {
        let c = Command::with_args("git", ["status", "--short"]);
        assert!(c.initialized);
        assert_eq!(c.program(), "git");
        assert_eq!(c.args(), &[OsString::from("status"), OsString::from("--short")]);
        assert!(c.env().is_none());
        assert!(c.dir().is_none());
        assert!(Command::new("true").args().is_empty());
    }

    #[test]
    fn default_is_uninitialized() {
        let c = Command::default();
        assert!(!c.initialized);
        assert!(!c.is_started());
        assert!(c.id().is_none());
    }

    #[test]
    fn command_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Command>();
        assert_send::<crate::opts::Opt>();
    }

    #[test]
    fn display_renders_quoted_cmdline() {
        let c = Command::with_args("echo", ["hello world", "x"]);
        assert_eq!(c.to_string(), "echo 'hello world' x");
    }
}
