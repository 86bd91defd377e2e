//! Options: composable, fallible configuration steps applied to a
//! `Command` by `start`, `run` and `output`.
//!
//! An option checks its precondition before touching the command, so a
//! failing option leaves the command as it found it.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use tracing::trace;

use crate::cmd::Command;
use crate::error::{BoxError, Error, Result};
use crate::stdio::{Sink, Source};

pub struct Opt(Box<dyn FnOnce(&mut Command) -> Result<()> + Send>);

impl Opt {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut Command) -> Result<()> + Send + 'static,
    {
        Opt(Box::new(f))
    }

    pub fn apply(self, cmd: &mut Command) -> Result<()> { (self.0)(cmd) }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Opt(..)") }
}

/// Working directory of the child. An empty path means the calling
/// process's current directory. Always overwrites.
pub fn dir<P: Into<PathBuf>>(path: P) -> Opt {
    let path = path.into();
    Opt::new(move |c| {
        c.dir = if path.as_os_str().is_empty() { None } else { Some(path) };
        Ok(())
    })
}

pub fn stdin(src: Source) -> Opt {
    Opt::new(move |c| {
        if c.stdin.is_some() {
            return Err(Error::AlreadySet("stdin"));
        }
        c.stdin = Some(src);
        Ok(())
    })
}

pub fn stdout(sink: Sink) -> Opt {
    Opt::new(move |c| {
        if c.stdout.is_some() {
            return Err(Error::AlreadySet("stdout"));
        }
        c.stdout = Some(sink);
        Ok(())
    })
}

pub fn stderr(sink: Sink) -> Opt {
    Opt::new(move |c| {
        if c.stderr.is_some() {
            return Err(Error::AlreadySet("stderr"));
        }
        c.stderr = Some(sink);
        Ok(())
    })
}

/// Run `f` just before the process is created. If it fails the process
/// is never created and `start` returns `Error::BeforeHook`.
pub fn before_func<F>(f: F) -> Opt
where
    F: FnMut(&Command) -> std::result::Result<(), BoxError> + Send + 'static,
{
    Opt::new(move |c| {
        if c.before.is_some() {
            return Err(Error::AlreadySet("before hook"));
        }
        c.before = Some(Box::new(f));
        Ok(())
    })
}

/// Run `f` just after the process exits, on `wait`. Its error is
/// returned only if the process itself exited cleanly.
pub fn after_func<F>(f: F) -> Opt
where
    F: FnMut(&Command) -> std::result::Result<(), BoxError> + Send + 'static,
{
    Opt::new(move |c| {
        if c.after.is_some() {
            return Err(Error::AlreadySet("after hook"));
        }
        c.after = Some(Box::new(f));
        Ok(())
    })
}

/// Set (or overwrite) `key` in the child's environment.
pub fn setenv<K, V>(key: K, val: V) -> Opt
where
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let key = key.as_ref().to_os_string();
    let val = val.as_ref().to_os_string();
    Opt::new(move |c| {
        let env = c.env.get_or_insert_with(Vec::new);
        match env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = val,
            None => env.push((key, val)),
        }
        Ok(())
    })
}

/// Fill any stream the caller left unset with the calling process's own.
pub(crate) fn inherit_unset_stdio() -> Opt {
    Opt::new(|c| {
        c.stdin.get_or_insert(Source::Inherit);
        c.stdout.get_or_insert(Sink::Inherit);
        c.stderr.get_or_insert(Sink::Inherit);
        Ok(())
    })
}

pub(crate) fn apply_default_options(c: &mut Command) -> Result<()> {
    if c.env.is_none() {
        c.env = Some(std::env::vars_os().collect::<Vec<(OsString, OsString)>>());
    }
    Ok(())
}

pub(crate) fn apply_options<I>(c: &mut Command, opts: I) -> Result<()>
where
    I: IntoIterator<Item = Opt>,
{
    for (i, opt) in opts.into_iter().enumerate() {
        opt.apply(c).inspect_err(|e| trace!(option = i, error = %e, "option rejected"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn configured(opts: Vec<Opt>) -> (Command, Result<()>) {
        let mut c = Command::new("true");
        apply_default_options(&mut c).unwrap();
        let r = apply_options(&mut c, opts);
        (c, r)
    }

    #[test]
    fn defaults_materialize_environment_once() {
        let mut c = Command::new("true");
        apply_default_options(&mut c).unwrap();
        let n = c.env().unwrap().len();
        assert_eq!(n, std::env::vars_os().count());
        setenv("CMDEXEC_ONCE", "1").apply(&mut c).unwrap();
        apply_default_options(&mut c).unwrap();
        assert_eq!(c.env().unwrap().len(), n + 1);
    }

    #[test]
    fn setenv_overwrites_in_place() {
        let (c, r) = configured(vec![setenv("CMDEXEC_K", "v1"), setenv("CMDEXEC_K", "v2")]);
        r.unwrap();
        let hits: Vec<_> = c.env().unwrap().iter().filter(|(k, _)| k == "CMDEXEC_K").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(c.env_var("CMDEXEC_K"), Some(OsStr::new("v2")));
    }

    #[test]
    fn setenv_replaces_inherited_entry() {
        let mut c = Command::new("true");
        c.env = Some(vec![("PATH".into(), "/old".into()), ("HOME".into(), "/h".into())]);
        setenv("PATH", "/new").apply(&mut c).unwrap();
        assert_eq!(c.env().unwrap()[0], (OsString::from("PATH"), OsString::from("/new")));
        assert_eq!(c.env().unwrap().len(), 2);
    }

    #[test]
    fn setting_a_stream_twice_fails_and_keeps_first() {
        let (c, r) = configured(vec![stdout(Sink::Null), stdout(Sink::Inherit)]);
        assert!(matches!(r, Err(Error::AlreadySet("stdout"))));
        assert!(matches!(c.stdout, Some(Sink::Null)));

        let (c, r) = configured(vec![stdin(Source::Null), stdin(Source::Bytes(b"x".to_vec()))]);
        assert!(matches!(r, Err(Error::AlreadySet("stdin"))));
        assert!(matches!(c.stdin, Some(Source::Null)));

        let (c, r) = configured(vec![stderr(Sink::Null), stderr(Sink::Inherit)]);
        assert!(matches!(r, Err(Error::AlreadySet("stderr"))));
        assert!(matches!(c.stderr, Some(Sink::Null)));
    }

    #[test]
    fn second_hook_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (first, second) = (calls.clone(), calls.clone());
        let (mut c, r) = configured(vec![
            before_func(move |_| { first.fetch_add(1, Ordering::SeqCst); Ok(()) }),
            before_func(move |_| { second.fetch_add(10, Ordering::SeqCst); Ok(()) }),
        ]);
        assert!(matches!(r, Err(Error::AlreadySet("before hook"))));
        (c.before.as_mut().unwrap())(&Command::new("x")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (_, r) = configured(vec![after_func(|_| Ok(())), after_func(|_| Ok(()))]);
        assert!(matches!(r, Err(Error::AlreadySet("after hook"))));
    }

    #[test]
    fn application_stops_at_first_failure() {
        let (c, r) = configured(vec![
            stdout(Sink::Null),
            stdout(Sink::Null),
            dir("/never"),
            setenv("CMDEXEC_NEVER", "1"),
        ]);
        assert!(r.is_err());
        assert!(c.dir().is_none());
        assert!(c.env_var("CMDEXEC_NEVER").is_none());
    }

    #[test]
    fn dir_always_overwrites() {
        let (c, r) = configured(vec![dir("/a"), dir("/b")]);
        r.unwrap();
        assert_eq!(c.dir(), Some(std::path::Path::new("/b")));

        let (c, _) = configured(vec![dir("/a"), dir("")]);
        assert!(c.dir().is_none());
    }

    #[test]
    fn inherit_fills_only_unset_streams() {
        let (c, r) = configured(vec![stdout(Sink::Null), inherit_unset_stdio()]);
        r.unwrap();
        assert!(matches!(c.stdout, Some(Sink::Null)));
        assert!(matches!(c.stdin, Some(Source::Inherit)));
        assert!(matches!(c.stderr, Some(Sink::Inherit)));
    }
}
