//! Standard stream bindings for a child process.
//!
//! `Inherit`, `Null` and `File` map straight onto an OS handle. `Bytes`,
//! `Reader` and `Writer` have no handle of their own, so the child gets a
//! pipe and a relay thread copies between the pipe and the binding. The
//! relays are joined by `Command::wait`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::process::{self, ChildStdin};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};

/// Where the child's standard input comes from.
pub enum Source {
    Inherit,
    Null,
    File(PathBuf),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
}

/// Where the child's standard output or error goes.
pub enum Sink {
    Inherit,
    Null,
    File { path: PathBuf, append: bool },
    Writer(Box<dyn Write + Send>),
}

impl Source {
    pub fn reader<R: Read + Send + 'static>(r: R) -> Self { Source::Reader(Box::new(r)) }
}

impl Sink {
    pub fn writer<W: Write + Send + 'static>(w: W) -> Self { Sink::Writer(Box::new(w)) }
    /// Truncate `path` and write to it.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self { Sink::File { path: path.into(), append: false } }
    pub fn append<P: Into<PathBuf>>(path: P) -> Self { Sink::File { path: path.into(), append: true } }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Inherit => f.write_str("Inherit"),
            Source::Null => f.write_str("Null"),
            Source::File(p) => f.debug_tuple("File").field(p).finish(),
            Source::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Inherit => f.write_str("Inherit"),
            Sink::Null => f.write_str("Null"),
            Sink::File { path, append } => f.debug_struct("File").field("path", path).field("append", append).finish(),
            Sink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Resolve an optional stdin binding into the handle given to the child
/// and, for relayed bindings, the reader to pump into its pipe.
pub(crate) fn prepare_source(src: Option<Source>) -> Result<(process::Stdio, Option<Box<dyn Read + Send>>)> {
    match src {
        None | Some(Source::Inherit) => Ok((process::Stdio::inherit(), None)),
        Some(Source::Null) => Ok((process::Stdio::null(), None)),
        Some(Source::File(path)) => {
            let f = File::open(&path).map_err(|source| Error::Open { path, source })?;
            Ok((f.into(), None))
        }
        Some(Source::Bytes(b)) => Ok((process::Stdio::piped(), Some(Box::new(Cursor::new(b))))),
        Some(Source::Reader(r)) => Ok((process::Stdio::piped(), Some(r))),
    }
}

pub(crate) fn prepare_sink(sink: Option<Sink>) -> Result<(process::Stdio, Option<Box<dyn Write + Send>>)> {
    match sink {
        None | Some(Sink::Inherit) => Ok((process::Stdio::inherit(), None)),
        Some(Sink::Null) => Ok((process::Stdio::null(), None)),
        Some(Sink::File { path, append }) => {
            let f = OpenOptions::new()
                .write(true)
                .create(true)
                .append(append)
                .truncate(!append)
                .open(&path)
                .map_err(|source| Error::Open { path, source })?;
            Ok((f.into(), None))
        }
        Some(Sink::Writer(w)) => Ok((process::Stdio::piped(), Some(w))),
    }
}

/// A thread copying between a child pipe and a stream binding.
pub(crate) struct Relay {
    stream: &'static str,
    handle: JoinHandle<io::Result<()>>,
}

impl Relay {
    /// Drain `pipe` (the child's stdout or stderr) into `sink`.
    pub(crate) fn drain<R>(stream: &'static str, mut pipe: R, mut sink: Box<dyn Write + Send>) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        Self::spawn(stream, move || {
            io::copy(&mut pipe, &mut sink)?;
            sink.flush()
        })
    }

    /// Feed `src` into the child's stdin, closing it at end of input.
    pub(crate) fn feed(mut src: Box<dyn Read + Send>, mut pipe: ChildStdin) -> Result<Self> {
        Self::spawn("stdin", move || match io::copy(&mut src, &mut pipe) {
            // the child closed its stdin early; not our failure
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            r => r.map(|_| ()),
        })
    }

    fn spawn<F>(stream: &'static str, f: F) -> Result<Self>
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("cmdexec-{}", stream))
            .spawn(f)
            .map_err(|source| Error::Relay { stream, source })?;
        Ok(Relay { stream, handle })
    }

    pub(crate) fn join(self) -> Result<()> {
        let stream = self.stream;
        match self.handle.join() {
            Ok(r) => r.map_err(|source| Error::Relay { stream, source }),
            Err(_) => Err(Error::Relay { stream, source: io::Error::new(io::ErrorKind::Other, "relay thread panicked") }),
        }
    }
}

/// In-memory sink shared between a relay thread and its owner.
#[derive(Clone, Default)]
pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub(crate) fn take(&self) -> Vec<u8> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }
}

impl Write for Capture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(data);
        Ok(data.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_shares_buffer_between_clones() {
        let c = Capture::default();
        let mut w = c.clone();
        w.write_all(b"hello ").unwrap();
        w.write_all(b"world").unwrap();
        assert_eq!(c.take(), b"hello world");
        assert!(c.take().is_empty());
    }

    #[test]
    fn drain_relay_copies_everything() {
        let c = Capture::default();
        let relay = Relay::drain("stdout", Cursor::new(b"abc".to_vec()), Box::new(c.clone())).unwrap();
        relay.join().unwrap();
        assert_eq!(c.take(), b"abc");
    }

    #[test]
    fn failing_sink_surfaces_as_relay_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> { Err(io::Error::new(io::ErrorKind::Other, "disk full")) }
            fn flush(&mut self) -> io::Result<()> { Ok(()) }
        }
        let relay = Relay::drain("stderr", Cursor::new(b"x".to_vec()), Box::new(Broken)).unwrap();
        let err = relay.join().unwrap_err();
        assert!(matches!(err, Error::Relay { stream: "stderr", .. }));
    }

    #[test]
    fn missing_input_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let err = prepare_source(Some(Source::File(missing.clone()))).err().unwrap();
        assert!(matches!(err, Error::Open { path, .. } if path == missing));
    }

    #[test]
    fn unset_bindings_inherit_without_relay() {
        assert!(prepare_source(None).unwrap().1.is_none());
        assert!(prepare_sink(None).unwrap().1.is_none());
        assert!(prepare_sink(Some(Sink::Null)).unwrap().1.is_none());
        assert!(prepare_sink(Some(Sink::writer(Vec::new()))).unwrap().1.is_some());
    }
}
