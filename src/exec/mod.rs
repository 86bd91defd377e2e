//! Launching, waiting and capturing: the terminal operations on a `Command`.

use std::io::{Read, Write};
use std::iter;
use std::path::PathBuf;
use std::process::{self, Child, ChildStderr, ChildStdin, ChildStdout};

use tracing::{debug, trace};

use crate::cmd::Command;
use crate::error::{Error, Result};
use crate::opts::{apply_default_options, apply_options, inherit_unset_stdio, stdout, Opt};
use crate::stdio::{prepare_sink, prepare_source, Capture, Relay, Sink};

#[cfg(not(windows))]
const SHELL: (&str, &str) = ("/bin/sh", "-c");
#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");

impl Command {
    /// Start the command without waiting for it to complete.
    ///
    /// Default options run first, then `opts` in order, then the before
    /// hook. The first failure is returned and the process is not created.
    /// `wait` must be called to reap the child.
    pub fn start<I>(&mut self, opts: I) -> Result<()>
    where
        I: IntoIterator<Item = Opt>,
    {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        apply_default_options(self)?;
        apply_options(self, opts)?;
        self.run_before_hook()?;
        self.spawn()
    }

    /// Wait for the command to exit, reap it and run the after hook.
    ///
    /// A failed wait or unsuccessful exit wins over the after hook's error.
    pub fn wait(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if self.waited {
            return Err(Error::AlreadyWaited);
        }
        self.waited = true;
        let reaped = self.reap();
        let after = self.run_after_hook();
        reaped.and(after)
    }

    /// Start the command and wait for it to complete.
    pub fn run<I>(&mut self, opts: I) -> Result<()>
    where
        I: IntoIterator<Item = Opt>,
    {
        self.start(opts)?;
        self.wait()
    }

    /// Run the command and return its standard output.
    ///
    /// Output gathered before a failure is returned alongside the error.
    /// Passing a `stdout` option as well fails with `AlreadySet`.
    pub fn output<I>(&mut self, opts: I) -> (Vec<u8>, Result<()>)
    where
        I: IntoIterator<Item = Opt>,
    {
        let buf = Capture::default();
        let opts = iter::once(stdout(Sink::writer(buf.clone()))).chain(opts);
        let result = self.run(opts);
        (buf.take(), result)
    }

    fn run_before_hook(&mut self) -> Result<()> {
        let Some(mut hook) = self.before.take() else { return Ok(()) };
        trace!(cmd = %self, "running before hook");
        let r = hook(&*self);
        self.before = Some(hook);
        r.map_err(Error::BeforeHook)
    }

    fn run_after_hook(&mut self) -> Result<()> {
        let Some(mut hook) = self.after.take() else { return Ok(()) };
        trace!(cmd = %self, "running after hook");
        let r = hook(&*self);
        self.after = Some(hook);
        r.map_err(Error::AfterHook)
    }

    fn spawn(&mut self) -> Result<()> {
        let mut proc = process::Command::new(&self.program);
        proc.args(&self.args);
        if let Some(dir) = &self.dir {
            proc.current_dir(dir);
        }
        if let Some(env) = &self.env {
            proc.env_clear().envs(env.iter().map(|(k, v)| (k, v)));
        }
        self.started = true;
        let (stdin, feed) = prepare_source(self.stdin.take())?;
        let (stdout, out) = prepare_sink(self.stdout.take())?;
        let (stderr, err) = prepare_sink(self.stderr.take())?;
        proc.stdin(stdin).stdout(stdout).stderr(stderr);

        let mut child = proc.spawn().map_err(|source| Error::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;
        debug!(pid = child.id(), cmd = %self, dir = ?self.dir, "spawned child");

        let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        if let Err(e) = self.start_relays(feed, out, err, pipes) {
            self.abandon(child);
            return Err(e);
        }
        self.child = Some(child);
        Ok(())
    }

    fn start_relays(
        &mut self,
        feed: Option<Box<dyn Read + Send>>,
        out: Option<Box<dyn Write + Send>>,
        err: Option<Box<dyn Write + Send>>,
        pipes: (Option<ChildStdin>, Option<ChildStdout>, Option<ChildStderr>),
    ) -> Result<()> {
        if let (Some(src), Some(pipe)) = (feed, pipes.0) {
            self.relays.push(Relay::feed(src, pipe)?);
        }
        if let (Some(sink), Some(pipe)) = (out, pipes.1) {
            self.relays.push(Relay::drain("stdout", pipe, sink)?);
        }
        if let (Some(sink), Some(pipe)) = (err, pipes.2) {
            self.relays.push(Relay::drain("stderr", pipe, sink)?);
        }
        Ok(())
    }

    /// Kill and reap a child that cannot be handed out, then collect its relays.
    fn abandon(&mut self, mut child: Child) {
        debug!(pid = child.id(), cmd = %self, "abandoning child");
        let _ = child.kill();
        let _ = child.wait();
        for relay in self.relays.drain(..) {
            let _ = relay.join();
        }
    }

    fn reap(&mut self) -> Result<()> {
        let mut child = self.child.take().ok_or(Error::NotStarted)?;
        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                // the pipes may still be open; detach rather than block on them
                self.relays.clear();
                return Err(Error::Wait(e));
            }
        };
        debug!(pid = child.id(), %status, "child exited");

        let mut relayed = Ok(());
        for relay in self.relays.drain(..) {
            let r = relay.join();
            if relayed.is_ok() {
                relayed = r;
            }
        }
        if !status.success() {
            return Err(Error::Exit { status });
        }
        relayed
    }
}

/// Run `command_line` through the system shell and wait for it.
///
/// The line is split on whitespace and the tokens are handed to the shell
/// after its command flag. Quoting is not understood: `echo "a b"` becomes
/// the tokens `echo`, `"a` and `b"`. The child shares this process's
/// stdin, stdout and stderr unless `opts` bind them.
pub fn system<I>(command_line: &str, opts: I) -> Result<()>
where
    I: IntoIterator<Item = Opt>,
{
    let (shell, flag) = SHELL;
    let args = iter::once(flag).chain(split_command_line(command_line));
    let mut cmd = Command::with_args(shell, args);
    cmd.run(opts.into_iter().chain(iter::once(inherit_unset_stdio())))
}

/// Naive whitespace split used by [`system`].
pub fn split_command_line(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace()
}

/// Search `PATH` for an executable named `name`. A name containing a path
/// separator is tried directly and `PATH` is not consulted.
pub fn look_path(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|source| Error::NotFound { name: name.to_string(), source })
}
