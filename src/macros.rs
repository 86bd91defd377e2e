//! Terse macros for everyday usage

/// Build a [`Command`](crate::Command) from a program and its arguments.
///
/// `cmd!("git", "status")` is `Command::with_args("git", ["status"])`.
#[macro_export]
macro_rules! cmd {
    ($prog:expr $(,)?) => {{
        $crate::Command::new($prog)
    }};
    ($prog:expr, $( $arg:expr ),+ $(,)?) => {{
        $crate::Command::with_args($prog, [ $( ::std::ffi::OsString::from($arg) ),+ ])
    }};
}
