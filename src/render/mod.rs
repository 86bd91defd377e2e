//! POSIX rendering of a command line, for logs and `Display`.
//!
//! The rendered string is diagnostic only: commands are never executed
//! through it.

use std::ffi::OsStr;

/// Render program and arguments as a single shell-quoted line.
pub fn render_cmdline<I, S>(program: &OsStr, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut parts = vec![quote_prog(&program.to_string_lossy())];
    for a in args {
        parts.push(quote_sh(&a.as_ref().to_string_lossy()));
    }
    parts.join(" ")
}

fn quote_prog(p: &str) -> String {
    // bare if simple, else quote
    if !p.is_empty() && is_simple_word(p) { p.to_string() } else { quote_sh(p) }
}

fn is_simple_word(s: &str) -> bool {
    s.chars().all(|c| matches!(c,
        'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' | '/' | ':' | '+' | '%' | '@' | '=' | ','))
}

pub fn quote_sh(s: &str) -> String {
    if s.is_empty() { return "''".to_string(); }
    if is_simple_word(s) { return s.to_string(); }
    let escaped = s.replace('\'', "'\"'\"'");
    format!("'{}'", escaped)
}
