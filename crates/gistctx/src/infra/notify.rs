//! User-facing notifications.

use std::io::{self, Write};

/// Severity-tagged messages shown to the user after an upload attempt.
pub trait Notifier: Send + Sync {
    fn info_url(&self, title: &str, message: &str, url: &str);
    fn warning(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
}

/// Writes notifications to stderr, keeping stdout free for URLs and payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn info_url(&self, title: &str, message: &str, url: &str) {
        let _ = writeln!(io::stderr(), "{title}: {message} {url}");
    }

    fn warning(&self, title: &str, message: &str) {
        let _ = writeln!(io::stderr(), "warning: {title}: {message}");
    }

    fn error(&self, title: &str, message: &str) {
        let _ = writeln!(io::stderr(), "error: {title}: {message}");
    }
}
