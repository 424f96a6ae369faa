//! Copying the created gist URL to the system clipboard.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Destination for text the user asked to have copied.
pub trait ClipboardSink: Send + Sync {
    fn copy(&self, text: &str) -> Result<()>;
}

/// System clipboard, falling back to platform copy commands when no display is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_owned())) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard unavailable, trying fallbacks");
                fallback_copy(text)
            }
        }
    }
}

fn fallback_copy(text: &str) -> Result<()> {
    for command in fallback_commands() {
        match try_command_copy(command, text) {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(error = %err, "clipboard command failed"),
        }
    }
    Err(anyhow!("no clipboard backend accepted the text"))
}

fn try_command_copy(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{program} exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["wl-copy"], &["xclip", "-selection", "clipboard"], &["xsel", "--clipboard", "--input"]]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["clip.exe"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[]
}
