//! System clipboard access for `forklift get tag --copy`.
//!
//! Pipes the text into the first clipboard tool available for the platform.

use log::debug;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Candidate tools per platform, in order of preference.
fn candidates(os: &str) -> &'static [(&'static str, &'static [&'static str])] {
    match os {
        "macos" => &[("pbcopy", &[])],
        "windows" => &[("clip", &[])],
        _ => &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ],
    }
}

/// Copies `text` to the clipboard.
pub fn copy(text: &str) -> Result<()> {
    let mut last_error = None;
    for (program, args) in candidates(std::env::consts::OS) {
        match pipe_into(program, args, text) {
            Ok(()) => {
                debug!("copied to clipboard with {}", program);
                return Ok(());
            }
            Err(err) => {
                debug!("{} unavailable: {}", program, err);
                last_error = Some(err);
            }
        }
    }
    Err(Error::Advisory {
        operation: "copy to clipboard".to_string(),
        message: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no clipboard tool found".to_string()),
    })
}

fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Advisory {
            operation: program.to_string(),
            message: format!("exited with {}", status),
        })
    }
}
