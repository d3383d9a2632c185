//! Speech synthesis backend: pipes the materialized transcript to the
//! platform `say` command.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::NarrateError;

/// Silence directive `say` honors between phrases (200 ms).
pub const SILENCE: &str = "[[slnc 200]]";

/// Speaks `text`, or renders it into `output` when given.
pub fn speak(text: &str, output: Option<&Path>) -> Result<(), NarrateError> {
    let mut cmd = Command::new("say");
    if let Some(output) = output {
        cmd.arg("-o").arg(output);
    }
    cmd.stdin(Stdio::piped());
    debug!(bytes = text.len(), "handing transcript to say");
    let mut child = cmd
        .spawn()
        .map_err(|e| NarrateError::Backend(format!("unable to launch say: {e}")))?;
    child
        .stdin
        .take()
        .ok_or_else(|| NarrateError::Backend("say has no stdin".to_string()))?
        .write_all(text.as_bytes())?;
    let status = child.wait()?;
    if !status.success() {
        return Err(NarrateError::Backend(format!(
            "say exited with {status}"
        )));
    }
    Ok(())
}
