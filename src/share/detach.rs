//! Background detachment.
//!
//! After the password is entered, the foreground process relaunches itself
//! and exits so the terminal is released. The password travels to the child
//! over its stdin pipe; the child's argv and environment only carry a marker
//! saying a handoff is waiting.

use crate::error::{AppError, AppResult};
use crate::share::secret::Secret;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use tracing::{debug, info};
use zeroize::Zeroize;

/// Marker set in the child's environment. Carries no secret.
pub const CHILD_MARKER_ENV: &str = "_SHAREPASS_CHILD";

/// True when this process was started by [`detach`].
pub fn is_detached_child() -> bool {
    std::env::var_os(CHILD_MARKER_ENV).is_some()
}

/// Relaunch the current executable in the background and hand it the secret.
///
/// Returns the child's pid. The caller is expected to exit right after.
pub fn detach(secret: Secret) -> AppResult<u32> {
    let exe = std::env::current_exe().map_err(AppError::Detachment)?;

    let mut command = Command::new(exe);
    command
        .args(std::env::args_os().skip(1))
        .env(CHILD_MARKER_ENV, "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(AppError::Detachment)?;
    let pid = child.id();
    debug!("Spawned background process {}", pid);

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Detachment(std::io::Error::other("child stdin unavailable")))?;
    stdin
        .write_all(secret.expose().as_bytes())
        .map_err(AppError::Detachment)?;
    // Closing the pipe marks the end of the handoff
    drop(stdin);
    drop(secret);

    info!("Running in background (pid {})", pid);
    Ok(pid)
}

/// Read the secret handed over by the parent process.
pub fn receive_handoff<R: Read>(mut input: R) -> AppResult<Secret> {
    let mut raw = Vec::new();
    let read = input.read_to_end(&mut raw);
    if let Err(e) = read {
        raw.zeroize();
        return Err(AppError::Handoff(e.to_string()));
    }

    let value = String::from_utf8(raw).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        AppError::Handoff("password is not valid UTF-8".into())
    })?;

    let secret = Secret::new(value);
    if secret.is_empty() {
        return Err(AppError::Handoff("no password received".into()));
    }
    Ok(secret)
}
