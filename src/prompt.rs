//! Password prompt.

use crate::error::{AppError, AppResult};
use crate::share::secret::Secret;
use std::io::{BufRead, IsTerminal, Write};

pub const PROMPT: &str = "Enter password > ";

/// Ask the operator for the password.
///
/// On a terminal the input is not echoed. When stdin is redirected, one
/// line is read from it instead.
pub fn read_secret() -> AppResult<Secret> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        let value = rpassword::read_password_from_tty(Some(PROMPT))
            .map_err(|e| AppError::prompt(e.to_string()))?;
        return non_empty(Secret::new(value));
    }

    let mut stderr = std::io::stderr();
    // Best effort, the prompt is cosmetic here
    let _ = write!(stderr, "{}", PROMPT);
    let _ = stderr.flush();
    read_line(stdin.lock())
}

/// Read one line as the password.
pub fn read_line<R: BufRead>(mut input: R) -> AppResult<Secret> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| AppError::prompt(e.to_string()))?;
    non_empty(Secret::new(line))
}

fn non_empty(secret: Secret) -> AppResult<Secret> {
    if secret.is_empty() {
        return Err(AppError::prompt("empty password"));
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_first_line_only() {
        let secret = read_line(Cursor::new("first line\r\nsecond line\n")).unwrap();
        assert_eq!(secret.expose(), "first line");
    }

    #[test]
    fn test_line_without_newline() {
        let secret = read_line(Cursor::new("no newline")).unwrap();
        assert_eq!(secret.expose(), "no newline");
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(read_line(Cursor::new("")), Err(AppError::Prompt(_))));
        assert!(matches!(read_line(Cursor::new("  \n")), Err(AppError::Prompt(_))));
    }
}
