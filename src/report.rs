//! Human-readable rendering of a [`RunResult`].

use std::fmt::Write;

use crate::scheduler::RunResult;
use crate::wordlist::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub severity: Severity,
    pub message: String,
}

pub fn render(result: &RunResult) -> Rendered {
    match result {
        RunResult::Found(password) => Rendered {
            severity: Severity::Success,
            message: format!("Password found: {}", describe(password)),
        },
        RunResult::NotFound => Rendered {
            severity: Severity::Warning,
            message: "Wordlist exhausted, password not found".to_string(),
        },
        RunResult::Error(e) => Rendered {
            severity: Severity::Error,
            message: format!("Error: {e}"),
        },
    }
}

/// Process exit status: 0 when found, 1 when the wordlist ran out, 2 on any error.
pub fn exit_code(result: &RunResult) -> u8 {
    match result {
        RunResult::Found(_) => 0,
        RunResult::NotFound => 1,
        RunResult::Error(_) => 2,
    }
}

/// Quote the password; spell out the bytes too when they are not valid UTF-8.
fn describe(password: &Candidate) -> String {
    match std::str::from_utf8(password.as_bytes()) {
        Ok(s) => format!("{s:?}"),
        Err(_) => {
            let mut hex = String::with_capacity(password.as_bytes().len() * 2);
            for b in password.as_bytes() {
                let _ = write!(hex, "{b:02x}");
            }
            format!("{:?} (hex {hex})", password.to_string_lossy())
        }
    }
}
