//! Interactive credential acquisition
//!
//! The GitHub lister asks a [`CredentialSource`] for anything the
//! configuration does not provide. [`TerminalPrompt`] is the production
//! implementation; tests substitute a mock.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, BufRead, Write};

use crate::error::{MirrorError, Result};

/// Supplies credentials on demand
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    /// Password for `username`, read without echo
    fn password(&self, username: &str) -> Result<String>;

    /// One-time two-factor authentication code
    fn two_factor_code(&self) -> Result<String>;
}

/// Prompts on the controlling terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn read_line(label: &str) -> io::Result<String> {
        print!("{}", label);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn read_secret(label: &str) -> io::Result<String> {
        print!("{}", label);
        io::stdout().flush()?;

        terminal::enable_raw_mode()?;
        let secret = Self::read_keys_until_enter();
        terminal::disable_raw_mode()?;
        println!();

        secret
    }

    fn read_keys_until_enter() -> io::Result<String> {
        let mut secret = String::new();

        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };

            match apply_key(&mut secret, key) {
                SecretInput::Pending => {}
                SecretInput::Done => return Ok(secret),
                SecretInput::Cancelled => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretInput {
    Pending,
    Done,
    Cancelled,
}

/// Apply one key press to a secret being typed
///
/// Characters typed with Ctrl or Alt held are editing shortcuts, not input.
fn apply_key(secret: &mut String, key: KeyEvent) -> SecretInput {
    if key.kind == KeyEventKind::Release {
        return SecretInput::Pending;
    }

    let chorded = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

    match key.code {
        KeyCode::Enter => return SecretInput::Done,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return SecretInput::Cancelled;
        }
        KeyCode::Backspace => {
            secret.pop();
        }
        KeyCode::Char(c) if !chorded => secret.push(c),
        _ => {}
    }

    SecretInput::Pending
}

impl CredentialSource for TerminalPrompt {
    fn password(&self, username: &str) -> Result<String> {
        Self::read_secret(&format!("Password for {}: ", username)).map_err(|source| {
            MirrorError::Prompt {
                what: "password",
                source,
            }
        })
    }

    fn two_factor_code(&self) -> Result<String> {
        Self::read_line("Two-Factor Auth: ").map_err(|source| MirrorError::Prompt {
            what: "two-factor code",
            source,
        })
    }
}
