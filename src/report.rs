//! Console reporting
//!
//! Everything the operator is meant to read goes through a [`Reporter`].
//! Diagnostics go to `tracing` instead; the two never share a stream.

use crossterm::style::{Color, Stylize};
use std::fmt::Display;

/// Writes colored progress and status lines to stdout
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Reporter that never emits escape sequences
    pub fn plain() -> Self {
        Self::new(false)
    }

    #[cfg(test)]
    pub(crate) fn color_enabled(&self) -> bool {
        self.color
    }

    /// API URL about to be requested
    pub fn request(&self, url: &str) {
        println!("{}", self.paint(url, Color::Green));
    }

    pub fn retry(&self, retry_count: u32) {
        println!(
            "{}",
            self.paint(&format!("Retry Count: {}", retry_count), Color::Blue)
        );
    }

    /// External command about to be executed
    pub fn command(&self, command: &str) {
        println!("{}", self.paint(command, Color::Cyan));
    }

    pub fn progress(&self, line: impl Display) {
        let line = line.to_string();
        if self.color {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }

    /// Highlighted message for failures the run survives or stops on
    pub fn alert(&self, message: &str) {
        if self.color {
            println!("{}", message.white().on_red());
        } else {
            println!("{}", message);
        }
    }

    pub fn info(&self, message: impl Display) {
        println!("{}", message);
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true)
    }
}
