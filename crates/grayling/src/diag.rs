//! Invocation-scoped diagnostics.
//!
//! All user-facing warnings and recoverable errors flow through one
//! [`Diagnostics`] value threaded through the run, instead of process-wide
//! mutable state. The error counter decides the final exit status even when
//! some graphs were processed successfully.

use std::fmt;

/// Message suppression level selected with `-q`.
///
/// Levels are ordered: each level suppresses everything the previous one does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suppression {
    /// Warnings and errors are printed.
    #[default]
    None,
    /// `-q` / `-q1`: warnings are dropped, errors are printed.
    Warnings,
    /// `-q2` and above: warnings and errors are both dropped.
    All,
}

impl Suppression {
    /// Maps a `-q` numeric suffix to a level. Values below 1 are invalid.
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            l if l <= 0 => None,
            1 => Some(Self::Warnings),
            _ => Some(Self::All),
        }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    level: Suppression,
    errors: usize,
}

impl Diagnostics {
    pub fn new(level: Suppression) -> Self {
        Self { level, errors: 0 }
    }

    pub fn level(&self) -> Suppression {
        self.level
    }

    pub fn warning(&self, message: fmt::Arguments<'_>) {
        if self.level < Suppression::Warnings {
            eprintln!("Warning: {message}");
        }
    }

    /// Records a recoverable error. The run continues; the counter is
    /// consulted once at the end to pick the exit status.
    pub fn error(&mut self, message: fmt::Arguments<'_>) {
        self.errors += 1;
        if self.level < Suppression::All {
            eprintln!("Error: {message}");
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }
}
