//! Interactive prompt collaborator.
//!
//! Store and sync operations suspend on user input at a few well-defined
//! points (tag/secret entry, delete confirmation, disambiguation,
//! remote password). They all go through [`Prompter`] so the interactive
//! surface stays swappable and testable.

use std::io::{self, Write};

/// Interactive prompt seam.
pub trait Prompter: Send + Sync {
    /// Asks for a line of input, re-asking until it is non-empty.
    fn input(&self, message: &str) -> io::Result<String>;

    /// Asks a yes/no question. Only `y`/`yes` count as affirmative.
    fn confirm(&self, message: &str) -> io::Result<bool>;

    /// Asks the user to pick one entry from `choices`, returning its index.
    fn select(&self, message: &str, choices: &[String]) -> io::Result<usize>;

    /// Asks for a password. Input handling is the terminal's business.
    fn password(&self, message: &str) -> io::Result<String> {
        self.input(message)
    }

    /// Edits a field pre-filled with its current value. An empty reply
    /// keeps the current value.
    fn edit(&self, field: &str, current: &str) -> io::Result<String>;
}

/// Prompter reading from stdin.
#[derive(Debug, Clone, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_line(message: &str) -> io::Result<String> {
        print!("{}: ", message);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

impl Prompter for StdinPrompter {
    fn input(&self, message: &str) -> io::Result<String> {
        loop {
            let line = Self::read_line(message)?;
            if !line.is_empty() {
                return Ok(line);
            }
        }
    }

    fn confirm(&self, message: &str) -> io::Result<bool> {
        let line = Self::read_line(&format!("{} [y/N]", message))?;
        Ok(matches!(line.to_lowercase().as_str(), "y" | "yes"))
    }

    fn select(&self, message: &str, choices: &[String]) -> io::Result<usize> {
        println!("{}", message);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}) {}", i + 1, choice);
        }

        loop {
            let line = Self::read_line("Enter a number")?;
            if let Ok(n) = line.parse::<usize>() {
                if n >= 1 && n <= choices.len() {
                    return Ok(n - 1);
                }
            }
        }
    }

    fn edit(&self, field: &str, current: &str) -> io::Result<String> {
        let line = Self::read_line(&format!("{} [{}]", field, current))?;
        if line.is_empty() {
            Ok(current.to_string())
        } else {
            Ok(line)
        }
    }
}
