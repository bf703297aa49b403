//! Interactive console commands
//!
//! One command per stdin line; the first non-whitespace character decides,
//! everything after it is ignored. Unrecognized input is silently dropped.

/// A parsed console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `q`: quit the supervisor
    Quit,

    /// `p`: toggle between Paused and Playing
    TogglePause,

    /// `s`: write a diagnostic pipeline snapshot
    Snapshot,
}

impl Command {
    /// Parse one input line; `None` for blank or unrecognized lines
    pub fn parse(line: &str) -> Option<Command> {
        match line.trim_start().chars().next()? {
            'q' => Some(Command::Quit),
            'p' => Some(Command::TogglePause),
            's' => Some(Command::Snapshot),
            _ => None,
        }
    }
}

/// Print the command summary shown when interactive mode starts
pub fn print_usage() {
    println!("Available commands:");
    println!("  p - Toggle between Play and Pause");
    println!("  s - Write a pipeline snapshot dump");
    println!("  q - Quit");
}
