//! Terminal stand-ins for the desktop dialogs

use crate::app::Dialogs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// Dialogs answered on stdin/stdout
///
/// Without a terminal on stdin, questions are answered "no" and directory
/// prompts are cancelled, unless `assume_yes` is set.
pub(crate) struct TerminalDialogs {
    assume_yes: bool,
    interactive: bool,
}

impl TerminalDialogs {
    pub(crate) fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            interactive: io::stdin().is_terminal(),
        }
    }

    fn prompt(&self, question: &str) -> Option<String> {
        if !self.interactive {
            return None;
        }
        print!("{question} ");
        io::stdout().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        Some(line.trim().to_string())
    }
}

impl Dialogs for TerminalDialogs {
    fn warning(&mut self, title: &str, message: &str) {
        eprintln!("⚠️  {title}: {message}");
    }

    fn info(&mut self, title: &str, message: &str) {
        println!("✅ {title}: {message}");
    }

    fn error(&mut self, title: &str, message: &str) {
        eprintln!("❌ {title}: {message}");
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            log::info!("{title}: accepted with --yes");
            return true;
        }
        println!("{title}\n{message}");
        self.prompt("[y/N]")
            .is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn choose_directory(&mut self) -> Option<PathBuf> {
        self.prompt("Output directory (empty to cancel):")
            .filter(|answer| !answer.is_empty())
            .map(PathBuf::from)
    }

    fn open_directory(&mut self, path: &Path) {
        println!("📁 Output: {}", path.display());
    }
}
