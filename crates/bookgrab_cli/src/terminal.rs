use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use bookgrab_core::ProgressMessage;
use bookgrab_engine::{OutputPrompt, ProgressSink};

/// Prints progress lines to stdout; logs go to stderr or the log file.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn report(&self, message: &ProgressMessage) {
        println!("{message}");
    }
}

/// Output path given on the command line.
#[derive(Debug, Clone)]
pub struct FixedOutput(pub PathBuf);

impl OutputPrompt for FixedOutput {
    fn choose_output_path(&self, _suggested: &Path) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Asks on stdin. An empty answer takes the suggestion; end of input declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl OutputPrompt for StdinPrompt {
    fn choose_output_path(&self, suggested: &Path) -> Option<PathBuf> {
        print!("Save PDF as [{}]: ", suggested.display());
        io::stdout().flush().ok()?;
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line).ok()?;
        answer_to_path(read, &line, suggested)
    }
}

fn answer_to_path(read: usize, line: &str, suggested: &Path) -> Option<PathBuf> {
    if read == 0 {
        return None;
    }
    let answer = line.trim();
    if answer.is_empty() {
        Some(suggested.to_path_buf())
    } else {
        Some(PathBuf::from(answer))
    }
}
