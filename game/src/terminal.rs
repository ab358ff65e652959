use std::io::Write;

use tracing::warn;

use crate::color::Color;
use crate::presenter::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCommand {
    Start,
    Press(Color),
    Help,
    Quit,
}

/// Parses one line typed at the prompt. Blank or unknown lines give `None`.
pub fn parse_command(line: &str) -> Option<TerminalCommand> {
    let word = line.trim().to_ascii_lowercase();
    match word.as_str() {
        "" => None,
        "s" | "start" | "restart" => Some(TerminalCommand::Start),
        "h" | "help" | "?" => Some(TerminalCommand::Help),
        "q" | "quit" | "exit" => Some(TerminalCommand::Quit),
        other => other.parse::<Color>().ok().map(TerminalCommand::Press),
    }
}

/// What the loop does once stdin reaches end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClosed {
    Exit,
    /// Stop reading stdin but keep serving remote commands.
    KeepServing,
}

pub fn on_input_closed(remote_serving: bool) -> InputClosed {
    if remote_serving {
        InputClosed::KeepServing
    } else {
        InputClosed::Exit
    }
}

pub fn help_text() -> String {
    let keys: Vec<String> = Color::ALL
        .iter()
        .map(|c| format!("{} ({})", c.key(), c.name()))
        .collect();
    format!(
        "Commands:\n  s, start   start or restart the game\n  {}   press a button\n  h, help    show this help\n  q, quit    leave\n",
        keys.join(", ")
    )
}

/// Line-oriented presenter: one line per flash, status or score change.
#[derive(Debug)]
pub struct TerminalPresenter<W: Write> {
    out: W,
    start_label: String,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            start_label: String::new(),
        }
    }

    pub fn start_label(&self) -> &str {
        &self.start_label
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let res = writeln!(self.out, "{text}").and_then(|_| self.out.flush());
        if let Err(err) = res {
            warn!(%err, "terminal write failed");
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn set_score(&mut self, score: u32) {
        self.line(&format!("score: {score}"));
    }

    fn set_status(&mut self, text: &str) {
        if !text.is_empty() {
            self.line(text);
        }
    }

    fn flash(&mut self, color: Color) {
        self.line(&format!("  ** {} **", color.name().to_ascii_uppercase()));
    }

    fn set_start_label(&mut self, text: &str) {
        self.start_label = text.to_string();
        self.line(&format!("[s] {text}"));
    }
}
