//! Console UI sink

use std::io::Write;

use pocket_core::{UiEvent, UiSink};

// Console colors
const GRAY: &str = "\x1b[90m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Renders response events to stdout.
///
/// Answer text streams inline; thinking is dimmed, tool notices and
/// failures get their own lines.
#[derive(Default)]
pub struct ConsoleUi;

impl ConsoleUi {
    pub fn new() -> Self {
        Self
    }
}

impl UiSink for ConsoleUi {
    fn render(&self, event: UiEvent) {
        match event {
            UiEvent::Text { text } => {
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
            UiEvent::Thinking { text } => {
                print!("{}{}{}", GRAY, text, RESET);
                let _ = std::io::stdout().flush();
            }
            UiEvent::Notice { name, payload } => {
                println!("{}[{}] {}{}", CYAN, name, payload, RESET);
            }
            UiEvent::Failure { kind, message } => {
                println!("{}[{}] {}{}", YELLOW, kind, message, RESET);
            }
        }
    }
}
