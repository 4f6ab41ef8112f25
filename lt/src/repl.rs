//! Interactive annotation loop

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::error::LabelError;
use crate::render::render_screen;
use crate::session::{Decision, Session};
use crate::view::Screen;

/// A parsed key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Decide(Decision),
    Start,
    Help,
    Quit,
    Unknown,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "r" | "relevant" | "y" => Input::Decide(Decision::Relevant),
            "n" | "not-relevant" | "no" => Input::Decide(Decision::NotRelevant),
            "s" | "start" => Input::Start,
            "h" | "help" | "?" => Input::Help,
            "q" | "quit" | "exit" => Input::Quit,
            _ => Input::Unknown,
        }
    }
}

/// Renders one screen per cycle and applies the operator's answer
pub struct AnnotationRepl<'a> {
    session: &'a Session,
}

impl<'a> AnnotationRepl<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn run(&self) -> Result<()> {
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        let mut render = true;

        loop {
            if render {
                let screen = self.session.screen()?;
                println!();
                print!("{}", render_screen(&screen));
                if matches!(screen, Screen::Complete { .. }) {
                    break;
                }
            }

            let readline = rl.readline(&format!("{} ", "[r/n/s/q]>".bright_green()));
            let line = match readline {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    render = false;
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            };

            let input = Input::parse(&line);
            debug!(?input, "run: parsed input");
            render = match input {
                Input::Quit => break,
                Input::Help => {
                    self.print_help();
                    false
                }
                Input::Unknown => {
                    println!("{} Unknown input: {}", "?".yellow(), line.trim());
                    false
                }
                Input::Start => self.apply(|| self.session.start())?,
                Input::Decide(decision) => self.apply(|| self.session.decide(decision))?,
            };
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Run an action; a persistence failure is a warning and keeps the screen
    fn apply<F, T>(&self, action: F) -> Result<bool>
    where
        F: FnOnce() -> Result<T, LabelError>,
    {
        match action() {
            Ok(_) => Ok(true),
            Err(err @ LabelError::Persistence(_)) => {
                warn!(error = %err, "Action not saved");
                println!("{} Warning: Could not save progress: {}", "⚠".yellow(), err);
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Keys:".bright_cyan());
        println!("  {:6} Relevant", "r".yellow());
        println!("  {:6} Not relevant", "n".yellow());
        println!("  {:6} Start (leave the tutorial)", "s".yellow());
        println!("  {:6} Quit", "q".yellow());
        println!();
    }
}
