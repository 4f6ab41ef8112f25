//! Terminal rendering of screens

use std::fmt::Write;

use colored::Colorize;

use crate::view::{PairView, Screen};

const BAR_WIDTH: usize = 40;

const TUTORIAL: &str = "\
Your task is to decide whether the displayed report is relevant for the
displayed user.

  1. The report's title, date and full description are shown first.
  2. The user's profile follows below it.
  3. Answer with one of:
       r  Relevant      the report matters to this user
       n  Not relevant  the report does not

Progress is saved after every answer, so you can stop at any time and pick
up from the same pair later. When everything is annotated, `lt export`
writes the results as JSON.";

/// Render a screen as terminal text
pub fn render_screen(screen: &Screen<'_>) -> String {
    match screen {
        Screen::Tutorial => render_tutorial(),
        Screen::Annotating(view) => render_pair(view),
        Screen::Complete {
            total_reports,
            total_users,
        } => format!(
            "{} All {} reports have been annotated for {} users. Let us know you've finished!\n",
            "✓".green(),
            total_reports,
            total_users
        ),
    }
}

fn render_tutorial() -> String {
    format!(
        "{}\n\n{}\n\nRun {} (or press {} in {}) to begin.\n",
        "Welcome to the report annotation tool!".bright_cyan().bold(),
        TUTORIAL,
        "lt start".yellow(),
        "s".yellow(),
        "lt run".yellow()
    )
}

fn render_pair(view: &PairView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.progress_line().dimmed());
    let _ = writeln!(out, "{}", progress_bar(view.progress_fraction()));
    let _ = writeln!(out);

    let _ = writeln!(out, "{} {}", "Report:".bright_cyan().bold(), view.report.title.bold());
    let _ = writeln!(out, "{}", view.report_caption().dimmed());
    let _ = writeln!(out, "{}", view.report.description);
    let _ = writeln!(out);

    let _ = writeln!(out, "{} {}", "User:".bright_cyan().bold(), view.user.name.bold());
    let _ = writeln!(out, "{}", view.user_caption().dimmed());
    for entry in view.profile_entries() {
        let _ = writeln!(out, "{} {}", format!("{}:", entry.label).bold(), entry.display_value());
    }
    out
}

/// `[##########--------------]  46.0%`
pub fn progress_bar(fraction: f64) -> String {
    let clamped = fraction.clamp(0.0, 1.0);
    let filled = (clamped * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:5.1}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        clamped * 100.0
    )
}
