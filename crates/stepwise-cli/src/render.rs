use stepwise_common::Result;
use stepwise_core::{DownReport, ListReport, MigrationState};

use crate::command::Outcome;

/// Human-readable summary of a command outcome. `json` only affects `ls`.
pub fn render_outcome(outcome: &Outcome, json: bool) -> Result<String> {
    Ok(match outcome {
        Outcome::List(report) if json => serde_json::to_string_pretty(report)?,
        Outcome::List(report) => render_list(report),
        Outcome::Up(report) if report.applied.is_empty() => {
            format!("Nothing to apply (cursor @{}).", report.cursor_after)
        }
        Outcome::Up(report) => format!(
            "Applied {} migration{} (cursor @{} -> @{}).",
            report.applied.len(),
            if report.applied.len() == 1 { "" } else { "s" },
            report.cursor_before,
            report.cursor_after
        ),
        Outcome::Down(DownReport::Noop) => "No down migration to run.".to_string(),
        Outcome::Down(DownReport::Reverted {
            position,
            name,
            cursor,
        }) => format!("Reverted @{position} {name} (cursor now @{cursor})."),
        Outcome::Created(path) => format!("Created {}", path.display()),
    })
}

/// Boxed status table, one row per registered migration.
pub fn render_list(report: &ListReport) -> String {
    let label_w = report
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);
    let pos_w = report.entries.len().to_string().len().max(1);
    // "[v] " + pos + "  " + label + "  " + "done"
    let inner = 4 + pos_w + 2 + label_w + 2 + 4;

    let title = format!(" migrations @{} ", report.cursor);
    let title_dashes = (inner + 2).saturating_sub(title.chars().count() + 3);
    let top = format!("╭───{title}{}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(inner + 2));

    let mut lines = vec![top];
    if report.entries.is_empty() {
        lines.push(format!("│ {:<inner$} │", "no migrations registered"));
    }
    for entry in &report.entries {
        let mark = match entry.state {
            MigrationState::Done => "[v]",
            MigrationState::Todo => "[ ]",
        };
        let row = format!(
            "{mark} {:>pos_w$}  {:<label_w$}  {}",
            entry.position,
            entry.label,
            entry.state.as_str()
        );
        lines.push(format!("│ {row:<inner$} │"));
    }
    lines.push(bottom);
    lines.join("\n")
}
