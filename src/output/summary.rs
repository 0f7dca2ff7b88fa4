use std::fmt::Write;

use crate::providers::gitlab::{Pipeline, PollOutcome, TerminalStatus};

use super::styling::{bright, bright_yellow, cyan, dim, for_terminal_status};
use super::tables::{color_coded_status_cell, create_table, duration_cell, label_cell};

/// Prints the freshly triggered pipeline: link, user, creation time and a
/// details table.
pub fn print_triggered(pipeline: &Pipeline) {
    println!("{}", render_triggered(pipeline));
}

/// Prints the final snapshot of a pipeline that reached a terminal status.
pub fn print_outcome(outcome: &PollOutcome) {
    println!("{}", render_outcome(outcome));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_triggered(pipeline: &Pipeline) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🚀", "Triggered New Pipeline");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}({})\n  {} {}\n",
        dim("Pipeline:"),
        cyan(&pipeline.web_url),
        dim("By user:"),
        bright_yellow(&pipeline.user.name),
        pipeline.user.username,
        dim("Created at:"),
        dim(&pipeline.created_at),
    );
    let _ = writeln!(output, "{}", render_details(pipeline));

    output
}

fn render_outcome(outcome: &PollOutcome) -> String {
    let mut output = String::new();
    let id = outcome.pipeline.id;

    add_section_header(&mut output, "🏁", "Pipeline Finished");
    let text = match outcome.status {
        TerminalStatus::Succeeded => format!("Pipeline {id} succeeded ✓"),
        TerminalStatus::Failed => format!("Pipeline {id} failed ✗"),
        TerminalStatus::Canceled => format!("Pipeline {id} was canceled"),
    };
    let verdict = for_terminal_status(outcome.status, text);
    let _ = writeln!(
        output,
        "  {verdict}\n  {} {}\n",
        dim("Status checks:"),
        outcome.polls
    );
    let _ = writeln!(output, "{}", render_details(&outcome.pipeline));

    output
}

fn render_details(pipeline: &Pipeline) -> String {
    let mut table = create_table();

    let mut add_row = |label: &str, value: String| {
        table.add_row(vec![label_cell(label), comfy_table::Cell::new(value)]);
    };

    add_row("ID", pipeline.id.to_string());
    add_row("Ref", pipeline.ref_.clone().unwrap_or_else(|| "-".to_string()));
    add_row("Tag", pipeline.tag.to_string());
    add_row("Commit", short_sha(&pipeline.sha).to_string());
    add_row(
        "User",
        format!("{} ({})", pipeline.user.name, pipeline.user.username),
    );
    add_row("Created", pipeline.created_at.clone());
    add_row(
        "Started",
        pipeline.started_at.clone().unwrap_or_else(|| "-".to_string()),
    );
    add_row(
        "Finished",
        pipeline
            .finished_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    add_row(
        "Coverage",
        pipeline
            .coverage
            .as_ref()
            .map(|coverage| format!("{coverage}%"))
            .unwrap_or_else(|| "-".to_string()),
    );

    table.add_row(vec![label_cell("Status"), color_coded_status_cell(&pipeline.status)]);
    table.add_row(vec![label_cell("Duration"), duration_cell(pipeline.duration)]);

    table.to_string()
}

fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}
