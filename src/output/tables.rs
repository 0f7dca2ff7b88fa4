use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::providers::gitlab::TerminalStatus;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn label_cell(label: &str) -> Cell {
    Cell::new(label).fg(TableColor::Cyan)
}

pub fn color_coded_status_cell(status: &str) -> Cell {
    match TerminalStatus::classify(status) {
        Some(TerminalStatus::Succeeded) => Cell::new(status).fg(TableColor::Green),
        Some(TerminalStatus::Failed) => Cell::new(status).fg(TableColor::Red),
        Some(TerminalStatus::Canceled) => Cell::new(status).fg(TableColor::DarkGrey),
        None => Cell::new(status).fg(TableColor::Yellow),
    }
}

pub fn duration_cell(seconds: Option<u64>) -> Cell {
    match seconds {
        Some(seconds) if seconds >= 60 => Cell::new(format!("{}m {:02}s", seconds / 60, seconds % 60)),
        Some(seconds) => Cell::new(format!("{seconds}s")),
        None => Cell::new("-"),
    }
}
