pub mod brands;
pub mod chat;
pub mod ds;
pub mod inbox;
pub mod leads;
pub mod social;
pub mod wa;

pub use brands::{handle_brands_command, BrandsCommand};
pub use chat::{handle_chat_command, ChatCommand};
pub use ds::{handle_ds_command, DsCommand};
pub use inbox::{handle_inbox_command, InboxCommand};
pub use leads::{handle_leads_command, LeadsCommand};
pub use social::{handle_social_command, SocialCommand};
pub use wa::{handle_wa_command, WaCommand};

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).fg(Color::White))
                .collect::<Vec<_>>(),
        );
    table
}

pub(crate) fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub(crate) fn yes_no(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::DarkGrey)
    }
}

pub(crate) fn truncate(value: &str, max: usize) -> String {
    let flat = value.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
