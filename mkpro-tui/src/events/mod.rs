mod commands;
mod handler;
mod keybinds;

pub use commands::Command;
pub use handler::{route_key, Action, KeyRoute};
pub use keybinds::{KeyBinding, KeybindConfig, Keybinds};
