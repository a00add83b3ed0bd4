pub mod app;
pub mod events;
pub mod forms;
pub mod theme;
pub mod ui;
