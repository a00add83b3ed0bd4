mod brands;
mod channels;
mod leads;
mod team_chat;
mod wa_admin;
mod wa_inbox;

pub use brands::BrandsView;
pub use channels::ChannelsView;
pub use leads::LeadsView;
pub use team_chat::TeamChatView;
pub use wa_admin::WaAdminView;
pub use wa_inbox::WaInboxView;
