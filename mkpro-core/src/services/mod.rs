mod brands;
mod channels;
mod inbox;
mod leads;
mod shell;
mod team_chat;
mod wa_admin;

pub use brands::{list_brands, set_context, BrandManager, DEFAULT_BRAND_NAME, DEFAULT_BRAND_TONE};
pub use channels::{
    is_already_exists, qr_image_url, ChannelConnector, CodeDisplay, CodeSource, ConnectOutcome,
    ConnectionSession, ConnectorProfile, SessionState, SocialPoster, WhatsAppConnector,
    WhatsAppSession, DEFAULT_FACEBOOK_MESSAGE, DEFAULT_INSTAGRAM_CAPTION, DEFAULT_INSTAGRAM_IMAGE,
    QR_RENDER_ENDPOINT,
};
pub use inbox::{
    parse_tags, BoardQuery, ChatMetaForm, ClassificationChange, Inbox, DEFAULT_BOARD_LIMIT,
    MESSAGE_HISTORY_LIMIT,
};
pub use leads::{
    LeadIntake, DEFAULT_LEAD_TEXT, DEFAULT_PAGE_SIZE, MIN_PAGE, MIN_PAGE_SIZE,
};
pub use shell::{HealthState, Shell, Tab};
pub use team_chat::TeamChat;
pub use wa_admin::{
    sanitize_number, split_csv, ActivityLog, ConfigDraft, DatasourceDraft, WaAdmin,
    DEFAULT_TEST_MESSAGE, LOG_CAPACITY,
};
