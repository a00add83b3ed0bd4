pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod poller;
pub mod services;

pub use client::{decode, error_message, parse_body, ApiClient, RequestOptions, API_KEY_HEADER};
pub use config::{
    ensure_data_dir, get_config_dir, get_data_dir, ApiConfig, ConfigLoadError, LoggingConfig,
    MkproConfig, PollingConfig, TuiConfig,
};
pub use context::BrandContext;
pub use error::{CliErrorDisplay, MkproError, MkproResult, NETWORK_FALLBACK_MESSAGE};
pub use models::{
    AgentMode, Board, BoardColumn, Brand, BrandId, ChatAgent, ChatCard, ChatMessage,
    ChatMetaUpdate, ChatThread, ConfigBundle, ConnectionStatus, Datasource, DatasourceKind,
    GroupBy, InstanceRotation, Lead, WaConfig, WaMessage,
};
pub use poller::{
    poll_channel, PollEvent, PollHandle, PollOutcome, PollPolicy, PollReceiver, PollSender,
    Poller,
};
pub use services::{
    BoardQuery, BrandManager, ChannelConnector, ChatMetaForm, ClassificationChange, CodeDisplay,
    CodeSource, ConnectOutcome, ConnectionSession, ConnectorProfile, HealthState, Inbox,
    LeadIntake, SessionState, Shell, SocialPoster, Tab, TeamChat, WaAdmin, WhatsAppConnector,
    WhatsAppSession,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
