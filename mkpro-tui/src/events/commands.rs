/// Work that needs the backend. Key handling stays synchronous and hands one
/// of these to the run loop, which awaits it before the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bootstrap,
    Refresh,
    LoadView,
    BrandChanged,

    CreateBrand,
    SaveContext,

    SendChat,

    ConnectWhatsApp,
    RetryPolling,
    PostFacebook,
    PostInstagram,

    SaveConfig,
    SetPassword,
    SendTest,
    SetWebhook,
    SyncPull,
    RotateInstance,
    InstanceStatus,
    AdminConnect,
    SaveDatasource,
    TestDatasource,
    DeleteDatasource(i64),

    IngestLead,
    ListLeads,

    LoadBoard,
    OpenChat(String),
    DropCard { jid: String, target: String },
    BulkMove { jids: Vec<String>, column: String },
    SaveMeta,
    QuickReply,
}

impl Command {
    /// Shown in the footer while the command runs.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Bootstrap => "Connecting to backend",
            Command::Refresh => "Reloading",
            Command::LoadView => "Loading",
            Command::BrandChanged => "Switching brand",
            Command::CreateBrand => "Creating brand",
            Command::SaveContext => "Saving context",
            Command::SendChat => "Sending",
            Command::ConnectWhatsApp | Command::AdminConnect => "Starting WhatsApp instance",
            Command::RetryPolling => "Polling",
            Command::PostFacebook => "Publishing to Facebook",
            Command::PostInstagram => "Publishing to Instagram",
            Command::SaveConfig => "Saving config",
            Command::SetPassword => "Updating admin password",
            Command::SendTest => "Sending test message",
            Command::SetWebhook => "Setting webhook",
            Command::SyncPull => "Pulling history",
            Command::RotateInstance => "Rotating instance",
            Command::InstanceStatus => "Reading instance status",
            Command::SaveDatasource => "Saving datasource",
            Command::TestDatasource => "Testing datasource",
            Command::DeleteDatasource(_) => "Deleting datasource",
            Command::IngestLead => "Scoring lead",
            Command::ListLeads => "Loading leads",
            Command::LoadBoard => "Loading board",
            Command::OpenChat(_) => "Opening chat",
            Command::DropCard { .. } => "Moving chat",
            Command::BulkMove { .. } => "Moving chats",
            Command::SaveMeta => "Saving chat",
            Command::QuickReply => "Sending reply",
        }
    }
}
