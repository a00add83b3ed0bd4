//! Channel connections: the WhatsApp QR/pairing session and one-shot
//! Facebook/Instagram posting.
//!
//! Every connection flow in the console goes through one
//! [`ConnectionSession`], parameterized by a [`ChannelConnector`] and a
//! [`ConnectorProfile`]. The session owns all connection state; its poll
//! task only fetches and reports back over a channel that the session drains.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::config::PollingConfig;
use crate::error::{MkproError, MkproResult};
use crate::models::{BrandId, ConnectionStatus, FacebookPost, InstagramPost, PostReceipt};
use crate::poller::{
    poll_channel, PollEvent, PollHandle, PollOutcome, PollPolicy, PollReceiver, Poller,
};

pub const QR_RENDER_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";
const QR_RENDER_SIZE: &str = "280x280";

pub const DEFAULT_FACEBOOK_MESSAGE: &str = "Hola Facebook desde PRO v2";
pub const DEFAULT_INSTAGRAM_CAPTION: &str = "Hola Instagram desde PRO v2";
pub const DEFAULT_INSTAGRAM_IMAGE: &str = "https://picsum.photos/seed/ig/1200/800";

/// Build an image URL that renders `text` as a QR code.
pub fn qr_image_url(text: &str) -> Option<String> {
    let cache_buster = Utc::now().timestamp_millis().to_string();
    Url::parse_with_params(
        QR_RENDER_ENDPOINT,
        &[
            ("size", QR_RENDER_SIZE),
            ("data", text),
            ("t", cache_buster.as_str()),
        ],
    )
    .ok()
    .map(String::from)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSource {
    BackendQr,
    LinkCode,
    PairingCode,
}

impl CodeSource {
    pub fn label(&self) -> &'static str {
        match self {
            CodeSource::BackendQr => "QR from backend",
            CodeSource::LinkCode => "QR from link code",
            CodeSource::PairingCode => "QR from pairing code",
        }
    }
}

/// What to show the user so they can link the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDisplay {
    pub source: CodeSource,
    /// `data:` URL from the backend or a rendered QR image URL.
    pub image: String,
    /// The code the image encodes, when it came from a code.
    pub code: Option<String>,
}

impl CodeDisplay {
    /// Backend QR first, then a QR synthesized from the link code, then
    /// from the pairing code.
    pub fn from_status(status: &ConnectionStatus) -> Option<CodeDisplay> {
        if let Some(qr) = &status.qr_data_url {
            return Some(CodeDisplay {
                source: CodeSource::BackendQr,
                image: qr.clone(),
                code: None,
            });
        }

        let (source, code) = match (&status.link_code, &status.pairing_code) {
            (Some(link), _) => (CodeSource::LinkCode, link),
            (None, Some(pairing)) => (CodeSource::PairingCode, pairing),
            (None, None) => return None,
        };

        Some(CodeDisplay {
            source,
            image: qr_image_url(code)?,
            code: Some(code.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Started(Value),
    AlreadyExists,
}

/// Backend errors that mean the instance is already there.
pub fn is_already_exists(error: &MkproError) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("already in use") || message.contains("already exists")
}

#[async_trait]
pub trait ChannelConnector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn connect(&self, brand_id: BrandId) -> MkproResult<ConnectOutcome>;

    async fn poll(&self, brand_id: BrandId) -> MkproResult<ConnectionStatus>;

    fn render_code(&self, status: &ConnectionStatus) -> Option<CodeDisplay> {
        CodeDisplay::from_status(status)
    }
}

/// WhatsApp instances managed by the backend.
#[derive(Debug, Clone)]
pub struct WhatsAppConnector {
    client: ApiClient,
}

impl WhatsAppConnector {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelConnector for WhatsAppConnector {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn connect(&self, brand_id: BrandId) -> MkproResult<ConnectOutcome> {
        let options = RequestOptions::post_empty().query("brand_id", brand_id);
        match self.client.request("/api/wa/start", options).await {
            Ok(payload) => Ok(ConnectOutcome::Started(payload)),
            Err(e) if is_already_exists(&e) => {
                info!("WhatsApp instance for brand {} already exists", brand_id);
                Ok(ConnectOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    async fn poll(&self, brand_id: BrandId) -> MkproResult<ConnectionStatus> {
        let options = RequestOptions::get().query("brand_id", brand_id);
        let payload = self.client.request("/api/wa/qr", options).await?;
        ConnectionStatus::from_payload(&payload)
    }
}

/// Poll cadence for one place a connection is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorProfile {
    pub name: &'static str,
    pub policy: PollPolicy,
}

impl ConnectorProfile {
    /// Channels tab: every 3 s, 20 polls.
    pub fn channels() -> Self {
        Self {
            name: "channels",
            policy: PollPolicy::every(std::time::Duration::from_millis(3000)).with_max_ticks(20),
        }
    }

    /// Admin console: every 3 s, 30 polls.
    pub fn admin() -> Self {
        Self {
            name: "admin",
            policy: PollPolicy::every(std::time::Duration::from_millis(3000)).with_max_ticks(30),
        }
    }

    /// Instance maintenance: immediate read, every 2 s, for up to 2 minutes.
    pub fn instance() -> Self {
        Self {
            name: "instance",
            policy: PollPolicy::every(std::time::Duration::from_millis(2000))
                .immediate()
                .with_deadline(std::time::Duration::from_secs(120)),
        }
    }

    /// Override interval and tick cap from configuration.
    pub fn with_polling(mut self, polling: &PollingConfig) -> Self {
        self.policy.interval = polling.interval();
        self.policy.max_ticks = Some(polling.max_ticks);
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    WaitingForScan,
    Connected,
    Error(String),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::WaitingForScan => write!(f, "waiting for scan"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Connection state for one brand, owned by a single view.
pub struct ConnectionSession<C: ChannelConnector + 'static> {
    connector: Arc<C>,
    profile: ConnectorProfile,
    pub state: SessionState,
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    pub last_outcome: Option<PollOutcome>,
    pub polls: u32,
    poll_handle: Option<PollHandle>,
    events: Option<PollReceiver<ConnectionStatus>>,
}

impl<C: ChannelConnector + 'static> ConnectionSession<C> {
    pub fn new(connector: C, profile: ConnectorProfile) -> Self {
        Self::with_shared(Arc::new(connector), profile)
    }

    pub fn with_shared(connector: Arc<C>, profile: ConnectorProfile) -> Self {
        Self {
            connector,
            profile,
            state: SessionState::Idle,
            status: ConnectionStatus::default(),
            last_error: None,
            last_outcome: None,
            polls: 0,
            poll_handle: None,
            events: None,
        }
    }

    pub fn profile(&self) -> &ConnectorProfile {
        &self.profile
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connect, read the status once, then poll until connected.
    pub async fn start(&mut self, brand_id: BrandId) -> MkproResult<()> {
        self.stop();
        self.state = SessionState::Connecting;
        self.last_error = None;

        match self.connector.connect(brand_id).await {
            Ok(ConnectOutcome::Started(_)) => {
                info!("{} instance started for brand {}", self.connector.name(), brand_id)
            }
            Ok(ConnectOutcome::AlreadyExists) => {}
            Err(e) => {
                warn!("{} connect failed: {}", self.connector.name(), e);
                self.state = SessionState::Error(e.to_string());
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        }

        if let Err(e) = self.fetch_once(brand_id).await {
            self.last_error = Some(e.to_string());
        }

        if self.status.connected {
            return Ok(());
        }

        self.state = SessionState::WaitingForScan;
        self.start_polling(brand_id);
        Ok(())
    }

    /// One status read that replaces every field.
    pub async fn fetch_once(&mut self, brand_id: BrandId) -> MkproResult<&ConnectionStatus> {
        let status = self.connector.poll(brand_id).await?;
        self.status = status;
        self.state = if self.status.connected {
            self.stop();
            SessionState::Connected
        } else {
            SessionState::WaitingForScan
        };
        Ok(&self.status)
    }

    pub fn start_polling(&mut self, brand_id: BrandId) {
        self.start_polling_with(brand_id, self.profile.policy);
    }

    /// Poll with a one-off policy instead of the profile's.
    pub fn start_polling_with(&mut self, brand_id: BrandId, policy: PollPolicy) {
        self.stop();

        let (tx, rx) = poll_channel();
        let connector = self.connector.clone();
        let handle = Poller::spawn(
            policy,
            move || {
                let connector = connector.clone();
                async move { connector.poll(brand_id).await }
            },
            |status: &ConnectionStatus| status.connected,
            tx,
        );

        debug!(
            "{} polling started for brand {} ({})",
            self.connector.name(),
            brand_id,
            self.profile.name
        );
        self.polls = 0;
        self.last_outcome = None;
        self.poll_handle = Some(handle);
        self.events = Some(rx);
    }

    pub fn retry_polling(&mut self, brand_id: BrandId) {
        self.stop();
        if !matches!(self.state, SessionState::Connected) {
            self.state = SessionState::WaitingForScan;
        }
        self.start_polling(brand_id);
    }

    /// Stop polling. Ticks that have not been drained are discarded.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.poll_handle.take() {
            handle.stop();
        }
        self.events = None;
    }

    /// Stop and forget everything, e.g. on brand change.
    pub fn reset(&mut self) {
        self.stop();
        self.state = SessionState::Idle;
        self.status = ConnectionStatus::default();
        self.last_error = None;
        self.last_outcome = None;
        self.polls = 0;
    }

    pub fn is_polling(&self) -> bool {
        self.poll_handle
            .as_ref()
            .map(|handle| handle.is_running())
            .unwrap_or(false)
    }

    /// Apply pending poll results. Returns how many events were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        let mut finished = false;

        if let Some(rx) = self.events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                applied += 1;
                match event {
                    PollEvent::Tick { attempt, item } => {
                        self.polls = attempt;
                        self.status.merge(item);
                        if self.status.connected {
                            self.state = SessionState::Connected;
                        } else if !matches!(self.state, SessionState::Error(_)) {
                            self.state = SessionState::WaitingForScan;
                        }
                    }
                    PollEvent::Failed { attempt, message } => {
                        self.polls = attempt;
                        debug!("Ignoring poll failure #{}: {}", attempt, message);
                    }
                    PollEvent::Finished(outcome) => {
                        self.last_outcome = Some(outcome);
                        finished = true;
                    }
                }
            }
        }

        if finished {
            self.poll_handle = None;
            self.events = None;
        }
        applied
    }

    pub fn status_text(&self) -> &'static str {
        if self.status.connected {
            "WhatsApp connected"
        } else if self.status.has_code() {
            "Scan the QR or enter the code in WhatsApp"
        } else {
            "Waiting for QR/code…"
        }
    }

    pub fn code_display(&self) -> Option<CodeDisplay> {
        self.connector.render_code(&self.status)
    }
}

impl<C: ChannelConnector + 'static> fmt::Debug for ConnectionSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("connector", &self.connector.name())
            .field("profile", &self.profile.name)
            .field("state", &self.state)
            .field("polling", &self.is_polling())
            .finish()
    }
}

pub type WhatsAppSession = ConnectionSession<WhatsAppConnector>;

/// Facebook and Instagram post forms.
#[derive(Debug, Clone)]
pub struct SocialPoster {
    client: ApiClient,
    pub facebook_busy: bool,
    pub instagram_busy: bool,
}

impl SocialPoster {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            facebook_busy: false,
            instagram_busy: false,
        }
    }

    /// Publish to the brand page. Returns the post id or `OK`.
    pub async fn post_facebook(
        &mut self,
        message: &str,
        image_url: Option<&str>,
    ) -> MkproResult<String> {
        if message.trim().is_empty() {
            return Err(MkproError::validation("write a message first"));
        }

        let body = FacebookPost {
            message: message.to_string(),
            image_url: image_url
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        };

        self.facebook_busy = true;
        let result: MkproResult<PostReceipt> = self
            .client
            .post_json("/api/meta/post/facebook", &body)
            .await;
        self.facebook_busy = false;

        let receipt = result?;
        info!("Facebook post published: {}", receipt.summary());
        Ok(receipt.summary())
    }

    /// Publish an image post. Returns the media id or `OK`.
    pub async fn post_instagram(&mut self, caption: &str, image_url: &str) -> MkproResult<String> {
        if caption.trim().is_empty() {
            return Err(MkproError::validation("write a caption first"));
        }
        if image_url.trim().is_empty() {
            return Err(MkproError::validation("Instagram posts need an image URL"));
        }

        let body = InstagramPost {
            caption: caption.to_string(),
            image_url: image_url.trim().to_string(),
        };

        self.instagram_busy = true;
        let result: MkproResult<PostReceipt> = self
            .client
            .post_json("/api/meta/post/instagram", &body)
            .await;
        self.instagram_busy = false;

        let receipt = result?;
        info!("Instagram post published: {}", receipt.summary());
        Ok(receipt.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Connector that replays scripted status payloads.
    struct ScriptedConnector {
        connect_error: Option<String>,
        statuses: Mutex<Vec<Value>>,
        polls: AtomicU32,
    }

    impl ScriptedConnector {
        fn new(statuses: Vec<Value>) -> Self {
            Self {
                connect_error: None,
                statuses: Mutex::new(statuses),
                polls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ChannelConnector for ScriptedConnector {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn connect(&self, _brand_id: BrandId) -> MkproResult<ConnectOutcome> {
            match &self.connect_error {
                Some(message) => {
                    let error = MkproError::Http {
                        status: 403,
                        message: message.clone(),
                    };
                    if is_already_exists(&error) {
                        Ok(ConnectOutcome::AlreadyExists)
                    } else {
                        Err(error)
                    }
                }
                None => Ok(ConnectOutcome::Started(json!({}))),
            }
        }

        async fn poll(&self, _brand_id: BrandId) -> MkproResult<ConnectionStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut statuses = self.statuses.lock().unwrap();
            let payload = if statuses.len() > 1 {
                statuses.remove(0)
            } else {
                statuses.first().cloned().unwrap_or_else(|| json!({}))
            };
            ConnectionStatus::from_payload(&payload)
        }
    }

    fn fast_profile(max_ticks: u32) -> ConnectorProfile {
        ConnectorProfile::channels()
            .with_policy(PollPolicy::every(Duration::from_secs(3)).with_max_ticks(max_ticks))
    }

    #[test]
    fn test_code_display_priority() {
        let backend = ConnectionStatus::from_payload(&json!({
            "qr": "data:image/png;base64,AAAA",
            "code": "2@LongLinkCode",
            "pairingCode": "ABCD1234"
        }))
        .unwrap();
        let display = CodeDisplay::from_status(&backend).unwrap();
        assert_eq!(display.source, CodeSource::BackendQr);
        assert_eq!(display.image, "data:image/png;base64,AAAA");

        let link = ConnectionStatus::from_payload(&json!({
            "code": "2@LongLinkCode",
            "pairingCode": "ABCD1234"
        }))
        .unwrap();
        let display = CodeDisplay::from_status(&link).unwrap();
        assert_eq!(display.source, CodeSource::LinkCode);
        assert_eq!(display.code.as_deref(), Some("2@LongLinkCode"));
        assert!(display
            .image
            .starts_with("https://api.qrserver.com/v1/create-qr-code/?size=280x280&data=2%40LongLinkCode&t="));

        let pairing = ConnectionStatus::from_payload(&json!({ "pin": "ABCD1234" })).unwrap();
        assert_eq!(
            CodeDisplay::from_status(&pairing).unwrap().source,
            CodeSource::PairingCode
        );

        assert!(CodeDisplay::from_status(&ConnectionStatus::default()).is_none());
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(is_already_exists(&MkproError::Http {
            status: 403,
            message: "Instance name Already In Use".to_string()
        }));
        assert!(is_already_exists(&MkproError::Network(
            "instance already exists".to_string()
        )));
        assert!(!is_already_exists(&MkproError::Timeout));
    }

    #[test]
    fn test_profiles() {
        assert_eq!(ConnectorProfile::channels().policy.max_ticks, Some(20));
        assert_eq!(ConnectorProfile::admin().policy.max_ticks, Some(30));
        let instance = ConnectorProfile::instance().policy;
        assert!(instance.immediate);
        assert_eq!(instance.interval, Duration::from_secs(2));
        assert_eq!(instance.deadline, Some(Duration::from_secs(120)));

        let tuned = ConnectorProfile::channels().with_polling(&PollingConfig {
            interval_ms: 500,
            max_ticks: 4,
        });
        assert_eq!(tuned.policy.interval, Duration::from_millis(500));
        assert_eq!(tuned.policy.max_ticks, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_polls_until_connected() {
        let connector = Arc::new(ScriptedConnector::new(vec![
            json!({ "connected": false }),
            json!({ "connected": false, "qr": "data:image/png;base64,AAAA" }),
            json!({ "connected": false }),
            json!({ "connected": true }),
        ]));
        let mut session = ConnectionSession::with_shared(connector.clone(), fast_profile(20));

        session.start(1).await.unwrap();
        assert_eq!(session.state, SessionState::WaitingForScan);
        assert_eq!(session.status_text(), "Waiting for QR/code…");

        tokio::time::sleep(Duration::from_secs(4)).await;
        session.drain_events();
        assert_eq!(
            session.status_text(),
            "Scan the QR or enter the code in WhatsApp"
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        session.drain_events();

        assert_eq!(session.state, SessionState::Connected);
        assert_eq!(session.status_text(), "WhatsApp connected");
        // Merging kept the QR from the earlier tick.
        assert!(session.status.qr_data_url.is_some());
        assert_eq!(
            session.last_outcome,
            Some(PollOutcome::Satisfied { attempts: 3 })
        );
        assert_eq!(connector.polls.load(Ordering::SeqCst), 4);
        assert!(!session.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_gives_up_after_cap() {
        let connector = Arc::new(ScriptedConnector::new(vec![json!({ "state": "connecting" })]));
        let mut session = ConnectionSession::with_shared(connector.clone(), fast_profile(5));

        session.start(1).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        session.drain_events();

        assert_eq!(
            session.last_outcome,
            Some(PollOutcome::Exhausted { attempts: 5 })
        );
        // One direct read plus five polls.
        assert_eq!(connector.polls.load(Ordering::SeqCst), 6);
        assert_eq!(session.state, SessionState::WaitingForScan);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_connected_skips_polling() {
        let connector = Arc::new(ScriptedConnector::new(vec![json!({ "status": "online" })]));
        let mut session = ConnectionSession::with_shared(connector.clone(), fast_profile(5));

        session.start(1).await.unwrap();
        assert_eq!(session.state, SessionState::Connected);
        assert!(!session.is_polling());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_error_sets_error_state() {
        let mut connector = ScriptedConnector::new(vec![json!({})]);
        connector.connect_error = Some("Evolution API unreachable".to_string());
        let mut session = ConnectionSession::new(connector, fast_profile(5));

        let err = session.start(1).await.unwrap_err();
        assert_eq!(err.to_string(), "Evolution API unreachable");
        assert_eq!(
            session.state,
            SessionState::Error("Evolution API unreachable".to_string())
        );
        assert!(!session.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_instance_keeps_going() {
        let mut connector = ScriptedConnector::new(vec![json!({ "pairingCode": "WXYZ9876" })]);
        connector.connect_error = Some("name already in use".to_string());
        let mut session = ConnectionSession::new(connector, fast_profile(5));

        session.start(1).await.unwrap();
        assert_eq!(session.state, SessionState::WaitingForScan);
        assert_eq!(session.status.pairing_code.as_deref(), Some("WXYZ9876"));
        assert!(session.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stops_and_clears() {
        let connector = Arc::new(ScriptedConnector::new(vec![
            json!({ "qr": "data:image/png;base64,AAAA" }),
        ]));
        let mut session = ConnectionSession::with_shared(connector.clone(), fast_profile(20));

        session.start(1).await.unwrap();
        assert!(session.status.qr_data_url.is_some());

        session.reset();
        assert_eq!(session.state, SessionState::Idle);
        assert_eq!(session.status, ConnectionStatus::default());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(session.drain_events(), 0);
        assert_eq!(connector.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_restarts_polling() {
        let connector = Arc::new(ScriptedConnector::new(vec![json!({})]));
        let mut session = ConnectionSession::with_shared(connector.clone(), fast_profile(2));

        session.retry_polling(1);
        tokio::time::sleep(Duration::from_secs(10)).await;
        session.drain_events();
        assert_eq!(
            session.last_outcome,
            Some(PollOutcome::Exhausted { attempts: 2 })
        );

        session.retry_polling(1);
        assert!(session.last_outcome.is_none());
        tokio::time::sleep(Duration::from_secs(10)).await;
        session.drain_events();
        assert_eq!(connector.polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_social_validation() {
        let client = ApiClient::new(&crate::config::ApiConfig::default()).unwrap();
        let mut poster = SocialPoster::new(client);

        assert!(poster
            .post_facebook("  ", None)
            .await
            .unwrap_err()
            .is_validation());
        assert!(poster
            .post_instagram("caption", "")
            .await
            .unwrap_err()
            .is_validation());
        assert!(!poster.facebook_busy);
        assert!(!poster.instagram_busy);
    }
}
