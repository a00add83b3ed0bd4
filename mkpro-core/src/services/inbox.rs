use tracing::{debug, info};

use crate::client::{ApiClient, RequestOptions};
use crate::context::BrandContext;
use crate::error::{MkproError, MkproResult};
use crate::models::{
    interest_from_key, priority_from_key, Board, BrandId, BulkMove, ChatCard, ChatMetaUpdate,
    GroupBy, MessageList, TestMessage, WaMessage, UNTAGGED_KEY,
};

use super::wa_admin::{sanitize_number, send_test_message, split_csv};

pub const DEFAULT_BOARD_LIMIT: u32 = 200;
pub const MESSAGE_HISTORY_LIMIT: u32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardQuery {
    pub group_by: GroupBy,
    pub show_archived: bool,
    pub q: Option<String>,
    pub limit: u32,
}

impl Default for BoardQuery {
    fn default() -> Self {
        Self {
            group_by: GroupBy::Column,
            show_archived: false,
            q: None,
            limit: DEFAULT_BOARD_LIMIT,
        }
    }
}

impl BoardQuery {
    fn to_options(&self, brand_id: BrandId) -> RequestOptions {
        let mut options = RequestOptions::get()
            .query("brand_id", brand_id)
            .query("group_by", self.group_by)
            .query("archived", self.show_archived)
            .query("limit", self.limit);
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            options = options.query("q", q);
        }
        options
    }
}

/// What a drop onto a column changes, by grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationChange {
    Column(String),
    Priority(u8),
    Interest(u8),
    Tags(Vec<String>),
}

impl ClassificationChange {
    pub fn for_drop(
        group_by: GroupBy,
        card: Option<&ChatCard>,
        target_key: &str,
    ) -> MkproResult<Self> {
        match group_by {
            GroupBy::Column => Ok(ClassificationChange::Column(target_key.to_string())),
            GroupBy::Priority => priority_from_key(target_key)
                .map(ClassificationChange::Priority)
                .ok_or_else(|| {
                    MkproError::validation(format!("unknown priority column '{}'", target_key))
                }),
            GroupBy::Interest => interest_from_key(target_key)
                .map(ClassificationChange::Interest)
                .ok_or_else(|| {
                    MkproError::validation(format!("unknown interest column '{}'", target_key))
                }),
            GroupBy::Tag if target_key == UNTAGGED_KEY => Ok(ClassificationChange::Tags(Vec::new())),
            GroupBy::Tag => {
                let mut tags = card.map(|c| c.tags.clone()).unwrap_or_default();
                if !tags.iter().any(|t| t == target_key) {
                    tags.push(target_key.to_string());
                }
                Ok(ClassificationChange::Tags(tags))
            }
        }
    }

    pub fn into_update(self, brand_id: BrandId, jid: &str) -> ChatMetaUpdate {
        let mut update = ChatMetaUpdate::new(brand_id, jid);
        match self {
            ClassificationChange::Column(column) => update.column = Some(column),
            ClassificationChange::Priority(priority) => update.priority = Some(priority),
            ClassificationChange::Interest(interest) => update.interest = Some(interest),
            ClassificationChange::Tags(tags) => update.tags = Some(tags),
        }
        update
    }
}

/// Split the tag field, trimming and dropping duplicates while keeping order.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in split_csv(raw) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Editable metadata of the open chat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatMetaForm {
    pub jid: String,
    pub number: String,
    pub title: String,
    pub color: String,
    pub column: String,
    pub priority: u8,
    pub interest: u8,
    pub pinned: bool,
    pub archived: bool,
    pub tags: String,
    pub notes: String,
}

impl ChatMetaForm {
    pub fn from_card(card: &ChatCard) -> Self {
        Self {
            jid: card.jid.clone(),
            number: card.reply_number(),
            title: card.title.clone().unwrap_or_default(),
            color: card.color.clone().unwrap_or_default(),
            column: card.column.clone().unwrap_or_default(),
            priority: card.priority.unwrap_or(0).min(3),
            interest: card.interest.unwrap_or(0).min(3),
            pinned: card.pinned,
            archived: card.archived,
            tags: card.tags.join(", "),
            notes: card.notes.clone().unwrap_or_default(),
        }
    }

    /// Full metadata object for the save call.
    pub fn to_update(&self, brand_id: BrandId) -> ChatMetaUpdate {
        ChatMetaUpdate {
            brand_id,
            jid: self.jid.clone(),
            title: Some(self.title.trim().to_string()),
            color: Some(self.color.trim().to_string()),
            column: Some(self.column.trim().to_string()),
            priority: Some(self.priority.min(3)),
            interest: Some(self.interest.min(3)),
            pinned: Some(self.pinned),
            archived: Some(self.archived),
            tags: Some(parse_tags(&self.tags)),
            notes: Some(self.notes.clone()),
        }
    }
}

/// Kanban triage of WhatsApp conversations.
#[derive(Debug, Clone)]
pub struct Inbox {
    client: ApiClient,
    pub query: BoardQuery,
    pub board: Board,
    pub meta_form: Option<ChatMetaForm>,
    pub messages: Vec<WaMessage>,
    pub loading: bool,
    pub status_message: Option<String>,
}

impl Inbox {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            query: BoardQuery::default(),
            board: Board::default(),
            meta_form: None,
            messages: Vec::new(),
            loading: false,
            status_message: None,
        }
    }

    pub async fn load_board(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;

        self.loading = true;
        let result: MkproResult<Board> = self
            .client
            .send_json("/api/wa/board", self.query.to_options(brand_id))
            .await;
        self.loading = false;

        self.board = result?;
        debug!(
            "Board loaded: {} columns, {} chats",
            self.board.columns.len(),
            self.board.card_count()
        );
        Ok(())
    }

    async fn post_meta(&self, update: &ChatMetaUpdate) -> MkproResult<()> {
        self.client
            .request(
                "/api/wa/chat/meta",
                RequestOptions::post(serde_json::to_value(update)?),
            )
            .await?;
        Ok(())
    }

    /// Reclassify a chat dropped onto `target_key`, then reload the board.
    pub async fn drop_card(
        &mut self,
        ctx: &BrandContext,
        jid: &str,
        target_key: &str,
    ) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        let change =
            ClassificationChange::for_drop(self.query.group_by, self.board.find_card(jid), target_key)?;

        info!("Moving {} to {} ({})", jid, target_key, self.query.group_by);
        self.post_meta(&change.into_update(brand_id, jid)).await?;
        self.load_board(ctx).await
    }

    pub async fn bulk_move(
        &mut self,
        ctx: &BrandContext,
        jids: Vec<String>,
        column: &str,
    ) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        if jids.is_empty() {
            return Err(MkproError::validation("select at least one chat"));
        }

        let body = BulkMove {
            brand_id,
            jids,
            column: column.to_string(),
        };
        self.client
            .request(
                "/api/wa/chat/bulk_move",
                RequestOptions::post(serde_json::to_value(&body)?),
            )
            .await?;
        self.load_board(ctx).await
    }

    async fn fetch_messages(&self, brand_id: BrandId, jid: &str) -> MkproResult<Vec<WaMessage>> {
        let list: MessageList = self
            .client
            .send_json(
                "/api/wa/messages",
                RequestOptions::get()
                    .query("brand_id", brand_id)
                    .query("jid", jid)
                    .query("limit", MESSAGE_HISTORY_LIMIT),
            )
            .await?;
        Ok(list.into_messages())
    }

    /// Load recent history and seed the metadata form from the card.
    pub async fn open_chat(&mut self, ctx: &BrandContext, jid: &str) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        let form = match self.board.find_card(jid) {
            Some(card) => ChatMetaForm::from_card(card),
            None => ChatMetaForm::from_card(&ChatCard {
                jid: jid.to_string(),
                ..Default::default()
            }),
        };

        self.messages = self.fetch_messages(brand_id, jid).await?;
        self.meta_form = Some(form);
        Ok(())
    }

    pub fn close_chat(&mut self) {
        self.meta_form = None;
        self.messages.clear();
    }

    pub async fn save_meta(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        let update = match &self.meta_form {
            Some(form) => form.to_update(brand_id),
            None => return Err(MkproError::validation("open a chat first")),
        };

        self.post_meta(&update).await?;
        self.status_message = Some("Chat saved".to_string());
        self.load_board(ctx).await
    }

    /// Send a reply to the open chat and refresh its history.
    pub async fn quick_reply(&mut self, ctx: &BrandContext, text: &str) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        let (jid, number) = match &self.meta_form {
            Some(form) => (form.jid.clone(), sanitize_number(&form.number)),
            None => return Err(MkproError::validation("open a chat first")),
        };
        if text.trim().is_empty() {
            return Err(MkproError::validation("write a reply first"));
        }
        if number.is_empty() {
            return Err(MkproError::validation("this chat has no phone number"));
        }

        let body = TestMessage {
            brand_id,
            to: number,
            text: text.to_string(),
        };
        send_test_message(&self.client, &body).await?;
        self.messages = self.fetch_messages(brand_id, &jid).await?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.board = Board::default();
        self.close_chat();
        self.status_message = None;
    }
}
