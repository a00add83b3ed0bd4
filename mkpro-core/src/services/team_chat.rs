use tracing::{debug, info};

use crate::client::ApiClient;
use crate::context::BrandContext;
use crate::error::{MkproError, MkproResult};
use crate::models::{ChatAgent, ChatMessage, ChatPost, ChatThread, OrchestratorPost};

/// Team chat thread for the selected brand.
#[derive(Debug, Clone)]
pub struct TeamChat {
    client: ApiClient,
    pub agent: ChatAgent,
    pub text: String,
    pub thread_id: Option<i64>,
    pub context: String,
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
}

impl TeamChat {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            agent: ChatAgent::Mc,
            text: String::new(),
            thread_id: None,
            context: String::new(),
            messages: Vec::new(),
            loading: false,
        }
    }

    fn apply(&mut self, thread: ChatThread) {
        if thread.thread_id.is_some() {
            self.thread_id = thread.thread_id;
        }
        self.context = thread.context;
        self.messages = thread.messages;
    }

    /// Fetch the thread and replace the local copy.
    pub async fn load_thread(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        let thread: ChatThread = self
            .client
            .get_json("/api/chat/thread", &[("brand_id", brand_id.to_string())])
            .await?;

        debug!(
            "Loaded thread {:?} with {} messages",
            thread.thread_id,
            thread.messages.len()
        );
        self.thread_id = thread.thread_id;
        self.context = thread.context;
        self.messages = thread.messages;
        Ok(())
    }

    /// Post the message and, for the orchestrator, fetch its reply.
    ///
    /// The user message is stored first. When the orchestrator call fails the
    /// first response stays rendered and the error is returned.
    pub async fn send(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        if self.text.trim().is_empty() {
            return Err(MkproError::validation("write a message first"));
        }

        self.loading = true;
        let result = self.send_inner(brand_id).await;
        self.loading = false;
        result
    }

    async fn send_inner(&mut self, brand_id: i64) -> MkproResult<()> {
        let text = self.text.clone();
        let posted: ChatThread = self
            .client
            .post_json(
                "/api/chat",
                &ChatPost {
                    brand_id,
                    agent: self.agent,
                    text: &text,
                },
            )
            .await?;
        self.apply(posted);
        self.text.clear();

        if self.agent.is_orchestrator() {
            let reply: ChatThread = self
                .client
                .post_json(
                    "/api/chat/agent/mc",
                    &OrchestratorPost {
                        brand_id,
                        text: &text,
                    },
                )
                .await?;
            info!("Orchestrator replied for brand {}", brand_id);
            self.apply(reply);
        }

        Ok(())
    }

    pub fn reset(&mut self) {
        self.thread_id = None;
        self.context.clear();
        self.messages.clear();
    }

    pub fn cycle_agent(&mut self) {
        self.agent = self.agent.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn chat() -> TeamChat {
        TeamChat::new(ApiClient::new(&ApiConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_send_requires_brand_and_text() {
        let mut chat = chat();
        chat.text = "hola".to_string();
        let err = chat.send(&BrandContext::new()).await.unwrap_err();
        assert!(err.is_validation());

        chat.text = "  ".to_string();
        let err = chat.send(&BrandContext::with_brand(1)).await.unwrap_err();
        assert!(err.is_validation());
        assert!(!chat.loading);
    }

    #[test]
    fn test_apply_keeps_known_thread_id() {
        let mut chat = chat();
        chat.thread_id = Some(5);
        chat.apply(ChatThread {
            thread_id: None,
            context: "ctx".to_string(),
            messages: Vec::new(),
        });
        assert_eq!(chat.thread_id, Some(5));
        assert_eq!(chat.context, "ctx");

        chat.cycle_agent();
        assert_eq!(chat.agent, ChatAgent::Copy);
        chat.reset();
        assert_eq!(chat.thread_id, None);
    }
}
