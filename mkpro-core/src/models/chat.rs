use serde::{Deserialize, Serialize};

use super::{nullable, BrandId};

/// Team agents a message can be addressed to. `Mc` is the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatAgent {
    #[default]
    Mc,
    Copy,
    Designer,
    Reservas,
    Sales,
    Bot,
}

impl ChatAgent {
    pub fn all() -> &'static [ChatAgent] {
        &[
            ChatAgent::Mc,
            ChatAgent::Copy,
            ChatAgent::Designer,
            ChatAgent::Reservas,
            ChatAgent::Sales,
            ChatAgent::Bot,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAgent::Mc => "mc",
            ChatAgent::Copy => "copy",
            ChatAgent::Designer => "designer",
            ChatAgent::Reservas => "reservas",
            ChatAgent::Sales => "sales",
            ChatAgent::Bot => "bot",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChatAgent::Mc => "MC (orchestrator)",
            ChatAgent::Copy => "Copywriter",
            ChatAgent::Designer => "Designer",
            ChatAgent::Reservas => "Reservations",
            ChatAgent::Sales => "Sales",
            ChatAgent::Bot => "Bot",
        }
    }

    pub fn is_orchestrator(&self) -> bool {
        matches!(self, ChatAgent::Mc)
    }

    pub fn next(&self) -> ChatAgent {
        let agents = ChatAgent::all();
        let idx = agents.iter().position(|a| a == self).unwrap_or(0);
        agents[(idx + 1) % agents.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub sender: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
}

impl ChatMessage {
    /// Label shown before the message text.
    pub fn author(&self) -> String {
        match &self.agent {
            Some(agent) if !agent.is_empty() => format!("{} ({})", self.sender, agent),
            _ => self.sender.clone(),
        }
    }
}

/// Thread payload returned by the thread, send and orchestrator endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    #[serde(default)]
    pub thread_id: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub context: String,
    #[serde(default, deserialize_with = "nullable")]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatPost<'a> {
    pub brand_id: BrandId,
    pub agent: ChatAgent,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OrchestratorPost<'a> {
    pub brand_id: BrandId,
    pub text: &'a str,
}
