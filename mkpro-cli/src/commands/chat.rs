use clap::Subcommand;
use colored::Colorize;
use mkpro_core::{ChatAgent, ChatMessage, MkproError, TeamChat};

use super::print_json;
use crate::config::CliContext;

#[derive(Subcommand)]
pub enum ChatCommand {
    #[command(about = "Show the team chat thread of the brand")]
    Thread,

    #[command(about = "Send a message to an agent")]
    Send {
        #[arg(help = "Message text")]
        text: String,

        #[arg(
            short,
            long,
            default_value = "mc",
            help = "Agent (mc, copy, designer, reservas, sales, bot)"
        )]
        agent: String,
    },
}

pub async fn handle_chat_command(ctx: &CliContext, cmd: Option<ChatCommand>) -> anyhow::Result<()> {
    let brands = ctx.brand_context().await?;
    let mut chat = TeamChat::new(ctx.client.clone());

    match cmd.unwrap_or(ChatCommand::Thread) {
        ChatCommand::Thread => {
            chat.load_thread(&brands).await?;
        }
        ChatCommand::Send { text, agent } => {
            chat.agent = parse_agent(&agent)?;
            chat.text = text;
            chat.send(&brands).await?;
        }
    }

    if ctx.json {
        return print_json(&serde_json::json!({
            "thread_id": chat.thread_id,
            "context": chat.context,
            "messages": chat.messages,
        }));
    }

    println!(
        "{} {}",
        "Team chat ·".cyan().bold(),
        brands.selected_label().cyan().bold()
    );
    if let Some(id) = chat.thread_id {
        println!("  {} {}", "Thread:".dimmed(), id);
    }
    println!();
    print_messages(&chat.messages);
    Ok(())
}

fn parse_agent(value: &str) -> anyhow::Result<ChatAgent> {
    let wanted = value.trim().to_lowercase();
    ChatAgent::all()
        .iter()
        .copied()
        .find(|agent| agent.as_str() == wanted)
        .ok_or_else(|| MkproError::validation(format!("unknown agent '{}'", value)).into())
}

fn print_messages(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }

    for message in messages {
        let author = message.author();
        let author = if message.sender == "user" {
            author.green().bold()
        } else {
            author.magenta().bold()
        };
        println!("{}: {}", author, message.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent() {
        assert_eq!(parse_agent("mc").unwrap(), ChatAgent::Mc);
        assert_eq!(parse_agent(" Sales ").unwrap(), ChatAgent::Sales);
        assert!(parse_agent("ceo").is_err());
    }
}
