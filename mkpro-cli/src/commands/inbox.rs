use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Color};
use mkpro_core::services::DEFAULT_BOARD_LIMIT;
use mkpro_core::{Board, BrandContext, ChatCard, ChatMetaForm, GroupBy, Inbox, WaMessage};
use serde_json::{json, Value};

use super::{new_table, print_json, print_success, truncate};
use crate::config::CliContext;

#[derive(Subcommand)]
pub enum InboxCommand {
    #[command(about = "Show the conversation board")]
    Board(BoardArgs),

    #[command(about = "Move a chat to another column of the grouping")]
    Move {
        #[arg(help = "Chat jid")]
        jid: String,

        #[arg(help = "Target column key (e.g. nuevo, p1, warm, vip, untagged)")]
        column: String,

        #[arg(short, long, default_value = "column", help = "Grouping (column, priority, interest, tag)")]
        group_by: String,
    },

    #[command(about = "Edit chat metadata; unset options keep their value")]
    Meta(MetaArgs),

    #[command(about = "Show the recent messages of a chat")]
    Messages {
        #[arg(help = "Chat jid")]
        jid: String,
    },

    #[command(about = "Reply to a chat from the brand's number")]
    Reply {
        #[arg(help = "Chat jid")]
        jid: String,

        #[arg(help = "Reply text")]
        text: String,
    },

    #[command(about = "Move several chats to one column")]
    BulkMove {
        #[arg(help = "Target column key")]
        column: String,

        #[arg(required = true, help = "Chat jids")]
        jids: Vec<String>,
    },
}

#[derive(Args, Default)]
pub struct BoardArgs {
    #[arg(short, long, default_value = "column", help = "Grouping (column, priority, interest, tag)")]
    group_by: String,

    #[arg(short, long, help = "Include archived chats")]
    archived: bool,

    #[arg(short, long, help = "Search text")]
    query: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_BOARD_LIMIT, help = "Maximum chats")]
    limit: u32,
}

#[derive(Args)]
pub struct MetaArgs {
    #[arg(help = "Chat jid")]
    jid: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long, help = "Column key")]
    column: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3), help = "0 (P0) to 3 (P3)")]
    priority: Option<u8>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3), help = "0 unknown, 1 cold, 2 warm, 3 hot")]
    interest: Option<u8>,

    #[arg(long)]
    pinned: Option<bool>,

    #[arg(long)]
    archived: Option<bool>,

    #[arg(long, help = "Comma separated tags")]
    tags: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long, help = "Number used for replies")]
    number: Option<String>,
}

impl MetaArgs {
    fn apply(self, form: &mut ChatMetaForm) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(color) = self.color {
            form.color = color;
        }
        if let Some(column) = self.column {
            form.column = column;
        }
        if let Some(priority) = self.priority {
            form.priority = priority;
        }
        if let Some(interest) = self.interest {
            form.interest = interest;
        }
        if let Some(pinned) = self.pinned {
            form.pinned = pinned;
        }
        if let Some(archived) = self.archived {
            form.archived = archived;
        }
        if let Some(tags) = self.tags {
            form.tags = tags;
        }
        if let Some(notes) = self.notes {
            form.notes = notes;
        }
        if let Some(number) = self.number {
            form.number = number;
        }
    }
}

pub async fn handle_inbox_command(ctx: &CliContext, cmd: Option<InboxCommand>) -> anyhow::Result<()> {
    let brands = ctx.brand_context().await?;
    let mut inbox = Inbox::new(ctx.client.clone());

    match cmd.unwrap_or(InboxCommand::Board(BoardArgs {
        group_by: GroupBy::Column.to_string(),
        limit: DEFAULT_BOARD_LIMIT,
        ..Default::default()
    })) {
        InboxCommand::Board(args) => {
            inbox.query.group_by = args.group_by.parse()?;
            inbox.query.show_archived = args.archived;
            inbox.query.q = args.query;
            inbox.query.limit = args.limit;
            inbox.load_board(&brands).await?;
            print_board(ctx, &brands, &inbox.board)
        }
        InboxCommand::Move {
            jid,
            column,
            group_by,
        } => {
            inbox.query.group_by = group_by.parse()?;
            inbox.load_board(&brands).await?;
            inbox.drop_card(&brands, &jid, &column).await?;
            if ctx.json {
                return print_json(&json!({ "jid": jid, "column": column }));
            }
            print_success(&format!("Moved {} to {}", jid, column));
            Ok(())
        }
        InboxCommand::Meta(args) => {
            inbox.load_board(&brands).await?;
            let mut form = match inbox.board.find_card(&args.jid) {
                Some(card) => ChatMetaForm::from_card(card),
                None => ChatMetaForm::from_card(&ChatCard {
                    jid: args.jid.clone(),
                    ..Default::default()
                }),
            };
            args.apply(&mut form);
            let jid = form.jid.clone();
            inbox.meta_form = Some(form);
            inbox.save_meta(&brands).await?;
            if ctx.json {
                return print_json(&json!({ "jid": jid, "saved": true }));
            }
            print_success(&format!("Chat {} saved", jid));
            Ok(())
        }
        InboxCommand::Messages { jid } => {
            inbox.load_board(&brands).await?;
            inbox.open_chat(&brands, &jid).await?;
            print_messages(ctx, &jid, &inbox.messages)
        }
        InboxCommand::Reply { jid, text } => {
            inbox.load_board(&brands).await?;
            inbox.open_chat(&brands, &jid).await?;
            inbox.quick_reply(&brands, &text).await?;
            if !ctx.json {
                print_success("Reply sent");
                println!();
            }
            print_messages(ctx, &jid, &inbox.messages)
        }
        InboxCommand::BulkMove { column, jids } => {
            let count = jids.len();
            inbox.bulk_move(&brands, jids, &column).await?;
            if ctx.json {
                return print_json(&json!({ "column": column, "moved": count }));
            }
            print_success(&format!("Moved {} chats to {}", count, column));
            Ok(())
        }
    }
}

fn message_json(message: &WaMessage) -> Value {
    json!({
        "id": message.id_text(),
        "from_me": message.from_me,
        "text": message.text,
        "timestamp": message.timestamp,
    })
}

fn print_messages(ctx: &CliContext, jid: &str, messages: &[WaMessage]) -> anyhow::Result<()> {
    if ctx.json {
        let items: Vec<Value> = messages.iter().map(message_json).collect();
        return print_json(&items);
    }

    println!("{} {}", "Chat".cyan().bold(), jid.cyan().bold());
    if messages.is_empty() {
        println!("{}", "No messages.".dimmed());
        return Ok(());
    }
    for message in messages {
        if message.from_me {
            println!("{} {}", "me:".green().bold(), message.text);
        } else {
            println!("{} {}", "them:".magenta().bold(), message.text);
        }
    }
    Ok(())
}

fn print_board(ctx: &CliContext, brands: &BrandContext, board: &Board) -> anyhow::Result<()> {
    if ctx.json {
        let columns: Vec<Value> = board
            .columns
            .iter()
            .map(|column| {
                json!({
                    "key": column.key,
                    "title": column.title,
                    "cards": column.cards,
                })
            })
            .collect();
        return print_json(&json!({
            "group_by": board.group_by,
            "columns": columns,
        }));
    }

    println!(
        "{} {}",
        "Inbox ·".cyan().bold(),
        brands.selected_label().cyan().bold()
    );
    println!(
        "  {} {} chats in {} columns",
        "→".blue(),
        board.card_count(),
        board.columns.len()
    );
    println!();

    if board.columns.is_empty() {
        println!("{}", "No chats.".yellow());
        return Ok(());
    }

    let mut table = new_table(&["Column", "Chat", "JID", "Unread", "Tags", "Last message"]);
    for column in &board.columns {
        if column.cards.is_empty() {
            table.add_row(vec![
                Cell::new(column.heading()).fg(Color::Cyan),
                Cell::new("-").fg(Color::DarkGrey),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ]);
            continue;
        }
        for (index, card) in column.cards.iter().enumerate() {
            let heading = if index == 0 {
                Cell::new(column.heading()).fg(Color::Cyan)
            } else {
                Cell::new("")
            };
            let label = if card.pinned {
                format!("★ {}", card.label())
            } else {
                card.label()
            };
            let unread = if card.unread > 0 {
                Cell::new(card.unread).fg(Color::Yellow)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                heading,
                Cell::new(label),
                Cell::new(&card.jid).fg(Color::DarkGrey),
                unread,
                Cell::new(card.tags.join(", ")),
                Cell::new(truncate(card.last_message.as_deref().unwrap_or(""), 40)),
            ]);
        }
    }
    println!("{table}");
    Ok(())
}
