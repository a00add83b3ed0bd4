use std::time::Duration;

use anyhow::bail;
use clap::Subcommand;
use colored::Colorize;
use mkpro_core::services::DEFAULT_TEST_MESSAGE;
use mkpro_core::{
    AgentMode, BrandContext, ConnectorProfile, SessionState, WaAdmin, WhatsAppConnector,
    WhatsAppSession,
};
use serde_json::{json, Value};

use super::{new_table, print_json, print_success, truncate, yes_no};
use crate::config::CliContext;

const WATCH_TICK: Duration = Duration::from_millis(250);

#[derive(Subcommand)]
pub enum WaCommand {
    #[command(about = "Start the brand's WhatsApp instance and show the pairing code")]
    Start,

    #[command(about = "Read the connection status and pairing code once")]
    Qr,

    #[command(about = "Start the instance and poll until it connects")]
    Watch,

    #[command(about = "Send a test message")]
    Test {
        #[arg(help = "Destination number with country code, no +")]
        to: String,

        #[arg(short, long, default_value = DEFAULT_TEST_MESSAGE, help = "Message text")]
        text: String,
    },

    #[command(about = "Show the agent configuration")]
    Config,

    #[command(about = "Change agent configuration fields and save")]
    SaveConfig {
        #[arg(long, help = "Agent mode (ventas, reservas, auto)")]
        mode: Option<String>,

        #[arg(long, help = "Model name")]
        model: Option<String>,

        #[arg(long, help = "Sampling temperature")]
        temperature: Option<f64>,

        #[arg(long, help = "Rules as markdown")]
        rules_md: Option<String>,

        #[arg(long, help = "Rules as JSON")]
        rules_json: Option<String>,

        #[arg(long, help = "Enable admin commands over WhatsApp")]
        super_enabled: Option<bool>,

        #[arg(long, help = "Keyword that opens the admin mode")]
        keyword: Option<String>,

        #[arg(long, help = "Comma separated numbers allowed to use the admin mode")]
        allow_list: Option<String>,
    },

    #[command(about = "Set or rotate the WhatsApp admin password")]
    SetPassword {
        #[arg(help = "New password")]
        new: String,

        #[arg(long, help = "Repeat the new password")]
        confirm: String,

        #[arg(long, default_value = "", help = "Current password, when one is set")]
        current: String,
    },

    #[command(about = "Point the instance webhook at the backend")]
    Webhook,

    #[command(about = "Pull message history from the instance")]
    SyncPull,

    #[command(about = "Replace the brand's instance and wait for it to connect")]
    Rotate {
        #[arg(long, help = "Return without waiting for the new instance")]
        no_wait: bool,
    },

    #[command(about = "Show the instance state reported by the backend")]
    Status,
}

pub async fn handle_wa_command(ctx: &CliContext, cmd: Option<WaCommand>) -> anyhow::Result<()> {
    let brands = ctx.brand_context().await?;
    let brand_id = brands.require_selected()?;

    match cmd.unwrap_or(WaCommand::Status) {
        WaCommand::Start => {
            let mut session = channel_session(ctx);
            session.start(brand_id).await?;
            session.stop();
            print_session(ctx, &session)
        }
        WaCommand::Qr => {
            let mut session = channel_session(ctx);
            session.fetch_once(brand_id).await?;
            print_session(ctx, &session)
        }
        WaCommand::Watch => {
            let mut session = channel_session(ctx);
            session.start(brand_id).await?;
            watch_session(ctx, &mut session).await
        }
        WaCommand::Test { to, text } => {
            let mut admin = WaAdmin::new(ctx.client.clone());
            let reply = admin.send_test(&brands, &to, &text).await?;
            print_reply(ctx, "Test message sent", reply)
        }
        WaCommand::Config => cmd_wa_config(ctx, &brands).await,
        WaCommand::SaveConfig {
            mode,
            model,
            temperature,
            rules_md,
            rules_json,
            super_enabled,
            keyword,
            allow_list,
        } => {
            let mut admin = load_admin(ctx, &brands).await?;
            let draft = &mut admin.draft;
            if let Some(mode) = mode {
                draft.agent_mode = mode.parse::<AgentMode>()?;
            }
            if let Some(model) = model {
                draft.model_name = model;
            }
            if let Some(temperature) = temperature {
                draft.temperature = temperature;
            }
            if let Some(rules_md) = rules_md {
                draft.rules_md = rules_md;
            }
            if let Some(rules_json) = rules_json {
                draft.rules_json = rules_json;
            }
            if let Some(enabled) = super_enabled {
                draft.super_enabled = enabled;
            }
            if let Some(keyword) = keyword {
                draft.super_keyword = keyword;
            }
            if let Some(allow_list) = allow_list {
                draft.super_allow_list = allow_list;
            }

            admin.save(&brands).await?;
            print_reply(ctx, "Configuration saved", json!({ "saved": true }))
        }
        WaCommand::SetPassword {
            new,
            confirm,
            current,
        } => {
            let mut admin = load_admin(ctx, &brands).await?;
            admin.set_password(&brands, &current, &new, &confirm).await?;
            print_reply(ctx, "Admin password updated", json!({ "saved": true }))
        }
        WaCommand::Webhook => {
            let mut admin = WaAdmin::new(ctx.client.clone());
            let reply = admin.set_webhook(&brands).await?;
            print_reply(ctx, "Webhook set", reply)
        }
        WaCommand::SyncPull => {
            let mut admin = WaAdmin::new(ctx.client.clone());
            let saved = admin.sync_pull(&brands).await?;
            print_reply(
                ctx,
                &format!("Sync (pull) saved {} messages", saved),
                json!({ "saved": saved }),
            )
        }
        WaCommand::Rotate { no_wait } => {
            let mut admin = WaAdmin::new(ctx.client.clone());
            let rotation = admin.rotate_instance(&brands).await?;
            let summary = json!({
                "instance": rotation.instance,
                "webhook": rotation.webhook,
            });

            if no_wait {
                admin.session.stop();
                return print_reply(ctx, "Instance rotated", summary);
            }
            if !ctx.json {
                print_success(&format!(
                    "Instance rotated -> {}",
                    rotation.instance.as_deref().unwrap_or("-")
                ));
                if let Some(webhook) = &rotation.webhook {
                    println!("  {} {}", "Webhook:".dimmed(), webhook);
                }
            }
            watch_session(ctx, &mut admin.session).await
        }
        WaCommand::Status => {
            let mut admin = WaAdmin::new(ctx.client.clone());
            let state = admin.instance_status(&brands).await?;
            if ctx.json {
                return print_json(&state);
            }
            println!("{}", "Instance status".cyan().bold());
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
    }
}

fn channel_session(ctx: &CliContext) -> WhatsAppSession {
    WhatsAppSession::new(
        WhatsAppConnector::new(ctx.client.clone()),
        ConnectorProfile::channels().with_polling(&ctx.config.polling),
    )
}

async fn load_admin(ctx: &CliContext, brands: &BrandContext) -> anyhow::Result<WaAdmin> {
    let mut admin = WaAdmin::new(ctx.client.clone());
    if !admin.load(brands).await {
        bail!("Could not load the WhatsApp configuration for {}", brands.selected_label());
    }
    Ok(admin)
}

/// Drain poll results until the session connects or polling ends.
async fn watch_session(ctx: &CliContext, session: &mut WhatsAppSession) -> anyhow::Result<()> {
    let mut shown_code: Option<String> = None;

    loop {
        session.drain_events();

        if !ctx.json {
            if let Some(display) = session.code_display() {
                let key = display.code.clone().unwrap_or_else(|| display.image.clone());
                if shown_code.as_deref() != Some(key.as_str()) {
                    println!();
                    print_code_lines(session);
                    shown_code = Some(key);
                }
            }
        }

        if session.status.connected || session.last_outcome.is_some() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(WATCH_TICK) => {}
            _ = tokio::signal::ctrl_c() => {
                session.stop();
                break;
            }
        }
    }
    session.drain_events();

    if ctx.json {
        print_json(&session_json(session))?;
    } else {
        println!();
        print_state_line(session);
        if let Some(outcome) = session.last_outcome {
            println!("  {} {}", "Polling:".dimmed(), outcome.describe());
        }
    }

    if !session.status.connected {
        bail!("WhatsApp is not connected yet");
    }
    Ok(())
}

async fn cmd_wa_config(ctx: &CliContext, brands: &BrandContext) -> anyhow::Result<()> {
    let admin = load_admin(ctx, brands).await?;
    let config = &admin.config;

    if ctx.json {
        return print_json(&json!({
            "config": config,
            "datasources": admin.datasources,
        }));
    }

    println!(
        "{} {}",
        "WhatsApp agent ·".cyan().bold(),
        brands.selected_label().cyan().bold()
    );
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<16} {}", "Mode:".bold(), config.agent_mode);
    println!(
        "  {:<16} {}",
        "Model:".bold(),
        config.model_name.as_deref().unwrap_or("-")
    );
    println!("  {:<16} {}", "Temperature:".bold(), config.temperature);
    println!(
        "  {:<16} {} ({})",
        "Admin mode:".bold(),
        if config.super_enabled {
            "on".green()
        } else {
            "off".dimmed()
        },
        config.super_keyword
    );
    println!(
        "  {:<16} {}",
        "Allow list:".bold(),
        if config.super_allow_list.is_empty() {
            "-".to_string()
        } else {
            config.super_allow_list.join(", ")
        }
    );
    println!(
        "  {:<16} {}",
        "Password:".bold(),
        if config.has_password {
            "set".green()
        } else {
            "not set".yellow()
        }
    );
    if let Some(instance) = &config.instance_name {
        println!("  {:<16} {}", "Instance:".bold(), instance);
    }
    if let Some(webhook) = &config.webhook_example {
        println!("  {:<16} {}", "Webhook:".bold(), webhook);
    }
    if !config.rules_md.is_empty() {
        println!("  {:<16} {}", "Rules:".bold(), truncate(&config.rules_md, 60));
    }

    if !admin.datasources.is_empty() {
        println!();
        let mut table = new_table(&["ID", "Name", "Kind", "URL", "Enabled", "Read only"]);
        for ds in &admin.datasources {
            table.add_row(vec![
                comfy_table::Cell::new(ds.id.map(|id| id.to_string()).unwrap_or_default()),
                comfy_table::Cell::new(&ds.name),
                comfy_table::Cell::new(ds.kind),
                comfy_table::Cell::new(truncate(&ds.url, 40)),
                yes_no(ds.enabled),
                yes_no(ds.read_only),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}

fn print_reply(ctx: &CliContext, message: &str, reply: Value) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&reply);
    }
    print_success(message);
    if !reply.is_null() && reply != json!({}) {
        println!("  {}", reply.to_string().dimmed());
    }
    Ok(())
}

fn session_json(session: &WhatsAppSession) -> Value {
    let display = session.code_display();
    json!({
        "state": session.state.to_string(),
        "connected": session.status.connected,
        "code_source": display.as_ref().map(|d| d.source.label()),
        "code": display.as_ref().and_then(|d| d.code.clone()),
        "image": display.map(|d| d.image),
        "polls": session.polls,
        "outcome": session.last_outcome.map(|o| o.describe()),
        "error": session.last_error,
    })
}

fn print_session(ctx: &CliContext, session: &WhatsAppSession) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&session_json(session));
    }
    print_state_line(session);
    print_code_lines(session);
    if let Some(error) = &session.last_error {
        println!("  {} {}", "Last error:".dimmed(), error.red());
    }
    Ok(())
}

fn print_state_line(session: &WhatsAppSession) {
    let state = match &session.state {
        SessionState::Connected => session.state.to_string().green().bold(),
        SessionState::Error(_) => session.state.to_string().red().bold(),
        _ => session.state.to_string().yellow(),
    };
    println!("{} {}", "WhatsApp:".bold(), state);
    println!("  {}", session.status_text().dimmed());
}

fn print_code_lines(session: &WhatsAppSession) {
    let Some(display) = session.code_display() else {
        return;
    };
    println!("  {} {}", "Source:".dimmed(), display.source.label());
    if let Some(code) = &display.code {
        println!("  {} {}", "Code:".dimmed(), code.cyan().bold());
    }
    if display.image.starts_with("data:") {
        println!(
            "  {} inline data URL ({} bytes)",
            "QR:".dimmed(),
            display.image.len()
        );
    } else {
        println!("  {} {}", "QR:".dimmed(), display.image);
    }
}
