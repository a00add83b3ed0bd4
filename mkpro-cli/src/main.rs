use clap::{Parser, Subcommand};
use colored::Colorize;
use mkpro_core::{BrandId, CliErrorDisplay, HealthState, MkproError, Shell};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::{
    handle_brands_command, handle_chat_command, handle_ds_command, handle_inbox_command,
    handle_leads_command, handle_social_command, handle_wa_command, BrandsCommand, ChatCommand,
    DsCommand, InboxCommand, LeadsCommand, SocialCommand, WaCommand,
};
use config::CliContext;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "mkpro")]
#[command(version = VERSION)]
#[command(about = "Marketing PRO - command-line console for brands, team chat and WhatsApp")]
#[command(long_about = r#"
mkpro talks to a Marketing PRO backend: brands and their shared context, the
team chat with its agents, WhatsApp pairing and administration, the chat
board, lead scoring and Facebook/Instagram posts.

Point it at a backend with MKPRO_API_BASE (default http://127.0.0.1:8000).
Brand-scoped commands use --brand, or the first brand the backend lists.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, env = "MKPRO_BRAND", help = "Brand id")]
    brand: Option<BrandId>,

    #[arg(long, global = true, help = "Print JSON instead of tables")]
    json: bool,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check that the backend answers")]
    Health,

    #[command(about = "Manage brands and their shared context")]
    Brands {
        #[command(subcommand)]
        action: Option<BrandsCommand>,
    },

    #[command(about = "Read and write the team chat")]
    Chat {
        #[command(subcommand)]
        action: Option<ChatCommand>,
    },

    #[command(about = "WhatsApp pairing, agent config and instance maintenance")]
    Wa {
        #[command(subcommand)]
        action: Option<WaCommand>,
    },

    #[command(about = "Manage the datasources of the WhatsApp agent")]
    Ds {
        #[command(subcommand)]
        action: Option<DsCommand>,
    },

    #[command(about = "Triage WhatsApp conversations")]
    Inbox {
        #[command(subcommand)]
        action: Option<InboxCommand>,
    },

    #[command(about = "Score and list leads")]
    Leads {
        #[command(subcommand)]
        action: Option<LeadsCommand>,
    },

    #[command(about = "Publish to Facebook or Instagram")]
    Social {
        #[command(subcommand)]
        action: SocialCommand,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MkproError>() {
                Some(err) => eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(err)),
                None => eprintln!("{}: {:#}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mkpro_core=debug,mkpro=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version { detailed } = cli.command {
        return cmd_version(detailed);
    }

    let ctx = CliContext::load(cli.brand, cli.json)?;

    match cli.command {
        Commands::Health => cmd_health(&ctx).await,
        Commands::Brands { action } => handle_brands_command(&ctx, action).await,
        Commands::Chat { action } => handle_chat_command(&ctx, action).await,
        Commands::Wa { action } => handle_wa_command(&ctx, action).await,
        Commands::Ds { action } => handle_ds_command(&ctx, action).await,
        Commands::Inbox { action } => handle_inbox_command(&ctx, action).await,
        Commands::Leads { action } => handle_leads_command(&ctx, action).await,
        Commands::Social { action } => handle_social_command(&ctx, action).await,
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

async fn cmd_health(ctx: &CliContext) -> anyhow::Result<()> {
    let mut shell = Shell::new(ctx.client.clone());
    let health = shell.check_health().await.clone();

    let reason = match &health {
        HealthState::Fail(reason) => Some(reason.as_str()),
        _ => None,
    };

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "base_url": ctx.client.base_url(),
                "status": health.label(),
                "ok": health.is_ok(),
                "error": reason,
            }))?
        );
    } else {
        let status = match &health {
            HealthState::Ok => health.label().green().bold(),
            HealthState::Fail(_) => health.label().red().bold(),
            HealthState::Pending => health.label().yellow(),
        };
        println!("{} {}", "●".bold(), status);
        println!("  {} {}", "Backend:".dimmed(), ctx.client.base_url());
        if let Some(reason) = reason {
            println!("  {} {}", "Reason:".dimmed(), reason);
        }
    }

    if !health.is_ok() {
        anyhow::bail!("Backend at {} is not answering", ctx.client.base_url());
    }
    Ok(())
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Marketing PRO Console".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} {}", "Core:".bold(), mkpro_core::VERSION);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Surfaces:".bold());
        println!("    ◆ Team chat");
        println!("    ◆ Brands");
        println!("    ◆ Channels (WhatsApp, Facebook, Instagram)");
        println!("    ◆ WhatsApp admin");
        println!("    ◆ Leads");
        println!("    ◆ WhatsApp inbox");
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("mkpro {}", VERSION);
    }

    Ok(())
}
