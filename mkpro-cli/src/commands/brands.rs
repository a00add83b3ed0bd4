use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};
use mkpro_core::services::{list_brands, DEFAULT_BRAND_TONE};
use mkpro_core::{BrandContext, BrandManager};

use super::{new_table, print_json, print_success, truncate};
use crate::config::CliContext;

#[derive(Subcommand)]
pub enum BrandsCommand {
    #[command(about = "List brands")]
    List,

    #[command(about = "Create a brand and store its shared context")]
    Create {
        #[arg(help = "Brand name")]
        name: String,

        #[arg(short, long, default_value = DEFAULT_BRAND_TONE, help = "Tone of voice")]
        tone: String,

        #[arg(short, long, help = "Shared context for every agent")]
        context: Option<String>,
    },

    #[command(about = "Show the brand context, or replace it when TEXT is given")]
    Context {
        #[arg(help = "New context text")]
        text: Option<String>,
    },
}

pub async fn handle_brands_command(ctx: &CliContext, cmd: Option<BrandsCommand>) -> anyhow::Result<()> {
    match cmd.unwrap_or(BrandsCommand::List) {
        BrandsCommand::List => cmd_brands_list(ctx).await,
        BrandsCommand::Create {
            name,
            tone,
            context,
        } => cmd_brands_create(ctx, name, tone, context).await,
        BrandsCommand::Context { text } => cmd_brands_context(ctx, text).await,
    }
}

async fn cmd_brands_list(ctx: &CliContext) -> anyhow::Result<()> {
    let brands = list_brands(&ctx.client).await?;

    if ctx.json {
        return print_json(&brands);
    }

    if brands.is_empty() {
        println!("{}", "No brands yet.".yellow());
        println!(
            "{}",
            "Run 'mkpro brands create <name>' to add one.".dimmed()
        );
        return Ok(());
    }

    println!("{}", "Brands".cyan().bold());
    println!();

    let mut table = new_table(&["ID", "Name", "Tone", "Context"]);
    for brand in &brands {
        let id_cell = if ctx.brand == Some(brand.id) {
            Cell::new(format!("● {}", brand.id)).fg(Color::Green)
        } else {
            Cell::new(brand.id)
        };
        table.add_row(vec![
            id_cell,
            Cell::new(&brand.name).fg(Color::Cyan),
            Cell::new(brand.tone.as_deref().unwrap_or("-")),
            Cell::new(truncate(brand.context.as_deref().unwrap_or(""), 48)).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    println!();
    println!("  {} {}", "Total:".dimmed(), brands.len());
    Ok(())
}

async fn cmd_brands_create(
    ctx: &CliContext,
    name: String,
    tone: String,
    context: Option<String>,
) -> anyhow::Result<()> {
    let mut manager = BrandManager::new(ctx.client.clone());
    manager.name = name;
    manager.tone = tone;
    manager.context = context.unwrap_or_default();

    let mut brands = BrandContext::new();
    let id = manager.create(&mut brands).await?;

    if ctx.json {
        return print_json(&serde_json::json!({ "id": id, "name": manager.name }));
    }

    match id {
        Some(id) => print_success(&format!("Created brand '{}' (id {})", manager.name, id)),
        None => print_success(&format!("Created brand '{}'", manager.name)),
    }
    if id.is_some() && !manager.context.trim().is_empty() {
        println!("  {} context stored", "→".blue());
    }
    Ok(())
}

async fn cmd_brands_context(ctx: &CliContext, text: Option<String>) -> anyhow::Result<()> {
    let mut brands = ctx.brand_context().await?;
    let mut manager = BrandManager::new(ctx.client.clone());
    manager.on_brand_selected(&brands);

    let Some(text) = text else {
        if ctx.json {
            return print_json(&serde_json::json!({
                "brand_id": brands.selected,
                "context": manager.context,
            }));
        }
        println!("{}", brands.selected_label().cyan().bold());
        if manager.context.is_empty() {
            println!("{}", "No context stored.".dimmed());
        } else {
            println!("{}", manager.context);
        }
        return Ok(());
    };

    manager.context = text;
    manager.save_context(&mut brands).await?;

    if ctx.json {
        return print_json(&serde_json::json!({ "brand_id": brands.selected, "saved": true }));
    }
    print_success(&format!("Context saved for {}", brands.selected_label()));
    Ok(())
}
