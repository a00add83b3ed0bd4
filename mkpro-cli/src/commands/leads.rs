use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};
use mkpro_core::services::{DEFAULT_PAGE_SIZE, MIN_PAGE};
use mkpro_core::{Lead, LeadIntake};

use super::{new_table, print_json, truncate};
use crate::config::CliContext;

#[derive(Subcommand)]
pub enum LeadsCommand {
    #[command(about = "Score an incoming message and store it as a lead")]
    Ingest {
        #[arg(help = "The prospect's message")]
        text: String,
    },

    #[command(about = "List leads page by page")]
    List {
        #[arg(short, long, default_value_t = MIN_PAGE, help = "Page number")]
        page: u32,

        #[arg(short = 's', long, default_value_t = DEFAULT_PAGE_SIZE, help = "Leads per page")]
        page_size: u32,
    },
}

pub async fn handle_leads_command(ctx: &CliContext, cmd: Option<LeadsCommand>) -> anyhow::Result<()> {
    let brands = ctx.brand_context().await?;
    let mut intake = LeadIntake::new(ctx.client.clone());

    match cmd.unwrap_or(LeadsCommand::List {
        page: MIN_PAGE,
        page_size: DEFAULT_PAGE_SIZE,
    }) {
        LeadsCommand::Ingest { text } => {
            intake.raw_text = text;
            let lead = intake.ingest(&brands).await?;
            if ctx.json {
                return print_json(lead);
            }
            println!("{}", "Lead scored".cyan().bold());
            println!();
            print_leads(std::slice::from_ref(lead));
            Ok(())
        }
        LeadsCommand::List { page, page_size } => {
            intake.page = page;
            intake.set_page_size(page_size);
            intake.list(&brands).await?;
            if ctx.json {
                return print_json(&intake.leads);
            }

            println!(
                "{} {}",
                "Leads ·".cyan().bold(),
                brands.selected_label().cyan().bold()
            );
            println!(
                "  {} page {} · {} per page",
                "→".blue(),
                intake.page,
                intake.page_size
            );
            println!();
            if intake.leads.is_empty() {
                println!("{}", "No leads on this page.".yellow());
                return Ok(());
            }
            print_leads(&intake.leads);
            Ok(())
        }
    }
}

fn score_cell(score: Option<f64>) -> Cell {
    match score {
        Some(s) if s >= 70.0 => Cell::new(format!("{:.0}", s)).fg(Color::Green),
        Some(s) if s >= 40.0 => Cell::new(format!("{:.0}", s)).fg(Color::Yellow),
        Some(s) => Cell::new(format!("{:.0}", s)).fg(Color::Red),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}

fn print_leads(leads: &[Lead]) {
    let mut table = new_table(&["ID", "Name", "Channel", "Status", "Score", "Notes"]);
    for lead in leads {
        table.add_row(vec![
            Cell::new(lead.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(lead.name.as_deref().unwrap_or("-")).fg(Color::Cyan),
            Cell::new(lead.channel.as_deref().unwrap_or("-")),
            Cell::new(lead.status.as_deref().unwrap_or("-")),
            score_cell(lead.score),
            Cell::new(truncate(&lead.notes_text(), 50)).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
}
