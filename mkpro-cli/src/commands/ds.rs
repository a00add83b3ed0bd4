use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Color};
use mkpro_core::{BrandContext, DatasourceKind, MkproError, WaAdmin};

use super::{new_table, print_json, print_success, truncate, yes_no};
use crate::config::CliContext;

#[derive(Subcommand)]
pub enum DsCommand {
    #[command(about = "List the brand's datasources")]
    List,

    #[command(about = "Create a datasource, or update one with --id")]
    Upsert(DatasourceArgs),

    #[command(about = "Delete a datasource")]
    Delete {
        #[arg(help = "Datasource id")]
        id: i64,

        #[arg(short, long, help = "Confirm the deletion")]
        yes: bool,
    },

    #[command(about = "Dry-run a datasource definition against the backend")]
    Test(DatasourceArgs),
}

#[derive(Args)]
pub struct DatasourceArgs {
    #[arg(long, help = "Id of an existing datasource")]
    id: Option<i64>,

    #[arg(long, help = "Display name")]
    name: String,

    #[arg(long, default_value = "postgres", help = "Kind (postgres, mysql, sqlite, http)")]
    kind: String,

    #[arg(long, help = "Connection string or base URL")]
    url: String,

    #[arg(long, default_value = "", help = "Headers as a JSON object")]
    headers: String,

    #[arg(long, help = "Create it disabled")]
    disabled: bool,

    #[arg(long, help = "Allow writes")]
    read_write: bool,
}

impl DatasourceArgs {
    /// Load the args into the admin's draft.
    fn apply(self, admin: &mut WaAdmin) -> anyhow::Result<()> {
        admin.new_datasource_draft();
        let draft = &mut admin.ds_draft;
        draft.id = self.id;
        draft.name = self.name;
        draft.kind = self.kind.parse::<DatasourceKind>()?;
        draft.url = self.url;
        draft.headers = self.headers;
        draft.enabled = !self.disabled;
        draft.read_only = !self.read_write;
        Ok(())
    }
}

pub async fn handle_ds_command(ctx: &CliContext, cmd: Option<DsCommand>) -> anyhow::Result<()> {
    let brands = ctx.brand_context().await?;
    let mut admin = WaAdmin::new(ctx.client.clone());

    match cmd.unwrap_or(DsCommand::List) {
        DsCommand::List => {
            admin.load(&brands).await;
            cmd_ds_list(ctx, &brands, &admin)
        }
        DsCommand::Upsert(args) => {
            args.apply(&mut admin)?;
            admin.save_datasource(&brands).await?;
            if ctx.json {
                return print_json(&admin.datasources);
            }
            print_success(&format!("Datasource '{}' saved", admin.ds_draft.name.trim()));
            Ok(())
        }
        DsCommand::Delete { id, yes } => {
            if !yes {
                return Err(MkproError::validation(format!(
                    "deleting datasource {} cannot be undone; re-run with --yes",
                    id
                ))
                .into());
            }
            admin.delete_datasource(&brands, id, yes).await?;
            if ctx.json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            print_success(&format!("Datasource {} deleted", id));
            Ok(())
        }
        DsCommand::Test(args) => {
            args.apply(&mut admin)?;
            let raw = admin.test_datasource(&brands).await?;
            if ctx.json {
                println!("{}", raw);
                return Ok(());
            }
            println!("{}", "Datasource test".cyan().bold());
            println!("{}", raw);
            Ok(())
        }
    }
}

fn cmd_ds_list(ctx: &CliContext, brands: &BrandContext, admin: &WaAdmin) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&admin.datasources);
    }

    if admin.datasources.is_empty() {
        println!("{}", "No datasources.".yellow());
        println!(
            "{}",
            "Run 'mkpro ds upsert --name <name> --url <url>' to add one.".dimmed()
        );
        return Ok(());
    }

    println!(
        "{} {}",
        "Datasources ·".cyan().bold(),
        brands.selected_label().cyan().bold()
    );
    println!();

    let mut table = new_table(&["ID", "Name", "Kind", "URL", "Headers", "Enabled", "Read only"]);
    for ds in &admin.datasources {
        table.add_row(vec![
            Cell::new(ds.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(&ds.name).fg(Color::Cyan),
            Cell::new(ds.kind),
            Cell::new(truncate(&ds.url, 40)),
            Cell::new(ds.headers.len()),
            yes_no(ds.enabled),
            yes_no(ds.read_only),
        ]);
    }
    println!("{table}");
    Ok(())
}
