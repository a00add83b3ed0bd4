use clap::Subcommand;
use mkpro_core::services::DEFAULT_INSTAGRAM_IMAGE;
use mkpro_core::SocialPoster;

use super::{print_json, print_success};
use crate::config::CliContext;

#[derive(Subcommand)]
pub enum SocialCommand {
    #[command(about = "Publish a post to the Facebook page")]
    Facebook {
        #[arg(help = "Post text")]
        message: String,

        #[arg(short, long, help = "Optional image URL")]
        image_url: Option<String>,
    },

    #[command(about = "Publish an image post to Instagram")]
    Instagram {
        #[arg(help = "Caption")]
        caption: String,

        #[arg(short, long, default_value = DEFAULT_INSTAGRAM_IMAGE, help = "Image URL")]
        image_url: String,
    },
}

pub async fn handle_social_command(ctx: &CliContext, cmd: SocialCommand) -> anyhow::Result<()> {
    let mut poster = SocialPoster::new(ctx.client.clone());

    let (network, id) = match cmd {
        SocialCommand::Facebook { message, image_url } => (
            "Facebook",
            poster.post_facebook(&message, image_url.as_deref()).await?,
        ),
        SocialCommand::Instagram { caption, image_url } => (
            "Instagram",
            poster.post_instagram(&caption, &image_url).await?,
        ),
    };

    if ctx.json {
        return print_json(&serde_json::json!({ "network": network, "id": id }));
    }
    print_success(&format!("Published to {}: {}", network, id));
    Ok(())
}
