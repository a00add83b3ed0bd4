use anyhow::{Context, Result};
use mkpro_core::services::list_brands;
use mkpro_core::{ApiClient, BrandContext, BrandId, MkproConfig, MkproError};
use tracing::debug;

/// Everything a subcommand needs: configuration, an API client, the
/// `--brand` override and the output mode.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: MkproConfig,
    pub client: ApiClient,
    pub brand: Option<BrandId>,
    pub json: bool,
}

impl CliContext {
    pub fn load(brand: Option<BrandId>, json: bool) -> Result<Self> {
        let config = MkproConfig::load().map_err(MkproError::from)?;
        Self::new(config, brand, json)
    }

    pub fn new(config: MkproConfig, brand: Option<BrandId>, json: bool) -> Result<Self> {
        let client = ApiClient::new(&config.api).context("Failed to build the API client")?;
        debug!("Using backend {}", client.base_url());
        Ok(Self {
            config,
            client,
            brand,
            json,
        })
    }

    /// Brand scope for brand-bound commands.
    ///
    /// An explicit `--brand` wins even when the brand list cannot be read.
    /// Without one the first listed brand is used.
    pub async fn brand_context(&self) -> Result<BrandContext> {
        if let Some(id) = self.brand {
            let mut ctx = BrandContext::with_brand(id);
            match list_brands(&self.client).await {
                Ok(brands) => ctx.brands = brands,
                Err(e) => debug!("Brand list unavailable, keeping --brand {}: {}", id, e),
            }
            return Ok(ctx);
        }

        let mut ctx = BrandContext::new();
        ctx.replace_brands(list_brands(&self.client).await?);
        if ctx.selected.is_none() {
            return Err(MkproError::validation(
                "no brands yet; create one with 'mkpro brands create <name>'",
            )
            .into());
        }
        debug!("Defaulting to brand {}", ctx.selected_label());
        Ok(ctx)
    }
}
