use tracing::{info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::context::BrandContext;
use crate::error::{MkproError, MkproResult};
use crate::models::{Brand, BrandId, ContextUpdate, CreatedBrand, NewBrand};

pub const DEFAULT_BRAND_NAME: &str = "Marca Pepito";
pub const DEFAULT_BRAND_TONE: &str = "cercano y directo";

pub async fn list_brands(client: &ApiClient) -> MkproResult<Vec<Brand>> {
    let payload = client.request("/api/brands", RequestOptions::get()).await?;
    Brand::list_from_value(payload)
}

pub async fn set_context(client: &ApiClient, brand_id: BrandId, context: &str) -> MkproResult<()> {
    let body = ContextUpdate { brand_id, context };
    client
        .request("/api/context/set", RequestOptions::post(serde_json::to_value(&body)?))
        .await?;
    Ok(())
}

/// Create-brand form and the shared context editor.
#[derive(Debug, Clone)]
pub struct BrandManager {
    client: ApiClient,
    pub name: String,
    pub tone: String,
    pub context: String,
    pub busy: bool,
}

impl BrandManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            name: DEFAULT_BRAND_NAME.to_string(),
            tone: DEFAULT_BRAND_TONE.to_string(),
            context: String::new(),
            busy: false,
        }
    }

    /// Create a brand, select it, and store the staged context against it.
    ///
    /// The brand list re-fetch is best effort: a failure is logged and the
    /// created id is still selected. If storing the context fails the error
    /// is returned with the new brand already selected.
    pub async fn create(&mut self, ctx: &mut BrandContext) -> MkproResult<Option<BrandId>> {
        if self.name.trim().is_empty() {
            return Err(MkproError::validation("enter a brand name"));
        }

        self.busy = true;
        let result = self.create_inner(ctx).await;
        self.busy = false;
        result
    }

    async fn create_inner(&mut self, ctx: &mut BrandContext) -> MkproResult<Option<BrandId>> {
        let body = NewBrand {
            name: &self.name,
            tone: &self.tone,
        };
        let created: CreatedBrand = self.client.post_json("/api/brands", &body).await?;
        info!("Created brand {:?} ({})", created.id, self.name);

        match list_brands(&self.client).await {
            Ok(brands) => ctx.replace_brands(brands),
            Err(e) => warn!("Brand list refresh after create failed: {}", e),
        }
        if let Some(id) = created.id {
            ctx.select(Some(id));
        }

        if let Some(id) = created.id {
            if !self.context.trim().is_empty() {
                set_context(&self.client, id, &self.context).await?;
                if let Some(brand) = ctx.brands.iter_mut().find(|b| b.id == id) {
                    brand.context = Some(self.context.clone());
                }
            }
        }

        Ok(created.id)
    }

    /// Persist the context text verbatim for the selected brand.
    pub async fn save_context(&mut self, ctx: &mut BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;

        self.busy = true;
        let result = set_context(&self.client, brand_id, &self.context).await;
        self.busy = false;
        result?;

        if let Some(brand) = ctx.brands.iter_mut().find(|b| b.id == brand_id) {
            brand.context = Some(self.context.clone());
        }
        info!("Saved context for brand {}", brand_id);
        Ok(())
    }

    /// Seed the editor from the newly selected brand.
    pub fn on_brand_selected(&mut self, ctx: &BrandContext) {
        self.context = ctx
            .selected_brand()
            .and_then(|b| b.context.clone())
            .unwrap_or_default();
    }
}
