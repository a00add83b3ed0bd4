use tracing::info;

use crate::client::{ApiClient, RequestOptions};
use crate::context::BrandContext;
use crate::error::{MkproError, MkproResult};
use crate::models::{Lead, LeadIngest, LeadPage};

pub const DEFAULT_LEAD_TEXT: &str =
    "Hola, quiero una campaña para octubre, presupuesto 200k. Soy Carla.";
pub const MIN_PAGE: u32 = 1;
pub const MIN_PAGE_SIZE: u32 = 5;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
const INGEST_CHANNEL: &str = "web";

#[derive(Debug, Clone)]
pub struct LeadIntake {
    client: ApiClient,
    pub raw_text: String,
    pub leads: Vec<Lead>,
    pub page: u32,
    pub page_size: u32,
    pub loading: bool,
}

impl LeadIntake {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            raw_text: DEFAULT_LEAD_TEXT.to_string(),
            leads: Vec::new(),
            page: MIN_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            loading: false,
        }
    }

    /// Submit the text for scoring and put the scored lead first.
    pub async fn ingest(&mut self, ctx: &BrandContext) -> MkproResult<&Lead> {
        let brand_id = ctx.require_selected()?;
        if self.raw_text.trim().is_empty() {
            return Err(MkproError::validation("paste the lead's message first"));
        }

        let body = LeadIngest {
            brand_id,
            raw_text: &self.raw_text,
            channel: INGEST_CHANNEL,
        };

        self.loading = true;
        let result: MkproResult<Lead> = self.client.post_json("/api/leads/ingest", &body).await;
        self.loading = false;

        let lead = result?;
        info!("Lead scored: {:?} ({:?})", lead.name, lead.score);
        self.leads.insert(0, lead);
        Ok(&self.leads[0])
    }

    /// Fetch the current page and replace the list.
    pub async fn list(&mut self, ctx: &BrandContext) -> MkproResult<()> {
        let brand_id = ctx.require_selected()?;
        self.page = self.page.max(MIN_PAGE);
        self.page_size = self.page_size.max(MIN_PAGE_SIZE);

        let options = RequestOptions::get()
            .query("brand_id", brand_id)
            .query("page", self.page)
            .query("page_size", self.page_size);

        self.loading = true;
        let result: MkproResult<LeadPage> = self.client.send_json("/api/leads", options).await;
        self.loading = false;

        self.leads = result?.into_items();
        Ok(())
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1).max(MIN_PAGE);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(MIN_PAGE);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(MIN_PAGE_SIZE);
    }

    pub fn reset(&mut self) {
        self.leads.clear();
        self.page = MIN_PAGE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn intake() -> LeadIntake {
        LeadIntake::new(ApiClient::new(&ApiConfig::default()).unwrap())
    }

    #[test]
    fn test_page_clamping() {
        let mut intake = intake();
        assert_eq!((intake.page, intake.page_size), (1, 10));

        intake.prev_page();
        assert_eq!(intake.page, 1);
        intake.next_page();
        intake.next_page();
        assert_eq!(intake.page, 3);
        intake.prev_page();
        assert_eq!(intake.page, 2);

        intake.set_page_size(2);
        assert_eq!(intake.page_size, 5);
        intake.set_page_size(25);
        assert_eq!(intake.page_size, 25);
    }

    #[tokio::test]
    async fn test_requires_brand() {
        let mut intake = intake();
        let ctx = BrandContext::new();
        assert!(intake.ingest(&ctx).await.unwrap_err().is_validation());
        assert!(intake.list(&ctx).await.unwrap_err().is_validation());
    }
}
