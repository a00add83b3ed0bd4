use crate::error::{MkproError, MkproResult};
use crate::models::{Brand, BrandId};

/// Brand list plus the selected brand, passed by reference into every
/// controller call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandContext {
    pub brands: Vec<Brand>,
    pub selected: Option<BrandId>,
}

impl BrandContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_brand(brand_id: BrandId) -> Self {
        Self {
            brands: Vec::new(),
            selected: Some(brand_id),
        }
    }

    /// Select a brand. Returns `true` when the selection changed.
    pub fn select(&mut self, brand_id: Option<BrandId>) -> bool {
        let changed = self.selected != brand_id;
        self.selected = brand_id;
        changed
    }

    pub fn selected_brand(&self) -> Option<&Brand> {
        let id = self.selected?;
        self.brands.iter().find(|b| b.id == id)
    }

    pub fn require_selected(&self) -> MkproResult<BrandId> {
        self.selected
            .ok_or_else(|| MkproError::validation("select a brand first"))
    }

    /// Replace the list, keeping the selection when it still exists and
    /// falling back to the first brand otherwise.
    pub fn replace_brands(&mut self, brands: Vec<Brand>) {
        self.brands = brands;
        let still_present = self
            .selected
            .map(|id| self.brands.iter().any(|b| b.id == id))
            .unwrap_or(false);
        if !still_present {
            self.selected = self.brands.first().map(|b| b.id);
        }
    }

    /// Move the selection by `offset` positions, wrapping around.
    pub fn cycle(&mut self, offset: isize) -> bool {
        if self.brands.is_empty() {
            return false;
        }
        let len = self.brands.len() as isize;
        let current = self
            .selected
            .and_then(|id| self.brands.iter().position(|b| b.id == id))
            .map(|idx| idx as isize)
            .unwrap_or(-1);
        let next = (current + offset).rem_euclid(len) as usize;
        let id = self.brands[next].id;
        self.select(Some(id))
    }

    pub fn selected_label(&self) -> String {
        match (self.selected_brand(), self.selected) {
            (Some(brand), _) => brand.display_name(),
            (None, Some(id)) => format!("Brand #{}", id),
            (None, None) => "no brand".to_string(),
        }
    }
}
