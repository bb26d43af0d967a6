use serde::{Deserialize, Serialize};

use crate::lookup::leaf_texts;
use crate::ProductRecord;

/// Keyword sets deciding which products are published.
///
/// All matching is unanchored, case-insensitive substring containment over
/// the whole field, so `"case"` also matches `"bookcase"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Only publish records whose stock entry is active.
    pub require_active: bool,
    /// The category type must contain at least one of these.
    pub accessory_keywords: Vec<String>,
    /// The category type must contain none of these.
    pub excluded_category_keywords: Vec<String>,
    /// Outlet and excluded-brand markers looked up in the code and the name.
    pub excluded_markers: Vec<String>,
    /// Looked up in the concatenated attribute values.
    pub excluded_material_keywords: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            require_active: false,
            accessory_keywords: to_strings(&["etui", "case", "szkło", "szklo", "glass", "pasek", "strap"]),
            excluded_category_keywords: to_strings(&["słuchawk", "laptop"]),
            excluded_markers: to_strings(&["outlet"]),
            excluded_material_keywords: to_strings(&["folia", "obiektyw"]),
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Why a record was kept out of the published set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Inactive,
    OutOfStock,
    NotAccessory,
    ExcludedCategory,
    ExcludedMarker,
    ExcludedMaterial,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    accessory: Vec<String>,
    excluded_category: Vec<String>,
    excluded_markers: Vec<String>,
    excluded_material: Vec<String>,
    require_active: bool,
}

impl Classifier {
    pub fn new(rules: &ClassifierRules) -> Self {
        Self {
            accessory: lowered(&rules.accessory_keywords),
            excluded_category: lowered(&rules.excluded_category_keywords),
            excluded_markers: lowered(&rules.excluded_markers),
            excluded_material: lowered(&rules.excluded_material_keywords),
            require_active: rules.require_active,
        }
    }

    pub fn is_published(&self, record: &ProductRecord) -> bool {
        self.check(record).is_ok()
    }

    /// Applies the rules in order and reports the first one that failed.
    pub fn check(&self, record: &ProductRecord) -> Result<(), Rejection> {
        if self.require_active && !record.active {
            return Err(Rejection::Inactive);
        }
        if record.stock_quantity == 0 {
            return Err(Rejection::OutOfStock);
        }

        let category = record.category_type.to_lowercase();
        if !contains_any(&category, &self.accessory) {
            return Err(Rejection::NotAccessory);
        }
        if contains_any(&category, &self.excluded_category) {
            return Err(Rejection::ExcludedCategory);
        }

        let ean = record.ean.to_lowercase();
        let name = record.name.to_lowercase();
        if contains_any(&ean, &self.excluded_markers) || contains_any(&name, &self.excluded_markers)
        {
            return Err(Rejection::ExcludedMarker);
        }

        let attribute_text = leaf_texts(&record.attributes).join(" ").to_lowercase();
        if contains_any(&attribute_text, &self.excluded_material) {
            return Err(Rejection::ExcludedMaterial);
        }

        Ok(())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierRules::default())
    }
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
