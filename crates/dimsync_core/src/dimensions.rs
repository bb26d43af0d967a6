use lazy_regex::{lazy_regex, Lazy, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookup::attribute_value;
use crate::markup::strip_markup;
use crate::ProductRecord;

/// Group / field identifier pair inside a product attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeKey {
    pub group: String,
    pub field: String,
}

impl AttributeKey {
    pub fn new(group: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            field: field.into(),
        }
    }
}

/// Ordered attribute candidates for each measured side. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionRules {
    pub length: Vec<AttributeKey>,
    pub height: Vec<AttributeKey>,
}

impl Default for DimensionRules {
    fn default() -> Self {
        Self {
            length: vec![AttributeKey::new("552", "1191"), AttributeKey::new("555", "1207")],
            height: vec![AttributeKey::new("552", "1196"), AttributeKey::new("555", "1208")],
        }
    }
}

/// Output of [`DimensionResolver::find_dimensions_description`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimensionResult {
    /// `""` when no pattern matched.
    pub dimensions: String,
    pub clean_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedDimensions {
    pub attribute: String,
    pub description: String,
    pub clean_description: String,
}

/// One step of the description cascade. Every capture group is a side.
struct DescriptionRule {
    name: &'static str,
    pattern: &'static Lazy<Regex>,
}

static THREE_SPACED: Lazy<Regex> = lazy_regex!(
    r"(?i)(\d+(?:[.,]\d+)?)\s*(?:cm|mm)?(?:\s*,\s*|\s+)(\d+(?:[.,]\d+)?)\s*(?:cm|mm)?(?:\s*,\s*|\s+)(\d+(?:[.,]\d+)?)"
);
static THREE_CROSSED: Lazy<Regex> = lazy_regex!(
    r"(?i)(\d+(?:[.,]\d+)?)\s*(?:cm|mm)?\s*[x×-]\s*(\d+(?:[.,]\d+)?)\s*(?:cm|mm)?\s*[x×-]\s*(\d+(?:[.,]\d+)?)"
);
static LENGTH_WIDTH_LABELS: Lazy<Regex> = lazy_regex!(
    r"(?i)(?:długość|dlugosc|length)\s*:?\s*(\d+(?:[.,]\d+)?).*?(?:szerokość|szerokosc|width)\s*:?\s*(\d+(?:[.,]\d+)?)"
);
static AXIS_LABELS: Lazy<Regex> =
    lazy_regex!(r"X-[^:]*:\s*(\d+(?:[.,]\d+)?).*?Y-[^:]*:\s*(\d+(?:[.,]\d+)?)");
static TWO_CROSSED: Lazy<Regex> =
    lazy_regex!(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:cm|mm)?\s*[x×-]\s*(\d+(?:[.,]\d+)?)");

/// Most specific first; the first rule that matches decides.
static DESCRIPTION_RULES: [DescriptionRule; 5] = [
    DescriptionRule {
        name: "three_spaced",
        pattern: &THREE_SPACED,
    },
    DescriptionRule {
        name: "three_crossed",
        pattern: &THREE_CROSSED,
    },
    DescriptionRule {
        name: "length_width_labels",
        pattern: &LENGTH_WIDTH_LABELS,
    },
    DescriptionRule {
        name: "axis_labels",
        pattern: &AXIS_LABELS,
    },
    DescriptionRule {
        name: "two_crossed",
        pattern: &TWO_CROSSED,
    },
];

/// Runs the description cascade over plain text.
///
/// Returns the name of the rule that fired and the `a x b [x c]` string.
/// Numbers are copied verbatim, decimal commas included.
pub fn match_description(text: &str) -> Option<(&'static str, String)> {
    DESCRIPTION_RULES.iter().find_map(|rule| {
        let caps = rule.pattern.captures(text)?;
        let sides: Vec<&str> = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .collect();
        Some((rule.name, sides.join(" x ")))
    })
}

#[derive(Debug, Clone, Default)]
pub struct DimensionResolver {
    rules: DimensionRules,
}

impl DimensionResolver {
    pub fn new(rules: DimensionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &DimensionRules {
        &self.rules
    }

    /// `"{length} x {height}"` from structured attributes, or `""` unless
    /// both sides are present.
    pub fn find_dimensions_attribute(&self, attributes: &Value) -> String {
        let length = first_present(attributes, &self.rules.length);
        let height = first_present(attributes, &self.rules.height);
        match (length, height) {
            (Some(length), Some(height)) => format!("{length} x {height}"),
            _ => String::new(),
        }
    }

    pub fn find_dimensions_description(&self, description_html: &str) -> DimensionResult {
        let clean_description = strip_markup(description_html);
        let dimensions = match_description(&clean_description)
            .map(|(_, dims)| dims)
            .unwrap_or_default();
        DimensionResult {
            dimensions,
            clean_description,
        }
    }

    pub fn resolve(&self, attributes: &Value, description_html: &str) -> ResolvedDimensions {
        let DimensionResult {
            dimensions,
            clean_description,
        } = self.find_dimensions_description(description_html);
        ResolvedDimensions {
            attribute: self.find_dimensions_attribute(attributes),
            description: dimensions,
            clean_description,
        }
    }

    /// Stores the resolved dimensions on `record`.
    pub fn enrich(&self, record: &mut ProductRecord) {
        let resolved = self.resolve(&record.attributes, &record.description_html);
        record.dimensions_attribute = resolved.attribute;
        record.dimensions_description = resolved.description;
        record.clean_description = resolved.clean_description;
    }
}

fn first_present(attributes: &Value, candidates: &[AttributeKey]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| attribute_value(attributes, &key.group, &key.field))
}
