use crate::{Classifier, ProductRecord};

/// Column order of the published sheet.
pub const PUBLISHED_HEADER: [&str; 8] = [
    "EAN",
    "Nazwa",
    "ID produktu",
    "Link do edycji",
    "Typ produktu",
    "Wymiary (atrybuty)",
    "Wymiary (opis)",
    "Opis",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRow {
    pub ean: String,
    pub name: String,
    pub product_id: i64,
    pub edit_link: String,
    pub category_type: String,
    pub dimensions_attribute: String,
    pub dimensions_description: String,
    pub description: String,
}

impl PublishedRow {
    pub fn from_record(record: &ProductRecord, site_url: &str) -> Self {
        Self {
            ean: record.ean.clone(),
            name: record.name.clone(),
            product_id: record.product_id,
            edit_link: edit_link(site_url, record.product_id),
            category_type: record.category_type.clone(),
            dimensions_attribute: record.dimensions_attribute.clone(),
            dimensions_description: record.dimensions_description.clone(),
            description: record.clean_description.clone(),
        }
    }

    /// Cell texts in [`PUBLISHED_HEADER`] order.
    pub fn values(&self) -> Vec<String> {
        vec![
            self.ean.clone(),
            self.name.clone(),
            self.product_id.to_string(),
            self.edit_link.clone(),
            self.category_type.clone(),
            self.dimensions_attribute.clone(),
            self.dimensions_description.clone(),
            self.description.clone(),
        ]
    }
}

/// Admin panel link for one product.
pub fn edit_link(site_url: &str, product_id: i64) -> String {
    format!(
        "{}/admin/products/edit/id/{product_id}",
        site_url.trim_end_matches('/')
    )
}

/// Header plus text rows, ready for a bulk replace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishedSheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PublishedSheet {
    pub fn from_rows(rows: &[PublishedRow]) -> Self {
        Self {
            header: PUBLISHED_HEADER.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(PublishedRow::values).collect(),
        }
    }

    /// Header first, then data rows.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keeps the records accepted by `classifier`, preserving input order.
///
/// Records are expected to be enriched already; see
/// [`crate::DimensionResolver::enrich`].
pub fn assemble_rows(
    records: &[ProductRecord],
    classifier: &Classifier,
    site_url: &str,
) -> Vec<PublishedRow> {
    records
        .iter()
        .filter(|record| classifier.is_published(record))
        .map(|record| PublishedRow::from_record(record, site_url))
        .collect()
}
