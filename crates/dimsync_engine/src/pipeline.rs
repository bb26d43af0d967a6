use dimsync_core::{
    assemble_rows, normalize_all, Classifier, ClassifierRules, DimensionResolver, DimensionRules,
    NormalizeOptions, PublishedSheet,
};
use dimsync_logging::{dimsync_info, dimsync_warn};
use serde_json::Value;
use thiserror::Error;

use crate::fetch::CatalogSource;
use crate::sink::Sink;
use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::{FetchError, Resource};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Shop root used for admin links.
    pub site_url: String,
    pub page_limit: u32,
    pub normalize: NormalizeOptions,
    pub dimensions: DimensionRules,
    pub classifier: ClassifierRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            page_limit: 50,
            normalize: NormalizeOptions::default(),
            dimensions: DimensionRules::default(),
            classifier: ClassifierRules::default(),
        }
    }
}

/// Where `export` takes product records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSource {
    /// Fetch all pages now and refresh the snapshot.
    Network,
    /// Reuse the last products snapshot.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub fetched: usize,
    pub published: usize,
    pub saved: bool,
}

pub struct Pipeline<S> {
    source: S,
    store: SnapshotStore,
    config: PipelineConfig,
    resolver: DimensionResolver,
    classifier: Classifier,
}

impl<S: CatalogSource> Pipeline<S> {
    pub fn new(source: S, store: SnapshotStore, config: PipelineConfig) -> Self {
        let resolver = DimensionResolver::new(config.dimensions.clone());
        let classifier = Classifier::new(&config.classifier);
        Self {
            source,
            store,
            config,
            resolver,
            classifier,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Fetches every page of `resource` and replaces its snapshot.
    ///
    /// Nothing is written when any page fails.
    pub async fn fetch_resource(&self, resource: Resource) -> Result<Vec<Value>, PipelineError> {
        let records = self
            .source
            .fetch_all(resource, self.config.page_limit)
            .await?;
        self.store.write(resource, &records)?;
        Ok(records)
    }

    /// Normalizes, enriches and filters raw product records.
    pub fn build_sheet(&self, raw: &[Value]) -> PublishedSheet {
        let mut records = normalize_all(raw, &self.config.normalize);
        for record in &mut records {
            self.resolver.enrich(record);
        }
        let rows = assemble_rows(&records, &self.classifier, &self.config.site_url);
        PublishedSheet::from_rows(&rows)
    }

    pub async fn export(
        &self,
        from: ProductSource,
        sink: &dyn Sink,
    ) -> Result<ExportSummary, PipelineError> {
        let raw = match from {
            ProductSource::Network => self.fetch_resource(Resource::Products).await?,
            ProductSource::Snapshot => self.store.read(Resource::Products)?,
        };

        let sheet = self.build_sheet(&raw);
        dimsync_info!(
            "{} of {} products qualify for publishing",
            sheet.len(),
            raw.len()
        );

        let saved = sink.save(&sheet).await;
        if !saved {
            dimsync_warn!("Published sheet was not saved");
        }

        Ok(ExportSummary {
            fetched: raw.len(),
            published: sheet.len(),
            saved,
        })
    }
}
