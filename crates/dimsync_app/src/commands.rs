use std::path::PathBuf;

use anyhow::{bail, Context};
use dimsync_core::{normalize, DimensionResolver};
use dimsync_engine::{
    CsvSheetWriter, GoogleSheetsWriter, Pipeline, ProductSource, Resource, RetryingSink,
    ShopClient, Sink, SnapshotStore,
};
use dimsync_logging::dimsync_info;

use crate::config::{env_var, AppConfig, SiteAccess};

/// Single-product lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    Code(String),
    Id(i64),
}

fn client(config: &AppConfig, access: &SiteAccess) -> anyhow::Result<ShopClient> {
    let client = ShopClient::new(
        &access.site_url,
        access.credentials.clone(),
        config.fetch_settings(),
    )?;
    Ok(client)
}

async fn connected_client(config: &AppConfig, access: &SiteAccess) -> anyhow::Result<ShopClient> {
    let mut client = client(config, access)?;
    client.connect().await?;
    Ok(client)
}

fn pipeline(config: &AppConfig, access: &SiteAccess, client: ShopClient) -> Pipeline<ShopClient> {
    Pipeline::new(
        client,
        SnapshotStore::new(&config.sheets_dir),
        config.pipeline_config(&access.site_url),
    )
}

fn sink(config: &AppConfig, csv: Option<PathBuf>) -> anyhow::Result<Box<dyn Sink>> {
    let retry = config.retry_settings();
    if let Some(path) = csv {
        return Ok(Box::new(RetryingSink::new(CsvSheetWriter::new(path), retry)));
    }
    if config.sheet.sheet_id.is_empty() {
        bail!("sheet.sheet_id is not configured; pass --csv to export to a file instead");
    }
    let token = env_var(&config.sheet.token_env)?;
    let writer = GoogleSheetsWriter::new(&config.sheet.sheet_id, &config.sheet.sheet_name, token);
    Ok(Box::new(RetryingSink::new(writer, retry)))
}

/// Downloads `resources` and refreshes their snapshots.
pub async fn fetch(config: &AppConfig, resources: &[Resource]) -> anyhow::Result<()> {
    let access = SiteAccess::from_env(&config.site)?;
    let client = connected_client(config, &access).await?;
    let pipeline = pipeline(config, &access, client);

    for resource in resources {
        let records = pipeline.fetch_resource(*resource).await?;
        println!(
            "{}: {} records saved to {:?}",
            resource,
            records.len(),
            pipeline.store().path_for(*resource)
        );
    }
    Ok(())
}

/// Publishes the classified products. Returns whether the sink accepted
/// the sheet.
pub async fn export(config: &AppConfig, offline: bool, csv: Option<PathBuf>) -> anyhow::Result<bool> {
    let access = if offline {
        SiteAccess::offline_from_env(&config.site)?
    } else {
        SiteAccess::from_env(&config.site)?
    };
    let sink = sink(config, csv)?;

    let (client, from) = if offline {
        (client(config, &access)?, ProductSource::Snapshot)
    } else {
        (connected_client(config, &access).await?, ProductSource::Network)
    };
    let pipeline = pipeline(config, &access, client);

    let summary = pipeline
        .export(from, sink.as_ref())
        .await
        .context("export failed")?;

    if summary.saved {
        println!(
            "Published {} of {} products.",
            summary.published, summary.fetched
        );
    } else {
        println!(
            "Could not save {} products to the sheet; see the log for details.",
            summary.published
        );
    }
    Ok(summary.saved)
}

/// Prints one product with its resolved dimensions.
pub async fn lookup(config: &AppConfig, target: LookupTarget) -> anyhow::Result<()> {
    let access = SiteAccess::from_env(&config.site)?;
    let client = connected_client(config, &access).await?;

    let raw = match &target {
        LookupTarget::Code(code) => client.find_product_by_code(code).await?,
        LookupTarget::Id(id) => Some(client.get_product(*id).await?),
    };
    let Some(raw) = raw else {
        println!("X | Product {target:?} doesn't exist");
        return Ok(());
    };

    let mut record = normalize(&raw, &config.normalize);
    DimensionResolver::new(config.dimensions.clone()).enrich(&mut record);
    dimsync_info!("Looked up product {}", record.product_id);

    println!("EAN:              {}", record.ean);
    println!("Name:             {}", record.name);
    println!("Product id:       {}", record.product_id);
    println!("Stock:            {}", record.stock_quantity);
    println!("Added:            {}", record.add_date_text());
    println!("Product type:     {}", record.category_type);
    println!("Dims (attribute): {}", record.dimensions_attribute);
    println!("Dims (text):      {}", record.dimensions_description);
    println!(
        "Attributes:       {}",
        serde_json::to_string_pretty(&record.attributes)?
    );
    Ok(())
}
