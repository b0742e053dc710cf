// ABOUTME: The import pipeline: list, resolve, export, write config.
// ABOUTME: Listing failures abort the run; a failed per-item fetch only drops that item.

use crate::error::Result;
use crate::export::KeyExporter;
use crate::record::{make_short_titles_unique, KeyRecord};
use crate::resolve::{FieldResolver, Prompter};
use crate::ssh_config::{render_config, write_config, CONFIG_FILE_NAME};
use crate::vault::Vault;
use std::path::PathBuf;

/// A vault item that was listed but could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub id: String,
    pub title: String,
    pub reason: String,
}

/// What an import run did.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Records that made it through resolution, in listing order.
    pub records: Vec<KeyRecord>,
    pub skipped: Vec<SkippedItem>,
    pub exported: usize,
    pub hosts: usize,
    pub config_path: PathBuf,
}

/// List the vault's SSH key items and resolve each one.
///
/// Items whose fields cannot be fetched are returned as skipped. Errors from
/// listing or from prompting are returned as-is.
pub fn load_records<V, P>(
    vault: &V,
    resolver: &mut FieldResolver<P>,
) -> Result<(Vec<KeyRecord>, Vec<SkippedItem>)>
where
    V: Vault + ?Sized,
    P: Prompter,
{
    let items = vault.list_items()?;
    tracing::info!(count = items.len(), "listed SSH key items");

    let mut records = Vec::with_capacity(items.len());
    let mut fetched = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();
    for item in &items {
        match vault.item_fields(&item.id) {
            Ok(fields) => {
                records.push(KeyRecord::from(item));
                fetched.push(fields);
            }
            Err(e) => {
                tracing::warn!(title = %item.title, error = %e, "skipping item");
                skipped.push(SkippedItem {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // Only items that made it through the fetch compete for short titles
    make_short_titles_unique(&mut records);

    let mut resolved = Vec::with_capacity(records.len());
    for (mut record, fields) in records.into_iter().zip(fetched) {
        resolver.resolve(&mut record, &fields)?;
        tracing::info!(title = %record.title, aliases = %record.labels.join(" "), "loaded item");
        resolved.push(record);
    }
    Ok((resolved, skipped))
}

/// Run the whole import: list and resolve, export public keys, write the
/// config file into the exporter's directory.
pub fn run_import<V, P>(
    vault: &V,
    resolver: &mut FieldResolver<P>,
    exporter: &KeyExporter,
    identity_agent: Option<&str>,
) -> Result<ImportReport>
where
    V: Vault + ?Sized,
    P: Prompter,
{
    let (mut records, skipped) = load_records(vault, resolver)?;

    let exported = exporter.export(&mut records)?;

    let config = render_config(&records, identity_agent);
    let config_path = exporter.dir().join(CONFIG_FILE_NAME);
    write_config(&config_path, &config)?;
    let hosts = config.lines().filter(|l| l.starts_with("Host ")).count();
    tracing::info!(path = %config_path.display(), hosts, "wrote SSH config");

    Ok(ImportReport {
        records,
        skipped,
        exported,
        hosts,
        config_path,
    })
}
