// ABOUTME: Vault CLI access: listing tagged SSH key items and fetching their fields.
// ABOUTME: Shells out to the 1Password `op` binary and parses its JSON output.

use crate::error::{OpsshError, Result};
use crate::settings::FieldLabels;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::process::{Command, Stdio};

/// An item as returned by the vault's list command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Field label to value, for the fields of one item that carry a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `label`, or `None` if absent or blank.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .get(label)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.0.insert(label.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

/// Access to the secrets vault.
pub trait Vault {
    /// List the items tagged as SSH keys. Failure here aborts the import.
    fn list_items(&self) -> Result<Vec<ItemSummary>>;

    /// Fetch the fields of one item. Failure here only skips that item.
    fn item_fields(&self, id: &str) -> Result<FieldMap>;
}

/// The 1Password command line client.
#[derive(Debug, Clone)]
pub struct OpCli {
    binary: String,
    vault: String,
    tags: String,
    fields: FieldLabels,
}

impl OpCli {
    pub fn new(
        binary: impl Into<String>,
        vault: impl Into<String>,
        tags: impl Into<String>,
        fields: FieldLabels,
    ) -> Self {
        Self {
            binary: binary.into(),
            vault: vault.into(),
            tags: tags.into(),
            fields,
        }
    }

    fn list_args(&self) -> Vec<String> {
        let mut args = vec!["item".to_string(), "list".to_string()];
        if !self.vault.is_empty() {
            args.push(format!("--vault={}", self.vault));
        }
        if !self.tags.is_empty() {
            args.push(format!("--tags={}", self.tags));
        }
        args.push("--format=json".to_string());
        args
    }

    fn get_args(&self, id: &str) -> Vec<String> {
        let selector = self
            .fields
            .all()
            .iter()
            .map(|label| format!("label={label}"))
            .collect::<Vec<_>>()
            .join(",");

        let mut args = vec!["item".to_string(), "get".to_string(), id.to_string()];
        if !self.vault.is_empty() {
            args.push(format!("--vault={}", self.vault));
        }
        args.push(format!("--fields={selector}"));
        args.push("--format=json".to_string());
        args
    }

    /// Run the CLI and return its stdout. Stdin stays attached so `op` can
    /// ask for a sign-in if its session expired.
    fn run(&self, args: &[String]) -> Result<Vec<u8>> {
        let command_line = format!("{} {}", self.binary, args.join(" "));
        tracing::debug!(command = %command_line, "running vault CLI");

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|e| OpsshError::Spawn {
                program: self.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(OpsshError::CommandFailed {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Vault for OpCli {
    fn list_items(&self) -> Result<Vec<ItemSummary>> {
        let stdout = self.run(&self.list_args())?;
        parse_item_list(&stdout)
    }

    fn item_fields(&self, id: &str) -> Result<FieldMap> {
        let stdout = self.run(&self.get_args(id))?;
        parse_fields(&stdout)
    }
}

/// Parse the JSON array printed by `op item list`. Empty output means no items.
pub fn parse_item_list(json: &[u8]) -> Result<Vec<ItemSummary>> {
    if is_blank(json) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(json).map_err(|e| OpsshError::ParseJson {
        what: "item list",
        source: e,
    })
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    #[serde(default)]
    label: String,
    #[serde(default)]
    value: Option<String>,
}

/// `op item get --fields` prints an array, or a bare object when exactly one
/// field matched.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldsOutput {
    Many(Vec<FieldEntry>),
    One(FieldEntry),
}

/// Parse the JSON printed by `op item get --fields ... --format=json`.
pub fn parse_fields(json: &[u8]) -> Result<FieldMap> {
    if is_blank(json) {
        return Ok(FieldMap::new());
    }
    let output: FieldsOutput = serde_json::from_slice(json).map_err(|e| OpsshError::ParseJson {
        what: "item fields",
        source: e,
    })?;

    let entries = match output {
        FieldsOutput::Many(entries) => entries,
        FieldsOutput::One(entry) => vec![entry],
    };

    Ok(entries
        .into_iter()
        .filter(|entry| !entry.label.is_empty())
        .filter_map(|entry| entry.value.map(|value| (entry.label, value)))
        .collect())
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
