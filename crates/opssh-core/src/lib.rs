// ABOUTME: SSH key import from a password manager CLI into ~/.ssh.
// ABOUTME: Exports public keys and generates an Include-able SSH client config.

//! # opssh-core
//!
//! Lists SSH key items from the 1Password CLI (`op`), fills in host name,
//! user and aliases for each, exports the public keys and writes an SSH
//! client config with one `Host` block per key.
//!
//! ```text
//! Vault::list_items ─▶ FieldResolver::resolve (per item) ─▶ KeyExporter::export ─▶ render_config
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use opssh_core::{run_import, FieldResolver, KeyExporter, OpCli, Settings, TerminalPrompter};
//!
//! # fn main() -> opssh_core::Result<()> {
//! let settings = Settings::default();
//! let vault = OpCli::new(&settings.op_binary, &settings.vault, &settings.tags, settings.fields.clone());
//! let mut resolver = FieldResolver::new(settings.policy(), settings.fields.clone(), TerminalPrompter);
//! let exporter = KeyExporter::new(settings.export_dir_expanded());
//! let report = run_import(&vault, &mut resolver, &exporter, None)?;
//! println!("{} hosts written to {}", report.hosts, report.config_path.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod fingerprint;
pub mod import;
pub mod record;
pub mod resolve;
pub mod settings;
pub mod ssh_config;
pub mod vault;

pub use error::{OpsshError, Result};
pub use export::KeyExporter;
pub use fingerprint::compute_fingerprint;
pub use import::{load_records, run_import, ImportReport, SkippedItem};
pub use record::{parse_labels, short_title, KeyRecord};
pub use resolve::{
    FieldResolver, LabelsAction, Prompter, ResolvePolicy, TerminalPrompter, UrlAction, UserAction,
};
pub use settings::{FieldLabels, Settings};
pub use ssh_config::{default_identity_agent, has_include, include_line, render_config};
pub use vault::{FieldMap, ItemSummary, OpCli, Vault};
