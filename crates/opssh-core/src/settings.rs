// ABOUTME: Settings for the importer, loaded from an optional TOML file.
// ABOUTME: Holds vault selection, field labels, export location and resolver policies.

use crate::error::{OpsshError, Result};
use crate::resolve::{LabelsAction, ResolvePolicy, UrlAction, UserAction};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Labels of the vault item fields the importer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub url: String,
    pub user: String,
    pub labels: String,
    pub public_key: String,
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            url: "URL".to_string(),
            user: "user".to_string(),
            labels: "labels".to_string(),
            public_key: "public key".to_string(),
        }
    }
}

impl FieldLabels {
    /// All labels in the order they are requested from the vault.
    pub fn all(&self) -> [&str; 4] {
        [
            self.url.as_str(),
            self.user.as_str(),
            self.labels.as_str(),
            self.public_key.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Vault CLI binary name or path
    pub op_binary: String,

    /// Vault to list items from
    pub vault: String,

    /// Comma-separated tags selecting SSH key items
    pub tags: String,

    /// Directory for exported public keys and the generated config (`~` allowed)
    pub export_dir: String,

    /// IdentityAgent written into every host block, if set
    pub identity_agent: Option<String>,

    /// User applied when `user_action = "default"`
    pub default_user: Option<String>,

    pub user_action: UserAction,
    pub url_action: UrlAction,
    pub labels_action: LabelsAction,

    pub fields: FieldLabels,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            op_binary: "op".to_string(),
            vault: "Personal".to_string(),
            tags: "SSH-Key,SSH-Keys".to_string(),
            export_dir: "~/.ssh/1password".to_string(),
            identity_agent: None,
            default_user: None,
            user_action: UserAction::default(),
            url_action: UrlAction::default(),
            labels_action: LabelsAction::default(),
            fields: FieldLabels::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OpsshError::ReadSettings {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| OpsshError::ParseSettings {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Get the default settings path (~/.config/opssh/config.toml).
    ///
    /// Uses `XDG_CONFIG_HOME` if set, otherwise falls back to `~/.config`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|p| p.join("opssh").join("config.toml"))
    }

    /// Export directory with `~` expanded.
    pub fn export_dir_expanded(&self) -> PathBuf {
        shellexpand::tilde(&self.export_dir).into_owned().into()
    }

    pub fn policy(&self) -> ResolvePolicy {
        ResolvePolicy {
            url: self.url_action,
            user: self.user_action,
            labels: self.labels_action,
            default_user: self.default_user.clone(),
        }
    }
}
