// ABOUTME: Error types for the importer using thiserror.
// ABOUTME: Provides typed errors for vault CLI calls, settings, prompts and file output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while importing keys and writing the SSH config.
#[derive(Error, Debug)]
pub enum OpsshError {
    /// The vault CLI could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The vault CLI ran but exited unsuccessfully.
    #[error("`{command}` exited with {}: {stderr}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The vault CLI printed something that is not the JSON we expect.
    #[error("failed to parse {what} from vault CLI output: {source}")]
    ParseJson {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to read the settings file.
    #[error("failed to read settings from {path}: {source}")]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the settings file.
    #[error("failed to parse settings from {path}: {source}")]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to parse public key text as an OpenSSH public key.
    #[error("failed to parse public key: {0}")]
    ParsePublicKey(#[source] ssh_key::Error),

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set file permissions.
    #[error("failed to set permissions on {path}: {source}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an answer from the terminal failed.
    #[error("failed to read answer from terminal: {0}")]
    Prompt(#[source] std::io::Error),

    /// `default` user policy selected without a user name to apply.
    #[error("user action 'default' requires a default user name (--user)")]
    MissingDefaultUser,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Result type alias using OpsshError.
pub type Result<T> = std::result::Result<T, OpsshError>;
