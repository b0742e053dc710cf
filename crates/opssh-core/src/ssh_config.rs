// ABOUTME: SSH client config generation from resolved key records.
// ABOUTME: Renders Host blocks in a fixed directive order and checks ~/.ssh/config for the Include line.

use crate::error::{OpsshError, Result};
use crate::record::KeyRecord;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// File name of the generated config inside the export directory.
pub const CONFIG_FILE_NAME: &str = "config";

/// Comment lines at the top of every generated config.
pub const HEADER: &str = "\
# This file was generated by opssh from your password manager's SSH keys.
# Manual changes to this file will be overwritten the next time opssh runs.
";

/// Default 1Password SSH agent socket for the current platform.
pub fn default_identity_agent() -> &'static str {
    if cfg!(target_os = "macos") {
        "~/Library/Group Containers/2BUA8C4S2C.com.1password/t/agent.sock"
    } else if cfg!(windows) {
        r"\\.\pipe\openssh-ssh-agent"
    } else {
        "~/.1password/agent.sock"
    }
}

/// Quote a directive argument if it contains whitespace.
fn quote(value: &str) -> Cow<'_, str> {
    if value.chars().any(char::is_whitespace) {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render the Host block for one record, or `None` if it would contain
/// nothing beyond the Host line.
///
/// Directive order: HostName, IdentityFile + IdentitiesOnly, User, IdentityAgent.
pub fn render_host_block(record: &KeyRecord, identity_agent: Option<&str>) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();

    if let Some(url) = &record.url {
        lines.push(format!("  HostName {}", quote(url)));
    }
    if let Some(path) = &record.export_path {
        lines.push(format!(
            "  IdentityFile {}",
            quote(&path.display().to_string())
        ));
        lines.push("  IdentitiesOnly yes".to_string());
    }
    if let Some(user) = &record.user {
        lines.push(format!("  User {}", quote(user)));
    }
    if let Some(agent) = identity_agent {
        lines.push(format!("  IdentityAgent {}", quote(agent)));
    }

    if lines.is_empty() {
        return None;
    }

    let mut block = format!("Host {}\n", record.labels.join(" "));
    for line in lines {
        block.push_str(&line);
        block.push('\n');
    }
    Some(block)
}

/// Render the whole config file. Records keep their order, so unchanged
/// input renders to identical bytes.
pub fn render_config(records: &[KeyRecord], identity_agent: Option<&str>) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for block in records
        .iter()
        .filter_map(|record| render_host_block(record, identity_agent))
    {
        out.push_str(&block);
        out.push('\n');
    }
    out
}

/// Write rendered config text to `path`.
pub fn write_config(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents.as_bytes()).map_err(|e| OpsshError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Path of the user's main SSH client config (~/.ssh/config).
pub fn user_ssh_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".ssh").join("config"))
}

/// The line to put at the top of ~/.ssh/config to pull in the generated file.
pub fn include_line(generated: &Path) -> String {
    format!("Include {}", quote(&generated.display().to_string()))
}

/// Whether `ssh_config` (the text of ~/.ssh/config) already has an Include
/// directive naming `generated`: verbatim, as `~/...` under `home`, or as a
/// relative path, which ssh resolves against `~/.ssh`.
pub fn has_include(ssh_config: &str, generated: &Path, home: Option<&Path>) -> bool {
    let absolute = generated.display().to_string();
    let tilde = home
        .and_then(|home| generated.strip_prefix(home).ok())
        .map(|rest| format!("~/{}", rest.display()));
    let relative = home
        .and_then(|home| generated.strip_prefix(home.join(".ssh")).ok())
        .map(|rest| rest.display().to_string());

    ssh_config.lines().any(|line| {
        let line = line.trim();
        let Some((keyword, args)) = line.split_once(|c: char| c.is_whitespace() || c == '=')
        else {
            return false;
        };
        if !keyword.eq_ignore_ascii_case("include") {
            return false;
        }
        split_args(args.trim_start_matches(|c: char| c.is_whitespace() || c == '='))
            .iter()
            .any(|arg| {
                *arg == absolute
                    || tilde.as_deref() == Some(arg.as_str())
                    || relative.as_deref() == Some(arg.as_str())
            })
    })
}

/// Split directive arguments on whitespace, honouring double quotes.
fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in args.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
