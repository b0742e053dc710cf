// ABOUTME: KeyRecord model and short-title derivation.
// ABOUTME: Sanitizes item titles into alias/file-safe names and keeps label sets ordered and unique.

use crate::vault::ItemSummary;
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Matches "ssh-key"/"ssh" runs and anything outside lowercase ASCII alphanumerics.
static STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ssh(-key)?|[^a-z0-9]+").expect("strip pattern is valid"));

/// Used when neither the title nor the item id leave anything behind.
const FALLBACK_SHORT_TITLE: &str = "key";

/// One SSH key item from the vault, enriched as the import progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// Vault item identifier.
    pub id: String,
    /// Display title as stored in the vault.
    pub title: String,
    /// Sanitized title, used as file stem and default alias.
    pub short_title: String,
    /// Host name or address to connect to.
    pub url: Option<String>,
    /// Login user name.
    pub user: Option<String>,
    /// Host aliases, in order, without duplicates.
    pub labels: Vec<String>,
    /// OpenSSH public key text. `None` when the item has no public key field.
    pub public_key: Option<String>,
    /// Where the public key was exported, once it has been.
    pub export_path: Option<PathBuf>,
}

impl KeyRecord {
    /// Create an unresolved record for a listed vault item.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        let title = title.into();
        let short_title = derive_short_title(&title, &id);
        Self {
            id,
            title,
            short_title,
            url: None,
            user: None,
            labels: Vec::new(),
            public_key: None,
            export_path: None,
        }
    }

    /// Default aliases for a record: its short title, then its URL if known.
    pub fn default_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        push_unique(&mut labels, &self.short_title);
        if let Some(url) = &self.url {
            push_unique(&mut labels, url);
        }
        labels
    }
}

impl From<&ItemSummary> for KeyRecord {
    fn from(item: &ItemSummary) -> Self {
        KeyRecord::new(item.id.clone(), item.title.clone())
    }
}

/// Sanitize a title: lowercase it, then drop "ssh"/"ssh-key" and every
/// character outside `a-z0-9`.
///
/// Removal repeats until nothing changes, since stripping can join fragments
/// into a new "ssh" (e.g. `"ss-h"`). The result is therefore idempotent.
pub fn short_title(title: &str) -> String {
    let mut current = title.to_lowercase();
    loop {
        let next = STRIP.replace_all(&current, "").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

fn derive_short_title(title: &str, id: &str) -> String {
    let from_title = short_title(title);
    if !from_title.is_empty() {
        return from_title;
    }
    let from_id = short_title(id);
    if !from_id.is_empty() {
        return from_id;
    }
    FALLBACK_SHORT_TITLE.to_string()
}

/// Split a label string on commas and whitespace, dropping empty tokens and
/// repeated labels.
pub fn parse_labels(input: &str) -> Vec<String> {
    let mut labels = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if !token.is_empty() {
            push_unique(&mut labels, token);
        }
    }
    labels
}

fn push_unique(labels: &mut Vec<String>, label: &str) {
    if !labels.iter().any(|existing| existing == label) {
        labels.push(label.to_string());
    }
}

/// Give every record a distinct short title by appending a counter to later
/// duplicates (`work`, `work2`, `work3`).
///
/// Runs before resolution so default aliases and file names agree.
pub fn make_short_titles_unique(records: &mut [KeyRecord]) {
    let mut taken: HashSet<String> = HashSet::new();
    for record in records.iter_mut() {
        if taken.insert(record.short_title.clone()) {
            continue;
        }
        let mut counter = 2;
        let unique = loop {
            let candidate = format!("{}{}", record.short_title, counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
            counter += 1;
        };
        tracing::warn!(
            title = %record.title,
            short_title = %record.short_title,
            renamed = %unique,
            "short title already in use"
        );
        taken.insert(unique.clone());
        record.short_title = unique;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_example() {
        assert_eq!(short_title("My-SSH-Key: prod db"), "myproddb");
    }

    #[test]
    fn test_short_title_strips_plain_ssh() {
        assert_eq!(short_title("GitHub SSH"), "github");
        assert_eq!(short_title("ssh key work"), "keywork");
    }

    #[test]
    fn test_short_title_keeps_digits() {
        assert_eq!(short_title("Server 01"), "server01");
    }

    #[test]
    fn test_short_title_drops_non_ascii() {
        assert_eq!(short_title("Bücher-Server"), "bcherserver");
    }

    #[test]
    fn test_short_title_is_idempotent() {
        for title in [
            "My-SSH-Key: prod db",
            "ss-h",
            "sssshh",
            "SSH-Key",
            "s.s.h-key host",
            "Raspberry Pi (home)",
            "",
        ] {
            let once = short_title(title);
            assert_eq!(short_title(&once), once, "title {:?}", title);
        }
    }

    #[test]
    fn test_short_title_collapses_rejoined_ssh() {
        assert_eq!(short_title("ss-h"), "");
        assert_eq!(short_title("sssshh"), "");
    }

    #[test]
    fn test_new_record_falls_back_to_id() {
        let record = KeyRecord::new("AbC123", "SSH-Key");
        assert_eq!(record.short_title, "abc123");
    }

    #[test]
    fn test_new_record_last_resort_short_title() {
        let record = KeyRecord::new("--", "ssh");
        assert_eq!(record.short_title, "key");
    }

    #[test]
    fn test_parse_labels_commas_and_spaces() {
        assert_eq!(
            parse_labels("db, prod  db.example.com,,"),
            vec!["db", "prod", "db.example.com"]
        );
    }

    #[test]
    fn test_parse_labels_empty() {
        assert!(parse_labels("  , ,").is_empty());
    }

    #[test]
    fn test_parse_labels_drops_duplicates() {
        assert_eq!(parse_labels("a b a,b c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_default_labels_with_url() {
        let mut record = KeyRecord::new("id1", "Prod DB");
        record.url = Some("db.example.com".to_string());
        assert_eq!(record.default_labels(), vec!["proddb", "db.example.com"]);
    }

    #[test]
    fn test_default_labels_without_url() {
        let record = KeyRecord::new("id1", "Prod DB");
        assert_eq!(record.default_labels(), vec!["proddb"]);
    }

    #[test]
    fn test_default_labels_url_equal_to_short_title() {
        let mut record = KeyRecord::new("id1", "nas");
        record.url = Some("nas".to_string());
        assert_eq!(record.default_labels(), vec!["nas"]);
    }

    #[test]
    fn test_make_short_titles_unique() {
        let mut records = vec![
            KeyRecord::new("1", "Work"),
            KeyRecord::new("2", "work ssh"),
            KeyRecord::new("3", "Work2"),
            KeyRecord::new("4", "WORK"),
        ];
        make_short_titles_unique(&mut records);
        let titles: Vec<_> = records.iter().map(|r| r.short_title.as_str()).collect();
        assert_eq!(titles, vec!["work", "work2", "work22", "work3"]);
    }

    #[test]
    fn test_record_from_item_summary() {
        let item = ItemSummary {
            id: "xyz".to_string(),
            title: "Home NAS".to_string(),
            tags: vec!["SSH-Key".to_string()],
        };
        let record = KeyRecord::from(&item);
        assert_eq!(record.id, "xyz");
        assert_eq!(record.short_title, "homenas");
        assert!(record.labels.is_empty());
    }
}
