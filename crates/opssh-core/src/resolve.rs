// ABOUTME: Field resolution for vault items: URL, user, labels and public key.
// ABOUTME: Applies the configured prompt/leave-empty/default policy to missing fields.

use crate::error::{OpsshError, Result};
use crate::record::{parse_labels, KeyRecord};
use crate::settings::FieldLabels;
use crate::vault::FieldMap;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

/// What to do when an item has no URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UrlAction {
    /// Ask on the terminal
    Prompt,
    /// Emit no HostName
    #[default]
    LeaveEmpty,
}

/// What to do when an item has no user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UserAction {
    /// Ask on the terminal
    Prompt,
    /// Emit no User line
    #[default]
    LeaveEmpty,
    /// Use the configured default user
    Default,
}

/// What to do when an item has no labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LabelsAction {
    /// Ask on the terminal for a comma/space separated list
    Prompt,
    /// Use the short title and the URL
    #[default]
    Default,
}

/// The defaulting policy for missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub url: UrlAction,
    pub user: UserAction,
    pub labels: LabelsAction,
    pub default_user: Option<String>,
}

impl ResolvePolicy {
    /// Reject combinations that cannot be applied, before any item is fetched.
    pub fn validate(&self) -> Result<()> {
        let has_default_user = self
            .default_user
            .as_deref()
            .is_some_and(|user| !user.trim().is_empty());
        if self.user == UserAction::Default && !has_default_user {
            return Err(OpsshError::MissingDefaultUser);
        }
        Ok(())
    }
}

/// Source of interactive answers.
pub trait Prompter {
    /// Ask `question` and return the raw answer line.
    fn ask(&mut self, question: &str) -> Result<String>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, question: &str) -> Result<String> {
        (**self).ask(question)
    }
}

/// Prompts on stdout and reads answers from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        println!("{question}");
        print!(">>> ");
        io::stdout().flush().map_err(OpsshError::Prompt)?;

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(OpsshError::Prompt)?;
        Ok(input)
    }
}

/// Fills a record's URL, user, labels and public key from its fetched
/// fields, falling back to the policy for whatever is missing.
pub struct FieldResolver<P> {
    policy: ResolvePolicy,
    labels: FieldLabels,
    prompter: P,
}

impl<P: Prompter> FieldResolver<P> {
    pub fn new(policy: ResolvePolicy, labels: FieldLabels, prompter: P) -> Self {
        Self {
            policy,
            labels,
            prompter,
        }
    }

    /// Resolve all fields of `record`. Afterwards `record.labels` is never empty.
    pub fn resolve(&mut self, record: &mut KeyRecord, fields: &FieldMap) -> Result<()> {
        record.url = self.resolve_url(record, fields)?;
        record.user = self.resolve_user(record, fields)?;
        record.labels = self.resolve_labels(record, fields)?;
        record.public_key = fields
            .get(&self.labels.public_key)
            .map(|key| key.trim().to_string());
        Ok(())
    }

    fn resolve_url(&mut self, record: &KeyRecord, fields: &FieldMap) -> Result<Option<String>> {
        if let Some(url) = fields.get(&self.labels.url) {
            return Ok(Some(url.trim().to_string()));
        }
        match self.policy.url {
            UrlAction::LeaveEmpty => Ok(None),
            UrlAction::Prompt => {
                let question = format!(
                    "Host name for {:?} (press enter to leave empty)",
                    record.title
                );
                self.ask_optional(&question)
            }
        }
    }

    fn resolve_user(&mut self, record: &KeyRecord, fields: &FieldMap) -> Result<Option<String>> {
        if let Some(user) = fields.get(&self.labels.user) {
            return Ok(Some(user.trim().to_string()));
        }
        match self.policy.user {
            UserAction::LeaveEmpty => Ok(None),
            UserAction::Default => Ok(self
                .policy
                .default_user
                .as_deref()
                .map(str::trim)
                .filter(|user| !user.is_empty())
                .map(str::to_string)),
            UserAction::Prompt => {
                let question = format!(
                    "SSH user for {:?} (press enter to leave empty)",
                    record.title
                );
                self.ask_optional(&question)
            }
        }
    }

    fn resolve_labels(&mut self, record: &KeyRecord, fields: &FieldMap) -> Result<Vec<String>> {
        if let Some(raw) = fields.get(&self.labels.labels) {
            let labels = parse_labels(raw);
            if !labels.is_empty() {
                return Ok(labels);
            }
        }
        let defaults = record.default_labels();
        match self.policy.labels {
            LabelsAction::Default => Ok(defaults),
            LabelsAction::Prompt => {
                let question = format!(
                    "Host aliases for {:?}, separated by commas or spaces (press enter for: {})",
                    record.title,
                    defaults.join(" ")
                );
                let answer = self.prompter.ask(&question)?;
                let labels = parse_labels(&answer);
                Ok(if labels.is_empty() { defaults } else { labels })
            }
        }
    }

    fn ask_optional(&mut self, question: &str) -> Result<Option<String>> {
        let answer = self.prompter.ask(question)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }
}
