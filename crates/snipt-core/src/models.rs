use crate::error::{Result, SniptError};
use crate::matcher::{is_token_char, is_token_start};
use crate::variables::{referenced_variables, validate_content, ContentError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

pub const MIN_SHORTCUT_LEN: usize = 2;
pub const MAX_SHORTCUT_LEN: usize = 50;

/// Check a shortcut's shape and return its normalized (lowercase) form
pub fn validate_shortcut(shortcut: &str) -> Result<String> {
    let invalid = |reason: &str| SniptError::InvalidShortcut {
        shortcut: shortcut.to_string(),
        reason: reason.to_string(),
    };

    let len = shortcut.chars().count();
    if len < MIN_SHORTCUT_LEN || len > MAX_SHORTCUT_LEN {
        return Err(invalid(&format!(
            "must be {}-{} characters long",
            MIN_SHORTCUT_LEN, MAX_SHORTCUT_LEN
        )));
    }

    let mut chars = shortcut.chars();
    if !chars.next().is_some_and(is_token_start) {
        return Err(invalid("must start with a letter or underscore"));
    }
    if !chars.all(is_token_char) {
        return Err(invalid(
            "may only contain letters, digits, underscores and hyphens",
        ));
    }

    Ok(shortcut.to_ascii_lowercase())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Text,
    Select,
    Date,
    Number,
}

/// A placeholder declared by a snippet
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub default_value: Option<String>,
    pub required: bool,
    pub options: Vec<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Non-empty default, if any
    pub fn default_text(&self) -> Option<&str> {
        self.default_value.as_deref().filter(|value| !value.is_empty())
    }

    /// Whether `value` is acceptable for this variable
    pub fn is_satisfied_by(&self, value: Option<&str>) -> bool {
        let value = value.or(self.default_text()).unwrap_or("");
        if value.is_empty() {
            return !self.required;
        }
        match self.kind {
            VariableKind::Select => self.options.is_empty() || self.options.iter().any(|o| o == value),
            VariableKind::Number => value.trim().parse::<f64>().is_ok(),
            VariableKind::Text | VariableKind::Date => true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub shortcut: String,
    pub content: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Snippet {
    pub fn new(shortcut: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        let content = content.into();
        let is_dynamic = !referenced_variables(&content).is_empty();
        Self {
            id: Uuid::new_v4().to_string(),
            shortcut: shortcut.into().to_ascii_lowercase(),
            content,
            enabled: true,
            is_dynamic,
            variables: Vec::new(),
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self.is_dynamic = true;
        self
    }

    pub fn record_usage(&mut self) {
        self.usage_count += 1;
        self.updated_at = Utc::now();
    }

    /// Placeholder names used in the content, in order of first appearance
    pub fn referenced_variables(&self) -> Vec<String> {
        referenced_variables(&self.content)
    }

    /// Required variables that have neither a provided value nor a default
    pub fn missing_required(&self, provided: &HashMap<String, String>) -> Vec<String> {
        self.variables
            .iter()
            .filter(|variable| !variable.is_satisfied_by(provided.get(&variable.name).map(String::as_str)))
            .map(|variable| variable.name.clone())
            .collect()
    }

    /// Validate shortcut shape and content braces
    pub fn validate(&self) -> std::result::Result<(), SnippetProblems> {
        let shortcut = validate_shortcut(&self.shortcut).err();
        let content = validate_content(&self.content);
        if shortcut.is_none() && content.is_empty() {
            Ok(())
        } else {
            Err(SnippetProblems {
                shortcut: shortcut.map(|e| e.to_string()),
                content,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnippetProblems {
    pub shortcut: Option<String>,
    pub content: Vec<ContentError>,
}

/// Serializable description of the element an expansion happened in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSummary {
    pub tag_name: String,
    pub id: Option<String>,
    pub class_name: Option<String>,
}

/// Reported to the usage collaborator after a completed expansion
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub snippet_id: String,
    pub shortcut: String,
    pub surface: SurfaceSummary,
    pub variables: HashMap<String, String>,
    pub strategy: String,
    pub expanded_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notification {
    pub fn expanded(snippet: &Snippet, duration: Duration) -> Self {
        Self {
            title: "Snippet expanded".to_string(),
            message: format!("'{}' was expanded", snippet.shortcut),
            severity: Severity::Success,
            duration,
        }
    }
}
