//! `{name}` placeholder substitution and brace validation.

use crate::models::Variable;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Names that resolve to a computed value when nothing else supplies one
pub const BUILTIN_VARIABLES: [&str; 12] = [
    "date",
    "time",
    "datetime",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "timestamp",
    "iso",
    "clipboard",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_VARIABLES.contains(&name)
}

/// Inputs for built-in values, captured once per expansion
#[derive(Debug, Clone)]
pub struct BuiltinContext {
    pub now: DateTime<Local>,
    pub clipboard: Option<String>,
}

impl BuiltinContext {
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    pub fn at(now: DateTime<Local>) -> Self {
        Self {
            now,
            clipboard: None,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Option<String>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn value(&self, name: &str) -> Option<String> {
        let now = &self.now;
        let value = match name {
            "date" => now.format("%-m/%-d/%Y").to_string(),
            "time" => now.format("%-I:%M:%S %p").to_string(),
            "datetime" => format!(
                "{}, {}",
                now.format("%-m/%-d/%Y"),
                now.format("%-I:%M:%S %p")
            ),
            "year" => now.format("%Y").to_string(),
            "month" => now.format("%m").to_string(),
            "day" => now.format("%d").to_string(),
            "hour" => now.format("%H").to_string(),
            "minute" => now.format("%M").to_string(),
            "second" => now.format("%S").to_string(),
            "timestamp" => now.timestamp_millis().to_string(),
            "iso" => now
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            "clipboard" => self.clipboard.clone().unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }
}

/// A placeholder found in content: char span of the braces and the trimmed name
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    start: usize,
    end: usize,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Placeholder(Placeholder),
}

/// Split content into literal runs and `{...}` pairs without nested braces.
/// Every `{` is consumed once, so this is linear and always terminates.
fn parse(chars: &[char]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && chars[j] != '}' && chars[j] != '{' {
            j += 1;
        }

        if j < chars.len() && chars[j] == '}' {
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            let name: String = chars[i + 1..j].iter().collect();
            pieces.push(Piece::Placeholder(Placeholder {
                start: i,
                end: j + 1,
                name: name.trim().to_string(),
            }));
            i = j + 1;
        } else {
            literal.push('{');
            i += 1;
        }
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    pieces
}

/// Substitute every `{name}` in `content`.
///
/// Resolution order: a provided value, the variable's non-empty default, a
/// built-in, otherwise the empty string. `{}` and unmatched braces stay literal.
/// Substituted values are not expanded again.
pub fn expand(
    content: &str,
    variables: &[Variable],
    provided: &HashMap<String, String>,
    context: &BuiltinContext,
) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut output = String::with_capacity(content.len());

    for piece in parse(&chars) {
        match piece {
            Piece::Literal(text) => output.push_str(&text),
            Piece::Placeholder(placeholder) if placeholder.name.is_empty() => {
                output.extend(&chars[placeholder.start..placeholder.end]);
            }
            Piece::Placeholder(placeholder) => {
                output.push_str(&resolve(&placeholder.name, variables, provided, context));
            }
        }
    }

    output
}

fn resolve(
    name: &str,
    variables: &[Variable],
    provided: &HashMap<String, String>,
    context: &BuiltinContext,
) -> String {
    if let Some(value) = provided.get(name) {
        return value.clone();
    }

    if let Some(default) = variables
        .iter()
        .find(|variable| variable.name == name)
        .and_then(Variable::default_text)
    {
        return default.to_string();
    }

    context.value(name).unwrap_or_default()
}

/// Placeholder names in order of first appearance
pub fn referenced_variables(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut names: Vec<String> = Vec::new();
    for piece in parse(&chars) {
        if let Piece::Placeholder(placeholder) = piece {
            if !placeholder.name.is_empty() && !names.contains(&placeholder.name) {
                names.push(placeholder.name);
            }
        }
    }
    names
}

/// Whether expanding `content` needs the clipboard
pub fn needs_clipboard(content: &str) -> bool {
    referenced_variables(content).iter().any(|name| name == "clipboard")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentError {
    #[error("unmatched closing brace at position {position}")]
    UnmatchedClosingBrace { position: usize },
    #[error("unmatched opening brace at position {position}")]
    UnmatchedOpeningBrace { position: usize },
    #[error("empty variable name at position {position}")]
    EmptyVariableName { position: usize },
}

/// Report brace problems in snippet content. Positions are char offsets.
pub fn validate_content(content: &str) -> Vec<ContentError> {
    let mut errors = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for (position, c) in content.chars().enumerate() {
        match c {
            '{' => open.push(position),
            '}' => match open.pop() {
                Some(start) if start + 1 == position => {
                    errors.push(ContentError::EmptyVariableName { position: start })
                }
                Some(_) => {}
                None => errors.push(ContentError::UnmatchedClosingBrace { position }),
            },
            _ => {}
        }
    }

    errors.extend(
        open.into_iter()
            .map(|position| ContentError::UnmatchedOpeningBrace { position }),
    );
    errors.sort_by_key(|error| match error {
        ContentError::UnmatchedClosingBrace { position }
        | ContentError::UnmatchedOpeningBrace { position }
        | ContentError::EmptyVariableName { position } => *position,
    });
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed_context() -> BuiltinContext {
        let now = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        BuiltinContext::at(now)
    }

    fn no_values() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn provided_beats_default_beats_builtin() {
        let vars = vec![Variable::new("name").with_default("friend"), Variable::new("year").with_default("1999")];
        let mut provided = no_values();
        provided.insert("name".to_string(), "Ada".to_string());

        let out = expand("Hi {name}, {year} {month}", &vars, &provided, &fixed_context());
        assert_eq!(out, "Hi Ada, 1999 03");
    }

    #[test]
    fn builtins_are_zero_padded() {
        let out = expand(
            "{year}-{month}-{day} {hour}:{minute}:{second}",
            &[],
            &no_values(),
            &fixed_context(),
        );
        assert_eq!(out, "2024-03-07 09:05:02");
    }

    #[test]
    fn locale_style_date_and_time() {
        let ctx = fixed_context();
        assert_eq!(ctx.value("date").unwrap(), "3/7/2024");
        assert_eq!(ctx.value("time").unwrap(), "9:05:02 AM");
        assert_eq!(ctx.value("datetime").unwrap(), "3/7/2024, 9:05:02 AM");
        assert!(ctx.value("iso").unwrap().ends_with('Z'));
    }

    #[test]
    fn clipboard_builtin_degrades_to_empty() {
        let out = expand("[{clipboard}]", &[], &no_values(), &fixed_context());
        assert_eq!(out, "[]");

        let ctx = fixed_context().with_clipboard(Some("copied".to_string()));
        assert_eq!(expand("[{clipboard}]", &[], &no_values(), &ctx), "[copied]");
    }

    #[test]
    fn unknown_names_become_empty() {
        assert_eq!(expand("a{nope}b", &[], &no_values(), &fixed_context()), "ab");
    }

    #[test]
    fn malformed_braces_stay_literal() {
        let ctx = fixed_context();
        assert_eq!(expand("Hello {name, missing", &[], &no_values(), &ctx), "Hello {name, missing");
        assert_eq!(expand("{}", &[], &no_values(), &ctx), "{}");
        assert_eq!(expand("}{", &[], &no_values(), &ctx), "}{");
        assert_eq!(expand("{{year}}", &[], &no_values(), &ctx), "{2024}");
    }

    #[test]
    fn empty_default_falls_through_to_builtin() {
        let vars = vec![Variable::new("year").with_default("")];
        assert_eq!(expand("{year}", &vars, &no_values(), &fixed_context()), "2024");
    }

    #[test]
    fn validator_reports_unmatched_opening() {
        let errors = validate_content("Hello {name, missing");
        assert_eq!(errors, vec![ContentError::UnmatchedOpeningBrace { position: 6 }]);
    }

    #[test]
    fn validator_reports_each_kind() {
        let errors = validate_content("} {} {ok} {");
        assert_eq!(
            errors,
            vec![
                ContentError::UnmatchedClosingBrace { position: 0 },
                ContentError::EmptyVariableName { position: 2 },
                ContentError::UnmatchedOpeningBrace { position: 10 },
            ]
        );
    }

    #[test]
    fn referenced_variables_are_unique() {
        assert_eq!(
            referenced_variables("{a} {b} {a} { c } {}"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(needs_clipboard("paste: {clipboard}"));
    }

    proptest! {
        #[test]
        fn expansion_resolves_known_names(
            pieces in prop::collection::vec(
                prop::sample::select(vec!["hello ", "{name}", "{city}", "{date}", "{year}", "{clipboard}", "{", "}", " ", "{}"]),
                0..12,
            ),
            value in "[0-9 ]{1,8}",
        ) {
            let content: String = pieces.concat();
            let vars = vec![Variable::new("name"), Variable::new("city").with_default("Oslo")];
            let mut provided = HashMap::new();
            provided.insert("name".to_string(), value);

            let out = expand(&content, &vars, &provided, &fixed_context());
            for name in ["name", "city", "date", "year", "clipboard"] {
                let placeholder = format!("{{{}}}", name);
                prop_assert!(!out.contains(&placeholder));
            }
        }

        #[test]
        fn validator_never_panics(content in "\\PC{0,60}") {
            let _ = validate_content(&content);
            let _ = referenced_variables(&content);
        }
    }
}
