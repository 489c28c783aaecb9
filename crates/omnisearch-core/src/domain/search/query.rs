//! Query operator parsing
//!
//! Splits a raw query string into the free text used for matching and scoring
//! and the typed [`Operators`] embedded in it:
//!
//! | syntax              | effect                                   |
//! |---------------------|------------------------------------------|
//! | `"exact phrase"`    | phrase kept unquoted, `exact = true`     |
//! | `from:@jane`        | sender restriction                       |
//! | `in:#general`       | channel restriction                      |
//! | `has:file`          | attachment / link / reaction restriction |
//! | `before:2024-05-01` | inclusive upper date bound               |
//! | `after:2024-05-01`  | inclusive lower date bound               |
//! | `NOT term`, `-term` | exclusion                                |
//! | `a OR b`            | match any word instead of the phrase     |
//! | `AND`, `*`          | dropped                                  |
//!
//! Parsing never fails. A `from:` / `in:` token with an empty value stays in
//! the base query; a `before:` / `after:` token with an unreadable date is
//! dropped and the bound left unset.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Tags accepted by `has:`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasTag {
    File,
    Link,
    Attachment,
    Reaction,
    /// Unknown tag; kept so callers can see it, ignored by the searchers
    Other(String),
}

impl HasTag {
    pub fn parse(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "file" | "files" => Self::File,
            "link" | "links" => Self::Link,
            "attachment" | "attachments" => Self::Attachment,
            "reaction" | "reactions" => Self::Reaction,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Structured restrictions extracted from a query string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operators {
    /// Sender usernames or ids from `from:`
    pub from: Vec<String>,
    /// Channel names or ids from `in:`
    pub in_channels: Vec<String>,
    pub has: Vec<HasTag>,
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    /// A quoted phrase was present
    pub exact: bool,
    pub exclude: Vec<String>,
    /// An `OR` connector was present
    pub match_any: bool,
}

impl Operators {
    /// True when no operator narrows the result set
    pub fn is_unrestricted(&self) -> bool {
        self.from.is_empty()
            && self.in_channels.is_empty()
            && self.has.is_empty()
            && self.before.is_none()
            && self.after.is_none()
    }

    pub fn wants_attachment(&self) -> bool {
        self.has
            .iter()
            .any(|tag| matches!(tag, HasTag::File | HasTag::Attachment))
    }

    pub fn wants_link(&self) -> bool {
        self.has.contains(&HasTag::Link)
    }

    pub fn wants_reaction(&self) -> bool {
        self.has.contains(&HasTag::Reaction)
    }
}

/// Output of [`parse_query`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Free text with every recognised operator removed and whitespace collapsed
    pub base_query: String,
    pub operators: Operators,
}

impl ParsedQuery {
    /// Words of the base query used for `OR` matching
    pub fn terms(&self) -> Vec<String> {
        self.base_query
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Result of a rule handler: `Some(replacement)` consumes the token,
/// `None` leaves it in the query.
type RuleHandler = fn(&Captures<'_>, &mut Operators) -> Option<String>;

struct OperatorRule {
    pattern: &'static LazyLock<Regex>,
    /// Only the first occurrence is considered (`before:` / `after:`)
    first_only: bool,
    handler: RuleHandler,
}

impl OperatorRule {
    fn extract(&self, text: &str, operators: &mut Operators) -> String {
        let limit = if self.first_only { 1 } else { 0 };
        self.pattern
            .replacen(text, limit, |caps: &Captures<'_>| {
                (self.handler)(caps, operators).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("valid regex"));
static FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)from:@?(\S+)").expect("valid regex"));
static IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)in:#?(\S+)").expect("valid regex"));
static HAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)has:(\S+)").expect("valid regex"));
static BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)before:(\S+)").expect("valid regex"));
static AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)after:(\S+)").expect("valid regex"));
static NOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)NOT\s+(\S+)").expect("valid regex"));
static MINUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)-(\S+)").expect("valid regex"));
static CONNECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(AND|OR)(?:\s|$)").expect("valid regex"));
static WILDCARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+").expect("valid regex"));

/// Applied in order; each rule sees the text left by the previous one.
static OPERATOR_RULES: [OperatorRule; 10] = [
    OperatorRule {
        pattern: &QUOTED,
        first_only: false,
        handler: |caps, ops| {
            let phrase = caps[1].trim();
            if !phrase.is_empty() {
                ops.exact = true;
            }
            Some(format!(" {} ", phrase))
        },
    },
    OperatorRule {
        pattern: &FROM,
        first_only: false,
        handler: |caps, ops| push_value(&mut ops.from, &caps[1], '@'),
    },
    OperatorRule {
        pattern: &IN,
        first_only: false,
        handler: |caps, ops| push_value(&mut ops.in_channels, &caps[1], '#'),
    },
    OperatorRule {
        pattern: &HAS,
        first_only: false,
        handler: |caps, ops| {
            ops.has.push(HasTag::parse(&caps[1]));
            Some(" ".to_string())
        },
    },
    OperatorRule {
        pattern: &BEFORE,
        first_only: true,
        handler: |caps, ops| {
            ops.before = parse_date(&caps[1]);
            Some(" ".to_string())
        },
    },
    OperatorRule {
        pattern: &AFTER,
        first_only: true,
        handler: |caps, ops| {
            ops.after = parse_date(&caps[1]);
            Some(" ".to_string())
        },
    },
    OperatorRule {
        pattern: &NOT,
        first_only: false,
        handler: |caps, ops| {
            ops.exclude.push(caps[1].to_string());
            Some(" ".to_string())
        },
    },
    OperatorRule {
        pattern: &MINUS,
        first_only: false,
        handler: |caps, ops| {
            ops.exclude.push(caps[1].to_string());
            Some(" ".to_string())
        },
    },
    OperatorRule {
        pattern: &CONNECTOR,
        first_only: false,
        handler: |caps, ops| {
            if &caps[1] == "OR" {
                ops.match_any = true;
            }
            Some(" ".to_string())
        },
    },
    OperatorRule {
        pattern: &WILDCARD,
        first_only: false,
        handler: |_, _| Some(String::new()),
    },
];

fn push_value(target: &mut Vec<String>, raw: &str, sigil: char) -> Option<String> {
    let value = raw.trim_start_matches(sigil);
    if value.is_empty() {
        return None;
    }
    target.push(value.to_string());
    Some(" ".to_string())
}

/// Parse `before:` / `after:` values: RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC),
/// or a bare `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());
    if parsed.is_none() {
        tracing::debug!(value, "Ignoring unparseable date operator");
    }
    parsed
}

/// Parse a raw query into its base text and operators
pub fn parse_query(raw: &str) -> ParsedQuery {
    let mut operators = Operators::default();
    let remaining = OPERATOR_RULES
        .iter()
        .fold(raw.to_string(), |text, rule| rule.extract(&text, &mut operators));

    ParsedQuery {
        base_query: remaining.split_whitespace().collect::<Vec<_>>().join(" "),
        operators,
    }
}
