//! Local normalization and validation of answers.
//!
//! Everything here is pure. The oracle is only consulted when these
//! functions reject the user's raw text, and whatever the oracle returns is
//! run back through them before it is accepted.

use std::{fmt, sync::OnceLock};

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, ParseResult};
use regex::Regex;

const AFFIRMATIVE: &[&str] = &["yes", "yeah", "yep", "true", "of course"];
const NEGATIVE: &[&str] = &["no", "nope", "nah", "false"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Int,
    Float,
    Datetime,
    Boolean,
    Multichoice,
    /// Lower-cased author type that maps to nothing we can validate.
    Unrecognized(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Datetime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Multichoice => "multichoice",
            FieldType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, FieldType::Unrecognized(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn normalize_type(raw: &str) -> FieldType {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "text" | "string" | "phone" | "email" | "url" | "location" => FieldType::Text,
        "int" | "integer" => FieldType::Int,
        "float" | "number" => FieldType::Float,
        "datetime" | "date" | "time" => FieldType::Datetime,
        "boolean" | "bool" | "checkbox" => FieldType::Boolean,
        "multichoice" | "multi-choice" | "multiple choice" | "choice" | "select" => {
            FieldType::Multichoice
        }
        _ => FieldType::Unrecognized(lowered),
    }
}

/// Converts raw text into the canonical textual form for `field_type`.
///
/// `None` means numeric input could not be parsed at all.
pub fn clean_value(raw: &str, field_type: &FieldType) -> Option<String> {
    let trimmed = raw.trim();
    match field_type {
        FieldType::Boolean => {
            let lowered = trimmed.to_lowercase();
            if AFFIRMATIVE.iter().any(|word| lowered.contains(word)) {
                Some("yes".to_string())
            } else if NEGATIVE.iter().any(|word| lowered.contains(word)) {
                Some("no".to_string())
            } else {
                Some(trimmed.to_string())
            }
        }
        FieldType::Int => parse_number(trimmed).map(render_int),
        FieldType::Float => parse_number(trimmed).map(render_float),
        FieldType::Text
        | FieldType::Datetime
        | FieldType::Multichoice
        | FieldType::Unrecognized(_) => Some(trimmed.to_string()),
    }
}

pub fn validate_answer(value: &str, field_type: &FieldType, options: &[String]) -> bool {
    let Some(cleaned) = clean_value(value, field_type) else {
        return false;
    };

    match field_type {
        FieldType::Text => !cleaned.is_empty(),
        FieldType::Int => !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()),
        FieldType::Float => true,
        FieldType::Datetime => is_datetime(&cleaned),
        FieldType::Boolean => cleaned == "yes" || cleaned == "no",
        FieldType::Multichoice => {
            let lowered = cleaned.to_lowercase();
            options
                .iter()
                .any(|option| option.trim().to_lowercase() == lowered)
        }
        FieldType::Unrecognized(_) => false,
    }
}

/// Cleans then validates, returning the value to store on success.
pub fn accept_answer(raw: &str, field_type: &FieldType, options: &[String]) -> Option<String> {
    let cleaned = clean_value(raw, field_type)?;
    validate_answer(&cleaned, field_type, options).then_some(cleaned)
}

fn currency_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-]?)\s*[$€£¥₹]\s*").expect("currency regex is valid"))
}

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal regex is valid")
    })
}

fn bare_hour_meridiem() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(^|\s)(\d{1,2})\s*(am|pm)\b").expect("meridiem regex is valid")
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    let without_currency = currency_prefix().replace(raw, "$1");
    let digits: String = without_currency.chars().filter(|c| *c != ',').collect();
    let value = digits.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

fn render_int(value: f64) -> String {
    // Adding 0.0 folds -0 into 0.
    format!("{}", value.trunc() + 0.0)
}

fn render_float(value: f64) -> String {
    let rendered = format!("{}", value + 0.0);
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m/%d/%y",
    "%d.%m.%Y",
    "%B %d %Y",
    "%d %B %Y",
    "%A %B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M %p",
    "%d-%m-%Y %H:%M",
    "%B %d %Y %H:%M",
    "%B %d %Y %I:%M %p",
    "%d %B %Y %H:%M",
    "%d %B %Y %I:%M %p",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Words people put between date parts: "5th of March", "March 5 at 3pm".
const JOINER_WORDS: &[&str] = &["at", "of", "on"];

/// Accepts the common shapes a person types for a date, a time, or both.
///
/// A date without a year ("Jan 5") is read as falling in the current year.
pub fn is_datetime(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    if DateTime::parse_from_rfc3339(trimmed).is_ok()
        || DateTime::parse_from_rfc2822(trimmed).is_ok()
    {
        return true;
    }

    let normalized = normalize_datetime(trimmed);
    if matches_formats(&normalized, DATE_FORMATS, NaiveDate::parse_from_str)
        || matches_formats(&normalized, DATETIME_FORMATS, NaiveDateTime::parse_from_str)
        || matches_formats(&normalized, TIME_FORMATS, NaiveTime::parse_from_str)
    {
        return true;
    }

    let with_year = format!("{normalized} {}", Local::now().year());
    matches_formats(&with_year, DATE_FORMATS, NaiveDate::parse_from_str)
}

fn normalize_datetime(raw: &str) -> String {
    let without_ordinals = ordinal_suffix().replace_all(raw, "$1");
    let joined = without_ordinals
        .replace(',', " ")
        .split_whitespace()
        .filter(|token| {
            !JOINER_WORDS
                .iter()
                .any(|word| token.eq_ignore_ascii_case(word))
        })
        .collect::<Vec<_>>()
        .join(" ");
    bare_hour_meridiem()
        .replace_all(&joined, "${1}${2}:00 ${3}")
        .into_owned()
}

/// Format and input must have the same number of space-separated parts, so
/// "March 2024" is never read as day 20 of year 24.
fn matches_formats<T>(
    text: &str,
    formats: &[&str],
    parse: fn(&str, &str) -> ParseResult<T>,
) -> bool {
    let parts = text.split(' ').count();
    formats
        .iter()
        .filter(|format| format.split(' ').count() == parts)
        .any(|format| parse(text, format).is_ok())
}
