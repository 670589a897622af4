//! Field type system.
//!
//! Every schema attribute is described by a static [`FieldDescriptor`]: a
//! closed [`FieldKind`] plus requiredness and nullability. Descriptors are
//! shared by all instances of a schema and never hold request state; the
//! construction engine in [`crate::model`] invokes them imperatively.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::OnceLock;

/// Wire format of every date field.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Oldest accepted birthday, in calendar years before the current one.
pub const MAX_AGE_YEARS: i32 = 70;

/// Anchored at the start only: anything after a well-formed
/// `local@domain.tld` prefix is accepted.
fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("email regex is valid"))
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?(44)?(0|7)\d{9,13}$").expect("phone regex is valid"))
}

/// Gender label looked up from the wire code `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Lookup table indexed by the wire code.
    pub const BY_CODE: [Gender; 3] = [Gender::Unknown, Gender::Male, Gender::Female];

    pub fn from_code(code: u64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::BY_CODE.get(idx).copied())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Unknown => "unknown",
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Numeric client identifier, integer or floating point, kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClientId(pub Number);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        ClientId(Number::from(id))
    }
}

/// A validated field value, or the explicit null marker.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Date(NaiveDate),
    Gender(Gender),
    ClientIds(Vec<ClientId>),
    Arguments(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// Closed set of validator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Char,
    Email,
    Phone,
    Date,
    BirthDay,
    Gender,
    ClientIds,
    Arguments,
}

impl FieldKind {
    /// Applies the kind rule to a non-null-skipped raw value.
    ///
    /// `today` anchors the birthday age cap. The error is the bare reason;
    /// the engine attaches the field name.
    pub fn validate(self, raw: &Value, today: NaiveDate) -> Result<FieldValue, String> {
        match self {
            FieldKind::Char => char_rule(raw).map(FieldValue::Text),
            FieldKind::Email => {
                let text = char_rule(raw)?;
                if !email_regex().is_match(&text) {
                    return Err("invalid email".to_string());
                }
                Ok(FieldValue::Text(text))
            }
            FieldKind::Phone => {
                let text = match raw {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err("invalid phone".to_string()),
                };
                if !phone_regex().is_match(&text) {
                    return Err("invalid phone".to_string());
                }
                Ok(FieldValue::Text(text))
            }
            FieldKind::Date => date_rule(raw).map(FieldValue::Date),
            FieldKind::BirthDay => {
                let date = date_rule(raw)?;
                if today.year() - date.year() > MAX_AGE_YEARS {
                    return Err(format!(
                        "birthday is more than {} years ago",
                        MAX_AGE_YEARS
                    ));
                }
                Ok(FieldValue::Date(date))
            }
            FieldKind::Gender => raw
                .as_u64()
                .and_then(Gender::from_code)
                .map(FieldValue::Gender)
                .ok_or_else(|| "gender must be one of 0, 1, 2".to_string()),
            FieldKind::ClientIds => match raw {
                Value::Array(items) if !items.is_empty() => items
                    .iter()
                    .map(|item| match item {
                        Value::Number(n) => Ok(ClientId(n.clone())),
                        _ => Err(()),
                    })
                    .collect::<Result<Vec<_>, ()>>()
                    .map(FieldValue::ClientIds)
                    .map_err(|_| "must be a non-empty list of numbers".to_string()),
                _ => Err("must be a non-empty list of numbers".to_string()),
            },
            FieldKind::Arguments => match raw {
                Value::Null => Err("must not be null".to_string()),
                other => Ok(FieldValue::Arguments(other.clone())),
            },
        }
    }
}

fn char_rule(raw: &Value) -> Result<String, String> {
    raw.as_str()
        .map(str::to_owned)
        .ok_or_else(|| "must be a string".to_string())
}

fn date_rule(raw: &Value) -> Result<NaiveDate, String> {
    let text = char_rule(raw)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|_| "invalid date, expected DD.MM.YYYY".to_string())
}

/// Static rule attached to a named schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldDescriptor {
    pub const fn new(kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            kind,
            required,
            nullable,
        }
    }

    /// Not required, may be null.
    pub const fn optional(kind: FieldKind) -> Self {
        Self::new(kind, false, true)
    }

    /// Nullability short-circuits the kind rule; a non-nullable field hands
    /// null to its kind, which rejects it.
    pub fn clean(&self, raw: &Value, today: NaiveDate) -> Result<FieldValue, String> {
        if self.nullable && raw.is_null() {
            return Ok(FieldValue::Null);
        }
        self.kind.validate(raw, today)
    }
}
