//! Model construction engine.
//!
//! A [`Schema`] declares its fields statically, in order. [`build`] walks
//! that declaration against a raw JSON mapping, cleans every value through
//! its [`FieldDescriptor`], then runs the schema's cross-field hook. Either a
//! fully valid instance comes out or nothing does.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::fields::{ClientId, FieldDescriptor, FieldValue, Gender};

static NULL: Value = Value::Null;

/// Cleaned values of one construction attempt, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    values: Vec<(&'static str, FieldValue)>,
}

impl Record {
    fn push(&mut self, name: &'static str, value: FieldValue) {
        self.values.push((name, value));
    }

    /// Moves a value out, leaving null behind.
    pub fn take(&mut self, name: &str) -> FieldValue {
        self.values
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| std::mem::replace(v, FieldValue::Null))
            .unwrap_or(FieldValue::Null)
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        match self.take(name) {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn take_date(&mut self, name: &str) -> Option<NaiveDate> {
        match self.take(name) {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn take_gender(&mut self, name: &str) -> Option<Gender> {
        match self.take(name) {
            FieldValue::Gender(g) => Some(g),
            _ => None,
        }
    }

    pub fn take_client_ids(&mut self, name: &str) -> Option<Vec<ClientId>> {
        match self.take(name) {
            FieldValue::ClientIds(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn take_arguments(&mut self, name: &str) -> Option<Value> {
        match self.take(name) {
            FieldValue::Arguments(v) => Some(v),
            _ => None,
        }
    }

    /// Names of the non-null fields, in declaration order.
    pub fn present(&self) -> Vec<&'static str> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(n, _)| *n)
            .collect()
    }
}

/// A named, closed set of field descriptors with an optional cross-field rule.
pub trait Schema: Sized {
    /// Schema name, used in logs.
    const NAME: &'static str;

    /// Ordered `(name, descriptor)` pairs.
    const FIELDS: &'static [(&'static str, FieldDescriptor)];

    /// Moves cleaned values into the typed instance. Only called with a
    /// record whose every value already satisfied its descriptor.
    fn from_record(record: Record) -> Self;

    /// Cross-field invariant, run after every field is assigned.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Cleans `raw` against `S::FIELDS` and returns the record, without the
/// cross-field hook.
///
/// Requiredness and kind rules are checked field by field in declaration
/// order; the first violation aborts. Keys not declared by the schema are
/// ignored.
pub fn clean_fields<S: Schema>(
    raw: &Map<String, Value>,
    today: NaiveDate,
) -> Result<Record, ValidationError> {
    let mut record = Record::default();

    for &(name, descriptor) in S::FIELDS {
        let value = match raw.get(name) {
            Some(value) => value,
            None if descriptor.required => return Err(ValidationError::Required(name)),
            None => &NULL,
        };

        let cleaned = descriptor
            .clean(value, today)
            .map_err(|reason| ValidationError::InvalidField { field: name, reason })?;
        record.push(name, cleaned);
    }

    Ok(record)
}

/// Builds a schema instance from a raw mapping, or fails atomically.
pub fn build<S: Schema>(raw: &Map<String, Value>, today: NaiveDate) -> Result<S, ValidationError> {
    let record = clean_fields::<S>(raw, today)?;
    let instance = S::from_record(record);
    instance.validate()?;
    tracing::debug!(schema = S::NAME, "model constructed");
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldKind;
    use serde_json::json;

    #[derive(Debug)]
    struct Pair {
        left: Option<String>,
        right: Option<String>,
        count: Vec<ClientId>,
    }

    impl Schema for Pair {
        const NAME: &'static str = "Pair";
        const FIELDS: &'static [(&'static str, FieldDescriptor)] = &[
            ("left", FieldDescriptor::optional(FieldKind::Char)),
            ("right", FieldDescriptor::optional(FieldKind::Char)),
            ("count", FieldDescriptor::new(FieldKind::ClientIds, true, false)),
        ];

        fn from_record(mut record: Record) -> Self {
            Self {
                left: record.take_text("left"),
                right: record.take_text("right"),
                count: record.take_client_ids("count").unwrap_or_default(),
            }
        }

        fn validate(&self) -> Result<(), ValidationError> {
            if self.left.is_some() != self.right.is_some() {
                return Err(ValidationError::Invariant("left and right go together".into()));
            }
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_missing_required_field() {
        let err = build::<Pair>(&raw(json!({"left": "a", "right": "b"})), today()).unwrap_err();
        assert_eq!(err, ValidationError::Required("count"));
    }

    #[test]
    fn test_first_violation_wins() {
        // `left` is declared before the missing `count`.
        let err = build::<Pair>(&raw(json!({"left": 1})), today()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "left", .. }));
    }

    #[test]
    fn test_cross_field_hook_runs_last() {
        let err = build::<Pair>(&raw(json!({"left": "a", "count": [1]})), today()).unwrap_err();
        assert!(matches!(err, ValidationError::Invariant(_)));

        let pair = build::<Pair>(
            &raw(json!({"left": "a", "right": "b", "count": [1], "extra": true})),
            today(),
        )
        .unwrap();
        assert_eq!(pair.left.as_deref(), Some("a"));
        assert_eq!(pair.count.len(), 1);
    }

    #[test]
    fn test_record_present_keeps_declaration_order() {
        let mut record =
            clean_fields::<Pair>(&raw(json!({"count": [1], "right": "b", "left": null})), today())
                .unwrap();
        assert_eq!(record.present(), vec!["right", "count"]);
        assert_eq!(record.take("left"), FieldValue::Null);
        assert_eq!(record.take("unknown"), FieldValue::Null);
    }
}
