//! Request schemas: the envelope and the two method payloads.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::fields::{ClientId, FieldDescriptor, FieldKind, Gender};
use crate::model::{Record, Schema};
use crate::scoring::{ScoreInput, Scorer, ScoringError};

/// Request-scoped record filled by [`MethodSchema::set_context`].
///
/// Used for the completion log line only, never for validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestContext {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nclients: Option<usize>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }
}

/// Methods served behind the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    OnlineScore,
    ClientsInterests,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::OnlineScore => "online_score",
            Method::ClientsInterests => "clients_interests",
        }
    }
}

impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online_score" => Ok(Method::OnlineScore),
            "clients_interests" => Ok(Method::ClientsInterests),
            other => Err(ValidationError::UnknownMethod(other.to_string())),
        }
    }
}

/// Outer request used for authentication and routing.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    pub account: Option<String>,
    pub login: Option<String>,
    pub token: Option<String>,
    pub arguments: Option<Value>,
    pub method: String,
}

impl MethodRequest {
    pub fn is_admin(&self, admin_login: &str) -> bool {
        self.login.as_deref() == Some(admin_login)
    }

    pub fn route(&self) -> Result<Method, ValidationError> {
        self.method.parse()
    }

    /// `arguments` as a mapping; null reads as empty.
    pub fn arguments_map(&self) -> Result<Map<String, Value>, ValidationError> {
        match &self.arguments {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(ValidationError::NotAnObject("arguments")),
        }
    }
}

impl Schema for MethodRequest {
    const NAME: &'static str = "MethodRequest";
    const FIELDS: &'static [(&'static str, FieldDescriptor)] = &[
        ("account", FieldDescriptor::optional(FieldKind::Char)),
        ("login", FieldDescriptor::new(FieldKind::Char, true, true)),
        ("token", FieldDescriptor::new(FieldKind::Char, true, true)),
        ("arguments", FieldDescriptor::new(FieldKind::Arguments, true, true)),
        ("method", FieldDescriptor::new(FieldKind::Char, true, false)),
    ];

    fn from_record(mut record: Record) -> Self {
        Self {
            account: record.take_text("account"),
            login: record.take_text("login"),
            token: record.take_text("token"),
            arguments: record.take_arguments("arguments"),
            method: record.take_text("method").unwrap_or_default(),
        }
    }
}

/// A method payload the dispatcher can execute.
pub trait MethodSchema: Schema {
    fn set_context(&self, ctx: &mut RequestContext);

    fn calculate(&self, scorer: &dyn Scorer) -> Result<Value, ScoringError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnlineScoreRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<Gender>,
    has: Vec<&'static str>,
}

impl OnlineScoreRequest {
    /// Names of the non-null fields, in declaration order.
    pub fn has(&self) -> &[&'static str] {
        &self.has
    }
}

impl Schema for OnlineScoreRequest {
    const NAME: &'static str = "OnlineScoreRequest";
    const FIELDS: &'static [(&'static str, FieldDescriptor)] = &[
        ("first_name", FieldDescriptor::optional(FieldKind::Char)),
        ("last_name", FieldDescriptor::optional(FieldKind::Char)),
        ("email", FieldDescriptor::optional(FieldKind::Email)),
        ("phone", FieldDescriptor::optional(FieldKind::Phone)),
        ("birthday", FieldDescriptor::optional(FieldKind::BirthDay)),
        ("gender", FieldDescriptor::optional(FieldKind::Gender)),
    ];

    fn from_record(mut record: Record) -> Self {
        let has = record.present();
        Self {
            first_name: record.take_text("first_name"),
            last_name: record.take_text("last_name"),
            email: record.take_text("email"),
            phone: record.take_text("phone"),
            birthday: record.take_date("birthday"),
            gender: record.take_gender("gender"),
            has,
        }
    }

    /// At least one of (phone, email), (first_name, last_name),
    /// (gender, birthday) must be fully present.
    fn validate(&self) -> Result<(), ValidationError> {
        let pair_present = (self.phone.is_some() && self.email.is_some())
            || (self.first_name.is_some() && self.last_name.is_some())
            || (self.gender.is_some() && self.birthday.is_some());

        if pair_present {
            return Ok(());
        }
        Err(ValidationError::Invariant(
            "at least one pair of (phone, email), (first_name, last_name), (gender, birthday) \
             must be non-null"
                .to_string(),
        ))
    }
}

impl MethodSchema for OnlineScoreRequest {
    fn set_context(&self, ctx: &mut RequestContext) {
        ctx.has = Some(self.has.clone());
    }

    fn calculate(&self, scorer: &dyn Scorer) -> Result<Value, ScoringError> {
        let score = scorer.score(&ScoreInput {
            phone: self.phone.as_deref(),
            email: self.email.as_deref(),
            birthday: self.birthday,
            gender: self.gender,
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
        })?;
        Ok(json!({ "score": score }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientsInterestsRequest {
    pub client_ids: Vec<ClientId>,
    pub date: Option<NaiveDate>,
}

impl Schema for ClientsInterestsRequest {
    const NAME: &'static str = "ClientsInterestsRequest";
    const FIELDS: &'static [(&'static str, FieldDescriptor)] = &[
        ("client_ids", FieldDescriptor::new(FieldKind::ClientIds, true, false)),
        ("date", FieldDescriptor::optional(FieldKind::Date)),
    ];

    fn from_record(mut record: Record) -> Self {
        Self {
            client_ids: record.take_client_ids("client_ids").unwrap_or_default(),
            date: record.take_date("date"),
        }
    }
}

impl MethodSchema for ClientsInterestsRequest {
    fn set_context(&self, ctx: &mut RequestContext) {
        ctx.nclients = Some(self.client_ids.len());
    }

    fn calculate(&self, scorer: &dyn Scorer) -> Result<Value, ScoringError> {
        let mut interests = Map::new();
        for client_id in &self.client_ids {
            let topics = scorer.interests(client_id)?;
            interests.insert(client_id.to_string(), json!(topics));
        }
        Ok(Value::Object(interests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build;
    use crate::scoring::StoreScorer;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_envelope_requires_method() {
        let err = build::<MethodRequest>(
            &raw(json!({"login": "h&f", "token": "", "arguments": {}})),
            today(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::Required("method"));
    }

    #[test]
    fn test_envelope_nullable_fields() {
        let request = build::<MethodRequest>(
            &raw(json!({"login": null, "token": null, "arguments": null, "method": "x"})),
            today(),
        )
        .unwrap();
        assert_eq!(request.account, None);
        assert_eq!(request.login, None);
        assert_eq!(request.arguments_map(), Ok(Map::new()));
        assert!(!request.is_admin("admin"));
        assert_eq!(
            request.route(),
            Err(ValidationError::UnknownMethod("x".to_string()))
        );
    }

    #[test]
    fn test_envelope_method_not_nullable() {
        let err = build::<MethodRequest>(
            &raw(json!({"login": "a", "token": "t", "arguments": {}, "method": null})),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "method", .. }));
    }

    #[test]
    fn test_arguments_must_be_mapping() {
        let request = build::<MethodRequest>(
            &raw(json!({"login": "a", "token": "t", "arguments": [1], "method": "online_score"})),
            today(),
        )
        .unwrap();
        assert_eq!(
            request.arguments_map(),
            Err(ValidationError::NotAnObject("arguments"))
        );
    }

    #[test]
    fn test_online_score_context_lists_present_fields() {
        let request = build::<OnlineScoreRequest>(
            &raw(json!({"phone": "79991234567", "email": "a@b.co", "gender": 1})),
            today(),
        )
        .unwrap();
        assert_eq!(request.has(), ["email", "phone", "gender"]);

        let mut ctx = RequestContext::new("req");
        request.set_context(&mut ctx);
        assert_eq!(ctx.has, Some(vec!["email", "phone", "gender"]));
        assert_eq!(ctx.nclients, None);
    }

    #[test]
    fn test_online_score_calculate() {
        let request = build::<OnlineScoreRequest>(
            &raw(json!({"first_name": "a", "last_name": "b"})),
            today(),
        )
        .unwrap();
        let result = request.calculate(&StoreScorer::default()).unwrap();
        assert_eq!(result, json!({"score": 0.5}));
    }

    #[test]
    fn test_clients_interests_calculate() {
        let request =
            build::<ClientsInterestsRequest>(&raw(json!({"client_ids": [1, 2, 3]})), today())
                .unwrap();
        let mut ctx = RequestContext::new("req");
        request.set_context(&mut ctx);
        assert_eq!(ctx.nclients, Some(3));

        let result = request.calculate(&StoreScorer::default()).unwrap();
        let map = result.as_object().unwrap();
        assert_eq!(map.len(), 3);
        for key in ["1", "2", "3"] {
            assert_eq!(map[key].as_array().map(Vec::len), Some(2));
        }
    }

    #[test]
    fn test_clients_interests_requires_ids() {
        let err = build::<ClientsInterestsRequest>(&raw(json!({"date": "01.01.2020"})), today())
            .unwrap_err();
        assert_eq!(err, ValidationError::Required("client_ids"));
    }
}
