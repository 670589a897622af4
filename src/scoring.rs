//! Scoring and interests collaborator.
//!
//! The dispatcher treats this as an opaque synchronous black box behind
//! [`Scorer`]. [`StoreScorer`] is the default: a weighted score memoised in
//! an in-process TTL store, and a deterministic interests pick.

use chrono::NaiveDate;
use moka::sync::Cache;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

use crate::fields::{ClientId, Gender};

/// Interest topics handed out per client.
pub const INTERESTS: [&str; 11] = [
    "cars", "pets", "travel", "hi-tech", "sport", "music", "books", "tv", "cinema", "geek", "otus",
];

/// Failure inside the collaborator. Always surfaces as an internal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringError(pub String);

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scoring failed: {}", self.0)
    }
}

impl std::error::Error for ScoringError {}

/// Validated inputs of one score computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreInput<'a> {
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

impl ScoreInput<'_> {
    /// Store key covering every input that affects the score.
    pub fn cache_key(&self) -> String {
        let birthday = self
            .birthday
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_default();
        let gender = self.gender.map(|g| g.label()).unwrap_or_default();

        let mut hasher = Sha256::new();
        for part in [
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default(),
            self.phone.unwrap_or_default(),
            self.email.unwrap_or_default(),
            birthday.as_str(),
            gender,
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        format!("uid:{}", hex::encode(hasher.finalize()))
    }
}

/// The opaque score/interests functions the request schemas call.
pub trait Scorer: Send + Sync {
    fn score(&self, input: &ScoreInput<'_>) -> Result<f64, ScoringError>;

    fn interests(&self, client_id: &ClientId) -> Result<Vec<String>, ScoringError>;
}

/// Default collaborator backed by a TTL store.
#[derive(Clone)]
pub struct StoreScorer {
    store: Cache<String, f64>,
}

impl StoreScorer {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let store = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();
        Self { store }
    }
}

impl Default for StoreScorer {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 10_000)
    }
}

/// Weighted presence score.
pub fn compute_score(input: &ScoreInput<'_>) -> f64 {
    let mut score = 0.0;
    if input.phone.is_some() {
        score += 1.5;
    }
    if input.email.is_some() {
        score += 1.5;
    }
    if input.birthday.is_some() && input.gender.is_some() {
        score += 1.5;
    }
    if input.first_name.is_some() && input.last_name.is_some() {
        score += 0.5;
    }
    score
}

impl Scorer for StoreScorer {
    fn score(&self, input: &ScoreInput<'_>) -> Result<f64, ScoringError> {
        let key = input.cache_key();
        if let Some(score) = self.store.get(&key) {
            tracing::debug!(%key, score, "score store hit");
            return Ok(score);
        }

        let score = compute_score(input);
        self.store.insert(key, score);
        Ok(score)
    }

    fn interests(&self, client_id: &ClientId) -> Result<Vec<String>, ScoringError> {
        let digest = Sha256::digest(client_id.to_string().as_bytes());
        let n = INTERESTS.len();
        let first = digest[0] as usize % n;
        let second = (first + 1 + digest[1] as usize % (n - 1)) % n;
        Ok(vec![
            INTERESTS[first].to_string(),
            INTERESTS[second].to_string(),
        ])
    }
}
