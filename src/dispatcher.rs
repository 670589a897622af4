//! Authenticated method dispatch.
//!
//! One call to [`MethodDispatcher::dispatch`] runs the whole state machine
//! for a parsed request body:
//!
//! 1. build the [`MethodRequest`] envelope (`INVALID_REQUEST` on failure);
//! 2. authenticate (`FORBIDDEN`);
//! 3. short-circuit `online_score` for the admin with a fixed score;
//! 4. route `method` to its schema (`INVALID_REQUEST` when unknown);
//! 5. build the method schema from `arguments` (`INVALID_REQUEST`);
//! 6. fill the context and calculate.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::clock::Clock;
use crate::errors::{AppError, ValidationError};
use crate::model;
use crate::schemas::{
    ClientsInterestsRequest, Method, MethodRequest, MethodSchema, OnlineScoreRequest,
    RequestContext,
};
use crate::scoring::Scorer;

/// Score returned to the admin without touching the scorer.
pub const ADMIN_SCORE: u64 = 42;

#[derive(Clone)]
pub struct MethodDispatcher {
    auth: Authenticator,
    scorer: Arc<dyn Scorer>,
    clock: Arc<dyn Clock>,
}

impl MethodDispatcher {
    pub fn new(auth: Authenticator, scorer: Arc<dyn Scorer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth,
            scorer,
            clock,
        }
    }

    /// Runs one request body through validation, auth and calculation.
    pub fn dispatch(&self, body: &Value, ctx: &mut RequestContext) -> Result<Value, AppError> {
        let raw = body
            .as_object()
            .ok_or(ValidationError::NotAnObject("request"))?;
        let now = self.clock.now();

        let request: MethodRequest = model::build(raw, now.date())?;

        if !self.auth.check_auth(&request, now) {
            tracing::debug!(
                request_id = %ctx.request_id,
                login = request.login.as_deref().unwrap_or_default(),
                "digest mismatch"
            );
            return Err(AppError::Forbidden);
        }

        let is_admin = self.auth.is_admin(&request);
        if request.method == Method::OnlineScore.as_str() && is_admin {
            return Ok(json!({ "score": ADMIN_SCORE }));
        }

        let arguments = request.arguments_map()?;
        match request.route()? {
            Method::OnlineScore => self.run::<OnlineScoreRequest>(&arguments, now.date(), ctx),
            Method::ClientsInterests => {
                self.run::<ClientsInterestsRequest>(&arguments, now.date(), ctx)
            }
        }
    }

    fn run<S: MethodSchema>(
        &self,
        arguments: &serde_json::Map<String, Value>,
        today: chrono::NaiveDate,
        ctx: &mut RequestContext,
    ) -> Result<Value, AppError> {
        let request: S = model::build(arguments, today)?;
        request.set_context(ctx);
        Ok(request.calculate(self.scorer.as_ref())?)
    }
}
