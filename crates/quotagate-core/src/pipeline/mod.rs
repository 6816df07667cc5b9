//! Dispatch pipeline
//!
//! request -> gate -> cooldown -> prompt validation -> cache lookup
//! -> (miss) dispatch -> cache write + usage increment -> audit -> response
//!
//! Side effects run on one shared [`TaskTracker`]; the response never waits
//! for them. [`DispatchPipeline::drain`] waits for everything outstanding.


use crate::account::{Account, AccountStore};
use crate::accountant::UsageAccountant;
use crate::audit::{AuditLogger, LogStore, NewUsageLog, UNKNOWN_CALLER};
use crate::cache::ResponseCache;
use crate::cooldown::CooldownGuard;
use crate::error::GatewayError;
use crate::gate::CredentialGate;
use chrono::Utc;
use quotagate_llm::Dispatcher;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

/// Inbound pipeline request
#[derive(Debug, Clone)]
pub struct AskRequest {
    /// Registration number from the request header
    pub identifier: Option<String>,
    /// Parsed body, `Value::Null` when the body was not JSON
    pub body: Value,
    /// Matched route path
    pub endpoint: String,
    /// HTTP method
    pub method: String,
    /// Client address
    pub ip_address: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
}

impl AskRequest {
    /// `POST` request on `endpoint` with the given identifier and body
    pub fn new(endpoint: impl Into<String>, identifier: Option<&str>, body: Value) -> Self {
        Self {
            identifier: identifier.map(str::to_string),
            body,
            endpoint: endpoint.into(),
            method: "POST".to_string(),
            ip_address: None,
            user_agent: None,
        }
    }

    /// Attach client metadata
    #[must_use]
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// Status and JSON body to send back
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResponse {
    /// HTTP status
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl PipelineResponse {
    fn answer(answer: String) -> Self {
        Self {
            status: 200,
            body: json!({ "answer": answer }),
        }
    }
}

impl From<GatewayError> for PipelineResponse {
    fn from(err: GatewayError) -> Self {
        Self {
            status: err.status(),
            body: err.body(),
        }
    }
}

/// The request-dispatch pipeline
pub struct DispatchPipeline {
    gate: CredentialGate,
    cooldown: CooldownGuard,
    cache: ResponseCache,
    dispatcher: Arc<dyn Dispatcher>,
    accountant: UsageAccountant,
    audit: AuditLogger,
    tracker: TaskTracker,
}

impl DispatchPipeline {
    /// Assemble a pipeline from its collaborators
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        logs: Arc<dyn LogStore>,
        cache: ResponseCache,
        cooldown: CooldownGuard,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let tracker = TaskTracker::new();
        Self {
            gate: CredentialGate::new(Arc::clone(&accounts)),
            cooldown,
            cache,
            dispatcher,
            accountant: UsageAccountant::new(accounts, tracker.clone()),
            audit: AuditLogger::new(logs, tracker.clone()),
            tracker,
        }
    }

    /// Cooldown guard
    #[must_use]
    pub fn cooldown(&self) -> &CooldownGuard {
        &self.cooldown
    }

    /// Response cache
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Upstream dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    /// Run one request through the pipeline. Always audits exactly once.
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint))]
    pub async fn handle(&self, request: AskRequest) -> PipelineResponse {
        let used_at = Utc::now();
        let mut account = None;
        let response = match self.process(&request, &mut account).await {
            Ok(answer) => PipelineResponse::answer(answer),
            Err(e) => {
                debug!(status = e.status(), reason = %e, "Request rejected");
                PipelineResponse::from(e)
            }
        };

        let caller = request
            .identifier
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| account.as_ref().map(|a| a.registration_number.clone()))
            .unwrap_or_else(|| UNKNOWN_CALLER.to_string());

        self.audit.record(NewUsageLog {
            user_id: account.as_ref().map(|a| a.id),
            api_key: caller,
            endpoint: request.endpoint,
            request_method: request.method,
            request_payload: request.body,
            response_payload: response.body.clone(),
            response_status: response.status,
            used_at,
            ip_address: request.ip_address,
            user_agent: request.user_agent,
        });

        response
    }

    async fn process(
        &self,
        request: &AskRequest,
        account_slot: &mut Option<Account>,
    ) -> Result<String, GatewayError> {
        let account = self.gate.check(request.identifier.as_deref()).await?;
        let account_id = account.id;
        *account_slot = Some(account);

        self.cooldown.try_admit()?;

        let prompt = extract_prompt(&request.body).ok_or_else(GatewayError::invalid_prompt)?;

        if let Some(answer) = self.cache.get(prompt).await {
            info!(account_id, "Answer served from cache");
            return Ok(answer);
        }

        let raw = self.dispatcher.dispatch(prompt).await.map_err(|e| {
            warn!(account_id, provider = self.dispatcher.name(), error = %e, "Dispatch failed");
            GatewayError::from(e)
        })?;
        let answer = raw.trim().to_string();

        let cache = self.cache.clone();
        let (cache_prompt, cache_answer) = (prompt.to_string(), answer.clone());
        self.tracker.spawn(async move {
            cache.set(&cache_prompt, &cache_answer).await;
        });
        self.accountant.record_use(account_id);

        info!(account_id, model = self.dispatcher.model(), "Answer dispatched");
        Ok(answer)
    }

    /// Wait for all outstanding side-effect tasks
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Abort the cooldown reset and drain side effects
    pub async fn shutdown(&self) {
        self.cooldown.shutdown();
        self.drain().await;
        info!("Dispatch pipeline drained");
    }
}

/// Non-empty string `prompt` field of the body
fn extract_prompt(body: &Value) -> Option<&str> {
    body.get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
}
