// HTTP API routes (verdicts, case history, replay analysis, cost, learning).

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, Extension, Json, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::cost::{calculate_cost, usd_to_krw, CostRequest};
use crate::court::actions::GameState;
use crate::court::analyzer::{analyze_case, VerdictAnalysis};
use crate::court::fault::{estimate_fault, FaultEstimate};
use crate::court::rewards::{HeuristicRewardTable, LearningSnapshot};
use crate::db::{Database, NewPayment};
use crate::error::{AppError, SnapshotError};
use crate::llms_txt::LLMS_TXT;
use crate::metrics;
use crate::rate_limit::{RateLimitType, RateLimiter};
use crate::rofl::generate_replay;

// ── Request types ─────────────────────────────────────────────────────

const MAX_SITUATION_CHARS: usize = 200;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRequest {
    pub case_description: String,
    pub game_data: Option<GameState>,
    /// Action the player actually took; enables the fault estimate.
    pub actual_action: Option<String>,
    /// Situation used for candidate actions; defaults to the description.
    pub situation: Option<String>,
}

#[derive(Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayParams {
    pub file_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub action: String,
    pub situation: String,
    pub reward: f64,
}

// ── Response types ────────────────────────────────────────────────────

/// What gets stored with a case and returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictPayload {
    #[serde(flatten)]
    pub analysis: VerdictAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_estimate: Option<FaultEstimate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    pub case_id: i64,
    #[serde(flatten)]
    pub payload: VerdictPayload,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// Shared reward table; learning updates take the write lock.
    pub rewards: Arc<RwLock<HeuristicRewardTable>>,
    pub rate_limiter: RateLimiter,
    pub snapshot_path: PathBuf,
    /// Take the client from `x-forwarded-for` instead of the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl AppState {
    fn rewards(&self) -> RwLockReadGuard<'_, HeuristicRewardTable> {
        self.rewards.read().unwrap_or_else(|e| e.into_inner())
    }

    fn rewards_mut(&self) -> RwLockWriteGuard<'_, HeuristicRewardTable> {
        self.rewards.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Rate-limit identity of the caller, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Peer IP, or the first `x-forwarded-for` hop when the proxy is trusted.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> ClientKey {
    let forwarded = if trust_forwarded_for {
        forwarded_for(headers)
    } else {
        None
    };
    let key = forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    ClientKey(key)
}

async fn resolve_client(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(req.headers(), peer, state.trust_forwarded_for);
    req.extensions_mut().insert(key);
    next.run(req).await
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/llms.txt", get(get_llms_txt))
        // Verdicts
        .route("/api/verdict", post(create_verdict))
        .route("/api/cases", get(list_cases))
        .route("/api/cases/{id}", get(get_case).delete(delete_case))
        // Replays
        .route("/api/replays/analyze", post(analyze_replay))
        // Cost & payments
        .route("/api/cost/estimate", post(estimate_cost))
        .route("/api/payments", post(create_payment))
        .route("/api/payments/{payment_id}", get(get_payment))
        // Reward table
        .route("/api/learning/feedback", post(learning_feedback))
        .route("/api/learning/export", get(learning_export))
        .route("/api/learning/import", put(learning_import))
        .route("/api/learning/save", post(learning_save))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_client))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let start = Instant::now();

    let response = next.run(req).await;

    metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(start.elapsed().as_secs_f64());
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();
    response
}

// ── Misc handlers ─────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "lolcourt-backend" }))
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

async fn get_llms_txt() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], LLMS_TXT)
}

// ── Verdict handlers ──────────────────────────────────────────────────

async fn create_verdict(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    Json(req): Json<VerdictRequest>,
) -> Result<impl IntoResponse, AppError> {
    let description = req.case_description.trim();
    if description.is_empty() {
        return Err(AppError::BadRequest("caseDescription is required".into()));
    }
    state
        .rate_limiter
        .check_limit(&client.0, RateLimitType::Verdicts)?;

    let analysis = analyze_case(description);
    metrics::VERDICTS_TOTAL
        .with_label_values(&[analysis.verdict.as_str()])
        .inc();

    let fault_estimate = req.actual_action.as_deref().map(|actual| {
        let game_state = req
            .game_data
            .clone()
            .map(GameState::normalized)
            .unwrap_or_else(|| GameState::from_description(description));
        let situation = req.situation.as_deref().unwrap_or(description);
        let estimate = estimate_fault(situation, &game_state, actual, &state.rewards());
        metrics::FAULT_ESTIMATES_TOTAL
            .with_label_values(&[estimate.judgment.as_str()])
            .inc();
        estimate
    });

    let payload = VerdictPayload {
        analysis,
        fault_estimate,
    };
    let stored = serde_json::to_string(&payload)?;
    let case = state
        .db
        .create_case(
            description,
            &payload.analysis.verdict,
            payload.analysis.confidence,
            &stored,
        )
        .await?;
    tracing::info!(case_id = case.id, verdict = %payload.analysis.verdict, "verdict issued");

    Ok((
        StatusCode::CREATED,
        Json(VerdictResponse {
            case_id: case.id,
            payload,
        }),
    ))
}

fn case_json(case: crate::db::CaseRecord) -> Value {
    let analysis: Value = serde_json::from_str(&case.payload).unwrap_or(Value::Null);
    json!({
        "id": case.id,
        "description": case.description,
        "verdict": case.verdict,
        "confidence": case.confidence,
        "createdAt": case.created_at,
        "analysis": analysis,
    })
}

async fn list_cases(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Value>, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let cases = state.db.list_cases(limit, offset).await?;
    Ok(Json(Value::Array(cases.into_iter().map(case_json).collect())))
}

async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    match state.db.get_case(id).await? {
        Some(case) => Ok(Json(case_json(case))),
        None => Err(AppError::NotFound("Case not found".into())),
    }
}

async fn delete_case(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.db.delete_case(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Case not found".into()))
    }
}

// ── Replay handlers ───────────────────────────────────────────────────

async fn analyze_replay(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    Query(params): Query<ReplayParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    state
        .rate_limiter
        .check_limit(&client.0, RateLimitType::ReplayUploads)?;

    let file_name = params
        .file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "replay.rofl".to_string());
    metrics::REPLAY_UPLOAD_BYTES.observe(body.len() as f64);

    // CPU-bound; keep it off the async workers.
    let analysis = tokio::task::spawn_blocking(move || generate_replay(&body, &file_name))
        .await
        .map_err(|e| AppError::Internal(format!("replay task failed: {e}")))?;

    metrics::REPLAYS_ANALYZED_TOTAL
        .with_label_values(&[analysis.source.label()])
        .inc();
    tracing::info!(
        file = %analysis.record.file_name,
        size = analysis.record.file_size,
        source = analysis.source.label(),
        "replay analyzed"
    );
    Ok(Json(analysis))
}

// ── Cost & payment handlers ───────────────────────────────────────────

async fn estimate_cost(Json(req): Json<CostRequest>) -> Result<Json<Value>, AppError> {
    if !req.duration.is_finite() || req.duration < 0.0 {
        return Err(AppError::BadRequest("duration must be a non-negative number".into()));
    }
    let estimate = calculate_cost(&req);
    let total_krw = usd_to_krw(estimate.total_cost);
    let mut body = serde_json::to_value(&estimate)?;
    body["totalCostKrw"] = json!(total_krw);
    Ok(Json(body))
}

async fn create_payment(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    Json(req): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }
    if req.currency.trim().is_empty() || req.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest("currency and paymentMethod are required".into()));
    }
    state
        .rate_limiter
        .check_limit(&client.0, RateLimitType::Payments)?;

    let payment_id = uuid::Uuid::new_v4().to_string();
    state
        .db
        .create_payment(&NewPayment {
            payment_id: &payment_id,
            amount: req.amount,
            currency: &req.currency,
            payment_method: &req.payment_method,
            file_name: &req.file_name,
            duration: req.duration,
        })
        .await?;
    metrics::PAYMENTS_TOTAL.inc();
    tracing::info!(%payment_id, amount = req.amount, currency = %req.currency, "mock payment recorded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "paymentId": payment_id,
            "paidAt": chrono::Utc::now().to_rfc3339(),
            "message": format!("{} {:.2} 결제가 완료되었습니다 (모의 결제)", req.currency, req.amount),
        })),
    ))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.db.get_payment(&payment_id).await? {
        Some(payment) => Ok(Json(payment)),
        None => Err(AppError::NotFound("Payment not found".into())),
    }
}

// ── Learning handlers ─────────────────────────────────────────────────

async fn learning_feedback(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    if !req.reward.is_finite() {
        return Err(AppError::BadRequest("reward must be a finite number".into()));
    }
    let situation = req.situation.trim();
    if situation.is_empty() || situation.chars().count() > MAX_SITUATION_CHARS {
        return Err(AppError::BadRequest(format!(
            "situation must be 1 to {MAX_SITUATION_CHARS} characters"
        )));
    }
    state
        .rate_limiter
        .check_limit(&client.0, RateLimitType::Learning)?;

    let updated = {
        let mut table = state.rewards_mut();
        if !table.contains(&req.action) {
            return Err(AppError::BadRequest(format!("unknown action: {}", req.action)));
        }
        table.learn_from_result(&req.action, situation, req.reward)
    };
    metrics::LEARNING_UPDATES_TOTAL.inc();
    Ok(Json(json!({ "action": req.action, "reward": updated })))
}

async fn learning_export(State(state): State<AppState>) -> Json<LearningSnapshot> {
    Json(state.rewards().export())
}

async fn learning_import(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    Json(snapshot): Json<LearningSnapshot>,
) -> Result<StatusCode, AppError> {
    state
        .rate_limiter
        .check_limit(&client.0, RateLimitType::Learning)?;
    let actions = snapshot.rewards.len();
    state.rewards_mut().import(snapshot);
    tracing::info!(actions, client = %client.0, "reward table replaced by import");
    Ok(StatusCode::NO_CONTENT)
}

async fn learning_save(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let snapshot = state.rewards().export();
    let json = serde_json::to_string_pretty(&snapshot)?;
    tokio::fs::write(&state.snapshot_path, json)
        .await
        .map_err(SnapshotError::from)?;
    tracing::info!("Saved learning snapshot to {}", state.snapshot_path.display());
    Ok(Json(json!({ "path": state.snapshot_path.display().to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.7:51000".parse().unwrap())
    }

    #[test]
    fn test_client_key_ignores_forwarded_for_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers, peer(), false), ClientKey("192.0.2.7".into()));
    }

    #[test]
    fn test_client_key_uses_first_forwarded_hop_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.1".parse().unwrap());
        assert_eq!(client_key(&headers, peer(), true), ClientKey("10.0.0.1".into()));
    }

    #[test]
    fn test_client_key_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_key(&headers, peer(), true), ClientKey("192.0.2.7".into()));
        assert_eq!(client_key(&HeaderMap::new(), None, false), ClientKey("unknown".into()));
    }

    #[test]
    fn test_verdict_request_minimal_body() {
        let req: VerdictRequest = serde_json::from_str(r#"{"caseDescription":"탑이 던졌어요"}"#).unwrap();
        assert!(req.game_data.is_none());
        assert!(req.actual_action.is_none());
    }
}
