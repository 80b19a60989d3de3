#![deny(unsafe_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use ballot_core::{
    BallotError, ElectionId, ElectionRegistry, ElectionSummary, ErrorKind, Identity, JournalEntry,
    Proposal, ProposalId, TallyOutcome, Voter, WorkflowStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Header carrying the caller identity of every request.
pub const CALLER_HEADER: &str = "x-caller-identity";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub allow_status_override: bool,
    pub event_buffer: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            allow_status_override: false,
            event_buffer: ballot_core::registry::DEFAULT_EVENT_BUFFER,
        }
    }
}

#[derive(Clone)]
pub struct ServiceState {
    pub registry: Arc<ElectionRegistry>,
    pub config: Arc<ServiceConfig>,
}

impl ServiceState {
    pub fn bootstrap(config: ServiceConfig) -> Self {
        Self {
            registry: Arc::new(ElectionRegistry::new(config.event_buffer)),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/elections", get(list_elections).post(create_election))
        .route("/v1/elections/:election_id", get(get_summary))
        .route("/v1/elections/:election_id/status", get(get_status))
        .route("/v1/elections/:election_id/voters", post(add_voter))
        .route("/v1/elections/:election_id/voters/:voter", get(get_voter))
        .route("/v1/elections/:election_id/proposals", post(add_proposal))
        .route(
            "/v1/elections/:election_id/proposals/:proposal_id",
            get(get_proposal),
        )
        .route("/v1/elections/:election_id/votes", post(set_vote))
        .route(
            "/v1/elections/:election_id/workflow/override",
            put(override_status),
        )
        .route(
            "/v1/elections/:election_id/workflow/:transition",
            post(transition),
        )
        .route("/v1/elections/:election_id/winner", get(get_winner))
        .route("/v1/elections/:election_id/events", get(list_events))
        .with_state(state)
}

/// Log every journal entry published by the registry.
pub fn spawn_event_logger(state: &ServiceState) -> JoinHandle<()> {
    let mut events = state.registry.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(entry) => info!(
                    election_id = %entry.election_id,
                    index = entry.index,
                    event = entry.event.name(),
                    entry_hash = %entry.entry_hash,
                    "Election event"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error(transparent)]
    Ballot(#[from] BallotError),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::InvalidPhase | ErrorKind::AlreadyExists | ErrorKind::AlreadyVoted => {
            StatusCode::CONFLICT
        }
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Journal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
            ApiError::Ballot(err) => {
                let kind = err.kind();
                (
                    status_for(kind),
                    Json(serde_json::json!({ "error": err.message(), "kind": kind })),
                )
                    .into_response()
            }
        }
    }
}

fn caller(headers: &HeaderMap) -> Result<Identity, ApiError> {
    let value = headers
        .get(CALLER_HEADER)
        .ok_or_else(|| ApiError::forbidden(format!("missing {} header", CALLER_HEADER)))?;
    let raw = value
        .to_str()
        .map_err(|_| ApiError::bad_request(format!("{} must be valid text", CALLER_HEADER)))?;
    Ok(Identity::new(raw))
}

fn parse_election_id(raw: &str) -> Result<ElectionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("election '{}' not found", raw)))
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    elections: usize,
    status_override_enabled: bool,
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "ballot-service",
        elections: state.registry.len().await,
        status_override_enabled: state.config.allow_status_override,
    })
}

#[derive(Debug, Clone, Deserialize)]
struct CreateElectionRequest {
    administrator: Identity,
}

async fn create_election(
    State(state): State<ServiceState>,
    Json(request): Json<CreateElectionRequest>,
) -> Result<(StatusCode, Json<ElectionSummary>), ApiError> {
    let handle = state.registry.create(request.administrator).await?;
    Ok((StatusCode::CREATED, Json(handle.summary().await)))
}

#[derive(Debug, Clone, Serialize)]
struct ElectionListResponse {
    items: Vec<ElectionSummary>,
}

async fn list_elections(State(state): State<ServiceState>) -> Json<ElectionListResponse> {
    Json(ElectionListResponse {
        items: state.registry.list().await,
    })
}

async fn get_summary(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
) -> Result<Json<ElectionSummary>, ApiError> {
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    Ok(Json(handle.summary().await))
}

#[derive(Debug, Clone, Serialize)]
struct StatusResponse {
    status: WorkflowStatus,
    ordinal: u8,
}

async fn get_status(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    let status = handle.workflow_status().await;
    Ok(Json(StatusResponse {
        status,
        ordinal: status.ordinal(),
    }))
}

#[derive(Debug, Clone, Deserialize)]
struct AddVoterRequest {
    voter: Identity,
}

async fn add_voter(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<AddVoterRequest>,
) -> Result<Json<JournalEntry>, ApiError> {
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    Ok(Json(handle.add_voter(&caller, request.voter).await?))
}

async fn get_voter(
    Path((election_id, voter)): Path<(String, String)>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Json<Voter>, ApiError> {
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    Ok(Json(handle.get_voter(&caller, &Identity::new(voter)).await?))
}

#[derive(Debug, Clone, Deserialize)]
struct AddProposalRequest {
    description: String,
}

async fn add_proposal(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<AddProposalRequest>,
) -> Result<Json<JournalEntry>, ApiError> {
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    Ok(Json(handle.add_proposal(&caller, request.description).await?))
}

async fn get_proposal(
    Path((election_id, proposal_id)): Path<(String, String)>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Json<Proposal>, ApiError> {
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    let proposal_id: ProposalId = proposal_id
        .parse()
        .map_err(|_| ApiError::Ballot(BallotError::NotFound("Proposal not found".to_string())))?;
    Ok(Json(handle.get_one_proposal(&caller, proposal_id).await?))
}

#[derive(Debug, Clone, Deserialize)]
struct VoteRequest {
    proposal_id: ProposalId,
}

async fn set_vote(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<Json<JournalEntry>, ApiError> {
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    Ok(Json(handle.set_vote(&caller, request.proposal_id).await?))
}

async fn transition(
    Path((election_id, transition)): Path<(String, String)>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Json<JournalEntry>, ApiError> {
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    let entry = match transition.as_str() {
        "start-proposals" => handle.start_proposals_registering(&caller).await?,
        "end-proposals" => handle.end_proposals_registering(&caller).await?,
        "start-voting" => handle.start_voting_session(&caller).await?,
        "end-voting" => handle.end_voting_session(&caller).await?,
        "tally" => handle.tally_votes(&caller).await?,
        other => {
            return Err(ApiError::bad_request(format!(
                "invalid transition '{}'; expected one of: start-proposals, end-proposals, start-voting, end-voting, tally",
                other
            )))
        }
    };
    Ok(Json(entry))
}

#[derive(Debug, Clone, Deserialize)]
struct OverrideRequest {
    status: WorkflowStatus,
}

async fn override_status(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<JournalEntry>, ApiError> {
    if !state.config.allow_status_override {
        return Err(ApiError::forbidden("workflow status override is disabled"));
    }
    let caller = caller(&headers)?;
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    Ok(Json(
        handle
            .override_workflow_status(&caller, request.status)
            .await?,
    ))
}

#[derive(Debug, Clone, Serialize)]
struct WinnerResponse {
    winning_proposal_id: ProposalId,
    tally: Option<TallyOutcome>,
}

async fn get_winner(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
) -> Result<Json<WinnerResponse>, ApiError> {
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    let winning_proposal_id = handle.winner_id().await?;
    Ok(Json(WinnerResponse {
        winning_proposal_id,
        tally: handle.tally_outcome().await,
    }))
}

#[derive(Debug, Clone, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
    offset: Option<usize>,
    order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct EventsResponse {
    total: usize,
    returned: usize,
    chain_verified: bool,
    items: Vec<JournalEntry>,
}

async fn list_events(
    Path(election_id): Path<String>,
    State(state): State<ServiceState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let handle = state.registry.get(parse_election_id(&election_id)?).await?;
    let mut entries = handle.journal_entries().await;
    let chain_verified =
        ballot_core::EventJournal::from_entries(handle.id(), entries.clone()).is_ok();

    let order = query
        .order
        .as_deref()
        .unwrap_or("asc")
        .to_ascii_lowercase();
    if order == "desc" {
        entries.reverse();
    } else if order != "asc" {
        return Err(ApiError::bad_request(format!(
            "invalid order '{}'; expected asc or desc",
            order
        )));
    }

    let total = entries.len();
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);
    let items = entries
        .into_iter()
        .skip(offset)
        .take(limit)
        .collect::<Vec<_>>();
    let returned = items.len();

    Ok(Json(EventsResponse {
        total,
        returned,
        chain_verified,
        items,
    }))
}
