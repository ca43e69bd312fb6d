//! Job CRUD handlers (spec §4.H), generalized from the teacher's
//! `rules.rs` CRUD-endpoint idiom onto the `ecss-store`/`ecss-core`
//! job model.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use ecss_core::{default_id_from_task_definition, strip_managed_fields, validate_job, validate_patch, Job, JobPatch, StoreError};
use ecss_scheduler::Mutation;
use ecss_trigger::{clamp_triggered, clamp_untriggered};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

// ── Wire DTOs ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListParams {
    pub skip: Option<usize>,
    pub count: Option<usize>,
}

const DEFAULT_COUNT: usize = 10;

#[derive(Debug, Serialize, ToSchema)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    pub items: Vec<Job>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateResponse {
    pub id: String,
    pub link: Link,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DryRunResponse {
    pub launch_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────

/// `GET /` — list of endpoints (spec §4.H).
pub async fn root() -> Json<Vec<EndpointInfo>> {
    Json(vec![
        EndpointInfo { method: "GET", path: "/jobs" },
        EndpointInfo { method: "POST", path: "/jobs" },
        EndpointInfo { method: "GET", path: "/jobs/{id}" },
        EndpointInfo { method: "PUT", path: "/jobs/{id}" },
        EndpointInfo { method: "DELETE", path: "/jobs/{id}" },
        EndpointInfo { method: "GET", path: "/jobs/{id}/dry-run" },
        EndpointInfo { method: "GET", path: "/" },
        EndpointInfo { method: "GET", path: "/spec" },
    ])
}

/// `GET /spec` — static OpenAPI document (spec §4.H: "static OpenAPI
/// document", not an interactive viewer — the raw `utoipa::OpenApi`
/// JSON rather than a Scalar/Swagger UI).
pub async fn spec() -> impl IntoResponse {
    use utoipa::OpenApi;
    let json = crate::doc::ApiDoc::openapi().to_pretty_json().unwrap_or_else(|_| "{}".to_string());
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], json)
}

/// `GET /jobs?skip=&count=` — paginated list, `Link`-style `next`/`prev`
/// (spec §4.H).
#[utoipa::path(get, path = "/jobs", params(ListParams), responses((status = 200, body = ListResponse)), tag = "Jobs")]
pub async fn list_jobs(State(state): State<Arc<AppState>>, Query(params): Query<ListParams>) -> Result<impl IntoResponse, ApiError> {
    let skip = params.skip.unwrap_or(0);
    let count = params.count.unwrap_or(DEFAULT_COUNT);

    let page = state.store.list(skip, count).await?;

    let next = (skip + page.items.len() < page.total).then(|| Link { href: format!("/jobs?skip={}&count={}", skip + count, count) });
    let prev = (skip > 0).then(|| Link { href: format!("/jobs?skip={}&count={}", skip.saturating_sub(count), count) });

    let body = ListResponse { items: page.items, total: page.total, next, prev };
    let last = skip + body.items.len().saturating_sub(1);
    let content_range = format!("jobs {}-{}/{}", skip, last, body.total);

    Ok((StatusCode::OK, [(header::CONTENT_RANGE, content_range)], Json(body)))
}

/// `POST /jobs` — create (spec §4.H, §8 scenarios 1/3/4).
///
/// Body is parsed as a raw [`serde_json::Value`] rather than straight
/// into [`Job`] so `id` can default from `taskDefinition` (spec §8
/// scenario 1) and engine-managed keys can be silently dropped (spec
/// §9) before the typed deserialize, instead of rejecting either case
/// with a 422.
#[utoipa::path(post, path = "/jobs", responses((status = 201, body = CreateResponse), (status = 409), (status = 422)), tag = "Jobs")]
pub async fn create_job(State(state): State<Arc<AppState>>, Json(raw): Json<serde_json::Value>) -> Result<impl IntoResponse, ApiError> {
    let raw = default_id_from_task_definition(raw);
    let raw = strip_managed_fields(raw);

    let mut job: Job = serde_json::from_value(raw).map_err(|e| StoreError::Validation(body_parse_error(e)))?;

    validate_job(&job).map_err(StoreError::Validation)?;
    job.schedule = ecss_schedule::resolve_schedule(&job.schedule).map_err(|e| StoreError::Validation(schedule_error(e)))?;

    let created = state.store.create(job).await?;
    state
        .mutations
        .send(Mutation::Create(created.clone()))
        .await
        .map_err(|_| StoreError::Internal("mutation channel closed".to_string()))?;

    let body = CreateResponse { id: created.id.clone(), link: Link { href: format!("/jobs/{}", created.id) } };
    Ok((StatusCode::CREATED, Json(body)))
}

/// `GET /jobs/{id}` — 404 if absent. The advisory-lock sentinel record
/// lives in the same keyspace but is never a real job (spec §4.C list
/// semantics), so its id 404s here even though `store.get` itself still
/// returns it honestly for `AdvisoryLock`'s own bookkeeping.
#[utoipa::path(get, path = "/jobs/{id}", responses((status = 200, body = Job), (status = 404)), tag = "Jobs")]
pub async fn get_job(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Job>, ApiError> {
    reject_reserved_id(&id)?;
    Ok(Json(state.store.get(&id).await?))
}

/// `PUT /jobs/{id}` — partial merge (spec §3 Lifecycle, §8 scenario 2/6).
#[utoipa::path(put, path = "/jobs/{id}", responses((status = 200, body = Job), (status = 404), (status = 422)), tag = "Jobs")]
pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(raw): Json<serde_json::Value>,
) -> Result<Json<Job>, ApiError> {
    reject_reserved_id(&id)?;
    let raw = strip_managed_fields(raw);
    let mut patch: JobPatch = serde_json::from_value(raw).map_err(|e| StoreError::Validation(body_parse_error(e)))?;

    validate_patch(&patch).map_err(StoreError::Validation)?;
    if let Some(schedule) = &patch.schedule {
        patch.schedule = Some(ecss_schedule::resolve_schedule(schedule).map_err(|e| StoreError::Validation(schedule_error(e)))?);
    }

    // A patch that only flips `suspended` publishes the lighter-weight
    // pause/resume mutation kind (spec §4.G's `pause|resume` message
    // kinds) instead of a full `Update`, same distinction the engine
    // dispatch routine expects at spec §3's lifecycle diagram.
    let suspend_toggle = suspend_only_target(&patch);

    let updated = state.store.update(&id, patch).await?;
    let mutation = match suspend_toggle {
        Some(true) => Mutation::Pause(id.clone()),
        Some(false) => Mutation::Resume(id.clone()),
        None => Mutation::Update(updated.clone()),
    };
    state.mutations.send(mutation).await.map_err(|_| StoreError::Internal("mutation channel closed".to_string()))?;

    Ok(Json(updated))
}

/// `Some(target)` when `patch` sets only `suspended` and nothing else;
/// `None` otherwise (including when `suspended` itself is unset).
fn suspend_only_target(patch: &JobPatch) -> Option<bool> {
    let only_suspended = patch.task_definition.is_none()
        && patch.schedule.is_none()
        && patch.schedule_start.is_none()
        && patch.schedule_end.is_none()
        && patch.timezone.is_none()
        && patch.task_count.is_none()
        && patch.max_count.is_none()
        && patch.trigger.is_none()
        && patch.overrides.is_none();
    if only_suspended {
        patch.suspended
    } else {
        None
    }
}

/// `DELETE /jobs/{id}` — 204 on success, 404 if absent.
#[utoipa::path(delete, path = "/jobs/{id}", responses((status = 204), (status = 404)), tag = "Jobs")]
pub async fn delete_job(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    reject_reserved_id(&id)?;
    state.store.delete(&id).await?;
    state
        .mutations
        .send(Mutation::Delete(id))
        .await
        .map_err(|_| StoreError::Internal("mutation channel closed".to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /jobs/{id}/dry-run` — supplemental endpoint (SPEC_FULL.md):
/// evaluates the job's trigger against current conditions and returns
/// the launch count that *would* result, without launching. Shares
/// `ecss_trigger::clamp_triggered`/`clamp_untriggered` with the
/// scheduler's own fire procedure so the two stay provably consistent.
#[utoipa::path(get, path = "/jobs/{id}/dry-run", responses((status = 200, body = DryRunResponse), (status = 404)), tag = "Jobs")]
pub async fn dry_run(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<DryRunResponse>, ApiError> {
    reject_reserved_id(&id)?;
    let job = state.store.get(&id).await?;

    let response = match &job.trigger {
        Some(trigger) => match state.triggers.evaluate(&trigger.kind, &trigger.fields).await {
            Ok(desired) => DryRunResponse { launch_count: clamp_triggered(&job, desired), trigger_error: None },
            Err(err) => DryRunResponse { launch_count: 0, trigger_error: Some(err.to_string()) },
        },
        None => DryRunResponse { launch_count: clamp_untriggered(&job), trigger_error: None },
    };

    Ok(Json(response))
}

/// The advisory-lock sentinel (`ecss_store::LOCK_JOB_ID`) is a real
/// record so `AdvisoryLock` can read/write it through the same
/// `JobStore` every job uses, but it is not a job a client should ever
/// see or touch through the HTTP surface.
fn reject_reserved_id(id: &str) -> Result<(), ApiError> {
    if id == ecss_store::LOCK_JOB_ID {
        return Err(ApiError(StoreError::NotFound(id.to_string())));
    }
    Ok(())
}

fn body_parse_error(err: serde_json::Error) -> ecss_core::ValidationError {
    ecss_core::ValidationError { errors: vec![ecss_core::FieldError { field: "body".to_string(), message: err.to_string() }] }
}

fn schedule_error(err: ecss_schedule::ScheduleError) -> ecss_core::ValidationError {
    ecss_core::ValidationError { errors: vec![ecss_core::FieldError { field: "schedule".to_string(), message: err.to_string() }] }
}
