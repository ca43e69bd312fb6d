//! OpenAPI documentation aggregator (spec §4.H `GET /spec`), the same
//! `utoipa::OpenApi` derive pattern as the teacher's `api/doc.rs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ecss-scheduler API",
        version = "0.1.0",
        description = "Schedules ephemeral container tasks on an orchestrator according to cron-like timing rules and optional queue-depth triggers.",
    ),
    tags(
        (name = "Jobs", description = "Scheduled job CRUD, pagination, and fan-out dry-run"),
    ),
    paths(
        crate::routes::list_jobs,
        crate::routes::create_job,
        crate::routes::get_job,
        crate::routes::update_job,
        crate::routes::delete_job,
        crate::routes::dry_run,
    ),
    components(schemas(
        ecss_core::Job,
        ecss_core::JobOverride,
        ecss_core::Trigger,
        crate::routes::ListResponse,
        crate::routes::CreateResponse,
        crate::routes::DryRunResponse,
        crate::routes::Link,
        crate::routes::EndpointInfo,
    ))
)]
pub struct ApiDoc;
