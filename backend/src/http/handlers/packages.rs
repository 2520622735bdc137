//! `/api/packages`

use axum::extract::{Path, State};

use super::{created, done, ok, ok_with, CreatedResult, HandlerResult};
use crate::api::{Package, PackageId};
use crate::http::extract::{parse_id, JsonRecord, QueryRecord};
use crate::http::state::AppState;
use crate::services::packages::{self, PackageEvents};

/// GET /api/packages
///
/// `active_only=true` hides inactive packages.
pub async fn list_packages(
    State(state): State<AppState>,
    QueryRecord(query): QueryRecord,
) -> HandlerResult<Vec<Package>> {
    ok(packages::list_packages(state.repo(), &query).await?)
}

/// GET /api/packages/{id}
pub async fn get_package(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<Package> {
    let id: PackageId = parse_id(&id)?;
    ok(packages::get_package(state.repo(), id).await?)
}

/// GET /api/packages/{id}/events
pub async fn package_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<PackageEvents> {
    let id: PackageId = parse_id(&id)?;
    ok(packages::package_events(state.repo(), id).await?)
}

/// POST /api/packages
pub async fn create_package(
    State(state): State<AppState>,
    JsonRecord(body): JsonRecord,
) -> CreatedResult<Package> {
    let package = packages::create_package(state.repo(), &body).await?;
    created(package, "Package created successfully")
}

/// PUT /api/packages/{id}
pub async fn update_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonRecord(body): JsonRecord,
) -> HandlerResult<Package> {
    let id: PackageId = parse_id(&id)?;
    let package = packages::update_package(state.repo(), id, &body).await?;
    ok_with(package, "Package updated successfully")
}

/// DELETE /api/packages/{id}
pub async fn delete_package(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult<()> {
    let id: PackageId = parse_id(&id)?;
    let package = packages::delete_package(state.repo(), id).await?;
    done(format!("Package \"{}\" deleted successfully", package.package_name))
}
