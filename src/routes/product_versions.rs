use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::projects::format_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::{NewProductVersion, ProductVersion, Project};
use crate::schema::{product_versions, projects};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProductVersionRequest {
    pub version: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProductVersionRequest {
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = product_versions)]
struct ProductVersionChangeset<'a> {
    version: Option<&'a str>,
    description: Option<&'a str>,
    updated_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct ProductVersionResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProductVersion> for ProductVersionResponse {
    fn from(record: ProductVersion) -> Self {
        Self {
            id: record.id,
            project_id: record.project_id,
            version: record.version,
            description: record.description,
            created_at: format_timestamp(record.created_at),
            updated_at: format_timestamp(record.updated_at),
        }
    }
}

pub async fn list_product_versions(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductVersionResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<ProductVersion> = product_versions::table
        .filter(product_versions::project_id.eq(project_id))
        .order(product_versions::created_at.desc())
        .load(&mut conn)?;
    Ok(Json(
        rows.into_iter()
            .map(ProductVersionResponse::from)
            .collect(),
    ))
}

pub async fn create_product_version(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateProductVersionRequest>,
) -> AppResult<(StatusCode, Json<ProductVersionResponse>)> {
    let version = payload.version.trim();
    if version.is_empty() {
        return Err(AppError::bad_request("version must not be empty"));
    }

    let mut conn = state.db()?;
    let _project: Project = projects::table.find(project_id).first(&mut conn)?;

    let new_version = NewProductVersion {
        id: Uuid::new_v4(),
        project_id,
        version: version.to_string(),
        description: payload.description,
    };
    diesel::insert_into(product_versions::table)
        .values(&new_version)
        .execute(&mut conn)?;

    let record: ProductVersion = product_versions::table
        .find(new_version.id)
        .first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn get_product_version(
    State(state): State<AppState>,
    Path(product_version_id): Path<Uuid>,
) -> AppResult<Json<ProductVersionResponse>> {
    let mut conn = state.db()?;
    let record: ProductVersion = product_versions::table
        .find(product_version_id)
        .first(&mut conn)?;
    Ok(Json(record.into()))
}

pub async fn update_product_version(
    State(state): State<AppState>,
    Path(product_version_id): Path<Uuid>,
    Json(payload): Json<UpdateProductVersionRequest>,
) -> AppResult<Json<ProductVersionResponse>> {
    if let Some(version) = payload.version.as_deref() {
        if version.trim().is_empty() {
            return Err(AppError::bad_request("version must not be empty"));
        }
    }

    let mut conn = state.db()?;
    let changeset = ProductVersionChangeset {
        version: payload.version.as_deref().map(str::trim),
        description: payload.description.as_deref(),
        updated_at: Utc::now().naive_utc(),
    };
    diesel::update(product_versions::table.find(product_version_id))
        .set(&changeset)
        .execute(&mut conn)?;

    let record: ProductVersion = product_versions::table
        .find(product_version_id)
        .first(&mut conn)?;
    Ok(Json(record.into()))
}

pub async fn delete_product_version(
    State(state): State<AppState>,
    Path(product_version_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let deleted = diesel::delete(product_versions::table.find(product_version_id))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
