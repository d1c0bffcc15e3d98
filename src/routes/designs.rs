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
use crate::models::{Design, NewDesign, ProductVersion};
use crate::schema::{designs, product_versions};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateDesignRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDesignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = designs)]
struct DesignChangeset<'a> {
    name: Option<&'a str>,
    description: Option<&'a str>,
    updated_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct DesignResponse {
    pub id: Uuid,
    pub product_version_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Design> for DesignResponse {
    fn from(design: Design) -> Self {
        Self {
            id: design.id,
            product_version_id: design.product_version_id,
            name: design.name,
            description: design.description,
            created_at: format_timestamp(design.created_at),
            updated_at: format_timestamp(design.updated_at),
        }
    }
}

pub async fn list_designs(
    State(state): State<AppState>,
    Path(product_version_id): Path<Uuid>,
) -> AppResult<Json<Vec<DesignResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<Design> = designs::table
        .filter(designs::product_version_id.eq(product_version_id))
        .order(designs::created_at.desc())
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(DesignResponse::from).collect()))
}

pub async fn create_design(
    State(state): State<AppState>,
    Path(product_version_id): Path<Uuid>,
    Json(payload): Json<CreateDesignRequest>,
) -> AppResult<(StatusCode, Json<DesignResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }

    let mut conn = state.db()?;
    let _version: ProductVersion = product_versions::table
        .find(product_version_id)
        .first(&mut conn)?;

    let new_design = NewDesign {
        id: Uuid::new_v4(),
        product_version_id,
        name: name.to_string(),
        description: payload.description,
    };
    diesel::insert_into(designs::table)
        .values(&new_design)
        .execute(&mut conn)?;

    let design: Design = designs::table.find(new_design.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(design.into())))
}

pub async fn get_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
) -> AppResult<Json<DesignResponse>> {
    let mut conn = state.db()?;
    let design: Design = designs::table.find(design_id).first(&mut conn)?;
    Ok(Json(design.into()))
}

pub async fn update_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    Json(payload): Json<UpdateDesignRequest>,
) -> AppResult<Json<DesignResponse>> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
    }

    let mut conn = state.db()?;
    let changeset = DesignChangeset {
        name: payload.name.as_deref().map(str::trim),
        description: payload.description.as_deref(),
        updated_at: Utc::now().naive_utc(),
    };
    diesel::update(designs::table.find(design_id))
        .set(&changeset)
        .execute(&mut conn)?;

    let design: Design = designs::table.find(design_id).first(&mut conn)?;
    Ok(Json(design.into()))
}

pub async fn delete_design(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let deleted = diesel::delete(designs::table.find(design_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
