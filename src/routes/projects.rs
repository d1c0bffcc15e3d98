use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewProject, Project};
use crate::schema::projects;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Value>,
}

#[derive(AsChangeset)]
#[diesel(table_name = projects)]
struct ProjectChangeset<'a> {
    name: Option<&'a str>,
    description: Option<&'a str>,
    tags: Option<&'a Value>,
    updated_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            tags: project.tags,
            created_at: format_timestamp(project.created_at),
            updated_at: format_timestamp(project.updated_at),
        }
    }
}

pub(super) fn format_timestamp(value: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(value, Utc).to_rfc3339()
}

pub async fn list_projects(State(state): State<AppState>) -> AppResult<Json<Vec<ProjectResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<Project> = projects::table
        .order(projects::created_at.desc())
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(ProjectResponse::from).collect()))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }

    let mut conn = state.db()?;
    let new_project = NewProject {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: payload.description,
        tags: payload.tags,
    };
    diesel::insert_into(projects::table)
        .values(&new_project)
        .execute(&mut conn)?;

    let project: Project = projects::table.find(new_project.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<ProjectResponse>> {
    let mut conn = state.db()?;
    let project: Project = projects::table.find(project_id).first(&mut conn)?;
    Ok(Json(project.into()))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
    }

    let mut conn = state.db()?;
    let changeset = ProjectChangeset {
        name: payload.name.as_deref().map(str::trim),
        description: payload.description.as_deref(),
        tags: payload.tags.as_ref(),
        updated_at: Utc::now().naive_utc(),
    };
    diesel::update(projects::table.find(project_id))
        .set(&changeset)
        .execute(&mut conn)?;

    let project: Project = projects::table.find(project_id).first(&mut conn)?;
    Ok(Json(project.into()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let deleted = diesel::delete(projects::table.find(project_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
