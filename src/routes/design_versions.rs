use std::io::Write;
use std::path::{Component, Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use diesel::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::projects::format_timestamp;
use crate::error::{AppError, AppResult};
use crate::ingest::{self, EntryMode, UploadedArchive, VersionCoordinates};
use crate::models::{Design, DesignVersion, NewDesignVersion, ProductVersion};
use crate::schema::{design_versions, designs, product_versions};
use crate::state::AppState;

#[derive(Serialize)]
pub struct DesignVersionResponse {
    pub id: Uuid,
    pub design_id: Uuid,
    pub version: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub entry: Option<String>,
    pub created_at: String,
}

impl From<DesignVersion> for DesignVersionResponse {
    fn from(record: DesignVersion) -> Self {
        Self {
            id: record.id,
            design_id: record.design_id,
            version: record.version,
            path: record.path,
            kind: record.kind,
            entry: record.entry,
            created_at: format_timestamp(record.created_at),
        }
    }
}

struct CreateVersionFields {
    version: Option<String>,
    kind: Option<String>,
    entry: Option<String>,
    file: Option<Bytes>,
}

async fn collect_multipart(multipart: &mut Multipart) -> AppResult<CreateVersionFields> {
    let mut fields = CreateVersionFields {
        version: None,
        kind: None,
        entry: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        let msg = format!("invalid multipart data: {err}");
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(msg)
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let data = field.bytes().await.map_err(|err| {
                    let msg = format!("failed to read file bytes: {err}");
                    error!(error = %err, "failed to read file bytes");
                    AppError::bad_request(msg)
                })?;
                fields.file = Some(data);
            }
            Some("version") => {
                fields.version = Some(read_text_field(field, "version").await?);
            }
            Some("type") => {
                fields.kind = Some(read_text_field(field, "type").await?);
            }
            Some("entry") => {
                fields.entry = Some(read_text_field(field, "entry").await?);
            }
            _ => {}
        }
    }

    Ok(fields)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>, name: &str) -> AppResult<String> {
    field.text().await.map_err(|err| {
        let msg = format!("invalid {name} field: {err}");
        error!(error = %err, field = name, "invalid multipart text field");
        AppError::bad_request(msg)
    })
}

fn parse_entry_mode(kind: Option<&str>, entry: Option<String>) -> AppResult<EntryMode> {
    match kind.map(str::trim).filter(|s| !s.is_empty()) {
        None | Some("axure") => Ok(EntryMode::Axure),
        Some("html") => {
            let entry = entry
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("index.html")
                .to_string();
            Ok(EntryMode::Html { entry })
        }
        Some(other) => Err(AppError::bad_request(format!(
            "type must be axure or html, got '{other}'"
        ))),
    }
}

fn validate_version_label(raw: Option<&str>) -> AppResult<String> {
    let version = raw.map(str::trim).unwrap_or_default();
    if version.is_empty() {
        return Err(AppError::bad_request("version is required"));
    }
    let is_plain_segment = matches!(
        FsPath::new(version).components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !is_plain_segment {
        return Err(AppError::bad_request(
            "version must not contain path separators",
        ));
    }
    Ok(version.to_string())
}

/// Writes the upload to a temp file so the extractor can stream from disk.
/// Staging failures are not fatal; the in-memory buffer remains usable.
async fn stage_upload(data: Bytes) -> Option<PathBuf> {
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(&data)?;
        let (_file, path) = tmp.keep()?;
        Ok(path)
    })
    .await;

    match result {
        Ok(Ok(path)) => Some(path),
        Ok(Err(err)) => {
            warn!(error = %err, "failed to stage upload to disk, using in-memory buffer");
            None
        }
        Err(err) => {
            warn!(error = %err, "staging task panicked, using in-memory buffer");
            None
        }
    }
}

pub async fn create_design_version(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DesignVersionResponse>)> {
    let fields = collect_multipart(&mut multipart).await?;

    let file_bytes = match fields.file {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            error!(%design_id, "upload rejected: missing file field");
            return Err(AppError::bad_request("file is required"));
        }
    };
    let version = validate_version_label(fields.version.as_deref())?;
    let mode = parse_entry_mode(fields.kind.as_deref(), fields.entry)?;

    let coords = {
        let mut conn = state.db()?;
        let design: Design = designs::table.find(design_id).first(&mut conn)?;
        let product_version: ProductVersion = product_versions::table
            .find(design.product_version_id)
            .first(&mut conn)?;
        VersionCoordinates {
            project_id: product_version.project_id,
            product_version_id: product_version.id,
            design_id,
            version: version.clone(),
        }
    };

    let staged_path = stage_upload(file_bytes.clone()).await;
    let upload = UploadedArchive {
        staged_path,
        bytes: Some(file_bytes),
    };

    let upload_root = state.config.upload_dir.clone();
    let pipeline_coords = coords.clone();
    let pipeline_mode = mode.clone();
    let prepared = tokio::task::spawn_blocking(move || {
        ingest::ingest(&upload_root, &pipeline_coords, &pipeline_mode, upload)
    })
    .await
    .map_err(|err| AppError::internal(format!("ingestion task panicked: {err}")))?
    .map_err(|err| {
        error!(%design_id, version = %coords.version, error = %err, "design version ingestion failed");
        AppError::from(err)
    })?;

    let entry = match &mode {
        EntryMode::Axure => None,
        EntryMode::Html { entry } => Some(entry.clone()),
    };
    let new_version = NewDesignVersion {
        id: Uuid::new_v4(),
        design_id,
        version,
        path: prepared.preview_path,
        kind: mode.kind().to_string(),
        entry,
    };

    let mut conn = state.db()?;
    diesel::insert_into(design_versions::table)
        .values(&new_version)
        .execute(&mut conn)?;
    let record: DesignVersion = design_versions::table.find(new_version.id).first(&mut conn)?;

    info!(
        design_version_id = %record.id,
        %design_id,
        version = %record.version,
        kind = %record.kind,
        preview_path = %record.path,
        rewritten_files = prepared.rewritten_files,
        "design version created"
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn list_design_versions(
    State(state): State<AppState>,
    Path(design_id): Path<Uuid>,
) -> AppResult<Json<Vec<DesignVersionResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<DesignVersion> = design_versions::table
        .filter(design_versions::design_id.eq(design_id))
        .order(design_versions::created_at.desc())
        .load(&mut conn)?;
    Ok(Json(
        rows.into_iter()
            .map(DesignVersionResponse::from)
            .collect(),
    ))
}

pub async fn remove_design_version(
    State(state): State<AppState>,
    Path(design_version_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let coords = {
        let mut conn = state.db()?;
        let record: DesignVersion = design_versions::table
            .find(design_version_id)
            .first(&mut conn)?;
        let design: Design = designs::table.find(record.design_id).first(&mut conn)?;
        let product_version: ProductVersion = product_versions::table
            .find(design.product_version_id)
            .first(&mut conn)?;
        VersionCoordinates {
            project_id: product_version.project_id,
            product_version_id: product_version.id,
            design_id: record.design_id,
            version: record.version,
        }
    };

    // Files go first: a record must never outlive its directory tree.
    let upload_root = state.config.upload_dir.clone();
    let removal_coords = coords.clone();
    tokio::task::spawn_blocking(move || ingest::remove_version_dir(&upload_root, &removal_coords))
        .await
        .map_err(|err| AppError::internal(format!("removal task panicked: {err}")))?
        .map_err(|err| {
            error!(%design_version_id, error = %err, "failed to delete extracted directory");
            AppError::from(err)
        })?;

    let mut conn = state.db()?;
    diesel::delete(design_versions::table.find(design_version_id)).execute(&mut conn)?;

    info!(
        %design_version_id,
        design_id = %coords.design_id,
        version = %coords.version,
        "design version removed"
    );

    Ok(StatusCode::NO_CONTENT)
}
