use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = product_versions)]
#[diesel(belongs_to(Project))]
pub struct ProductVersion {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_versions)]
pub struct NewProductVersion {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = designs)]
#[diesel(belongs_to(ProductVersion))]
pub struct Design {
    pub id: Uuid,
    pub product_version_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = designs)]
pub struct NewDesign {
    pub id: Uuid,
    pub product_version_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = design_versions)]
#[diesel(belongs_to(Design))]
pub struct DesignVersion {
    pub id: Uuid,
    pub design_id: Uuid,
    pub version: String,
    pub path: String,
    pub kind: String,
    pub entry: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = design_versions)]
pub struct NewDesignVersion {
    pub id: Uuid,
    pub design_id: Uuid,
    pub version: String,
    pub path: String,
    pub kind: String,
    pub entry: Option<String>,
}
