//! Training catalog entries.

use academy_core::types::{DbId, Identifiable, Timestamp};
use academy_core::validation::{nullable, Dto, FieldKind, FieldRule};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::entity::{Column, EntityConfig, FieldMap, IntoColumns};

pub const TRAINING_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

const COLUMNS: &str = "\
    id, title, code, description, level, duration_hours, price, \
    is_published, starts_at, created_at, updated_at, deleted_at";

const FIELDS: &[FieldMap] = &[
    FieldMap::new("id", "id").sortable(),
    FieldMap::new("title", "title").searchable().sortable(),
    FieldMap::new("code", "code").searchable().filterable().sortable(),
    FieldMap::new("description", "description").searchable(),
    FieldMap::new("level", "level").filterable().sortable(),
    FieldMap::new("durationHours", "duration_hours").filterable().sortable(),
    FieldMap::new("price", "price").sortable(),
    FieldMap::new("isPublished", "is_published").filterable(),
    FieldMap::new("startsAt", "starts_at").sortable(),
    FieldMap::new("createdAt", "created_at").sortable(),
    FieldMap::new("updatedAt", "updated_at").sortable(),
];

pub static TRAINING_CONFIG: EntityConfig = EntityConfig {
    entity: "Training",
    table: "trainings",
    columns: COLUMNS,
    fields: FIELDS,
    soft_delete: Some("deleted_at"),
};

/// A row from the `trainings` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: DbId,
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub level: String,
    pub duration_hours: i32,
    pub price: Option<f64>,
    pub is_published: bool,
    pub starts_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

impl Identifiable for Training {
    fn id(&self) -> DbId {
        self.id
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTraining {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(min = 2, max = 32))]
    pub code: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub level: String,
    #[validate(range(min = 1, max = 1000))]
    pub duration_hours: i32,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub is_published: Option<bool>,
    pub starts_at: Option<Timestamp>,
}

impl Dto for CreateTraining {
    const FIELDS: &'static [FieldRule] = &[
        FieldRule::required("title", FieldKind::String),
        FieldRule::required("code", FieldKind::String),
        FieldRule::optional("description", FieldKind::String),
        FieldRule::required("level", FieldKind::Enum(TRAINING_LEVELS)),
        FieldRule::required("durationHours", FieldKind::Int32),
        FieldRule::optional("price", FieldKind::Number),
        FieldRule::optional("isPublished", FieldKind::Boolean),
        FieldRule::optional("startsAt", FieldKind::Timestamp),
    ];
}

impl IntoColumns for CreateTraining {
    fn into_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::new("title", self.title.clone()),
            Column::new("code", self.code.clone()),
            Column::new("description", self.description.clone()),
            Column::new("level", self.level.clone()),
            Column::new("duration_hours", self.duration_hours),
        ];
        if let Some(price) = self.price {
            columns.push(Column::new("price", price));
        }
        if let Some(is_published) = self.is_published {
            columns.push(Column::new("is_published", is_published));
        }
        if let Some(starts_at) = self.starts_at {
            columns.push(Column::new("starts_at", starts_at));
        }
        columns
    }
}

/// Partial update; absent fields are left untouched.
///
/// Nullable columns use `Option<Option<T>>` so an explicit `null` clears them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTraining {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 2, max = 32))]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 5000))]
    pub description: Option<Option<String>>,
    pub level: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub duration_hours: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0.0))]
    pub price: Option<Option<f64>>,
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub starts_at: Option<Option<Timestamp>>,
}

impl Dto for UpdateTraining {
    const FIELDS: &'static [FieldRule] = &[
        FieldRule::optional("title", FieldKind::String),
        FieldRule::optional("code", FieldKind::String),
        FieldRule::optional("description", FieldKind::String),
        FieldRule::optional("level", FieldKind::Enum(TRAINING_LEVELS)),
        FieldRule::optional("durationHours", FieldKind::Int32),
        FieldRule::optional("price", FieldKind::Number),
        FieldRule::optional("isPublished", FieldKind::Boolean),
        FieldRule::optional("startsAt", FieldKind::Timestamp),
    ];
}

impl IntoColumns for UpdateTraining {
    fn into_columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        if let Some(title) = &self.title {
            columns.push(Column::new("title", title.clone()));
        }
        if let Some(code) = &self.code {
            columns.push(Column::new("code", code.clone()));
        }
        if let Some(description) = &self.description {
            columns.push(Column::new("description", description.clone()));
        }
        if let Some(level) = &self.level {
            columns.push(Column::new("level", level.clone()));
        }
        if let Some(hours) = self.duration_hours {
            columns.push(Column::new("duration_hours", hours));
        }
        if let Some(price) = self.price {
            columns.push(Column::new("price", price));
        }
        if let Some(is_published) = self.is_published {
            columns.push(Column::new("is_published", is_published));
        }
        if let Some(starts_at) = self.starts_at {
            columns.push(Column::new("starts_at", starts_at));
        }
        columns
    }
}
