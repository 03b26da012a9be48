//! Platform users. The password is stored only as a hash.

use academy_core::types::{DbId, Identifiable, Timestamp};
use academy_core::validation::{Dto, FieldKind, FieldRule};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::entity::{Column, EntityConfig, FieldMap, HasSecret, IntoColumns};

pub const USER_ROLES: &[&str] = &["admin", "manager", "trainer", "learner"];

const COLUMNS: &str =
    "id, email, password_hash, full_name, role, is_active, created_at, updated_at";

const FIELDS: &[FieldMap] = &[
    FieldMap::new("id", "id").sortable(),
    FieldMap::new("email", "email").searchable().filterable().sortable(),
    FieldMap::new("fullName", "full_name").searchable().sortable(),
    FieldMap::new("role", "role").filterable().sortable(),
    FieldMap::new("isActive", "is_active").filterable(),
    FieldMap::new("createdAt", "created_at").sortable(),
];

pub static USER_CONFIG: EntityConfig = EntityConfig {
    entity: "User",
    table: "users",
    columns: COLUMNS,
    fields: FIELDS,
    soft_delete: None,
};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DbId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Identifiable for User {
    fn id(&self) -> DbId {
        self.id
    }
}

/// `password` arrives in plaintext and is replaced by its hash before insert.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    pub role: String,
    pub is_active: Option<bool>,
}

impl Dto for CreateUser {
    const FIELDS: &'static [FieldRule] = &[
        FieldRule::required("email", FieldKind::String),
        FieldRule::required("password", FieldKind::String),
        FieldRule::required("fullName", FieldKind::String),
        FieldRule::required("role", FieldKind::Enum(USER_ROLES)),
        FieldRule::optional("isActive", FieldKind::Boolean),
    ];
}

impl HasSecret for CreateUser {
    fn secret_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.password)
    }
}

impl IntoColumns for CreateUser {
    fn into_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::new("email", self.email.clone()),
            Column::new("password_hash", self.password.clone()),
            Column::new("full_name", self.full_name.clone()),
            Column::new("role", self.role.clone()),
        ];
        if let Some(is_active) = self.is_active {
            columns.push(Column::new("is_active", is_active));
        }
        columns
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl Dto for UpdateUser {
    const FIELDS: &'static [FieldRule] = &[
        FieldRule::optional("email", FieldKind::String),
        FieldRule::optional("password", FieldKind::String),
        FieldRule::optional("fullName", FieldKind::String),
        FieldRule::optional("role", FieldKind::Enum(USER_ROLES)),
        FieldRule::optional("isActive", FieldKind::Boolean),
    ];
}

impl HasSecret for UpdateUser {
    fn secret_mut(&mut self) -> Option<&mut String> {
        self.password.as_mut()
    }
}

impl IntoColumns for UpdateUser {
    fn into_columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        if let Some(email) = &self.email {
            columns.push(Column::new("email", email.clone()));
        }
        if let Some(password) = &self.password {
            columns.push(Column::new("password_hash", password.clone()));
        }
        if let Some(full_name) = &self.full_name {
            columns.push(Column::new("full_name", full_name.clone()));
        }
        if let Some(role) = &self.role {
            columns.push(Column::new("role", role.clone()));
        }
        if let Some(is_active) = self.is_active {
            columns.push(Column::new("is_active", is_active));
        }
        columns
    }
}
