//! Statement builders for the generic repository.
//!
//! Table and column names come only from [`EntityConfig`]; every value,
//! including search patterns and filter values, is bound.

use academy_core::pagination::{FilterValue, PaginationQuery};
use academy_core::types::DbId;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use crate::entity::{Column, ColumnValue, EntityConfig};
use crate::error::RepoResult;

pub(crate) type Statement = QueryBuilder<'static, Postgres>;

/// Tracks whether the next predicate opens the `WHERE` clause or extends it.
struct Conditions {
    started: bool,
}

impl Conditions {
    /// Start a clause, hiding soft-deleted rows when the entity has a marker.
    fn open(qb: &mut Statement, config: &EntityConfig) -> Self {
        let mut conditions = Self { started: false };
        if let Some(marker) = config.soft_delete {
            conditions.next(qb);
            qb.push(marker).push(" IS NULL");
        }
        conditions
    }

    fn next(&mut self, qb: &mut Statement) {
        qb.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
    }
}

fn push_value(qb: &mut Statement, value: ColumnValue) {
    match value {
        ColumnValue::Text(v) => qb.push_bind(v),
        ColumnValue::BigInt(v) => qb.push_bind(v),
        ColumnValue::Int(v) => qb.push_bind(v),
        ColumnValue::Double(v) => qb.push_bind(v),
        ColumnValue::Bool(v) => qb.push_bind(v),
        ColumnValue::Timestamp(v) => qb.push_bind(v),
        ColumnValue::Json(v) => qb.push_bind(v),
    };
}

fn push_equalities(qb: &mut Statement, conditions: &mut Conditions, filters: Vec<Column>) {
    for column in filters {
        conditions.next(qb);
        if column.value.is_null() {
            qb.push(column.name).push(" IS NULL");
        } else {
            qb.push(column.name).push(" = ");
            push_value(qb, column.value);
        }
    }
}

fn push_id(qb: &mut Statement, conditions: &mut Conditions, id: DbId) {
    conditions.next(qb);
    qb.push("id = ").push_bind(id);
}

pub(crate) fn select_by_id(config: &EntityConfig, id: DbId) -> Statement {
    let mut qb = Statement::new(format!("SELECT {} FROM {}", config.columns, config.table));
    let mut conditions = Conditions::open(&mut qb, config);
    push_id(&mut qb, &mut conditions, id);
    qb
}

/// `SELECT ... WHERE col = $n AND ...` in insertion order.
pub(crate) fn select_where(config: &EntityConfig, filters: Vec<Column>, limit_one: bool) -> Statement {
    let mut qb = Statement::new(format!("SELECT {} FROM {}", config.columns, config.table));
    let mut conditions = Conditions::open(&mut qb, config);
    push_equalities(&mut qb, &mut conditions, filters);
    qb.push(" ORDER BY id ASC");
    if limit_one {
        qb.push(" LIMIT 1");
    }
    qb
}

pub(crate) fn count_where(config: &EntityConfig, filters: Vec<Column>) -> Statement {
    let mut qb = Statement::new(format!("SELECT COUNT(*) FROM {}", config.table));
    let mut conditions = Conditions::open(&mut qb, config);
    push_equalities(&mut qb, &mut conditions, filters);
    qb
}

pub(crate) fn insert(config: &EntityConfig, columns: Vec<Column>) -> Statement {
    let mut qb = Statement::new(format!("INSERT INTO {}", config.table));
    if columns.is_empty() {
        qb.push(" DEFAULT VALUES");
    } else {
        qb.push(" (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(column.name);
        }
        qb.push(") VALUES (");
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, column.value);
        }
        qb.push(")");
    }
    qb.push(format!(" RETURNING {}", config.columns));
    qb
}

/// Partial update: only the given columns change, `updated_at` is refreshed.
pub(crate) fn update(config: &EntityConfig, id: DbId, columns: Vec<Column>) -> Statement {
    let mut qb = Statement::new(format!("UPDATE {} SET ", config.table));
    for column in columns {
        qb.push(column.name).push(" = ");
        push_value(&mut qb, column.value);
        qb.push(", ");
    }
    qb.push("updated_at = NOW()");
    let mut conditions = Conditions::open(&mut qb, config);
    push_id(&mut qb, &mut conditions, id);
    qb.push(format!(" RETURNING {}", config.columns));
    qb
}

fn delete_prefix(config: &EntityConfig) -> Statement {
    match config.soft_delete {
        Some(marker) => Statement::new(format!(
            "UPDATE {} SET {marker} = NOW(), updated_at = NOW()",
            config.table
        )),
        None => Statement::new(format!("DELETE FROM {}", config.table)),
    }
}

pub(crate) fn delete(config: &EntityConfig, id: DbId) -> Statement {
    let mut qb = delete_prefix(config);
    let mut conditions = Conditions::open(&mut qb, config);
    push_id(&mut qb, &mut conditions, id);
    qb
}

pub(crate) fn delete_many(config: &EntityConfig, ids: Vec<DbId>) -> Statement {
    let mut qb = delete_prefix(config);
    let mut conditions = Conditions::open(&mut qb, config);
    conditions.next(&mut qb);
    qb.push("id = ANY(").push_bind(ids).push(")");
    qb
}

/// Escape `LIKE` wildcards so a search term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_page_predicates(
    qb: &mut Statement,
    config: &EntityConfig,
    query: &PaginationQuery,
) -> RepoResult<()> {
    let mut conditions = Conditions::open(qb, config);

    if let Some(term) = &query.search {
        let columns: Vec<&str> = config.search_columns().collect();
        if !columns.is_empty() {
            let pattern = format!("%{}%", escape_like(term));
            conditions.next(qb);
            qb.push("(");
            for (i, column) in columns.into_iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(column).push("::text ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }

    for (field, value) in &query.filters {
        if value.is_cleared() {
            continue;
        }
        let column = config.filter_column(field)?;
        conditions.next(qb);
        match value {
            FilterValue::Scalar(Value::Null) => {
                qb.push(column).push(" IS NULL");
            }
            FilterValue::Scalar(v) => {
                qb.push(column).push("::text = ").push_bind(filter_text(v));
            }
            FilterValue::List(values) => {
                let values: Vec<String> = values.iter().map(filter_text).collect();
                qb.push(column).push("::text = ANY(").push_bind(values).push(")");
            }
        }
    }

    Ok(())
}

/// Count of all rows matching the page query's search and filters.
pub(crate) fn count_page(config: &EntityConfig, query: &PaginationQuery) -> RepoResult<Statement> {
    let mut qb = Statement::new(format!("SELECT COUNT(*) FROM {}", config.table));
    push_page_predicates(&mut qb, config, query)?;
    Ok(qb)
}

/// The rows of one page. A negative page size selects every matching row.
pub(crate) fn select_page(config: &EntityConfig, query: &PaginationQuery) -> RepoResult<Statement> {
    let mut qb = Statement::new(format!("SELECT {} FROM {}", config.columns, config.table));
    push_page_predicates(&mut qb, config, query)?;

    match &query.sort_by {
        Some(field) => {
            let column = config.sort_column(field)?;
            let direction = query.sort_order.unwrap_or_default().as_sql();
            qb.push(format!(" ORDER BY {column} {direction}"));
            if column != "id" {
                qb.push(format!(", id {direction}"));
            }
        }
        None => {
            qb.push(" ORDER BY id ASC");
        }
    }

    if !query.is_unpaginated() {
        qb.push(" LIMIT ")
            .push_bind(query.page_size)
            .push(" OFFSET ")
            .push_bind(query.offset());
    }

    Ok(qb)
}

pub(crate) fn statistics(config: &EntityConfig) -> Statement {
    let mut qb = Statement::new(format!(
        "SELECT \
             COUNT(*) FILTER (WHERE created_at >= date_trunc('week', NOW())), \
             COUNT(*) FILTER (WHERE created_at >= date_trunc('month', NOW())), \
             COUNT(*) FILTER (WHERE created_at >= date_trunc('year', NOW())), \
             COUNT(*) \
         FROM {}",
        config.table
    ));
    Conditions::open(&mut qb, config);
    qb
}
