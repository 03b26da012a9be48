//! In-memory stand-in for the HTTP collaborator.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use academy_client::api::EntityApi;
use academy_client::error::TransportError;
use academy_client::notify::Notifier;
use academy_core::pagination::{PaginatedResponse, PaginationQuery};
use academy_core::response::BulkDeleteResponse;
use academy_core::types::{DbId, Identifiable};
use academy_core::validation::ValidationFailure;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub is_published: bool,
}

impl Identifiable for Course {
    fn id(&self) -> DbId {
        self.id
    }
}

/// Behaves like the server for one resource and records every page request.
#[derive(Default)]
pub struct FakeApi {
    rows: Mutex<Vec<Course>>,
    next_id: AtomicUsize,
    queries: Mutex<Vec<PaginationQuery>>,
    calls: AtomicUsize,
    fail_next: Mutex<Option<TransportError>>,
    fail_next_fetch: Mutex<Option<TransportError>>,
}

impl FakeApi {
    pub fn seeded(count: usize) -> Arc<Self> {
        let api = Self::default();
        {
            let mut rows = api.rows.lock().unwrap();
            for n in 1..=count {
                rows.push(Course {
                    id: n as DbId,
                    title: format!("Course {n}"),
                    is_published: false,
                });
            }
        }
        api.next_id.store(count, Ordering::SeqCst);
        Arc::new(api)
    }

    /// Page requests seen so far.
    pub fn queries(&self) -> Vec<PaginationQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Every call made through the trait.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, err: TransportError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Fail only the next page request; mutations still go through.
    pub fn fail_next_fetch(&self, err: TransportError) {
        *self.fail_next_fetch.lock().unwrap() = Some(err);
    }

    pub fn ids(&self) -> Vec<DbId> {
        self.rows.lock().unwrap().iter().map(|c| c.id).collect()
    }

    fn begin(&self) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityApi<Course> for FakeApi {
    async fn fetch_page(
        &self,
        query: &PaginationQuery,
    ) -> Result<PaginatedResponse<Course>, TransportError> {
        self.begin()?;
        if let Some(err) = self.fail_next_fetch.lock().unwrap().take() {
            return Err(err);
        }
        self.queries.lock().unwrap().push(query.clone());

        let rows = self.rows.lock().unwrap().clone();
        if query.is_unpaginated() {
            return Ok(PaginatedResponse::unpaginated(rows));
        }
        let total = rows.len() as i64;
        let items = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok(PaginatedResponse::new(items, total, query.page, query.page_size))
    }

    async fn create(&self, input: &Value) -> Result<Course, TransportError> {
        self.begin()?;
        let Some(title) = input["title"].as_str() else {
            return Err(TransportError::Validation(vec![ValidationFailure {
                property: "title".into(),
                constraints: [(
                    "isDefined".to_string(),
                    "title should not be null or undefined".to_string(),
                )]
                .into(),
                value: Value::Null,
            }]));
        };
        let course = Course {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as DbId + 1,
            title: title.to_string(),
            is_published: input["isPublished"].as_bool().unwrap_or(false),
        };
        self.rows.lock().unwrap().push(course.clone());
        Ok(course)
    }

    async fn update(&self, id: DbId, input: &Value) -> Result<Vec<Course>, TransportError> {
        self.begin()?;
        let mut rows = self.rows.lock().unwrap();
        let course = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| TransportError::NotFound(format!("Course with id {id} not found")))?;
        if let Some(title) = input["title"].as_str() {
            course.title = title.to_string();
        }
        if let Some(published) = input["isPublished"].as_bool() {
            course.is_published = published;
        }
        Ok(vec![course.clone()])
    }

    async fn delete(&self, id: DbId) -> Result<(), TransportError> {
        self.begin()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        if rows.len() == before {
            return Err(TransportError::NotFound(format!("Course with id {id} not found")));
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[DbId]) -> Result<BulkDeleteResponse, TransportError> {
        self.begin()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| !ids.contains(&c.id));
        let deleted = (before - rows.len()) as u64;
        let requested = ids.len() as u64;
        Ok(BulkDeleteResponse {
            deleted: deleted == requested,
            deleted_count: deleted,
            requested_count: requested,
            message: if deleted == requested {
                format!("Deleted {deleted} Course record(s)")
            } else {
                format!(
                    "Deleted {deleted} of {requested} Course record(s); {} not found",
                    requested - deleted
                )
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Success(String),
    Warning(String),
    Error(String),
}

/// Keeps every notification for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notes: Mutex<Vec<Note>>,
}

impl RecordingNotifier {
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notes.lock().unwrap().push(Note::Success(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.notes.lock().unwrap().push(Note::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notes.lock().unwrap().push(Note::Error(message.to_string()));
    }
}
