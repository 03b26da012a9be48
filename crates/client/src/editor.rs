//! Entity editor controller.
//!
//! Drives the create/update dialog and the delete confirmation for one
//! entity, applying every mutation through a shared [`PaginatedList`] so the
//! list view stays current.

use std::sync::Arc;

use academy_core::types::{DbId, Identifiable};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::TransportError;
use crate::list::PaginatedList;
use crate::notify::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Create,
    Update,
}

/// Invoked once a delete confirmation is resolved, e.g. to clear a row selection.
pub type ResetCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone)]
pub struct EditorState<E> {
    pub dialog_open: bool,
    pub mode: EditorMode,
    /// The entity being edited; the default snapshot in create mode.
    pub entity: E,
    pub confirm_open: bool,
    pub pending_delete: Vec<DbId>,
}

struct Inner<E> {
    state: EditorState<E>,
    on_reset: Option<ResetCallback>,
}

pub struct EntityEditor<E> {
    label: &'static str,
    list: Arc<PaginatedList<E>>,
    notifier: Arc<dyn Notifier>,
    default_entity: E,
    inner: Mutex<Inner<E>>,
}

impl<E> EntityEditor<E>
where
    E: Identifiable + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// `label` names the entity in notifications (e.g. `"Training"`).
    pub fn new(
        label: &'static str,
        list: Arc<PaginatedList<E>>,
        notifier: Arc<dyn Notifier>,
        default_entity: E,
    ) -> Self {
        let state = EditorState {
            dialog_open: false,
            mode: EditorMode::Create,
            entity: default_entity.clone(),
            confirm_open: false,
            pending_delete: Vec::new(),
        };
        Self {
            label,
            list,
            notifier,
            default_entity,
            inner: Mutex::new(Inner {
                state,
                on_reset: None,
            }),
        }
    }

    pub fn list(&self) -> &Arc<PaginatedList<E>> {
        &self.list
    }

    pub async fn state(&self) -> EditorState<E> {
        self.inner.lock().await.state.clone()
    }

    pub async fn open_create_dialog(&self) {
        self.list.reset_filters().await;
        let mut inner = self.inner.lock().await;
        inner.state.mode = EditorMode::Create;
        inner.state.entity = self.default_entity.clone();
        inner.state.dialog_open = true;
    }

    pub async fn open_update_dialog(&self, entity: &E) {
        self.list.reset_filters().await;
        let mut inner = self.inner.lock().await;
        inner.state.mode = EditorMode::Update;
        inner.state.entity = entity.clone();
        inner.state.dialog_open = true;
    }

    pub async fn close_dialog(&self) {
        self.inner.lock().await.state.dialog_open = false;
    }

    /// Submit the dialog form. On failure the dialog stays open.
    pub async fn on_save(&self, form: &Value) -> Result<(), TransportError> {
        let (mode, id) = {
            let inner = self.inner.lock().await;
            (inner.state.mode, inner.state.entity.id())
        };

        let result = match mode {
            EditorMode::Create => self.list.create(form).await.map(|_| "created"),
            EditorMode::Update => self.list.update(id, form).await.map(|_| "updated"),
        };

        match result {
            Ok(verb) => {
                self.inner.lock().await.state.dialog_open = false;
                self.notifier.success(&format!("{} {verb}", self.label));
                Ok(())
            }
            Err(e) => {
                self.notifier.error(&describe(&e));
                Err(e)
            }
        }
    }

    /// Stage `ids` for deletion and ask for confirmation.
    pub async fn on_delete_trigger(&self, ids: Vec<DbId>, on_reset: Option<ResetCallback>) {
        let mut inner = self.inner.lock().await;
        inner.state.pending_delete = ids;
        inner.state.confirm_open = true;
        inner.on_reset = on_reset;
    }

    /// Delete the staged ids: the bulk path for several, the single path for one.
    ///
    /// The confirmation is closed, the staged ids cleared, and the reset
    /// callback invoked whatever the outcome.
    pub async fn confirm_delete(&self) -> Result<(), TransportError> {
        let (ids, on_reset) = {
            let mut inner = self.inner.lock().await;
            inner.state.confirm_open = false;
            (
                std::mem::take(&mut inner.state.pending_delete),
                inner.on_reset.take(),
            )
        };

        let result = match ids.as_slice() {
            [] => Ok(()),
            [id] => self.list.delete(*id).await.map(|()| {
                self.notifier.success(&format!("{} deleted", self.label));
            }),
            many => self.list.bulk_delete(many).await.map(|outcome| {
                if outcome.deleted {
                    self.notifier.success(&outcome.message);
                } else {
                    self.notifier.warning(&outcome.message);
                }
            }),
        };

        if let Err(e) = &result {
            self.notifier.error(&describe(e));
        }
        if let Some(callback) = on_reset {
            callback();
        }
        result
    }

    /// Dismiss the confirmation without deleting anything.
    pub async fn cancel_delete(&self) {
        let mut inner = self.inner.lock().await;
        inner.state.confirm_open = false;
        inner.state.pending_delete.clear();
        inner.on_reset = None;
    }
}

fn describe(err: &TransportError) -> String {
    match err {
        TransportError::Validation(failures) => {
            let properties: Vec<&str> = failures.iter().map(|f| f.property.as_str()).collect();
            format!("Invalid {}", properties.join(", "))
        }
        TransportError::Unauthorized(_) => "Session expired, please sign in again".to_string(),
        other => other.to_string(),
    }
}
