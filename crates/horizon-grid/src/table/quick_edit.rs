//! Quick edits and their persistence.
//!
//! An edit merges values into a row, then either advances the row's pristine
//! snapshot, hands the edit to the host, runs an immediate-save action or
//! saves through the store's transport:
//!
//! ```text
//! Idle -> Editing -> Diffing -> Saving -> Committed | RolledBack
//! ```

use horizon_grid_core::logging::targets;
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::model::value::{Record, create_object, difference, stringify};
use crate::model::{EditState, RowId, RowStore};
use crate::remote::RemoteMessages;
use crate::schema::SaveApi;

use super::{ActionRequest, Table};

/// How a quick edit should be handled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickChangeOptions {
    /// Endpoint of the cell's immediate-save action. Wins over the built-in
    /// save, but not over a connected `save_requested` listener.
    pub immediate_api: Option<SaveApi>,
    /// Advance the pristine snapshot instead of saving.
    pub save_pristine: bool,
    /// Revert the row if a single-row save fails.
    pub reset_on_failed: bool,
}

impl QuickChangeOptions {
    pub fn save_pristine() -> Self {
        Self {
            save_pristine: true,
            ..Self::default()
        }
    }

    pub fn reset_on_failed() -> Self {
        Self {
            reset_on_failed: true,
            ..Self::default()
        }
    }

    pub fn immediate(api: SaveApi) -> Self {
        Self {
            immediate_api: Some(api),
            ..Self::default()
        }
    }
}

/// A quick edit handed to the host through
/// [`TableSignals::save_requested`](super::TableSignals::save_requested).
#[derive(Debug, Clone, PartialEq)]
pub struct QuickSaveRequest {
    pub row: RowId,
    /// Current row data.
    pub data: Value,
    /// Fields that differ from the pristine snapshot.
    pub diff: Record,
    /// Row path, e.g. `3` or `3.1`.
    pub path: String,
    pub pristine: Value,
    pub reset_on_failed: bool,
}

/// A save through the store's transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    /// Rows submitted to `quickSaveApi`.
    Batch {
        /// Rows to track through the edit states.
        row_ids: Vec<RowId>,
        rows: Vec<Value>,
        rows_diff: Value,
        indexes: Vec<String>,
        rows_origin: Value,
        unmodified_items: Option<Vec<Value>>,
    },
    /// One row submitted to `quickSaveItemApi`.
    Single {
        row: RowId,
        item: Value,
        diff: Record,
        origin: Value,
        reset_on_failed: bool,
    },
}

impl SaveRequest {
    fn row_ids(&self) -> Vec<RowId> {
        match self {
            Self::Batch { row_ids, .. } => row_ids.clone(),
            Self::Single { row, .. } => vec![*row],
        }
    }
}

/// What became of a quick edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickEditOutcome {
    /// The row no longer exists.
    Ignored,
    /// The pristine snapshot advanced; nothing was saved.
    PristineSaved,
    /// Handed to the `save_requested` listeners.
    Delegated,
    /// Sent as an immediate-save action.
    ActionDispatched,
    /// The remote save succeeded.
    Saved,
    /// The remote save failed.
    SaveFailed {
        /// The row was reverted to its pristine snapshot.
        rolled_back: bool,
    },
}

impl<S: RowStore> Table<S> {
    /// Apply a quick edit to `row`.
    ///
    /// Edits against rows dropped by a reset are ignored. Selection is
    /// re-announced when the edit leaves the row modified.
    ///
    /// # Errors
    ///
    /// [`GridError::MissingSaveApi`] when the built-in save is used without
    /// an effective endpoint. The user is alerted through
    /// [`TableSignals::alert`](super::TableSignals::alert) as well.
    pub async fn handle_quick_change(
        &self,
        row: RowId,
        values: Value,
        options: QuickChangeOptions,
    ) -> Result<QuickEditOutcome> {
        let changed = {
            let mut store = self.store.write();
            store
                .change_row(row, &values, options.save_pristine)
                .map(|r| (r.data().clone(), r.pristine().clone(), r.path().to_string(), r.modified()))
        };
        let Some((data, pristine, path, modified)) = changed else {
            tracing::debug!(target: targets::QUICK_EDIT, ?row, "edit on dropped row ignored");
            return Ok(QuickEditOutcome::Ignored);
        };

        if modified {
            self.sync_selected();
        }

        if options.save_pristine {
            self.store.write().set_edit_state(row, EditState::Committed);
            self.signals.pristine_changed.emit((data, path));
            return Ok(QuickEditOutcome::PristineSaved);
        }

        let schema = self.schema();

        if self.signals.save_requested.is_connected() {
            let diff = self.diff(row, &data, &pristine, schema.primary_field());
            self.signals.save_requested.emit(QuickSaveRequest {
                row,
                data,
                diff,
                path,
                pristine,
                reset_on_failed: options.reset_on_failed,
            });
            return Ok(QuickEditOutcome::Delegated);
        }

        if let Some(api) = options.immediate_api {
            tracing::debug!(target: targets::QUICK_EDIT, url = api.url(), "immediate save");
            self.signals.action_requested.emit(ActionRequest {
                action_type: "ajax".into(),
                api,
                data: values,
            });
            return Ok(QuickEditOutcome::ActionDispatched);
        }

        let diff = self.diff(row, &data, &pristine, schema.primary_field());
        let request = if schema.quick_save_item_api.is_some() {
            SaveRequest::Single {
                row,
                item: data,
                diff,
                origin: pristine,
                reset_on_failed: options.reset_on_failed,
            }
        } else {
            SaveRequest::Batch {
                row_ids: vec![row],
                rows: vec![data],
                rows_diff: Value::Object(diff),
                indexes: vec![path],
                rows_origin: pristine,
                unmodified_items: None,
            }
        };
        self.handle_save(request).await
    }

    /// Move `row` to `Diffing` and compute its diff against `pristine`.
    fn diff(&self, row: RowId, data: &Value, pristine: &Value, primary_field: &str) -> Record {
        self.store.write().set_edit_state(row, EditState::Diffing);
        difference(data, pristine, &["id", primary_field])
    }

    /// Save through the store's transport.
    ///
    /// Batch failures are logged and absorbed. Single-row failures revert
    /// the row when `reset_on_failed` was requested.
    ///
    /// # Errors
    ///
    /// [`GridError::MissingSaveApi`] without an effective endpoint.
    pub async fn handle_save(&self, request: SaveRequest) -> Result<QuickEditOutcome> {
        let props = self.props();
        let schema = props.schema.clone();

        let (api, payload, submitted, messages) = match &request {
            SaveRequest::Batch {
                rows,
                rows_diff,
                indexes,
                rows_origin,
                unmodified_items,
                ..
            } => {
                let Some(api) = schema.quick_save_api.clone().filter(SaveApi::is_effective) else {
                    return Err(self.missing_api("quickSaveApi"));
                };

                let mut overlay = Record::new();
                overlay.insert("rows".into(), Value::Array(rows.clone()));
                overlay.insert("rowsDiff".into(), rows_diff.clone());
                overlay.insert(
                    "indexes".into(),
                    Value::Array(indexes.iter().cloned().map(Value::from).collect()),
                );
                overlay.insert("rowsOrigin".into(), rows_origin.clone());

                let primary = schema.primary_field();
                if rows.first().is_some_and(|row| row.get(primary).is_some()) {
                    let ids = rows
                        .iter()
                        .map(|row| row.get(primary).map(stringify).unwrap_or_default())
                        .collect::<Vec<_>>()
                        .join(",");
                    overlay.insert("ids".into(), Value::from(ids));
                }
                if let Some(items) = unmodified_items {
                    overlay.insert("unModifiedItems".into(), Value::Array(items.clone()));
                }

                let payload = create_object(&props.data, overlay);
                let messages = schema.messages.as_ref().map(|messages| RemoteMessages {
                    success: messages.save_success.clone(),
                    error: messages.save_failed.clone(),
                });
                (api, payload.clone(), payload, messages)
            }
            SaveRequest::Single {
                item,
                diff,
                origin,
                ..
            } => {
                let Some(api) = schema.quick_save_item_api.clone().filter(SaveApi::is_effective) else {
                    return Err(self.missing_api("quickSaveItemApi"));
                };

                let mut overlay = Record::new();
                overlay.insert("item".into(), item.clone());
                overlay.insert("modified".into(), Value::Object(diff.clone()));
                overlay.insert("origin".into(), origin.clone());
                let data = create_object(&props.data, overlay);

                let fields = match item {
                    Value::Object(fields) => fields.clone(),
                    _ => Record::new(),
                };
                let payload = create_object(&data, fields);
                (api, payload, data, None)
            }
        };

        let row_ids = request.row_ids();
        let pending = {
            let mut store = self.store.write();
            for id in &row_ids {
                store.set_edit_state(*id, EditState::Saving);
            }
            store.save_remote(&api, payload, messages)
        };
        tracing::debug!(target: targets::QUICK_EDIT, url = api.url(), rows = row_ids.len(), "saving");

        match pending.await {
            Ok(_) => {
                {
                    let mut store = self.store.write();
                    for id in &row_ids {
                        store.set_edit_state(*id, EditState::Committed);
                    }
                }
                if let Some(target) = schema.reload.clone() {
                    self.signals.reload_requested.emit((target, submitted));
                }
                Ok(QuickEditOutcome::Saved)
            }
            Err(err) => match request {
                SaveRequest::Batch { .. } => {
                    tracing::warn!(
                        target: targets::QUICK_EDIT,
                        url = api.url(),
                        error = %err,
                        "batch quick save rejected"
                    );
                    let mut store = self.store.write();
                    for id in &row_ids {
                        store.set_edit_state(*id, EditState::Editing);
                    }
                    Ok(QuickEditOutcome::SaveFailed { rolled_back: false })
                }
                SaveRequest::Single {
                    row,
                    reset_on_failed,
                    ..
                } => {
                    tracing::warn!(
                        target: targets::QUICK_EDIT,
                        url = api.url(),
                        error = %err,
                        reset_on_failed,
                        "quick save rejected"
                    );
                    let rolled_back = {
                        let mut store = self.store.write();
                        let reverted = reset_on_failed && store.reset_row(row).is_some();
                        let state = if reverted {
                            EditState::RolledBack
                        } else {
                            EditState::Editing
                        };
                        store.set_edit_state(row, state);
                        reverted
                    };
                    if rolled_back {
                        self.signals.edit_reset.emit(row);
                    }
                    Ok(QuickEditOutcome::SaveFailed { rolled_back })
                }
            },
        }
    }

    fn missing_api(&self, api: &'static str) -> GridError {
        let err = GridError::MissingSaveApi { api };
        tracing::warn!(target: targets::QUICK_EDIT, %err, "quick save aborted");
        self.signals.alert.emit(err.to_string());
        err
    }
}
