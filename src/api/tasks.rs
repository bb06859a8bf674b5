use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::api::error::{ApiError, ValidatedJson};
use crate::api::server::{AppState, with_store};
use crate::api::types::{IdsRequest, OneOrMany, ReorderRequest, ReorderResponse, TasksDeletedResponse, TasksResponse, plural};
use crate::io::store::Commit;
use crate::model::task::Task;
use crate::ops::reorder::{self, DropOutcome};
use crate::ops::task_ops::{self, NewTask, TaskPatch};

pub(crate) async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Task>>, ApiError> {
    let doc = with_store(&state, |store| Ok(store.snapshot()?)).await?;
    Ok(Json(doc.tasks))
}

pub(crate) async fn create_tasks(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<OneOrMany<NewTask>>,
) -> Result<Json<TasksResponse>, ApiError> {
    let now = Utc::now();
    let tasks = with_store(&state, move |store| {
        store.transact(|doc| {
            let mut created = Vec::new();
            for new in req.into_vec() {
                created.push(task_ops::create_task(doc, new, now)?);
            }
            Ok::<_, ApiError>(Commit::Write(created))
        })
    })
    .await?;
    tracing::info!(count = tasks.len(), "created tasks");
    Ok(Json(TasksResponse {
        success: true,
        count: tasks.len(),
        message: format!("Created {}", plural(tasks.len(), "task")),
        tasks,
    }))
}

/// Patches apply in order against one document, which is written once,
/// and only if some patch changed something.
pub(crate) async fn update_tasks(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<OneOrMany<TaskPatch>>,
) -> Result<Json<TasksResponse>, ApiError> {
    let now = Utc::now();
    let (tasks, changed) = with_store(&state, move |store| {
        store.transact(|doc| {
            let mut tasks = Vec::new();
            let mut changed = false;
            for patch in req.into_vec() {
                let update = task_ops::apply_task_update(doc, patch, now)?;
                changed |= update.changed;
                tasks.push(update.task);
            }
            Ok::<_, ApiError>(if changed {
                Commit::Write((tasks, true))
            } else {
                Commit::Skip((tasks, false))
            })
        })
    })
    .await?;
    let message = if changed {
        tracing::info!(count = tasks.len(), "updated tasks");
        format!("Updated {}", plural(tasks.len(), "task"))
    } else {
        "No changes".to_string()
    };
    Ok(Json(TasksResponse {
        success: true,
        count: tasks.len(),
        message,
        tasks,
    }))
}

pub(crate) async fn delete_tasks(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<IdsRequest>,
) -> Result<Json<TasksDeletedResponse>, ApiError> {
    let removed = with_store(&state, move |store| {
        store.transact(|doc| {
            let removed = task_ops::delete_tasks(doc, &req.ids);
            Ok::<_, ApiError>(if removed.is_empty() {
                Commit::Skip(removed)
            } else {
                Commit::Write(removed)
            })
        })
    })
    .await?;
    tracing::info!(ids = ?removed, "deleted tasks");
    Ok(Json(TasksDeletedResponse {
        success: true,
        count: removed.len(),
        message: format!("Deleted {}", plural(removed.len(), "task")),
        task_ids: removed,
    }))
}

/// Drag-and-drop. A drop that cannot be resolved is logged and answered
/// with `moved: false`, never with an error status.
pub(crate) async fn reorder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    let id = req.source.id.clone();
    let outcome = with_store(&state, move |store| {
        store.transact(|doc| {
            Ok::<_, ApiError>(match reorder::execute_drop(doc, &req.source, &req.target) {
                DropOutcome::Moved(outcome) => Commit::Write(Some(outcome)),
                DropOutcome::NoOp | DropOutcome::Ignored => Commit::Skip(None),
            })
        })
    })
    .await?;
    let response = match outcome {
        Some(outcome) => {
            tracing::info!(%id, kind = ?outcome.kind, "moved item");
            ReorderResponse {
                success: true,
                moved: true,
                kind: Some(outcome.kind),
                expand: outcome.expand,
            }
        }
        None => ReorderResponse {
            success: true,
            moved: false,
            kind: None,
            expand: None,
        },
    };
    Ok(Json(response))
}
