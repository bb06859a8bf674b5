use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::api::error::{ApiError, ValidatedJson};
use crate::api::server::{AppState, with_store};
use crate::api::types::{
    IdsRequest, LabelsDeletedResponse, LabelsResponse, OneOrMany, ProjectsDeletedResponse, ProjectsResponse, plural,
};
use crate::io::store::Commit;
use crate::model::label::Label;
use crate::model::project::Project;
use crate::ops::entity_ops::{self, LabelPatch, NewLabel, NewProject, ProjectPatch};

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub(crate) async fn list_projects(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Project>>, ApiError> {
    let doc = with_store(&state, |store| Ok(store.snapshot()?)).await?;
    Ok(Json(doc.projects))
}

pub(crate) async fn create_projects(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<OneOrMany<NewProject>>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects = with_store(&state, move |store| {
        store.transact(|doc| {
            let created: Vec<Project> = req
                .into_vec()
                .into_iter()
                .map(|new| entity_ops::create_project(doc, new))
                .collect();
            Ok::<_, ApiError>(Commit::Write(created))
        })
    })
    .await?;
    tracing::info!(count = projects.len(), "created projects");
    Ok(Json(ProjectsResponse {
        success: true,
        count: projects.len(),
        message: format!("Created {}", plural(projects.len(), "project")),
        projects,
    }))
}

pub(crate) async fn update_projects(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<OneOrMany<ProjectPatch>>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects = with_store(&state, move |store| {
        store.transact(|doc| {
            let mut updated = Vec::new();
            for patch in req.into_vec() {
                updated.push(entity_ops::update_project(doc, patch)?);
            }
            Ok::<_, ApiError>(Commit::Write(updated))
        })
    })
    .await?;
    tracing::info!(count = projects.len(), "updated projects");
    Ok(Json(ProjectsResponse {
        success: true,
        count: projects.len(),
        message: format!("Updated {}", plural(projects.len(), "project")),
        projects,
    }))
}

pub(crate) async fn delete_projects(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<IdsRequest>,
) -> Result<Json<ProjectsDeletedResponse>, ApiError> {
    let removed = with_store(&state, move |store| {
        store.transact(|doc| {
            let removed = entity_ops::delete_projects(doc, &req.ids);
            Ok::<_, ApiError>(if removed.is_empty() {
                Commit::Skip(removed)
            } else {
                Commit::Write(removed)
            })
        })
    })
    .await?;
    tracing::info!(ids = ?removed, "deleted projects");
    Ok(Json(ProjectsDeletedResponse {
        success: true,
        count: removed.len(),
        message: format!("Deleted {}", plural(removed.len(), "project")),
        project_ids: removed,
    }))
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

pub(crate) async fn list_labels(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Label>>, ApiError> {
    let doc = with_store(&state, |store| Ok(store.snapshot()?)).await?;
    Ok(Json(doc.labels))
}

pub(crate) async fn create_labels(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<OneOrMany<NewLabel>>,
) -> Result<Json<LabelsResponse>, ApiError> {
    let labels = with_store(&state, move |store| {
        store.transact(|doc| {
            let created: Vec<Label> = req
                .into_vec()
                .into_iter()
                .map(|new| entity_ops::create_label(doc, new))
                .collect();
            Ok::<_, ApiError>(Commit::Write(created))
        })
    })
    .await?;
    tracing::info!(count = labels.len(), "created labels");
    Ok(Json(LabelsResponse {
        success: true,
        count: labels.len(),
        message: format!("Created {}", plural(labels.len(), "label")),
        labels,
    }))
}

pub(crate) async fn update_labels(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<OneOrMany<LabelPatch>>,
) -> Result<Json<LabelsResponse>, ApiError> {
    let labels = with_store(&state, move |store| {
        store.transact(|doc| {
            let mut updated = Vec::new();
            for patch in req.into_vec() {
                updated.push(entity_ops::update_label(doc, patch)?);
            }
            Ok::<_, ApiError>(Commit::Write(updated))
        })
    })
    .await?;
    tracing::info!(count = labels.len(), "updated labels");
    Ok(Json(LabelsResponse {
        success: true,
        count: labels.len(),
        message: format!("Updated {}", plural(labels.len(), "label")),
        labels,
    }))
}

pub(crate) async fn delete_labels(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<IdsRequest>,
) -> Result<Json<LabelsDeletedResponse>, ApiError> {
    let removed = with_store(&state, move |store| {
        store.transact(|doc| {
            let removed = entity_ops::delete_labels(doc, &req.ids);
            Ok::<_, ApiError>(if removed.is_empty() {
                Commit::Skip(removed)
            } else {
                Commit::Write(removed)
            })
        })
    })
    .await?;
    tracing::info!(ids = ?removed, "deleted labels");
    Ok(Json(LabelsDeletedResponse {
        success: true,
        count: removed.len(),
        message: format!("Deleted {}", plural(removed.len(), "label")),
        label_ids: removed,
    }))
}
