use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::api::error::{ApiError, ValidatedJson};
use crate::api::server::{AppState, with_store};
use crate::api::types::{
    CreateGroupRequest, DeleteGroupRequest, GroupMutationResponse, GroupsResponse, PatchGroupsRequest, plural,
};
use crate::io::store::Commit;
use crate::ops::group_ops;

pub(crate) async fn list_groups(State(state): State<Arc<AppState>>) -> Result<Json<GroupsResponse>, ApiError> {
    let doc = with_store(&state, |store| Ok(store.snapshot()?)).await?;
    Ok(Json(GroupsResponse {
        project_groups: doc.project_groups,
        label_groups: doc.label_groups,
    }))
}

pub(crate) async fn create_group(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateGroupRequest>,
) -> Result<Json<GroupMutationResponse>, ApiError> {
    let name = req.name.clone();
    let id = with_store(&state, move |store| {
        store.transact(|doc| {
            let id = group_ops::create_group(doc, req.into())?;
            Ok::<_, ApiError>(Commit::Write(id))
        })
    })
    .await?;
    tracing::info!(%id, %name, "created group");
    Ok(Json(GroupMutationResponse {
        success: true,
        group_ids: vec![id],
        message: format!("Created group \"{}\"", name),
    }))
}

pub(crate) async fn update_groups(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PatchGroupsRequest>,
) -> Result<Json<GroupMutationResponse>, ApiError> {
    let response = match req {
        PatchGroupsRequest::Reorder(reorder) => {
            let count = reorder.groups.len();
            let kind = reorder.kind;
            let root_id = with_store(&state, move |store| {
                store.transact(|doc| {
                    group_ops::bulk_replace_items(doc, kind, reorder.groups)?;
                    Ok::<_, ApiError>(Commit::Write(doc.tree(kind).id.clone()))
                })
            })
            .await?;
            tracing::info!(tree = %kind, count, "reordered root group");
            GroupMutationResponse {
                success: true,
                group_ids: vec![root_id],
                message: format!("Reordered {} in the {} root", plural(count, "item"), kind),
            }
        }
        PatchGroupsRequest::Update(updates) => {
            let updates = updates.into_vec();
            let ids = with_store(&state, move |store| {
                store.transact(|doc| {
                    let mut ids = Vec::with_capacity(updates.len());
                    for update in updates {
                        ids.push(update.id.clone());
                        group_ops::update_group(doc, update.into())?;
                    }
                    Ok::<_, ApiError>(Commit::Write(ids))
                })
            })
            .await?;
            tracing::info!(?ids, "updated groups");
            GroupMutationResponse {
                success: true,
                message: format!("Updated {}", plural(ids.len(), "group")),
                group_ids: ids,
            }
        }
    };
    Ok(Json(response))
}

/// Always 200: a refused delete (ROOT or unknown id) reports no ids.
pub(crate) async fn delete_group(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<DeleteGroupRequest>,
) -> Result<Json<GroupMutationResponse>, ApiError> {
    let id = req.id.clone();
    let deleted = with_store(&state, move |store| {
        store.transact(|doc| {
            Ok::<_, ApiError>(if group_ops::delete_group(doc, &id) {
                Commit::Write(true)
            } else {
                Commit::Skip(false)
            })
        })
    })
    .await?;
    if deleted {
        tracing::info!(id = %req.id, "deleted group");
    }
    let group_ids = if deleted { vec![req.id] } else { Vec::new() };
    Ok(Json(GroupMutationResponse {
        success: true,
        message: format!("Deleted {}", plural(group_ids.len(), "group")),
        group_ids,
    }))
}
