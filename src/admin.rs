use crate::catalog::{build_views, read_areas, read_routes, CatalogError, IndexedCatalog};
use crate::scoreboard;
use crate::scoring::{summarize_team, TeamSummary};
use crate::store::{get_doc, set_doc, DocumentStore, FieldUpdate, StoreError, StorePaths, WriteOp};
use crate::tabular::ParseError;
use crate::types::Team;
use serde_json::json;
use std::io::Read;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid {table} data: {source}")]
    Parse {
        table: &'static str,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("catalog views inconsistent: wrote {written} but failed writing {path}: {source}")]
    PartialWrite {
        written: String,
        path: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct UploadSummary {
    pub areas: usize,
    pub routes: usize,
}

pub fn upload_catalog<A: Read, R: Read>(
    store: &dyn DocumentStore,
    paths: &StorePaths,
    areas: A,
    routes: R,
) -> Result<UploadSummary, AdminError> {
    let areas = read_areas(areas).map_err(|source| AdminError::Parse {
        table: "area",
        source,
    })?;
    let routes = read_routes(routes).map_err(|source| AdminError::Parse {
        table: "route",
        source,
    })?;
    let summary = UploadSummary {
        areas: areas.len(),
        routes: routes.len(),
    };

    let (sorted, indexed) = build_views(areas, routes)?;
    set_doc(store, &paths.sorted_doc, &sorted)?;
    if let Err(source) = set_doc(store, &paths.indexed_doc, &indexed) {
        return Err(AdminError::PartialWrite {
            written: paths.sorted_doc.clone(),
            path: paths.indexed_doc.clone(),
            source,
        });
    }
    info!(areas = summary.areas, routes = summary.routes, "replaced catalog");
    Ok(summary)
}

pub fn team_summaries(
    store: &dyn DocumentStore,
    paths: &StorePaths,
) -> Result<Vec<TeamSummary>, AdminError> {
    let indexed: IndexedCatalog = get_doc(store, &paths.indexed_doc)?;
    let mut teams = Vec::new();
    for path in store.iter_collection(&paths.team_collection)? {
        let path = path?;
        let team: Team = get_doc(store, &path)?;
        if let Some(summary) = summarize_team(&team, &indexed.routes) {
            teams.push(summary);
        }
    }
    scoreboard::sort_teams(&mut teams);
    Ok(teams)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct ClearSummary {
    pub teams_cleared: usize,
    pub teams_deleted: usize,
    pub climbers_updated: usize,
    pub invites_deleted: usize,
}

pub fn clear_scores(
    store: &dyn DocumentStore,
    paths: &StorePaths,
    delete_teams: bool,
) -> Result<ClearSummary, AdminError> {
    let mut summary = ClearSummary::default();

    for path in store.iter_collection(&paths.team_collection)? {
        let path = path?;
        if delete_teams {
            info!(%path, "deleting team");
            store.commit(vec![WriteOp::Delete { path: path.clone() }])?;
            summary.teams_deleted += 1;
            continue;
        }
        let team: Team = get_doc(store, &path)?;
        let fields: Vec<(String, FieldUpdate)> = team
            .members
            .keys()
            .map(|id| {
                (
                    format!("members.{}.ascents", id),
                    FieldUpdate::Set(json!({})),
                )
            })
            .collect();
        if !fields.is_empty() {
            info!(%path, "clearing team scores");
            store.update_fields(&path, fields)?;
            summary.teams_cleared += 1;
        }
    }

    for path in store.iter_collection(&paths.climber_collection)? {
        let path = path?;
        let mut fields = vec![("ascents".to_string(), FieldUpdate::Delete)];
        if delete_teams {
            fields.push(("team".to_string(), FieldUpdate::Delete));
        }
        info!(%path, "clearing climber scores");
        store.update_fields(&path, fields)?;
        summary.climbers_updated += 1;
    }

    if delete_teams {
        for path in store.iter_collection(&paths.invite_collection)? {
            let path = path?;
            info!(%path, "deleting invite");
            store.commit(vec![WriteOp::Delete { path }])?;
            summary.invites_deleted += 1;
        }
    }

    Ok(summary)
}

pub fn delete_empty_teams(
    store: &dyn DocumentStore,
    paths: &StorePaths,
) -> Result<Vec<String>, AdminError> {
    let mut deleted = Vec::new();
    for path in store.iter_collection(&paths.team_collection)? {
        let path = path?;
        let team: Team = get_doc(store, &path)?;
        debug!(%path, name = %team.name, members = team.members.len(), "inspecting team");
        if !team.members.is_empty() {
            continue;
        }
        let mut ops = vec![WriteOp::Delete { path: path.clone() }];
        if !team.invite.is_empty() {
            ops.push(WriteOp::Delete {
                path: paths.invite_doc(&team.invite),
            });
        }
        info!(%path, name = %team.name, "deleting empty team");
        store.commit(ops)?;
        deleted.push(team.name);
    }
    Ok(deleted)
}

pub fn set_readonly(
    store: &dyn DocumentStore,
    paths: &StorePaths,
    readonly: bool,
) -> Result<(), AdminError> {
    store.update_fields(
        &paths.config_doc,
        vec![("readonly".to_string(), FieldUpdate::Set(json!(readonly)))],
    )?;
    info!(readonly, "set database readonly state");
    Ok(())
}
