use crate::tabular::{read_records, Cell, Column, ParseError, TableRecord};
use crate::types::{Area, Route};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::mem;
use thiserror::Error;

impl TableRecord for Area {
    const COLUMNS: &'static [Column] = &[
        Column::text("id"),
        Column::text("name"),
        Column::text("mpid").optional(),
    ];

    fn set(&mut self, column: &str, cell: Cell<'_>) {
        match (column, cell) {
            ("id", Cell::Text(v)) => self.id = v.to_string(),
            ("name", Cell::Text(v)) => self.name = v.to_string(),
            ("mpid", Cell::Text(v)) => self.mp_id = v.to_string(),
            _ => {}
        }
    }
}

impl TableRecord for Route {
    const COLUMNS: &'static [Column] = &[
        Column::text("id"),
        Column::text("name"),
        Column::text("area"),
        Column::text("grade"),
        Column::int("lead"),
        Column::int("tr"),
        Column::text("mpid").optional(),
        Column::int("height").optional(),
    ];

    fn set(&mut self, column: &str, cell: Cell<'_>) {
        match (column, cell) {
            ("id", Cell::Text(v)) => self.id = v.to_string(),
            ("name", Cell::Text(v)) => self.name = v.to_string(),
            ("area", Cell::Text(v)) => self.area = v.to_string(),
            ("grade", Cell::Text(v)) => self.grade = v.to_string(),
            ("lead", Cell::Int(v)) => self.lead = v,
            ("tr", Cell::Int(v)) => self.tr = v,
            ("mpid", Cell::Text(v)) => self.mp_id = v.to_string(),
            ("height", Cell::Int(v)) => self.height = v,
            _ => {}
        }
    }
}

pub fn read_areas<R: Read>(input: R) -> Result<Vec<Area>, ParseError> {
    read_records(input)
}

pub fn read_routes<R: Read>(input: R) -> Result<Vec<Route>, ParseError> {
    read_records(input)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortedCatalog {
    #[serde(default)]
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexedCatalog {
    #[serde(default)]
    pub areas: BTreeMap<String, Area>,
    #[serde(default)]
    pub routes: BTreeMap<String, Route>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate area id {0:?}")]
    DuplicateArea(String),
    #[error("duplicate route id {0:?}")]
    DuplicateRoute(String),
    #[error("no routes defined for area {0:?}")]
    EmptyArea(String),
    #[error("routes defined for undefined area(s) {}", .0.join(", "))]
    OrphanRoutes(Vec<String>),
}

pub fn build_views(
    areas: Vec<Area>,
    routes: Vec<Route>,
) -> Result<(SortedCatalog, IndexedCatalog), CatalogError> {
    let mut seen = HashSet::new();
    for area in &areas {
        if !seen.insert(area.id.as_str()) {
            return Err(CatalogError::DuplicateArea(area.id.clone()));
        }
    }
    let mut seen = HashSet::new();
    for route in &routes {
        if !seen.insert(route.id.as_str()) {
            return Err(CatalogError::DuplicateRoute(route.id.clone()));
        }
    }

    let mut indexed = IndexedCatalog::default();
    for area in &areas {
        let mut entry = area.clone();
        let id = mem::take(&mut entry.id);
        entry.routes = Vec::new();
        indexed.areas.insert(id, entry);
    }
    for route in &routes {
        let mut entry = route.clone();
        let id = mem::take(&mut entry.id);
        indexed.routes.insert(id, entry);
    }

    let mut grouped: BTreeMap<String, Vec<Route>> = BTreeMap::new();
    for mut route in routes {
        let area_id = mem::take(&mut route.area);
        grouped.entry(area_id).or_default().push(route);
    }

    let mut sorted = SortedCatalog::default();
    for mut area in areas {
        let id = mem::take(&mut area.id);
        match grouped.remove(&id) {
            Some(group) => area.routes = group,
            None => return Err(CatalogError::EmptyArea(id)),
        }
        sorted.areas.push(area);
    }
    if !grouped.is_empty() {
        return Err(CatalogError::OrphanRoutes(grouped.into_keys().collect()));
    }

    Ok((sorted, indexed))
}
