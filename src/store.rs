use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub config_doc: String,
    pub sorted_doc: String,
    pub indexed_doc: String,
    pub team_collection: String,
    pub climber_collection: String,
    pub invite_collection: String,
}

impl Default for StorePaths {
    fn default() -> Self {
        Self {
            config_doc: "global/config".to_string(),
            sorted_doc: "global/sortedData".to_string(),
            indexed_doc: "global/indexedData".to_string(),
            team_collection: "teams".to_string(),
            climber_collection: "climbers".to_string(),
            invite_collection: "invites".to_string(),
        }
    }
}

impl StorePaths {
    pub fn team_doc(&self, id: &str) -> String {
        format!("{}/{}", self.team_collection, id)
    }

    pub fn climber_doc(&self, id: &str) -> String {
        format!("{}/{}", self.climber_collection, id)
    }

    pub fn invite_doc(&self, code: &str) -> String {
        format!("{}/{}", self.invite_collection, code)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set(Value),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: String,
        value: Value,
    },
    Update {
        path: String,
        fields: Vec<(String, FieldUpdate)>,
    },
    Delete {
        path: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0:?} not found")]
    NotFound(String),
    #[error("failed decoding {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed encoding {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed reading {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed writing {path}: {message}")]
    Write { path: String, message: String },
}

pub trait DocumentStore {
    fn get(&self, path: &str) -> Result<Value, StoreError>;

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    fn iter_collection(
        &self,
        collection: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<String, StoreError>> + '_>, StoreError>;

    fn update_fields(&self, path: &str, fields: Vec<(String, FieldUpdate)>)
        -> Result<(), StoreError>;

    fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}

pub fn get_doc<T: DeserializeOwned>(store: &dyn DocumentStore, path: &str) -> Result<T, StoreError> {
    let value = store.get(path)?;
    serde_json::from_value(value).map_err(|source| StoreError::Decode {
        path: path.to_string(),
        source,
    })
}

pub fn set_doc<T: Serialize>(
    store: &dyn DocumentStore,
    path: &str,
    doc: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(doc).map_err(|source| StoreError::Encode {
        path: path.to_string(),
        source,
    })?;
    store.set(path, value)
}

pub fn apply_field_updates(
    doc: &mut Value,
    fields: &[(String, FieldUpdate)],
) -> Result<(), String> {
    for (field_path, update) in fields {
        let mut segments: Vec<&str> = field_path.split('.').collect();
        let leaf = match segments.pop() {
            Some(leaf) => leaf,
            None => continue,
        };
        let mut target = &mut *doc;
        for segment in segments {
            let object = target
                .as_object_mut()
                .ok_or_else(|| format!("field {} crosses a non-object value", field_path))?;
            target = object
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        let object = target
            .as_object_mut()
            .ok_or_else(|| format!("field {} crosses a non-object value", field_path))?;
        match update {
            FieldUpdate::Set(value) => {
                object.insert(leaf.to_string(), value.clone());
            }
            FieldUpdate::Delete => {
                object.remove(leaf);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Value, StoreError> {
        self.guard()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.guard().insert(path.to_string(), value);
        Ok(())
    }

    fn iter_collection(
        &self,
        collection: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<String, StoreError>> + '_>, StoreError> {
        let prefix = format!("{}/", collection);
        let paths: Vec<String> = self
            .guard()
            .keys()
            .filter(|path| {
                path.strip_prefix(&prefix)
                    .map(|rest| !rest.contains('/'))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(Box::new(paths.into_iter().map(Ok)))
    }

    fn update_fields(
        &self,
        path: &str,
        fields: Vec<(String, FieldUpdate)>,
    ) -> Result<(), StoreError> {
        let mut docs = self.guard();
        let doc = docs
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        apply_field_updates(doc, &fields).map_err(|message| StoreError::Write {
            path: path.to_string(),
            message,
        })
    }

    fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut docs = self.guard();
        let mut staged = docs.clone();
        for op in ops {
            match op {
                WriteOp::Set { path, value } => {
                    staged.insert(path, value);
                }
                WriteOp::Update { path, fields } => {
                    let doc = staged
                        .entry(path.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    apply_field_updates(doc, &fields)
                        .map_err(|message| StoreError::Write { path, message })?;
                }
                WriteOp::Delete { path } => {
                    staged.remove(&path);
                }
            }
        }
        *docs = staged;
        Ok(())
    }
}
