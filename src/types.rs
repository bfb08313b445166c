use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AscentState {
    #[default]
    NotClimbed,
    Lead,
    TopRope,
}

impl Serialize for AscentState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(match self {
            Self::NotClimbed => 0,
            Self::Lead => 1,
            Self::TopRope => 2,
        })
    }
}

impl<'de> Deserialize<'de> for AscentState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        parse_ascent_state(raw).map_err(D::Error::custom)
    }
}

fn parse_ascent_state(raw: u8) -> Result<AscentState, String> {
    match raw {
        0 => Ok(AscentState::NotClimbed),
        1 => Ok(AscentState::Lead),
        2 => Ok(AscentState::TopRope),
        _ => Err(format!("unknown ascent state {}", raw)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Area {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    #[serde(rename = "mpId", default, skip_serializing_if = "String::is_empty")]
    pub mp_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub area: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grade: String,
    #[serde(default)]
    pub lead: u32,
    #[serde(default)]
    pub tr: u32,
    #[serde(rename = "mpId", default, skip_serializing_if = "String::is_empty")]
    pub mp_id: String,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClimberRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ascents: BTreeMap<String, AscentState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub invite: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, ClimberRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Climber {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ascents: BTreeMap<String, AscentState>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team: String,
}
