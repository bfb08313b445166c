use crate::types::{AscentState, Route, Team};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[must_use]
pub struct Score {
    pub points: u32,
    pub climbs: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClimberSummary {
    pub name: String,
    pub team: String,
    pub points: u32,
    pub climbs: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub name: String,
    pub points: u32,
    pub climbs: u32,
    pub height: u32,
    pub members: Vec<ClimberSummary>,
}

pub fn score_ascents(
    ascents: &BTreeMap<String, AscentState>,
    routes: &BTreeMap<String, Route>,
) -> Score {
    let mut score = Score::default();
    if ascents.is_empty() || routes.is_empty() {
        return score;
    }
    for (route_id, state) in ascents {
        let Some(route) = routes.get(route_id) else {
            continue;
        };
        match state {
            AscentState::Lead => {
                score.points += route.lead;
                score.climbs += 1;
            }
            AscentState::TopRope => {
                score.points += route.tr;
                score.climbs += 1;
            }
            AscentState::NotClimbed => {}
        }
        score.height += route.height;
    }
    score
}

pub fn summarize_team(team: &Team, routes: &BTreeMap<String, Route>) -> Option<TeamSummary> {
    if team.members.is_empty() {
        return None;
    }
    let mut summary = TeamSummary {
        name: team.name.clone(),
        points: 0,
        climbs: 0,
        height: 0,
        members: Vec::with_capacity(team.members.len()),
    };
    for member in team.members.values() {
        let score = score_ascents(&member.ascents, routes);
        summary.points += score.points;
        summary.climbs += score.climbs;
        summary.height += score.height;
        summary.members.push(ClimberSummary {
            name: member.name.clone(),
            team: team.name.clone(),
            points: score.points,
            climbs: score.climbs,
            height: score.height,
        });
    }
    summary
        .members
        .sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
    Some(summary)
}
