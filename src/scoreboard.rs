use crate::scoring::{ClimberSummary, TeamSummary};

pub fn sort_teams(teams: &mut [TeamSummary]) {
    teams.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
}

pub fn sort_climbers(climbers: &mut [ClimberSummary]) {
    climbers.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
}

pub fn flatten_climbers(teams: &[TeamSummary]) -> Vec<ClimberSummary> {
    teams
        .iter()
        .flat_map(|team| team.members.iter().cloned())
        .collect()
}

const PAGE_OPEN: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Scores</title>
    <style>
      body {
        font-family: Arial, Helvetica, sans-serif;
        font-size: 14px;
      }
      table {
        border: 1px solid #aaa;
        border-collapse: collapse;
      }
      td, th {
        border: 1px solid #aaa;
        max-width: 20em;
        padding: 2px 10px;
      }
      th {
        background-color: #ddd;
        font-weight: bold;
        text-align: left;
      }
      .num {
        text-align: right;
      }
    </style>
  </head>
  <body>
    <table>
"#;

const PAGE_CLOSE: &str = "    </table>\n  </body>\n</html>\n";

pub fn render_team_page(teams: &[TeamSummary]) -> String {
    let mut out = String::new();
    out.push_str(PAGE_OPEN);
    out.push_str("      <tr>\n");
    for th in [
        "Team", "Score", "Climbs", "Height", "Climber", "Score", "Climbs", "Height",
    ] {
        out.push_str(&format!("        <th>{}</th>\n", th));
    }
    out.push_str("      </tr>\n");
    for team in teams {
        let span = team.members.len();
        let mut members = team.members.iter();
        out.push_str("      <tr>\n");
        out.push_str(&format!(
            "        <td rowspan=\"{}\">{}</td>\n",
            span,
            escape_html(&team.name)
        ));
        out.push_str(&format!(
            "        <td rowspan=\"{}\" class=\"num\">{}</td>\n",
            span, team.points
        ));
        out.push_str(&format!(
            "        <td rowspan=\"{}\" class=\"num\">{}</td>\n",
            span, team.climbs
        ));
        out.push_str(&format!(
            "        <td rowspan=\"{}\" class=\"num\">{}'</td>\n",
            span, team.height
        ));
        if let Some(first) = members.next() {
            push_member_cells(&mut out, first);
        }
        out.push_str("      </tr>\n");
        for member in members {
            out.push_str("      <tr>\n");
            push_member_cells(&mut out, member);
            out.push_str("      </tr>\n");
        }
    }
    out.push_str(PAGE_CLOSE);
    out
}

fn push_member_cells(out: &mut String, member: &ClimberSummary) {
    out.push_str(&format!(
        "        <td>{}</td>\n",
        escape_html(&member.name)
    ));
    out.push_str(&format!(
        "        <td class=\"num\">{}</td>\n",
        member.points
    ));
    out.push_str(&format!(
        "        <td class=\"num\">{}</td>\n",
        member.climbs
    ));
    out.push_str(&format!(
        "        <td class=\"num\">{}'</td>\n",
        member.height
    ));
}

pub fn render_climber_page(climbers: &[ClimberSummary]) -> String {
    let mut out = String::new();
    out.push_str(PAGE_OPEN);
    out.push_str("      <tr>\n");
    for th in ["Climber", "Team", "Score", "Climbs", "Height"] {
        out.push_str(&format!("        <th>{}</th>\n", th));
    }
    out.push_str("      </tr>\n");
    for climber in climbers {
        out.push_str("      <tr>\n");
        out.push_str(&format!(
            "        <td>{}</td>\n",
            escape_html(&climber.name)
        ));
        out.push_str(&format!(
            "        <td>{}</td>\n",
            escape_html(&climber.team)
        ));
        out.push_str(&format!(
            "        <td class=\"num\">{}</td>\n",
            climber.points
        ));
        out.push_str(&format!(
            "        <td class=\"num\">{}</td>\n",
            climber.climbs
        ));
        out.push_str(&format!(
            "        <td class=\"num\">{}'</td>\n",
            climber.height
        ));
        out.push_str("      </tr>\n");
    }
    out.push_str(PAGE_CLOSE);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn team_export(teams: &[TeamSummary]) -> Result<String, csv::Error> {
    let mut rows = teams.to_vec();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["team", "name_1", "name_2", "score", "climbs", "height"])?;
    for team in &rows {
        let first = team.members.first().map(|m| m.name.as_str()).unwrap_or("");
        let second = team.members.get(1).map(|m| m.name.as_str()).unwrap_or("");
        writer.write_record([
            team.name.as_str(),
            first,
            second,
            &team.points.to_string(),
            &team.climbs.to_string(),
            &team.height.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn climber_export(climbers: &[ClimberSummary]) -> Result<String, csv::Error> {
    let mut rows = climbers.to_vec();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "team", "score", "climbs", "height"])?;
    for climber in &rows {
        writer.write_record([
            climber.name.as_str(),
            climber.team.as_str(),
            &climber.points.to_string(),
            &climber.climbs.to_string(),
            &climber.height.to_string(),
        ])?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
