use cragboard::admin;
use cragboard::scoreboard;
use cragboard::store::{set_doc, MemoryStore, StorePaths};
use cragboard::types::{AscentState, ClimberRecord, Team};

const AREAS: &str = "id,name\nslabs,The Slabs\ncave,The Cave\n";
const ROUTES: &str = "id,name,area,grade,lead,tr,height\n\
                      flake,Flake Route,slabs,5.9,10,5,60\n\
                      corner,Corner Crack,slabs,5.8,8,4,40\n\
                      roof,Roof Problem,cave,5.12a,12,6,20\n";

fn main() {
    let store = MemoryStore::new();
    let paths = StorePaths::default();

    let summary = admin::upload_catalog(&store, &paths, AREAS.as_bytes(), ROUTES.as_bytes())
        .expect("example catalog should upload");
    println!("Wrote {} area(s) and {} route(s)", summary.areas, summary.routes);

    let mut team = Team {
        name: "Whippers".to_string(),
        invite: "bold-heron".to_string(),
        ..Team::default()
    };
    let mut ana = ClimberRecord {
        name: "Ana".to_string(),
        ..ClimberRecord::default()
    };
    ana.ascents.insert("flake".to_string(), AscentState::Lead);
    ana.ascents.insert("roof".to_string(), AscentState::TopRope);
    let mut ben = ClimberRecord {
        name: "Ben".to_string(),
        ..ClimberRecord::default()
    };
    ben.ascents.insert("corner".to_string(), AscentState::Lead);
    team.members.insert("u1".to_string(), ana);
    team.members.insert("u2".to_string(), ben);
    set_doc(&store, &paths.team_doc("t1"), &team).expect("example team should write");

    let teams = admin::team_summaries(&store, &paths).expect("standings should compute");
    for team in &teams {
        println!(
            "{}: {} point(s), {} climb(s), {}'",
            team.name, team.points, team.climbs, team.height
        );
    }
    print!(
        "{}",
        scoreboard::team_export(&teams).expect("standings should render")
    );
}
