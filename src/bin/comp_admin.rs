use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use cragboard::admin;
use cragboard::scoreboard;
use cragboard::store::{
    apply_field_updates, DocumentStore, FieldUpdate, StoreError, StorePaths, WriteOp,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::iter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Climbing competition database admin", long_about = None)]
struct Cli {
    /// Database root directory
    #[arg(long, default_value = "comp_data", value_hint = ValueHint::DirPath)]
    store: PathBuf,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the route catalog from area and route CSV files
    Upload(UploadArgs),
    /// Render a scoreboard page or CSV export
    Scores(ScoresArgs),
    /// Reset every recorded ascent
    ClearScores(ClearScoresArgs),
    /// Delete teams that have no members
    PruneTeams,
    /// Put the database into read-only mode
    Lock,
    /// Make the database writable again
    Unlock,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// Area CSV path
    #[arg(long, value_hint = ValueHint::FilePath)]
    areas: PathBuf,

    /// Route CSV path
    #[arg(long, value_hint = ValueHint::FilePath)]
    routes: PathBuf,
}

#[derive(Parser, Debug)]
struct ScoresArgs {
    /// Rank individual climbers instead of teams
    #[arg(long, action = ArgAction::SetTrue)]
    climbers: bool,

    /// Emit CSV instead of an HTML page
    #[arg(long, action = ArgAction::SetTrue)]
    csv: bool,

    /// Output path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Parser, Debug)]
struct ClearScoresArgs {
    /// Also delete all teams and invites
    #[arg(long, action = ArgAction::SetTrue)]
    delete_teams: bool,

    /// Pass "REALLY CLEAR SCORES" to confirm
    #[arg(long, value_name = "PHRASE")]
    confirm: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let store = FileStore::new(cli.store);
    let paths = StorePaths::default();
    match cli.command {
        Command::Upload(args) => handle_upload(&store, &paths, args),
        Command::Scores(args) => handle_scores(&store, &paths, args),
        Command::ClearScores(args) => handle_clear_scores(&store, &paths, args),
        Command::PruneTeams => handle_prune_teams(&store, &paths),
        Command::Lock => handle_readonly(&store, &paths, true),
        Command::Unlock => handle_readonly(&store, &paths, false),
    }
}

fn handle_upload(store: &FileStore, paths: &StorePaths, args: UploadArgs) -> Result<()> {
    let areas =
        File::open(&args.areas).with_context(|| format!("failed to open {}", args.areas.display()))?;
    let routes = File::open(&args.routes)
        .with_context(|| format!("failed to open {}", args.routes.display()))?;
    let summary = admin::upload_catalog(store, paths, areas, routes)?;
    println!(
        "Wrote {} area(s) and {} route(s)",
        summary.areas, summary.routes
    );
    Ok(())
}

fn handle_scores(store: &FileStore, paths: &StorePaths, args: ScoresArgs) -> Result<()> {
    let teams = admin::team_summaries(store, paths)?;
    let output = if args.climbers {
        let mut climbers = scoreboard::flatten_climbers(&teams);
        if args.csv {
            scoreboard::climber_export(&climbers)?
        } else {
            scoreboard::sort_climbers(&mut climbers);
            scoreboard::render_climber_page(&climbers)
        }
    } else if args.csv {
        scoreboard::team_export(&teams)?
    } else {
        scoreboard::render_team_page(&teams)
    };
    write_output(&args.output, &output)
}

fn handle_clear_scores(store: &FileStore, paths: &StorePaths, args: ClearScoresArgs) -> Result<()> {
    if args.confirm != "REALLY CLEAR SCORES" {
        return Err(anyhow!("pass --confirm \"REALLY CLEAR SCORES\" to clear scores"));
    }
    let summary = admin::clear_scores(store, paths, args.delete_teams)?;
    if args.delete_teams {
        println!(
            "Deleted {} team(s) and {} invite(s), cleared {} climber doc(s)",
            summary.teams_deleted, summary.invites_deleted, summary.climbers_updated
        );
    } else {
        println!(
            "Cleared scores for {} team(s) and {} climber doc(s)",
            summary.teams_cleared, summary.climbers_updated
        );
    }
    Ok(())
}

fn handle_prune_teams(store: &FileStore, paths: &StorePaths) -> Result<()> {
    let deleted = admin::delete_empty_teams(store, paths)?;
    println!("Deleted {} empty team(s)", deleted.len());
    for name in deleted {
        println!("  {name}");
    }
    Ok(())
}

fn handle_readonly(store: &FileStore, paths: &StorePaths, readonly: bool) -> Result<()> {
    admin::set_readonly(store, paths, readonly)?;
    if readonly {
        println!("Database is now read-only");
    } else {
        println!("Database is now writable");
    }
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout()
            .write_all(contents.as_bytes())
            .context("failed writing to stdout")?;
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

struct FileStore {
    root: PathBuf,
}

impl FileStore {
    fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn doc_file(&self, path: &str) -> PathBuf {
        let mut file = self.root.clone();
        for segment in path.split('/') {
            file.push(segment);
        }
        file.set_extension("json");
        file
    }

    fn write_doc(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        let file = self.doc_file(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Write {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        }
        let raw = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
            path: path.to_string(),
            source,
        })?;
        fs::write(&file, raw).map_err(|err| StoreError::Write {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    fn remove_doc(&self, path: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.doc_file(path)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Write {
                path: path.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

impl DocumentStore for FileStore {
    fn get(&self, path: &str) -> Result<Value, StoreError> {
        let raw = match fs::read_to_string(self.doc_file(path)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_string()));
            }
            Err(err) => {
                return Err(StoreError::Read {
                    path: path.to_string(),
                    message: err.to_string(),
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.write_doc(path, &value)
    }

    fn iter_collection(
        &self,
        collection: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<String, StoreError>> + '_>, StoreError> {
        let entries = match fs::read_dir(self.root.join(collection)) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Box::new(iter::empty()));
            }
            Err(err) => {
                return Err(StoreError::Read {
                    path: collection.to_string(),
                    message: err.to_string(),
                });
            }
        };
        let collection = collection.to_string();
        Ok(Box::new(entries.filter_map(move |entry| match entry {
            Ok(entry) => {
                let name = entry.file_name();
                let name = Path::new(&name);
                if name.extension().and_then(OsStr::to_str) != Some("json") {
                    return None;
                }
                name.file_stem()
                    .and_then(OsStr::to_str)
                    .map(|stem| Ok(format!("{}/{}", collection, stem)))
            }
            Err(err) => Some(Err(StoreError::Read {
                path: collection.clone(),
                message: err.to_string(),
            })),
        })))
    }

    fn update_fields(
        &self,
        path: &str,
        fields: Vec<(String, FieldUpdate)>,
    ) -> Result<(), StoreError> {
        let mut doc = match self.get(path) {
            Ok(doc) => doc,
            Err(StoreError::NotFound(_)) => Value::Object(Map::new()),
            Err(err) => return Err(err),
        };
        apply_field_updates(&mut doc, &fields).map_err(|message| StoreError::Write {
            path: path.to_string(),
            message,
        })?;
        self.write_doc(path, &doc)
    }

    fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut staged: BTreeMap<String, Option<Value>> = BTreeMap::new();
        for op in ops {
            match op {
                WriteOp::Set { path, value } => {
                    staged.insert(path, Some(value));
                }
                WriteOp::Update { path, fields } => {
                    let mut doc = match staged.get(&path) {
                        Some(Some(doc)) => doc.clone(),
                        Some(None) => Value::Object(Map::new()),
                        None => match self.get(&path) {
                            Ok(doc) => doc,
                            Err(StoreError::NotFound(_)) => Value::Object(Map::new()),
                            Err(err) => return Err(err),
                        },
                    };
                    apply_field_updates(&mut doc, &fields).map_err(|message| {
                        StoreError::Write {
                            path: path.clone(),
                            message,
                        }
                    })?;
                    staged.insert(path, Some(doc));
                }
                WriteOp::Delete { path } => {
                    staged.insert(path, None);
                }
            }
        }
        for (path, doc) in staged {
            match doc {
                Some(doc) => self.write_doc(&path, &doc)?,
                None => self.remove_doc(&path)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cragboard::store::set_doc;
    use cragboard::types::{AscentState, ClimberRecord, Team};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trips_documents() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store.set("teams/t1", json!({"name": "Crimpers"})).unwrap();
        assert!(dir.path().join("teams/t1.json").is_file());
        assert_eq!(store.get("teams/t1").unwrap(), json!({"name": "Crimpers"}));
        assert!(matches!(
            store.get("teams/absent").unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn file_store_lists_only_collection_documents() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.set("teams/t2", json!({})).unwrap();
        store.set("teams/t1", json!({})).unwrap();
        store.set("global/config", json!({})).unwrap();
        fs::write(dir.path().join("teams/notes.txt"), "x").unwrap();

        let mut paths: Vec<String> = store
            .iter_collection("teams")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        paths.sort();
        assert_eq!(paths, vec!["teams/t1".to_string(), "teams/t2".to_string()]);
        assert!(store.iter_collection("invites").unwrap().next().is_none());
    }

    #[test]
    fn file_store_updates_fields_in_place() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store
            .update_fields(
                "global/config",
                vec![("readonly".to_string(), FieldUpdate::Set(json!(true)))],
            )
            .unwrap();
        assert_eq!(
            store.get("global/config").unwrap(),
            json!({"readonly": true})
        );

        store
            .update_fields(
                "global/config",
                vec![("readonly".to_string(), FieldUpdate::Delete)],
            )
            .unwrap();
        assert_eq!(store.get("global/config").unwrap(), json!({}));
    }

    #[test]
    fn file_store_commit_stages_before_writing() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.set("invites/i1", json!({"team": "t1"})).unwrap();

        store
            .commit(vec![
                WriteOp::Set {
                    path: "teams/t1".to_string(),
                    value: json!({"name": "Crimpers"}),
                },
                WriteOp::Update {
                    path: "teams/t1".to_string(),
                    fields: vec![("invite".to_string(), FieldUpdate::Set(json!("calm-otter")))],
                },
                WriteOp::Delete {
                    path: "invites/i1".to_string(),
                },
            ])
            .unwrap();
        assert_eq!(
            store.get("teams/t1").unwrap(),
            json!({"name": "Crimpers", "invite": "calm-otter"})
        );
        assert!(store.get("invites/i1").is_err());

        let err = store.commit(vec![
            WriteOp::Set {
                path: "teams/t9".to_string(),
                value: json!({}),
            },
            WriteOp::Update {
                path: "teams/t1".to_string(),
                fields: vec![("name.sub".to_string(), FieldUpdate::Set(json!(1)))],
            },
        ]);
        assert!(err.is_err());
        assert!(store.get("teams/t9").is_err());
    }

    #[test]
    fn file_store_backs_the_admin_flows() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let paths = StorePaths::default();

        let areas = "id,name\nslabs,The Slabs\n";
        let routes = "id,name,area,grade,lead,tr,height\nflake,Flake Route,slabs,5.9,10,5,60\n";
        admin::upload_catalog(&store, &paths, areas.as_bytes(), routes.as_bytes()).unwrap();

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
        team.members.insert("u1".to_string(), ana);
        set_doc(&store, &paths.team_doc("t1"), &team).unwrap();

        let teams = admin::team_summaries(&store, &paths).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Whippers");
        assert_eq!(teams[0].points, 10);
        assert_eq!(teams[0].height, 60);
    }

    #[test]
    fn clear_scores_requires_the_confirmation_phrase() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let paths = StorePaths::default();

        let err = handle_clear_scores(
            &store,
            &paths,
            ClearScoresArgs {
                delete_teams: false,
                confirm: "really clear scores".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("REALLY CLEAR SCORES"));

        handle_clear_scores(
            &store,
            &paths,
            ClearScoresArgs {
                delete_teams: false,
                confirm: "REALLY CLEAR SCORES".to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "comp_admin",
            "--store",
            "/tmp/comp",
            "scores",
            "--climbers",
            "--csv",
        ])
        .unwrap();
        assert_eq!(cli.store, PathBuf::from("/tmp/comp"));
        match cli.command {
            Command::Scores(args) => {
                assert!(args.climbers);
                assert!(args.csv);
                assert_eq!(args.output.as_os_str(), "-");
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["comp_admin", "clear-scores"]).is_err());
    }
}
