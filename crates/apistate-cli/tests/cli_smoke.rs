use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "apistate-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_apistate<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_apistate");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("apistate command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_config(path: &Path) {
    let text = r#"
[storage]
type1 = "storage.type1"
"type2.test" = 'storage["type2.test"]'

[transformations.type1]
relationships = ["type1", "type2.test"]

[transformations."type2.test"]
"#;
    fs::write(path, text).expect("config should be written");
}

fn write_store(path: &Path) {
    let store = json!({
        "ui": { "sidebarOpen": true, "openTabs": ["type1Id1"] },
        "storage": {
            "type1": {
                "type1Id1": {
                    "id": "type1Id1",
                    "type": "type1",
                    "attributes": { "name": "type1Id1" },
                    "relationships": {
                        "type1": { "data": [
                            { "id": "type1Id2", "type": "type1" },
                            { "id": "type1Id3", "type": "type1" }
                        ] },
                        "type2.test": { "data": { "id": "type2Id1", "type": "type2.test" } }
                    },
                    "meta": { "valid": true }
                },
                "type1Id2": {
                    "id": "type1Id2",
                    "type": "type1",
                    "attributes": { "name": "type1Id2" }
                },
                "type1Id3": {
                    "id": "type1Id3",
                    "type": "type1",
                    "attributes": { "name": "type1Id3" },
                    "relationships": {
                        "type1": { "data": [{ "id": "type1Id1", "type": "type1" }] }
                    }
                }
            },
            "type2.test": {
                "type2Id1": {
                    "id": "type2Id1",
                    "type": "type2.test",
                    "attributes": { "name": "type2Id1" }
                }
            }
        }
    });
    fs::write(path, serde_json::to_string_pretty(&store).expect("store json"))
        .expect("store should be written");
}

struct Workspace {
    _dir: TempDirGuard,
    config: PathBuf,
    store: PathBuf,
    root: PathBuf,
}

fn workspace(prefix: &str) -> Workspace {
    let dir = TempDirGuard::new(prefix);
    let root = dir.path().to_path_buf();
    let config = root.join("apistate.toml");
    let store = root.join("store.json");
    write_config(&config);
    write_store(&store);
    Workspace {
        _dir: dir,
        config,
        store,
        root,
    }
}

#[test]
fn normalize_item_splits_relationships() {
    let ws = workspace("normalize-item");
    let input = ws.root.join("item.json");
    fs::write(
        &input,
        json!({
            "id": "type1Id9",
            "type": "type1",
            "name": "nine",
            "type1": [{ "id": "type1Id1", "type": "type1", "name": "ignored" }],
            "type2.test": null
        })
        .to_string(),
    )
    .expect("input should be written");

    let output = run_apistate([
        OsStr::new("normalize"),
        input.as_os_str(),
        OsStr::new("--config"),
        ws.config.as_os_str(),
    ]);
    assert_success(&output);

    assert_eq!(
        parse_json_stdout(&output),
        json!({
            "id": "type1Id9",
            "type": "type1",
            "attributes": { "name": "nine" },
            "relationships": {
                "type1": { "data": [{ "id": "type1Id1", "type": "type1" }] },
                "type2.test": { "data": null }
            }
        })
    );
}

#[test]
fn normalize_collection_honors_picks() {
    let ws = workspace("normalize-collection");
    let input = ws.root.join("items.json");
    fs::write(
        &input,
        json!([
            { "id": "b", "type": "type1", "name": "B", "rank": 2 },
            { "id": "a", "type": "type1", "name": "A", "rank": 1 }
        ])
        .to_string(),
    )
    .expect("input should be written");

    let output = run_apistate([
        OsStr::new("normalize"),
        input.as_os_str(),
        OsStr::new("--config"),
        ws.config.as_os_str(),
        OsStr::new("--pick"),
        OsStr::new("rank"),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload[0]["id"], "b");
    assert_eq!(payload[1]["id"], "a");
    assert_eq!(payload[0]["attributes"], json!({ "rank": 2 }));
}

#[test]
fn denormalize_item_prints_nested_tree() {
    let ws = workspace("denormalize-item");

    let output = run_apistate([
        OsStr::new("denormalize"),
        OsStr::new("--type"),
        OsStr::new("type1"),
        OsStr::new("type1Id1"),
        OsStr::new("--store"),
        ws.store.as_os_str(),
        OsStr::new("--config"),
        ws.config.as_os_str(),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["name"], "type1Id1");
    assert_eq!(payload["meta"], json!({ "valid": true }));
    assert_eq!(payload["type2.test"]["name"], "type2Id1");
    assert_eq!(payload["type1"][0]["name"], "type1Id2");
    // type1Id3 links back to the root, which is rendered as a reference.
    assert_eq!(
        payload["type1"][1]["type1"][0],
        json!({ "id": "type1Id1", "type": "type1" })
    );
}

#[test]
fn denormalize_collection_attaches_meta() {
    let ws = workspace("denormalize-collection");

    let output = run_apistate([
        OsStr::new("denormalize"),
        OsStr::new("--type"),
        OsStr::new("type1"),
        OsStr::new("type1Id2"),
        OsStr::new("missing"),
        OsStr::new("--store"),
        ws.store.as_os_str(),
        OsStr::new("--config"),
        ws.config.as_os_str(),
        OsStr::new("--meta"),
        OsStr::new(r#"{"page":1}"#),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["meta"], json!({ "page": 1 }));
    assert_eq!(payload["data"][0]["id"], "type1Id2");
    assert_eq!(payload["data"][1], Value::Null);
}

#[test]
fn denormalize_enforces_object_budget() {
    let ws = workspace("denormalize-budget");
    let args = |max: &'static str| {
        vec![
            OsStr::new("denormalize").to_os_string(),
            OsStr::new("--type").to_os_string(),
            OsStr::new("type1").to_os_string(),
            OsStr::new("type1Id1").to_os_string(),
            OsStr::new("--store").to_os_string(),
            ws.store.clone().into_os_string(),
            OsStr::new("--config").to_os_string(),
            ws.config.clone().into_os_string(),
            OsStr::new("--references").to_os_string(),
            OsStr::new("--max-objects").to_os_string(),
            OsStr::new(max).to_os_string(),
        ]
    };

    let output = run_apistate(args("2"));
    assert_failure(&output);
    assert!(
        stderr_text(&output).contains("budget of 2 objects"),
        "stderr:\n{}",
        stderr_text(&output)
    );

    let output = run_apistate(args("4"));
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["type1"][1]["name"], "type1Id3");
    assert_eq!(
        payload["type1"][1]["type1"][0],
        json!({ "id": "type1Id1", "type": "type1" })
    );
}

#[test]
fn denormalize_rejects_unresolvable_storage_path() {
    let ws = workspace("denormalize-bad-path");
    fs::write(&ws.config, "[storage]\ntype1 = \"state.type1\"\n").expect("config should be written");

    let output = run_apistate([
        OsStr::new("denormalize"),
        OsStr::new("--type"),
        OsStr::new("type1"),
        OsStr::new("type1Id1"),
        OsStr::new("--store"),
        ws.store.as_os_str(),
        OsStr::new("--config"),
        ws.config.as_os_str(),
    ]);
    assert_failure(&output);
    assert!(
        stderr_text(&output).contains("does not resolve"),
        "stderr:\n{}",
        stderr_text(&output)
    );
}

#[test]
fn check_config_reports_store_resolution() {
    let ws = workspace("check-config");

    let output = run_apistate([
        OsStr::new("check-config"),
        OsStr::new("--config"),
        ws.config.as_os_str(),
        OsStr::new("--store"),
        ws.store.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["checkKind"], "apistate.config_check.v1");
    assert_eq!(payload["result"], "accepted");
    assert_eq!(payload["storeItems"], 4);
    assert_eq!(payload["unknownTypePolicy"], "empty");
    assert_eq!(
        payload["storage"][1],
        json!({ "type": "type2.test", "path": "storage[\"type2.test\"]" })
    );
}

#[test]
fn check_config_fails_for_missing_file() {
    let ws = workspace("check-config-missing");
    let missing = ws.root.join("nope.toml");

    let output = run_apistate([
        OsStr::new("check-config"),
        OsStr::new("--config"),
        missing.as_os_str(),
    ]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("config file not found"));
}
