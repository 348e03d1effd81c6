#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn layton(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("layton").unwrap();
    cmd.current_dir(dir.path())
        .env("LAYTON_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

const CODE_REVIEW: &str = "---\nname: code-review\ndescription: Review code\nvariables:\n  file_path: File to review\n  focus_area: What to look at\n---\n\n## Task\n\nReview ${file_path} for ${focus_area}.\n";

fn write_errand(dir: &TempDir, name: &str, content: &str) {
    let errands = dir.path().join(".layton/errands");
    std::fs::create_dir_all(&errands).unwrap();
    std::fs::write(errands.join(format!("{name}.md")), content).unwrap();
}

// ---------------------------------------------------------------------------
// Fake tracker
// ---------------------------------------------------------------------------

/// A stand-in `bd` that logs each invocation's arguments on one line and
/// answers with canned JSON.
#[cfg(unix)]
const FAKE_BD: &str = r#"#!/bin/sh
printf '%s' "$*" | tr '\n' ' ' >> "$BD_LOG"
echo >> "$BD_LOG"
case "$1" in
  create)
    case "$*" in
      *"--type epic"*) echo '{"id":"bd-epic"}' ;;
      *) echo '{"id":"bd-100","title":"[code-review] Review code","status":"open"}' ;;
    esac
    ;;
  list)
    case "$*" in
      *needs-review*)
        echo 'Warning: slow query'
        echo '[{"id":"bd-7","title":"[code-review] Review code","status":"closed","labels":["needs-review"]}]'
        ;;
      *) echo '[]' ;;
    esac
    ;;
  show)
    if [ "$2" = "bd-404" ]; then
      echo "Error: no issue found matching bd-404" >&2
      exit 1
    fi
    echo "[{\"id\":\"$2\",\"title\":\"[code-review] Review code\",\"description\":\"Review src/auth.py for security.\"}]"
    ;;
  comments)
    echo "No comments on $2"
    ;;
  label)
    ;;
  *)
    echo "unknown command: $1" >&2
    exit 1
    ;;
esac
"#;

#[cfg(unix)]
struct FakeTracker {
    bin: TempDir,
    log: PathBuf,
}

#[cfg(unix)]
impl FakeTracker {
    fn install() -> Self {
        use std::os::unix::fs::PermissionsExt;

        let bin = TempDir::new().unwrap();
        let script = bin.path().join("bd");
        std::fs::write(&script, FAKE_BD).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let log = bin.path().join("calls.log");
        FakeTracker { bin, log }
    }

    fn apply(&self, cmd: &mut Command) {
        let path = format!("{}:/bin:/usr/bin", self.bin.path().display());
        cmd.env("PATH", path).env("BD_LOG", &self.log);
    }

    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn log_text(&self) -> String {
        std::fs::read_to_string(&self.log).unwrap_or_default()
    }
}

#[cfg(unix)]
fn layton_with_bd(dir: &TempDir, bd: &FakeTracker) -> Command {
    let mut cmd = layton(dir);
    bd.apply(&mut cmd);
    cmd
}

/// Command with a `PATH` that contains no `bd`.
fn layton_without_bd(dir: &TempDir, empty_bin: &Path) -> Command {
    let mut cmd = layton(dir);
    cmd.env("PATH", empty_bin);
    cmd
}

// ---------------------------------------------------------------------------
// layton errands list / add
// ---------------------------------------------------------------------------

#[test]
fn errands_list_empty_suggests_add() {
    let dir = TempDir::new().unwrap();
    layton(&dir)
        .arg("errands")
        .assert()
        .success()
        .stdout(predicate::str::contains("No errands."))
        .stdout(predicate::str::contains("layton errands add"));
}

#[test]
fn errands_add_then_list() {
    let dir = TempDir::new().unwrap();
    layton(&dir)
        .args(["errands", "add", "weekly-report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created errand 'weekly-report'"));
    assert!(dir.path().join(".layton/errands/weekly-report.md").exists());

    let output = layton(&dir)
        .args(["--json", "errands", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["errands"][0]["name"], "weekly-report");
    assert!(v["data"]["errands"][0].get("body").is_none());
}

#[test]
fn errands_list_shows_declared_variables() {
    let dir = TempDir::new().unwrap();
    write_errand(&dir, "code-review", CODE_REVIEW);
    layton(&dir)
        .arg("errands")
        .assert()
        .success()
        .stdout(predicate::str::contains("code-review"))
        .stdout(predicate::str::contains("file_path, focus_area"));
}

#[test]
fn errands_add_existing_fails() {
    let dir = TempDir::new().unwrap();
    layton(&dir).args(["errands", "add", "dup"]).assert().success();

    let output = layton(&dir)
        .args(["--json", "errands", "add", "dup"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v = stdout_json(&output);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "ERRAND_EXISTS");
}

#[test]
fn errands_add_rejects_invalid_name() {
    let dir = TempDir::new().unwrap();
    layton(&dir)
        .args(["errands", "add", "Bad_Name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid name"));
    assert!(!dir.path().join(".layton/errands").exists());
}

// ---------------------------------------------------------------------------
// layton errands epic
// ---------------------------------------------------------------------------

#[test]
fn epic_set_then_show() {
    let dir = TempDir::new().unwrap();
    layton(&dir)
        .args(["errands", "epic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("epic not configured"))
        .stderr(predicate::str::contains("layton errands epic set"));

    layton(&dir)
        .args(["errands", "epic", "set", "bd-42"])
        .assert()
        .success();
    layton(&dir)
        .args(["errands", "epic"])
        .assert()
        .success()
        .stdout("bd-42\n");

    let raw = std::fs::read_to_string(dir.path().join(".layton/config.json")).unwrap();
    let cfg: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(cfg["errands"]["epic"], "bd-42");
}

// ---------------------------------------------------------------------------
// Tracker unavailable
// ---------------------------------------------------------------------------

#[test]
fn schedule_without_tracker_exits_with_status_2() {
    let dir = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    write_errand(&dir, "code-review", CODE_REVIEW);

    let output = layton_without_bd(&dir, empty.path())
        .args(["--json", "errands", "schedule", "code-review"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let v = stdout_json(&output);
    assert_eq!(v["error"]["code"], "BD_UNAVAILABLE");
    assert!(v["next_steps"][0].as_str().unwrap().contains("Beads"));
}

#[test]
fn orientation_without_tracker_exits_with_status_2() {
    let dir = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    layton_without_bd(&dir, empty.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("bd CLI not found"));
}

#[test]
fn listing_works_without_tracker() {
    let dir = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    write_errand(&dir, "code-review", CODE_REVIEW);
    layton_without_bd(&dir, empty.path())
        .args(["errands", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("code-review"));
}

// ---------------------------------------------------------------------------
// layton errands schedule / run
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn schedule_without_epic_never_creates() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);

    let output = layton_with_bd(&dir, &bd)
        .args(["--json", "errands", "schedule", "code-review", "{}"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["error"]["code"], "NO_EPIC");
    assert!(bd.calls().is_empty());
}

#[cfg(unix)]
#[test]
fn schedule_unknown_errand_never_creates() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    layton(&dir)
        .args(["errands", "epic", "set", "bd-epic"])
        .assert()
        .success();

    let output = layton_with_bd(&dir, &bd)
        .args(["--json", "errands", "schedule", "missing"])
        .output()
        .unwrap();
    let v = stdout_json(&output);
    assert_eq!(v["error"]["code"], "ERRAND_NOT_FOUND");
    assert!(v["error"]["message"].as_str().unwrap().contains("missing"));
    assert!(bd.calls().is_empty());
}

#[cfg(unix)]
#[test]
fn schedule_renders_variables_into_item() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);
    layton(&dir)
        .args(["errands", "epic", "set", "bd-epic"])
        .assert()
        .success();

    let output = layton_with_bd(&dir, &bd)
        .args([
            "--json",
            "errands",
            "schedule",
            "code-review",
            r#"{"file_path": "src/auth.py", "focus_area": "security"}"#,
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["data"]["scheduled"]["id"], "bd-100");

    let log = bd.log_text();
    assert!(log.starts_with("create --title [code-review] Review code --parent bd-epic"));
    assert!(log.contains("--labels scheduled,type:code-review"));
    assert!(log.contains("Review src/auth.py for security."));
    assert!(!log.contains("${file_path}"));
}

#[cfg(unix)]
#[test]
fn schedule_reads_variables_from_stdin() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);
    layton(&dir)
        .args(["errands", "epic", "set", "bd-epic"])
        .assert()
        .success();

    layton_with_bd(&dir, &bd)
        .args(["errands", "schedule", "code-review"])
        .write_stdin(r#"{"file_path": "lib/session.rs"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled 'code-review' as bd-100"));

    let log = bd.log_text();
    assert!(log.contains("lib/session.rs"));
    assert!(log.contains("${focus_area}"));
}

#[cfg(unix)]
#[test]
fn schedule_does_not_wait_on_idle_stdin() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);
    layton(&dir)
        .args(["errands", "epic", "set", "bd-epic"])
        .assert()
        .success();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("layton"))
        .args(["errands", "schedule", "code-review"])
        .current_dir(dir.path())
        .env("LAYTON_ROOT", dir.path())
        .env_remove("RUST_LOG")
        .env("PATH", format!("{}:/bin:/usr/bin", bd.bin.path().display()))
        .env("BD_LOG", &bd.log)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Held open and never written to.
    let _stdin = child.stdin.take();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("schedule blocked on an open, empty stdin");
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    assert!(status.success());
    let calls = bd.calls();
    assert!(calls.iter().any(|c| c.starts_with("create ")), "{calls:?}");
    assert!(bd.log_text().contains("${file_path}"));
}

#[cfg(unix)]
#[test]
fn schedule_rejects_non_object_variables() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);

    let output = layton_with_bd(&dir, &bd)
        .args(["--json", "errands", "schedule", "code-review", "[1, 2]"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["error"]["code"], "INVALID_JSON");
    assert!(bd.calls().is_empty());
}

#[cfg(unix)]
#[test]
fn run_provisions_epic_and_reports_item() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);

    let output = layton_with_bd(&dir, &bd)
        .args(["--json", "errands", "run", "code-review", "{}"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    assert_eq!(v["data"]["bead_id"], "bd-100");
    assert_eq!(v["data"]["title"], "[code-review] Review code");

    let calls = bd.calls();
    assert_eq!(calls[0], "create --title Background Tasks --type epic --json");
    assert!(calls[1].contains("--parent bd-epic"));

    layton(&dir)
        .args(["errands", "epic"])
        .assert()
        .success()
        .stdout("bd-epic\n");

    // Second run reuses the stored epic
    layton_with_bd(&dir, &bd)
        .args(["errands", "run", "code-review", "{}"])
        .assert()
        .success();
    assert_eq!(bd.calls().len(), 3);
}

// ---------------------------------------------------------------------------
// layton errands prompt / queue
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn prompt_marks_in_progress_and_embeds_protocol() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();

    layton_with_bd(&dir, &bd)
        .args(["errands", "prompt", "bd-42"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "# Errand: bd-42 - [code-review] Review code",
        ))
        .stdout(predicate::str::contains("Review src/auth.py for security."))
        .stdout(predicate::str::contains("prior comments").not())
        .stdout(predicate::str::contains(
            "bd comments add bd-42 \"## Summary\\n\\n<findings>\"\n",
        ))
        .stdout(predicate::str::contains("bd label remove bd-42 in-progress"))
        .stdout(predicate::str::contains("bd close bd-42"))
        .stdout(predicate::str::contains("bd label add bd-42 needs-review"));

    assert_eq!(
        bd.calls(),
        vec![
            "show bd-42 --json",
            "label remove bd-42 scheduled",
            "label add bd-42 in-progress",
            "comments bd-42",
        ]
    );
}

#[cfg(unix)]
#[test]
fn prompt_for_missing_item_fails() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();

    let output = layton_with_bd(&dir, &bd)
        .args(["--json", "errands", "prompt", "bd-404"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v = stdout_json(&output);
    assert_eq!(v["error"]["code"], "BEAD_NOT_FOUND");
    assert!(v["error"]["message"].as_str().unwrap().contains("bd-404"));
}

#[cfg(unix)]
#[test]
fn queue_skips_diagnostics_and_counts_review() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();

    let output = layton_with_bd(&dir, &bd)
        .args(["--json", "errands", "queue"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    assert_eq!(v["data"]["scheduled"], serde_json::json!([]));
    assert_eq!(v["data"]["pending_review"][0]["id"], "bd-7");
    assert_eq!(v["next_steps"][0], "1 item(s) pending review");
}

#[cfg(unix)]
#[test]
fn orientation_reports_inventory() {
    let dir = TempDir::new().unwrap();
    let bd = FakeTracker::install();
    write_errand(&dir, "code-review", CODE_REVIEW);

    let output = layton_with_bd(&dir, &bd).arg("--json").output().unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    assert_eq!(v["data"]["needs_setup"], true);
    assert_eq!(v["data"]["errands"]["templates"][0]["name"], "code-review");
    assert_eq!(
        v["data"]["errands"]["queue"]["pending_review"][0]["id"],
        "bd-7"
    );
    let steps: Vec<&str> = v["next_steps"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert!(steps.contains(&"Run 'layton config init' for quick setup"));
    assert!(steps.contains(&"1 item(s) pending review"));
}

// ---------------------------------------------------------------------------
// layton protocols / rolodex
// ---------------------------------------------------------------------------

#[test]
fn protocols_add_and_list() {
    let dir = TempDir::new().unwrap();
    layton(&dir)
        .args(["protocols", "add", "morning-brief"])
        .assert()
        .success();

    let output = layton(&dir)
        .args(["--json", "protocols"])
        .output()
        .unwrap();
    let v = stdout_json(&output);
    assert_eq!(v["data"]["protocols"][0]["name"], "morning-brief");
    assert_eq!(
        v["data"]["protocols"][0]["triggers"][0],
        "phrase that starts this protocol"
    );
}

#[test]
fn rolodex_add_and_list() {
    let dir = TempDir::new().unwrap();
    layton(&dir)
        .args(["rolodex", "add", "calendar"])
        .assert()
        .success();
    layton(&dir)
        .args(["rolodex", "add", "calendar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    layton(&dir)
        .arg("rolodex")
        .assert()
        .success()
        .stdout(predicate::str::contains("calendar"))
        .stdout(predicate::str::contains("manual"));
}

// ---------------------------------------------------------------------------
// layton config
// ---------------------------------------------------------------------------

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();
    layton(&dir).args(["config", "init"]).assert().success();
    layton(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    layton(&dir)
        .args(["config", "init", "--force"])
        .assert()
        .success();

    layton(&dir)
        .args(["config", "get", "work.schedule.start"])
        .assert()
        .success()
        .stdout("09:00\n");

    layton(&dir)
        .args(["config", "set", "work.days", "5"])
        .assert()
        .success();
    let output = layton(&dir)
        .args(["--json", "config", "get", "work.days"])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output)["data"]["value"], 5);

    layton(&dir)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("work.schedule.end"))
        .stdout(predicate::str::contains("work.days"));
}

#[test]
fn config_get_missing_key() {
    let dir = TempDir::new().unwrap();
    let output = layton(&dir)
        .args(["--json", "config", "get", "nope.nothing"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v = stdout_json(&output);
    assert_eq!(v["error"]["code"], "KEY_NOT_FOUND");
    assert!(v["next_steps"][0].as_str().unwrap().contains("config keys"));
}

// ---------------------------------------------------------------------------
// Root discovery
// ---------------------------------------------------------------------------

#[test]
fn root_found_from_subdirectory() {
    let dir = TempDir::new().unwrap();
    write_errand(&dir, "code-review", CODE_REVIEW);
    let sub = dir.path().join("notes/today");
    std::fs::create_dir_all(&sub).unwrap();

    let mut cmd = Command::cargo_bin("layton").unwrap();
    cmd.current_dir(&sub)
        .env_remove("LAYTON_ROOT")
        .args(["errands", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("code-review"));
}
