//! Integration tests for the mdesk CLI
//!
//! These exercise the commands end-to-end using assert_cmd. Nothing here
//! needs a running backend: remote commands are only checked for how they
//! fail without one.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// mdesk command isolated from the user's configuration and environment
fn mdesk(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mdesk").unwrap();
    let home = tmp.path().join("home");
    cmd.current_dir(tmp.path())
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("MDESK_API_URL")
        .env_remove("MDESK_TOKEN")
        .env_remove("MDESK_USER")
        .env_remove("MDESK_ORIGIN")
        .env_remove("MDESK_LOG");
    cmd
}

/// Temp directory with an initialized workspace
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp).arg("init").assert().success();
    tmp
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Master data administration"))
        .stdout(predicate::str::contains("options"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdesk"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mdesk"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();

    mdesk(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".mdesk").is_dir());
    assert!(tmp.path().join(".mdesk/config.yaml").exists());
    let catalog = fs::read_to_string(tmp.path().join(".mdesk/resources.yaml")).unwrap();
    assert!(catalog.contains("key: units"));
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_init_force_restores_catalog() {
    let tmp = setup_workspace();
    let catalog = tmp.path().join(".mdesk/resources.yaml");
    fs::write(&catalog, "resources: []\n").unwrap();

    mdesk(&tmp).args(["init", "--force"]).assert().success();
    assert!(fs::read_to_string(&catalog).unwrap().contains("key: rooms"));
}

// ============================================================================
// Resources Command Tests
// ============================================================================

#[test]
fn test_resources_lists_builtin_catalog() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .arg("resources")
        .assert()
        .success()
        .stdout(predicate::str::contains("units"))
        .stdout(predicate::str::contains("Unit of Measure"))
        .stdout(predicate::str::contains("building_id"));
}

#[test]
fn test_resources_id_format() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["resources", "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("roles\nunits\n"));
}

#[test]
fn test_resources_show_one() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["resources", "rooms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("section_id"))
        .stdout(predicate::str::contains("/master/room"));
}

#[test]
fn test_resources_unknown_key_fails() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["resources", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource"));
}

#[test]
fn test_workspace_catalog_is_used() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join(".mdesk/resources.yaml"),
        r#"resources:
  - key: colors
    path: color
    route: /master/color
    label: Color
    code_field: code
    fields:
      - { name: code, label: Code, required: true }
"#,
    )
    .unwrap();

    mdesk(&tmp)
        .args(["resources", "-f", "id"])
        .assert()
        .success()
        .stdout("colors\n");
}

#[test]
fn test_broken_catalog_reports_problem() {
    let tmp = setup_workspace();
    fs::write(
        tmp.path().join(".mdesk/resources.yaml"),
        r#"resources:
  - key: colors
    path: color
    route: /master/color
    label: Color
    code_field: hex
    fields:
      - { name: code, label: Code }
"#,
    )
    .unwrap();

    mdesk(&tmp)
        .arg("resources")
        .assert()
        .failure()
        .stderr(predicate::str::contains("code_field"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_set_and_show() {
    let tmp = setup_workspace();

    mdesk(&tmp)
        .args(["config", "set", "rows_per_page", "50"])
        .assert()
        .success();
    mdesk(&tmp)
        .args(["config", "show", "rows_per_page"])
        .assert()
        .success()
        .stdout("50\n");

    mdesk(&tmp)
        .args(["config", "unset", "rows_per_page"])
        .assert()
        .success();
    mdesk(&tmp)
        .args(["config", "show", "rows_per_page"])
        .assert()
        .failure();
}

#[test]
fn test_config_rejects_bad_values() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["config", "set", "author", "someone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
    mdesk(&tmp)
        .args(["config", "set", "rows_per_page", "7"])
        .assert()
        .failure();
}

#[test]
fn test_config_global_set() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .args(["config", "set", "--global", "username", "jsmith"])
        .assert()
        .success();
    mdesk(&tmp)
        .args(["config", "show", "username"])
        .assert()
        .success()
        .stdout("jsmith\n");
}

#[test]
fn test_config_env_overrides_file() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["config", "set", "api_url", "http://file.example"])
        .assert()
        .success();
    mdesk(&tmp)
        .env("MDESK_API_URL", "http://env.example")
        .args(["config", "show", "api_url"])
        .assert()
        .success()
        .stdout("http://env.example\n");
}

#[test]
fn test_config_path_workspace() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["config", "path", "--workspace-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".mdesk"))
        .stdout(predicate::str::contains("config.yaml"));
}

#[test]
fn test_config_set_outside_workspace_fails() {
    let tmp = TempDir::new().unwrap();
    mdesk(&tmp)
        .args(["config", "set", "api_url", "http://localhost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in an mdesk workspace"));
}

// ============================================================================
// Remote Command Tests (no backend)
// ============================================================================

#[test]
fn test_list_without_api_url_fails() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["list", "units"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API URL configured"));
}

#[test]
fn test_list_unknown_resource_fails() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["--api-url", "http://127.0.0.1:9", "list", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource"));
}

#[test]
fn test_list_unreachable_backend_fails() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["--api-url", "http://127.0.0.1:9", "list", "units"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request failed"));
}

#[test]
fn test_list_rejects_unsupported_page_size() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["list", "units", "--rows", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported page size"));
}

#[test]
fn test_options_needs_parent() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["--api-url", "http://127.0.0.1:9", "options", "rooms", "section_id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("depends on 'building_id'"));
}

#[test]
fn test_options_unknown_field_fails() {
    let tmp = setup_workspace();
    mdesk(&tmp)
        .args(["--api-url", "http://127.0.0.1:9", "options", "rooms", "code"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no picker"));
}
