//! Integration tests for the `netpass` CLI binary.
//!
//! Each test seeds its own state file in a temp dir; no NAS is configured,
//! so the live channel is offline throughout.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

const TENANT: &str = "6f1c2f0e-4b7a-4c1e-9a52-1d9f3c0b7e11";
const OTHER_TENANT: &str = "0b8e7d6c-5a4f-4e3d-8c2b-1a0f9e8d7c6b";
const PACKAGE: &str = "a3d1f6e2-7c45-4b89-9e10-2f3c4d5e6f70";
const FOREIGN_PACKAGE: &str = "c9b8a7f6-e5d4-4c3b-8a29-1807f6e5d4c3";

// ── Helpers ─────────────────────────────────────────────────────────

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Temp dir with a state file holding one daily package per tenant.
    fn seeded() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state = json!({
            "tenants": [TENANT, OTHER_TENANT],
            "packages": [
                package(PACKAGE, TENANT, "Day Pass"),
                package(FOREIGN_PACKAGE, OTHER_TENANT, "Other Day Pass"),
            ],
        });
        std::fs::write(
            dir.path().join("state.json"),
            serde_json::to_string_pretty(&state).unwrap(),
        )
        .unwrap();
        Self { dir }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    fn state(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(self.state_path()).unwrap()).unwrap()
    }

    /// `netpass` bound to this workspace's state file and tenant.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = netpass_cmd(self.dir.path());
        cmd.arg("--state")
            .arg(self.state_path())
            .env("NETPASS_TENANT", TENANT);
        cmd
    }

    fn generate(&self, count: u32) -> Vec<Value> {
        let output = self
            .cmd()
            .args(["vouchers", "generate", "--package", PACKAGE, "-o", "json"])
            .args(["--count", &count.to_string()])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", combined_output(&output));
        serde_json::from_slice::<Vec<Value>>(&output.stdout).unwrap()
    }
}

fn package(id: &str, tenant: &str, name: &str) -> Value {
    json!({
        "id": id,
        "tenant_id": tenant,
        "name": name,
        "duration": 1,
        "duration_unit": "days",
        "bandwidth": { "download_mbps": 10, "upload_mbps": 5 },
        "max_devices": 1,
    })
}

/// Build a [`Command`] for the `netpass` binary with env isolation.
///
/// Points config directories into `home` and clears `NETPASS_*` so tests
/// never touch the user's real configuration. Hashing runs at the cheapest
/// Argon2 cost.
fn netpass_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netpass");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("NETPASS_CONFIG")
        .env_remove("NETPASS_STATE")
        .env_remove("NETPASS_TENANT")
        .env_remove("NETPASS_OUTPUT")
        .env_remove("NETPASS_DEFAULT_TENANT")
        .env("NETPASS_HASHING__MEMORY_KIB", "8")
        .env("NETPASS_HASHING__ITERATIONS", "1")
        .env("NETPASS_HASHING__PARALLELISM", "1");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Stateless commands ──────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = netpass_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_rate_plain() {
    let dir = tempfile::tempdir().unwrap();
    netpass_cmd(dir.path())
        .args(["rate", "--upload", "5", "--download", "10"])
        .assert()
        .success()
        .stdout("5000k/10000k\n");
}

#[test]
fn test_rate_burst() {
    let dir = tempfile::tempdir().unwrap();
    netpass_cmd(dir.path())
        .args(["rate", "--upload", "5", "--download", "10"])
        .args(["--burst-limit", "8", "--burst-threshold", "6", "--burst-time", "10"])
        .assert()
        .success()
        .stdout("5000k/10000k 8000k/8000k 6000k/6000k 10/10\n");
}

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    netpass_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netpass"));
}

// ── Tenant selection ────────────────────────────────────────────────

#[test]
fn test_missing_tenant_is_usage_error() {
    let ws = Workspace::seeded();
    netpass_cmd(ws.dir.path())
        .arg("--state")
        .arg(ws.state_path())
        .args(["vouchers", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No tenant selected"));
}

#[test]
fn test_malformed_tenant_is_usage_error() {
    let ws = Workspace::seeded();
    ws.cmd()
        .args(["--tenant", "not-a-uuid", "vouchers", "list"])
        .assert()
        .code(2);
}

// ── Vouchers ────────────────────────────────────────────────────────

#[test]
fn test_generate_persists_unused_vouchers() {
    let ws = Workspace::seeded();
    let issued = ws.generate(3);

    assert_eq!(issued.len(), 3);
    for v in &issued {
        assert_eq!(v["code"].as_str().unwrap().len(), 8);
        assert_eq!(v["password"].as_str().unwrap().len(), 8);
    }

    let state = ws.state();
    let stored = state["vouchers"].as_array().unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|v| v["status"] == "unused"));
    // Only the hash is persisted
    let raw = std::fs::read_to_string(ws.state_path()).unwrap();
    for v in &issued {
        assert!(!raw.contains(v["password"].as_str().unwrap()));
    }
}

#[test]
fn test_generate_with_prefix() {
    let ws = Workspace::seeded();
    let output = ws
        .cmd()
        .args(["vouchers", "generate", "--package", PACKAGE, "--prefix", "cafe"])
        .args(["-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let line = String::from_utf8(output.stdout).unwrap();
    assert!(line.starts_with("CAFE"), "{line}");
}

#[test]
fn test_generate_foreign_package_is_forbidden() {
    let ws = Workspace::seeded();
    ws.cmd()
        .args(["vouchers", "generate", "--package", FOREIGN_PACKAGE])
        .assert()
        .code(5);
}

#[test]
fn test_activate_writes_rows_once() {
    let ws = Workspace::seeded();
    let code = ws.generate(1)[0]["code"].as_str().unwrap().to_owned();

    ws.cmd()
        .args(["vouchers", "activate", &code, "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"active\""));

    ws.cmd()
        .args(["rows", &code, "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(format!("Cleartext-Password := {code}"))
                .and(predicate::str::contains("Simultaneous-Use := 1"))
                .and(predicate::str::contains("Mikrotik-Rate-Limit := 5000k/10000k")),
        );

    ws.cmd()
        .args(["vouchers", "activate", &code])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("activated"));
}

#[test]
fn test_unknown_voucher_is_not_found() {
    let ws = Workspace::seeded();
    ws.cmd()
        .args(["vouchers", "show", "NOPE2345"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("netpass vouchers list"));
}

#[test]
fn test_list_filters_by_status() {
    let ws = Workspace::seeded();
    let issued = ws.generate(2);
    let first = issued[0]["code"].as_str().unwrap();
    ws.cmd().args(["vouchers", "activate", first]).assert().success();

    ws.cmd()
        .args(["vouchers", "list", "--status", "active", "-o", "plain"])
        .assert()
        .success()
        .stdout(format!("{first}\n"));

    ws.cmd()
        .args(["vouchers", "list", "--status", "bogus"])
        .assert()
        .code(2);
}

#[test]
fn test_expire_then_rows_are_gone() {
    let ws = Workspace::seeded();
    let code = ws.generate(1)[0]["code"].as_str().unwrap().to_owned();
    ws.cmd().args(["vouchers", "activate", &code]).assert().success();

    ws.cmd()
        .args(["vouchers", "expire", &code, "-o", "plain"])
        .assert()
        .success();

    ws.cmd()
        .args(["rows", &code, "-o", "json"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_delete_requires_confirmation_when_not_interactive() {
    let ws = Workspace::seeded();
    let code = ws.generate(1)[0]["code"].as_str().unwrap().to_owned();

    ws.cmd()
        .args(["vouchers", "delete", &code])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));

    ws.cmd()
        .args(["vouchers", "delete", &code, "--yes"])
        .assert()
        .success();
    assert!(ws.state()["vouchers"].as_array().unwrap().is_empty());
}

// ── Sync / sweep ────────────────────────────────────────────────────

#[test]
fn test_reconcile_reports_in_sync_after_activation() {
    let ws = Workspace::seeded();
    let code = ws.generate(1)[0]["code"].as_str().unwrap().to_owned();
    ws.cmd().args(["vouchers", "activate", &code]).assert().success();

    let output = ws
        .cmd()
        .args(["sync", "reconcile", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["checked"], 1);
    assert_eq!(report["in_sync"], 1);
    assert_eq!(report["resynced"], 0);
}

#[test]
fn test_sweep_once_without_tenant() {
    let ws = Workspace::seeded();
    let output = netpass_cmd(ws.dir.path())
        .arg("--state")
        .arg(ws.state_path())
        .args(["sweep", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["vouchers_expired"], 0);
}

// ── Sessions ────────────────────────────────────────────────────────

#[test]
fn test_usage_rejects_inverted_range() {
    let ws = Workspace::seeded();
    ws.cmd()
        .args(["sessions", "usage", "--from", "2026-03-02", "--to", "2026-03-01"])
        .assert()
        .code(2);
}

#[test]
fn test_disconnect_unknown_session_is_not_found() {
    let ws = Workspace::seeded();
    ws.cmd()
        .args(["sessions", "disconnect", "acct-404", "--yes"])
        .assert()
        .code(4);
}
