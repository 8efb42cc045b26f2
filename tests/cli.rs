//
//  pampu
//  tests/cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use assert_cmd::Command;
use predicates::prelude::*;

fn pampu() -> Command {
    let mut cmd = Command::cargo_bin("pampu").unwrap();
    cmd.env_remove("BAMBOO_URL")
        .env_remove("BAMBOO_TOKEN")
        .env_remove("PAMPU_JSON");
    cmd
}

#[test]
fn test_help_lists_commands() {
    pampu()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploys"))
        .stdout(predicate::str::contains("timeline"))
        .stdout(predicate::str::contains("version-create"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn test_version() {
    pampu()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pampu "));
}

#[test]
fn test_builds_rejects_key_without_dash() {
    pampu()
        .args(["builds", "MYPROJECT"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PROJECT-PLAN format"));
}

#[test]
fn test_deploy_chain_conflicts_with_parallel() {
    pampu()
        .args(["deploy", "master-1", "DEV", "--chain", "--parallel"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_completion_names_binary() {
    pampu()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_pampu"));
}
