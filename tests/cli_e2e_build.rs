//! End-to-end tests for `forklift build`.

mod common;

use common::prelude::*;

#[test]
fn test_build_merge_releases_next_tag() {
    let fixture = GitFixture::new().with_ledger_row("release", "v-release-3");

    fixture
        .command()
        .args(["build", "merge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[STASH] Stashing changes..."))
        .stdout(predicate::str::contains("[PULL] Pulling latest for release..."))
        .stdout(predicate::str::contains("[TAG] New tag: v-release-4"))
        .stdout(predicate::str::contains("Released v-release-4 on release."));

    assert_eq!(fixture.current_branch(), "feature");
    assert_eq!(fixture.ledger_rows()[0].last_tag, "v-release-4");
}

#[test]
fn test_build_merge_quiet_prints_nothing() {
    let fixture = GitFixture::new().with_ledger_row("release", "v-release-3");

    fixture
        .command()
        .args(["build", "merge", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_build_merge_quiet_still_reports_conflict() {
    let fixture = GitFixture::new().with_ledger_row("release", "v-release-3");
    fixture.commit_upstream("release", "feature.txt", "conflicting\n");

    fixture
        .command()
        .args(["build", "merge", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Merge conflicts merging feature into release",
        ))
        .stderr(predicate::str::contains("forklift build merge"));

    assert!(fixture.checkpoint_path().exists());
    assert_eq!(fixture.current_branch(), "release");
}

#[test]
fn test_build_merge_conflict_exits_cleanly_with_guidance() {
    let fixture = GitFixture::new().with_ledger_row("release", "v-release-3");
    fixture.commit_upstream("release", "feature.txt", "conflicting\n");

    fixture
        .command()
        .args(["build", "merge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MERGE CONFLICTS DETECTED!"))
        .stdout(predicate::str::contains(
            "Note: You are currently on the release branch.",
        ));

    assert!(fixture.checkpoint_path().exists());

    fixture
        .command()
        .args(["build", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("merging:  feature -> release"))
        .stdout(predicate::str::contains("Conflicts are unresolved"));

    fixture
        .command()
        .args(["build", "merge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("merge is still in progress"));
}

#[test]
fn test_build_abort_returns_to_original_branch() {
    let fixture = GitFixture::new().with_ledger_row("release", "v-release-3");
    fixture.commit_upstream("release", "feature.txt", "conflicting\n");
    fixture.command().args(["build", "merge"]).assert().success();

    fixture
        .command()
        .args(["build", "abort"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Abandoned build of feature into release.",
        ));

    assert_eq!(fixture.current_branch(), "feature");
    assert!(!fixture.checkpoint_path().exists());

    fixture
        .command()
        .args(["build", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No build in progress."));
}

#[test]
fn test_build_abort_without_build_fails() {
    let fixture = GitFixture::new();

    fixture
        .command()
        .args(["build", "abort"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no build in progress"));
}

#[test]
fn test_build_merge_unknown_repo_is_configuration_error() {
    let fixture = GitFixture::new().with_foreign_row("acme/other", "release");

    fixture
        .command()
        .args(["build", "merge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in ledger"))
        .stderr(predicate::str::contains("forklift set merge-branch"));

    assert_eq!(fixture.current_branch(), "feature");
}

#[test]
fn test_build_merge_without_configuration() {
    let fixture = GitFixture::new();
    std::fs::remove_file(fixture.config_path()).unwrap();

    fixture
        .command()
        .args(["build", "merge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "configuration not found. run 'forklift init' first.",
        ));
}
