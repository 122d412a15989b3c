//! Integration tests for the `git` adapter against real repositories.

mod common;

use common::prelude::*;
use forklift::git as forklift_git;
use forklift::repository::{DefaultGitOperations, GitOperations};

#[test]
fn test_stash_reports_whether_anything_was_stashed() {
    let fixture = GitFixture::new();
    let ops = DefaultGitOperations::new(fixture.work_path());

    assert!(!ops.stash().unwrap(), "clean tree stashes nothing");

    std::fs::write(fixture.work_path().join("README.md"), "changed\n").unwrap();
    assert!(ops.stash().unwrap());
    assert_eq!(
        std::fs::read_to_string(fixture.work_path().join("README.md")).unwrap(),
        "# widgets\n"
    );

    // an existing stash entry does not make a clean stash look successful
    assert!(!ops.stash().unwrap());

    ops.stash_pop().unwrap();
    assert_eq!(
        std::fs::read_to_string(fixture.work_path().join("README.md")).unwrap(),
        "changed\n"
    );
}

#[test]
fn test_stash_message_is_recognisable() {
    let fixture = GitFixture::new();
    std::fs::write(fixture.work_path().join("README.md"), "changed\n").unwrap();

    forklift_git::stash(&fixture.work_path()).unwrap();

    let list = git(&fixture.work_path(), &["stash", "list"]);
    assert!(list.contains(forklift_git::STASH_MESSAGE));
}

#[test]
fn test_branch_and_git_dir() {
    let fixture = GitFixture::new();
    let ops = DefaultGitOperations::new(fixture.work_path());

    assert_eq!(ops.current_branch().unwrap(), "feature");
    let git_dir = ops.git_dir().unwrap();
    assert!(git_dir.is_absolute());
    assert!(git_dir.ends_with(".git"));

    ops.checkout("release").unwrap();
    assert_eq!(ops.current_branch().unwrap(), "release");

    git(&fixture.work_path(), &["checkout", "--quiet", "--detach"]);
    assert_eq!(ops.current_branch().unwrap(), "HEAD");
}

#[test]
fn test_tag_queries() {
    let fixture = GitFixture::new();
    let ops = DefaultGitOperations::new(fixture.work_path());

    assert!(!ops.tag_exists("v-feature-1"));
    ops.create_tag("v-feature-1").unwrap();
    assert!(ops.tag_exists("v-feature-1"));
    assert!(ops.tag_points_at_head("v-feature-1"));

    fixture.commit_file("more.txt", "more\n", "more work");
    assert!(ops.tag_exists("v-feature-1"));
    assert!(!ops.tag_points_at_head("v-feature-1"));
    assert!(!ops.tag_points_at_head("v-feature-404"));
}

#[test]
fn test_push_tag_reaches_remote() {
    let fixture = GitFixture::new();
    let ops = DefaultGitOperations::new(fixture.work_path());

    ops.create_tag("v-feature-1").unwrap();
    ops.push_tag("origin", "v-feature-1").unwrap();

    assert_eq!(fixture.remote_tags(), vec!["v-feature-1".to_string()]);
}

#[test]
fn test_merge_conflict_leaves_merge_in_progress() {
    let fixture = GitFixture::new();
    fixture.commit_upstream("release", "feature.txt", "other\n");
    let ops = DefaultGitOperations::new(fixture.work_path());

    ops.checkout("release").unwrap();
    ops.pull("origin", "release").unwrap();
    assert!(!ops.merge_in_progress());

    let err = ops.merge("feature").unwrap_err();
    assert!(matches!(err, forklift::error::Error::GitCommand { .. }));
    assert!(ops.merge_in_progress());

    ops.merge_abort().unwrap();
    assert!(!ops.merge_in_progress());
}

#[test]
fn test_failed_checkout_is_git_command_error() {
    let fixture = GitFixture::new();
    let ops = DefaultGitOperations::new(fixture.work_path());

    let err = ops.checkout("does-not-exist").unwrap_err();
    assert!(matches!(err, forklift::error::Error::GitCommand { .. }));
    assert!(err.to_string().contains("checkout does-not-exist"));
}

#[test]
fn test_identity_and_repo_identifier() {
    let fixture = GitFixture::new();
    let ops = DefaultGitOperations::new(fixture.work_path());

    assert_eq!(ops.user_identity(), "Test Operator <ops@example.com>");
    assert_eq!(ops.repo_identifier("origin").unwrap(), fixture.repo_id());
    assert!(ops.repo_identifier("upstream").is_err());
}
