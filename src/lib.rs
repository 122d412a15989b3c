//! # forklift
//!
//! Library behind the `forklift` command-line tool: a resumable
//! merge-and-tag release helper. A shared ledger (a Google spreadsheet, or a
//! local JSON file) records, per repository, which branch is the current
//! release ("merge") branch and the last tag issued on it. `forklift build
//! merge` folds the operator's branch into that merge branch, computes the
//! next tag, pushes both and records the tag back into the ledger.
//!
//! ## Quick Example
//!
//! ```
//! use forklift::sequencer;
//!
//! assert_eq!(sequencer::next_tag("v-release-3", "release").unwrap(), "v-release-4");
//! assert_eq!(sequencer::next_tag("", "release").unwrap(), "v-release-0.0.1");
//! ```
//!
//! ## Core Concepts
//!
//! - **Build orchestration (`build`)**: the stash / checkout / pull / merge /
//!   tag / push / ledger-update sequence, with resume after conflicts.
//! - **Checkpoint (`checkpoint`)**: the small JSON record that lets a build
//!   survive a merge conflict or a crashed process.
//! - **Tag sequencer (`sequencer`)**: pure next-tag computation plus the
//!   bounded collision-avoidance loop.
//! - **Ledger (`ledger`)**: the shared row store and its backends.
//! - **Version control (`repository`, `git`)**: the [`GitOperations`]
//!   trait and its `git` CLI implementation.
//! - **Polling (`github`, `notification`)**: watching the workflow run a
//!   pushed tag triggers.
//!
//! [`GitOperations`]: repository::GitOperations

pub mod build;
pub mod checkpoint;
pub mod clipboard;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod github;
pub mod ledger;
pub mod notification;
pub mod output;
pub mod repository;
pub mod sequencer;
