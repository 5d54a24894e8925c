//! Core worktree operations.
//!
//! Each submodule holds the logic behind one piece of the worktree
//! lifecycle, separated from argument parsing and output rendering.
//! Functions take a `GitCommand` and, where they have something to report,
//! a `ProgressSink`, and return structured results.

pub mod clean;
pub mod copy;
pub mod create;
pub mod done;
pub mod remove;
pub mod scan;
pub mod setup;
