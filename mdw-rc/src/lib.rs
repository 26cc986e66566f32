//! # MDW Reconciler Library
//!
//! Incrementally reconciles a filesystem corpus of per-subject,
//! per-run measurement files into the warehouse. Each distinct run is
//! recorded exactly once regardless of how many passes are invoked;
//! subject rows are derived from run rows the first time a subject
//! number is seen.
//!
//! Pipeline: directory tree → [`scanner`] → [`record`] (composing
//! [`path_parse`], [`metadata`], [`hash`]) → [`reconcile`] → store
//! ([`db`]).

pub mod db;
pub mod hash;
pub mod metadata;
pub mod path_parse;
pub mod record;
pub mod reconcile;
pub mod scanner;

pub use reconcile::{reconcile, ReconcileReport};
pub use record::{build_run_record, RunRecord};
