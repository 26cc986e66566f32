//! Warehouse store operations
//!
//! Per-table free functions over an explicitly passed pool. The pool
//! is the store handle; nothing here keeps ambient connection state.

pub mod report;
pub mod runs;
pub mod subjects;
