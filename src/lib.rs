//! Core library for the excel-consolidator command line application.
//!
//! The library exposes high-level orchestration helpers that power the
//! command-line interface as well as the unit tests. The modules are
//! structured to keep responsibilities narrow and composable: IO adapters
//! live under [`io`], data representations inside [`model`], column ordering
//! in [`schema`], the consolidation engine in [`consolidate`], integrity
//! checks in [`validate`], and the run orchestration under [`pipeline`].

pub mod consolidate;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod validate;

pub use error::{ConsolidateError, Result};
