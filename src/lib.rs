//! Untangled console output for parallel test runs.
//!
//! Tests running in parallel interleave whatever they print. This crate
//! captures the console of every test into its own log file
//! ([`capture`]) and prints that output next to the failure it belongs to
//! once the run is over ([`formatter::Reporter`]). Identical failures of one
//! project are merged into a single entry ([`aggregate`]).

pub mod aggregate;
pub mod body;
pub mod capture;
pub mod formatter;
pub mod naming;
pub mod runner;
pub mod scope;
pub mod task;

#[cfg(test)]
mod test_support;

pub mod prelude {
    pub use crate::{
        capture::{SetupConfig, setup},
        formatter::{Reporter, ReporterOptions, common::color::ColorSetting},
        runner::{FileDef, RunReport, Runner, SuiteDef, TestDef},
    };
}
