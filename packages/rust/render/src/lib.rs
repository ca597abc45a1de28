//! Query classification and renderer dispatch.
//!
//! This crate provides:
//! - [`classify`], which turns a raw query into a [`RenderRequest`]
//!   using ordered [`QueryRule`]s
//! - [`dispatch`], which runs the external tool for a request and streams its
//!   combined output into any `AsyncWrite` sink

pub mod classify;
pub mod dispatch;

pub use classify::{
    Classifier, HELP_MARKER, LookupPlan, ManPageRule, ProgramHelpRule, QueryRule, RenderRequest,
    StdlibPackageRule, Strategy, USAGE,
};
pub use dispatch::{CommandLine, ERROR_MARKER, RenderCommands, render, run_to_sink};
