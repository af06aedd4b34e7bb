//! run - a minimalist task runner.
//!
//! Resolves a task name from the command line, loads the project task file
//! and dispatches to the named task.

pub mod app;
pub mod builtins;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod registry;
pub mod shell;
pub mod template;
pub mod util;
