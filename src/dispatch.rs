//! Task resolution and dispatch.
//!
//! `resolve_target` decides which task file and which task a command line
//! names; `invoke` runs it against a loaded registry. Neither touches
//! process-global state.

use crate::error::RunError;
use crate::registry::TaskRegistry;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{debug, info};

/// Leading marker that selects the runner's own built-in tasks.
pub const SELF_TASK_PREFIX: char = '.';

/// Snapshot of the process inputs, passed explicitly instead of read from globals.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: PathBuf,
}

impl InvocationContext {
    /// Snapshot the environment and working directory; `args` are the raw task arguments.
    pub fn from_process(args: Vec<String>) -> std::io::Result<Self> {
        Ok(Self::from_parts(
            args,
            std::env::vars_os(),
            std::env::current_dir()?,
        ))
    }

    /// Variables whose name or value is not valid UTF-8 are left out of the snapshot.
    pub fn from_parts(
        args: Vec<String>,
        vars: impl IntoIterator<Item = (OsString, OsString)>,
        cwd: PathBuf,
    ) -> Self {
        let env = vars
            .into_iter()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        InvocationContext { args, env, cwd }
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(|s| s.as_str())
    }

    /// Home directory, preferring `HOME` from the snapshot.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }
}

/// Source of the registry for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFile {
    Project(PathBuf),
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub raw_args: Vec<String>,
    pub task_name: Option<String>,
    pub forwarded_args: Vec<String>,
    pub target: TaskFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Available task names, in registry order.
    Listing(Vec<String>),
    /// The task ran; carries its printable value, if any.
    Value(Option<String>),
}

pub fn resolve_target(
    raw_args: &[String],
    default_file: TaskFile,
    self_file: TaskFile,
) -> InvocationRequest {
    let Some((candidate, rest)) = raw_args.split_first() else {
        return InvocationRequest {
            raw_args: Vec::new(),
            task_name: None,
            forwarded_args: Vec::new(),
            target: default_file,
        };
    };

    let (target, task_name) = match candidate.strip_prefix(SELF_TASK_PREFIX) {
        Some(stripped) => (self_file, stripped.to_string()),
        None => (default_file, candidate.clone()),
    };
    debug!(?target, task = %task_name, "resolved invocation target");

    InvocationRequest {
        raw_args: raw_args.to_vec(),
        task_name: Some(task_name),
        forwarded_args: rest.to_vec(),
        target,
    }
}

pub async fn invoke(
    registry: &TaskRegistry,
    task_name: Option<&str>,
    forwarded_args: &[String],
) -> Result<InvocationOutcome, RunError> {
    let name = match task_name {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(InvocationOutcome::Listing(registry.names())),
    };

    let Some(unit) = registry.get(name) else {
        info!(task = %name, "unknown task, listing available tasks");
        return Ok(InvocationOutcome::Listing(registry.names()));
    };

    if unit.is_entry_point() {
        return Err(RunError::SelfInvocation(name.to_string()));
    }

    debug!(task = %name, args = ?forwarded_args, "invoking task");
    let value = unit
        .invoke(forwarded_args)
        .await
        .map_err(|source| RunError::TaskExecution {
            name: name.to_string(),
            source,
        })?;
    debug!(task = %name, "task finished");
    Ok(InvocationOutcome::Value(value))
}

/// Task names starting with `prefix`, in registry order.
pub fn completion_list(registry: &TaskRegistry, prefix: &str) -> Vec<String> {
    registry
        .iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .map(|(name, _)| name.to_string())
        .collect()
}
