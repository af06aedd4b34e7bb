//! Loader: turns a task file path into a registry.

use crate::config::runfile;
use crate::config::settings::ShellSettings;
use crate::error::RunError;
use crate::registry::TaskRegistry;
use crate::shell::ShellTask;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<TaskRegistry, RunError>;
}

/// Loads YAML task files into shell tasks.
#[derive(Debug, Clone, Default)]
pub struct YamlLoader {
    pub shell: ShellSettings,
}

impl YamlLoader {
    pub fn new(shell: ShellSettings) -> Self {
        YamlLoader { shell }
    }
}

#[async_trait]
impl Loader for YamlLoader {
    async fn load(&self, path: &Path) -> Result<TaskRegistry, RunError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RunError::TaskFileNotFound(path.to_path_buf()),
                _ => RunError::TaskFileLoad {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            })?;

        let load_error = |message: String| RunError::TaskFileLoad {
            path: path.to_path_buf(),
            message,
        };
        let defs = runfile::parse(&source).map_err(|e| load_error(e.to_string()))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut registry = TaskRegistry::new();
        for (name, def) in defs {
            let task = ShellTask::from_def(&name, def, base_dir.clone(), self.shell.clone());
            registry
                .register(name, Arc::new(task))
                .map_err(|e| load_error(e.to_string()))?;
        }
        debug!(path = %path.display(), tasks = registry.len(), "loaded task file");
        Ok(registry)
    }
}
