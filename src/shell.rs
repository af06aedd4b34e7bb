use crate::config::runfile::TaskDef;
use crate::config::settings::ShellSettings;
use crate::error::TaskError;
use crate::registry::Invokable;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A task backed by a shell command line.
///
/// Runs `<program> <args..> <command> <task-name> <forwarded..>` so the
/// forwarded arguments show up as `$1..$n`.
#[derive(Debug, Clone)]
pub struct ShellTask {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    pub capture: bool,
    pub dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub shell: ShellSettings,
}

impl ShellTask {
    /// Build from a parsed definition; `base_dir` is the task file's directory.
    pub fn from_def(name: &str, def: TaskDef, base_dir: PathBuf, shell: ShellSettings) -> Self {
        let dir = match def.dir {
            Some(d) => base_dir.join(d),
            None => base_dir,
        };
        ShellTask {
            name: name.to_string(),
            command: def.run,
            description: def.description,
            capture: def.capture,
            dir,
            env: def.env,
            shell,
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.shell.program);
        cmd.args(&self.shell.args)
            .arg(&self.command)
            .arg(&self.name)
            .args(args)
            .envs(&self.env)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());
        // An empty dir means the process working directory
        if !self.dir.as_os_str().is_empty() {
            cmd.current_dir(&self.dir);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> TaskError {
        TaskError::Spawn {
            program: self.shell.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl Invokable for ShellTask {
    async fn invoke(&self, args: &[String]) -> Result<Option<String>, TaskError> {
        debug!(task = %self.name, dir = %self.dir.display(), capture = self.capture, "spawning shell task");
        let mut cmd = self.command(args);

        if !self.capture {
            let status = cmd
                .stdout(Stdio::inherit())
                .status()
                .await
                .map_err(|e| self.spawn_error(e))?;
            if !status.success() {
                return Err(TaskError::Exit {
                    code: status.code(),
                });
            }
            return Ok(None);
        }

        let output = cmd
            .stdout(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(TaskError::Exit {
                code: output.status.code(),
            });
        }
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
