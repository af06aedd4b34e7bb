//! The runner's own tasks, reached with a `.` prefix (`run .install`).

use crate::dispatch::{completion_list, SELF_TASK_PREFIX};
use crate::error::TaskError;
use crate::loader::Loader;
use crate::registry::{Invokable, TaskRegistry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const INSTALL: &str = "install";
pub const COMPLETE: &str = "complete";
pub const ENTRY_POINT: &str = "main";

/// Everything the builtins need from the surrounding invocation.
#[derive(Clone)]
pub struct BuiltinEnv {
    pub exe: PathBuf,
    pub install_dir: PathBuf,
    pub rc_file: PathBuf,
    pub runfile: PathBuf,
    pub comp_line: Option<String>,
    pub comp_point: Option<usize>,
    pub loader: Arc<dyn Loader>,
}

pub fn registry(env: BuiltinEnv) -> TaskRegistry {
    let units: [(&str, Arc<dyn Invokable>); 3] = [
        (
            INSTALL,
            Arc::new(Install {
                exe: env.exe.clone(),
                dir: env.install_dir.clone(),
                rc_file: env.rc_file.clone(),
                runfile: env.runfile.clone(),
            }),
        ),
        (COMPLETE, Arc::new(Complete { env })),
        (ENTRY_POINT, Arc::new(EntryPoint)),
    ];
    units.into_iter().collect()
}

/// Copies the running executable into a bin directory and hooks up completion.
struct Install {
    exe: PathBuf,
    dir: PathBuf,
    rc_file: PathBuf,
    runfile: PathBuf,
}

#[async_trait]
impl Invokable for Install {
    async fn invoke(&self, args: &[String]) -> Result<Option<String>, TaskError> {
        let dir = args.first().map(PathBuf::from).unwrap_or_else(|| self.dir.clone());
        let file_name = self
            .exe
            .file_name()
            .ok_or_else(|| TaskError::Failed(format!("invalid executable path {}", self.exe.display())))?;
        let target = dir.join(file_name);

        tokio::fs::create_dir_all(&dir).await?;
        if !same_file(&self.exe, &target).await {
            tokio::fs::copy(&self.exe, &target).await?;
            make_executable(&target).await?;
            info!(target = %target.display(), "installed executable");
        }

        let line = completion_hook(&target, &self.runfile);
        let appended = append_line_once(&self.rc_file, &line).await?;

        let mut report = format!("installed {}", target.display());
        if appended {
            report.push_str(&format!(
                "\nadded completion to {}; restart the shell session to use it",
                self.rc_file.display()
            ));
        }
        Ok(Some(report))
    }

    fn description(&self) -> Option<&str> {
        Some("Install this runner and its shell completion")
    }
}

/// Prints completion candidates for the word under the cursor.
struct Complete {
    env: BuiltinEnv,
}

#[async_trait]
impl Invokable for Complete {
    async fn invoke(&self, _args: &[String]) -> Result<Option<String>, TaskError> {
        let line = self.env.comp_line.as_deref().unwrap_or("");
        let prefix = completion_prefix(line, self.env.comp_point);

        let candidates = match prefix.strip_prefix(SELF_TASK_PREFIX) {
            Some(builtin_prefix) => completion_list(&registry(self.env.clone()), builtin_prefix)
                .into_iter()
                .filter(|name| name != ENTRY_POINT)
                .map(|name| format!("{}{}", SELF_TASK_PREFIX, name))
                .collect(),
            None => match self.env.loader.load(&self.env.runfile).await {
                Ok(registry) => completion_list(&registry, prefix),
                // Completion output goes straight into the shell; stay quiet
                Err(err) => {
                    debug!(error = %err, "no completion candidates");
                    Vec::new()
                }
            },
        };

        if candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(candidates.join("\n")))
    }

    fn description(&self) -> Option<&str> {
        Some("Shell completion hook (reads COMP_LINE and COMP_POINT)")
    }
}

/// The dispatcher itself. Present so that `run .main` is rejected, never executed.
struct EntryPoint;

#[async_trait]
impl Invokable for EntryPoint {
    async fn invoke(&self, _args: &[String]) -> Result<Option<String>, TaskError> {
        Err(TaskError::Failed(
            "the dispatcher cannot be invoked as a task".to_string(),
        ))
    }

    fn is_entry_point(&self) -> bool {
        true
    }
}

/// Last whitespace-delimited word of `line` before byte offset `point`.
pub fn completion_prefix(line: &str, point: Option<usize>) -> &str {
    let mut end = point.unwrap_or(line.len()).min(line.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    let head = &line[..end];
    if head.is_empty() || head.ends_with(char::is_whitespace) {
        return "";
    }
    head.split_whitespace().last().unwrap_or("")
}

pub fn completion_hook(exe: &Path, runfile: &Path) -> String {
    let exe_name = exe
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "run".to_string());
    let runfile_name = runfile
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!(
        "complete -C \"{} .complete\" {} {}",
        exe.display(),
        exe_name,
        runfile_name
    )
    .trim_end()
    .to_string()
}

/// Append `line` to `path` unless an identical line is already there.
async fn append_line_once(path: &Path, line: &str) -> std::io::Result<bool> {
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    if existing.lines().any(|l| l.trim() == line) {
        return Ok(false);
    }

    let mut contents = existing;
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(line);
    contents.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(true)
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(unix)]
pub(crate) async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
pub(crate) async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
