use crate::builtins::make_executable;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Starter task file. The shebang lets `./Runfile.yaml <task>` dispatch through `run`.
pub const TEMPLATE: &str = r#"#!/usr/bin/env -S run --file
# Each top-level key is a task: `run hello`.
# Arguments after the task name are passed to the command as $1, $2, ...

hello:
  run: echo "Hello World!"
  description: Say hello
"#;

/// Write the template to `path`. Returns false, leaving the file untouched, if it already exists.
pub async fn create_runfile(path: &Path) -> std::io::Result<bool> {
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    file.write_all(TEMPLATE.as_bytes()).await?;
    file.flush().await?;
    drop(file);
    make_executable(path).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runfile;

    #[test]
    fn template_parses_to_hello() {
        let tasks = runfile::parse(TEMPLATE).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].0, "hello");
    }

    #[tokio::test]
    async fn creates_once_and_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Runfile.yaml");
        assert!(create_runfile(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TEMPLATE);

        std::fs::write(&path, "mine: echo mine\n").unwrap();
        assert!(!create_runfile(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mine: echo mine\n");
    }
}
