use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single task body.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{}", exit_message(*code))]
    Exit { code: Option<i32> },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{0}")]
    Failed(String),
}

fn exit_message(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Everything that ends an invocation with a non-zero exit.
///
/// An unknown task name is deliberately absent: it degrades to a listing.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("task file not found: {}", .0.display())]
    TaskFileNotFound(PathBuf),

    #[error("failed to load {}: {message}", path.display())]
    TaskFileLoad { path: PathBuf, message: String },

    #[error("task '{0}' is the dispatcher entry point and cannot be invoked as a task")]
    SelfInvocation(String),

    #[error("task '{name}' failed")]
    TaskExecution {
        name: String,
        #[source]
        source: TaskError,
    },
}

impl RunError {
    /// Process exit status for this failure. A task's own non-zero status is passed through.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::TaskExecution {
                source: TaskError::Exit { code: Some(code) },
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_passes_through_task_status() {
        let err = RunError::TaskExecution {
            name: "build".to_string(),
            source: TaskError::Exit { code: Some(3) },
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            format!("{:#}", anyhow::Error::from(err)),
            "task 'build' failed: exited with status 3"
        );
    }

    #[test]
    fn exit_code_defaults_to_one() {
        assert_eq!(RunError::SelfInvocation("main".into()).exit_code(), 1);
        assert_eq!(
            RunError::TaskFileNotFound(PathBuf::from("Runfile.yaml")).exit_code(),
            1
        );
        let signalled = RunError::TaskExecution {
            name: "serve".to_string(),
            source: TaskError::Exit { code: None },
        };
        assert_eq!(signalled.exit_code(), 1);
    }
}
