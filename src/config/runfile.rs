//! Task file format.
//!
//! The top-level YAML mapping is the task set. A value is either a shell
//! command string or a mapping with `run` and optional settings. Keys keep
//! their file order.

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskDef {
    #[serde(default)]
    pub run: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capture: bool,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl TaskDef {
    pub fn command(run: &str) -> Self {
        TaskDef {
            run: run.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunfileError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

pub fn parse(source: &str) -> Result<Vec<(String, TaskDef)>, RunfileError> {
    let document: Value = serde_yaml::from_str(source)?;
    let mapping = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(m) => m,
        _ => {
            return Err(RunfileError::Invalid(
                "expected a mapping of task names to commands".to_string(),
            ))
        }
    };

    let mut tasks = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = match key {
            Value::String(s) => s,
            other => {
                return Err(RunfileError::Invalid(format!(
                    "task names must be strings, found {}",
                    describe(&other)
                )))
            }
        };

        let def = match value {
            Value::String(run) => TaskDef::command(&run),
            mapping @ Value::Mapping(_) => serde_yaml::from_value::<TaskDef>(mapping)
                .map_err(|e| RunfileError::Invalid(format!("task '{}': {}", name, e)))?,
            other => {
                return Err(RunfileError::Invalid(format!(
                    "task '{}' must be a command string or a mapping, found {}",
                    name,
                    describe(&other)
                )))
            }
        };

        if def.run.trim().is_empty() {
            return Err(RunfileError::Invalid(format!(
                "task '{}' has an empty command",
                name
            )));
        }
        tasks.push((name, def));
    }
    Ok(tasks)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_file_order_and_shapes() {
        let src = r#"#!/usr/bin/env -S run --file
zeta: echo z
alpha:
  run: echo a
  description: First letter
  capture: true
  dir: sub
  env:
    GREETING: hi
mid: |
  echo one
  echo two
"#;
        let tasks = parse(src).unwrap();
        let names: Vec<&str> = tasks.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        assert_eq!(tasks[0].1, TaskDef::command("echo z"));
        let alpha = &tasks[1].1;
        assert_eq!(alpha.run, "echo a");
        assert_eq!(alpha.description.as_deref(), Some("First letter"));
        assert!(alpha.capture);
        assert_eq!(alpha.dir.as_deref(), Some("sub"));
        assert_eq!(alpha.env.get("GREETING").map(String::as_str), Some("hi"));
        assert_eq!(tasks[2].1.run, "echo one\necho two\n");
    }

    #[test]
    fn empty_document_has_no_tasks() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(parse("hello: [unclosed"), Err(RunfileError::Yaml(_))));
        assert!(matches!(parse("- a\n- b\n"), Err(RunfileError::Invalid(_))));
        assert!(matches!(parse("1: echo\n"), Err(RunfileError::Invalid(_))));
        assert!(matches!(parse("hello: 42\n"), Err(RunfileError::Invalid(_))));
        assert!(matches!(parse("hello: ''\n"), Err(RunfileError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_task_fields() {
        let err = parse("hello:\n  run: echo\n  colour: red\n").unwrap_err();
        assert!(err.to_string().contains("task 'hello'"));
    }
}
