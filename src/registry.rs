//! Task registry: the ordered set of named, invokable units produced for one run.

use crate::error::TaskError;
use async_trait::async_trait;
use std::sync::Arc;

/// A single invokable unit of work.
///
/// `invoke` returns the task's produced value, if any; the caller prints it.
#[async_trait]
pub trait Invokable: Send + Sync {
    async fn invoke(&self, args: &[String]) -> Result<Option<String>, TaskError>;

    /// One-line description for verbose listings.
    fn description(&self) -> Option<&str> {
        None
    }

    /// True only for the dispatcher's own entry point.
    fn is_entry_point(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("task '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Name -> unit mapping that keeps insertion order.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    entries: Vec<(String, Arc<dyn Invokable>)>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        unit: Arc<dyn Invokable>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.entries.push((name, unit));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Invokable>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, unit)| unit.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Invokable>)> {
        self.entries.iter().map(|(n, unit)| (n.as_str(), unit))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Later duplicates are dropped; the first registration of a name wins.
impl<N: Into<String>> FromIterator<(N, Arc<dyn Invokable>)> for TaskRegistry {
    fn from_iter<I: IntoIterator<Item = (N, Arc<dyn Invokable>)>>(iter: I) -> Self {
        let mut registry = TaskRegistry::new();
        for (name, unit) in iter {
            let name = name.into();
            if !registry.contains(&name) {
                registry.entries.push((name, unit));
            }
        }
        registry
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(n, _)| n)).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn names_keep_insertion_order() {
        let registry = registry_of(&["zeta", "alpha", "mid"]);
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut registry = registry_of(&["build"]);
        let result = registry.register("build", FakeTask::returning("again"));
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(n)) if n == "build"));
    }

    #[test]
    fn collect_keeps_order_and_first_duplicate() {
        let first: Arc<dyn Invokable> = FakeTask::returning("first");
        let second: Arc<dyn Invokable> = FakeTask::returning("second");
        let registry: TaskRegistry = vec![
            ("b", first.clone()),
            ("a", second.clone()),
            ("b", second.clone()),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.names(), vec!["b", "a"]);
        assert!(Arc::ptr_eq(&registry.get("b").unwrap(), &first));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = registry_of(&["Build"]);
        assert!(registry.get("Build").is_some());
        assert!(registry.get("build").is_none());
    }
}
