//! Execution planner - an ordered pipeline of resources

use crate::resource::{BoxedResource, Resource};

/// An execution plan: resources converged strictly in insertion order
pub struct ExecutionPlan {
    /// Plan label shown in progress output (e.g. "install /srv/berks")
    pub name: String,
    /// Steps, in the order they must run
    pub steps: Vec<BoxedResource>,
    /// Notes reported once the plan has run
    pub notes: Vec<String>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Append a step to the end of the pipeline
    pub fn push(&mut self, resource: BoxedResource) {
        self.steps.push(resource);
    }

    /// Add a note, ignoring duplicates
    pub fn add_note(&mut self, note: String) {
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            name: self.name,
            steps: self
                .steps
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
            notes: self.notes,
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Step identifiers in execution order
    pub fn step_ids(&self) -> Vec<String> {
        self.steps.iter().map(|r| r.id()).collect()
    }

    /// Total number of resources in the plan
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((rt, name)) if !rt.contains('/') => (Some(rt.to_string()), Some(name.to_string())),
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type
        && !resource.resource_type().starts_with(rt)
    {
        return false;
    }

    if let Some(n) = name
        && !resource.id().contains(n)
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::{ApplyResult, ResourceState};

    #[derive(Debug)]
    struct Named(&'static str, &'static str);

    impl Resource for Named {
        fn id(&self) -> String {
            self.1.to_string()
        }
        fn description(&self) -> String {
            self.1.to_string()
        }
        fn resource_type(&self) -> &'static str {
            self.0
        }
        fn current_state(&self, _ctx: &ApplyContext) -> anyhow::Result<ResourceState> {
            Ok(ResourceState::present())
        }
        fn desired_state(&self) -> ResourceState {
            ResourceState::present()
        }
        fn apply(&self, _ctx: &ApplyContext) -> anyhow::Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("group"), (Some("group".to_string()), None));
        assert_eq!(
            parse_target("user.berkshelf"),
            (Some("user".to_string()), Some("berkshelf".to_string()))
        );
        assert_eq!(
            parse_target("/etc/berks/config.json"),
            (None, Some("/etc/berks/config.json".to_string()))
        );
    }

    #[test]
    fn test_filter_keeps_order() {
        let mut plan = ExecutionPlan::new("test");
        plan.push(Box::new(Named("group", "berkshelf")));
        plan.push(Box::new(Named("user", "berkshelf")));
        plan.push(Box::new(Named("group", "other")));

        let filtered = plan.filter_by_target(Some("group"));
        assert_eq!(filtered.step_ids(), vec!["berkshelf", "other"]);
    }

    #[test]
    fn test_notes_are_deduplicated() {
        let mut plan = ExecutionPlan::new("test");
        plan.add_note("kept".into());
        plan.add_note("kept".into());
        assert_eq!(plan.notes.len(), 1);
    }
}
