//! Resolver configuration.

/// What to do with a slot that has no feasible schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave the slot out of the graph and list it as unresolved.
    #[default]
    Omit,
    /// Abort the whole graph build.
    Fail,
}

/// Configuration for the schedule resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum search steps per slot before giving up.
    /// Every practical can double the search in the worst case.
    pub max_steps: usize,

    pub failure_policy: FailurePolicy,
}

impl ResolverConfig {
    pub fn new(max_steps: usize, failure_policy: FailurePolicy) -> Self {
        Self {
            max_steps,
            failure_policy,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            failure_policy: FailurePolicy::Omit,
        }
    }
}
