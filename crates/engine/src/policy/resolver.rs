//! Target resolution for a policy

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::error::TargetNotFound;
use crate::models::{MatchReason, Policy, ResolvedTarget, WorkloadKind, WorkloadRef};
use crate::observability::{noop_sink, ObservabilitySink};

/// Outcome of resolving one policy against a workload universe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Ordered by match priority, then by input order
    pub targets: Vec<ResolvedTarget>,
    /// Explicit targets absent from the universe
    pub missing: Vec<TargetNotFound>,
}

/// Computes the workloads a policy applies to
#[derive(Clone)]
pub struct PolicyResolver {
    sink: Arc<dyn ObservabilitySink>,
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(noop_sink())
    }
}

impl PolicyResolver {
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self { sink }
    }

    /// Resolve `policy` over `universe`.
    ///
    /// Selector and global-default matching scan `target_namespaces` when the
    /// policy sets them, otherwise `known_namespaces`, otherwise every
    /// namespace seen in the universe (in order of first appearance).
    pub fn resolve(
        &self,
        policy: &Policy,
        universe: &[WorkloadRef],
        known_namespaces: &[String],
    ) -> Resolution {
        let started = Instant::now();
        let resolution = resolve_targets(policy, universe, known_namespaces);

        for missing in &resolution.missing {
            self.sink.target_missing(policy, missing);
        }
        self.sink.policy_resolved(
            policy,
            resolution.targets.len(),
            resolution.missing.len(),
            started.elapsed(),
        );
        resolution
    }
}

fn resolve_targets(policy: &Policy, universe: &[WorkloadRef], known_namespaces: &[String]) -> Resolution {
    let mut out = Collector::default();
    let mut missing = Vec::new();

    for entry in &policy.explicit_targets {
        match universe.iter().find(|w| entry.matches(w)) {
            Some(workload) => out.push(workload, MatchReason::Explicit),
            None => missing.push(TargetNotFound {
                name: entry.name.clone(),
                namespace: entry.namespace.clone(),
                kind: entry.kind.clone(),
            }),
        }
    }

    let scope = namespace_scope(policy, universe, known_namespaces);

    if !policy.selector.is_empty() {
        for workload in in_scope(&scope, universe) {
            let selected = policy
                .selector
                .iter()
                .all(|(k, v)| workload.labels.get(k) == Some(v));
            if selected {
                out.push(workload, MatchReason::Selector);
            }
        }
    }

    if policy.global_default && policy.explicit_targets.is_empty() && policy.selector.is_empty() {
        for workload in in_scope(&scope, universe) {
            out.push(workload, MatchReason::GlobalDefault);
        }
    }

    Resolution {
        targets: out.targets,
        missing,
    }
}

/// Keeps the first (highest priority) occurrence of each workload
#[derive(Default)]
struct Collector<'a> {
    seen: HashSet<(&'a str, &'a str, WorkloadKind)>,
    targets: Vec<ResolvedTarget>,
}

impl<'a> Collector<'a> {
    fn push(&mut self, workload: &'a WorkloadRef, reason: MatchReason) {
        if self.seen.insert(workload.identity()) {
            self.targets.push(ResolvedTarget {
                workload: workload.clone(),
                reason,
            });
        }
    }
}

fn namespace_scope<'a>(
    policy: &'a Policy,
    universe: &'a [WorkloadRef],
    known: &'a [String],
) -> Vec<&'a str> {
    let candidates: Box<dyn Iterator<Item = &'a str>> = if !policy.target_namespaces.is_empty() {
        Box::new(policy.target_namespaces.iter().map(String::as_str))
    } else if !known.is_empty() {
        Box::new(known.iter().map(String::as_str))
    } else {
        Box::new(universe.iter().map(|w| w.namespace.as_str()))
    };

    let mut scope: Vec<&str> = Vec::new();
    for ns in candidates {
        if !scope.contains(&ns) {
            scope.push(ns);
        }
    }
    scope
}

/// Universe members grouped by scope order
fn in_scope<'a>(scope: &[&str], universe: &'a [WorkloadRef]) -> Vec<&'a WorkloadRef> {
    scope
        .iter()
        .flat_map(|ns| universe.iter().filter(move |w| w.namespace == *ns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaleValues, TargetRef};
    use crate::observability::EngineMetrics;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn workload(name: &str, ns: &str, labels: &[(&str, &str)]) -> WorkloadRef {
        WorkloadRef {
            name: name.into(),
            namespace: ns.into(),
            kind: WorkloadKind::Deployment,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cluster: None,
        }
    }

    fn universe() -> Vec<WorkloadRef> {
        vec![
            workload("cam", "edge", &[("app", "vision")]),
            workload("api", "prod", &[("app", "web")]),
            workload("det", "prod", &[("app", "vision"), ("tier", "gpu")]),
            workload("db", "data", &[]),
        ]
    }

    fn names(r: &Resolution) -> Vec<(&str, MatchReason)> {
        r.targets
            .iter()
            .map(|t| (t.workload.name.as_str(), t.reason))
            .collect()
    }

    fn selector(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_explicit_beats_selector() {
        let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
        p.explicit_targets = vec![TargetRef::new("det", "prod", "Deployment")];
        p.selector = selector(&[("app", "vision")]);

        let r = PolicyResolver::default().resolve(&p, &universe(), &[]);

        assert_eq!(
            names(&r),
            vec![("det", MatchReason::Explicit), ("cam", MatchReason::Selector)]
        );
        assert!(r.missing.is_empty());
    }

    #[test]
    fn test_missing_explicit_target_is_reported() {
        let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
        p.explicit_targets = vec![
            TargetRef::new("ghost", "prod", "Deployment"),
            TargetRef::new("api", "prod", "Deployment"),
            TargetRef::new("api", "prod", "StatefulSet"),
        ];

        let r = PolicyResolver::default().resolve(&p, &universe(), &[]);

        assert_eq!(names(&r), vec![("api", MatchReason::Explicit)]);
        assert_eq!(r.missing.len(), 2);
        assert_eq!(r.missing[0].name, "ghost");
        assert_eq!(r.missing[1].kind, "StatefulSet");
    }

    #[test]
    fn test_selector_respects_target_namespaces() {
        let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
        p.selector = selector(&[("app", "vision")]);
        p.target_namespaces = vec!["prod".into()];

        let r = PolicyResolver::default().resolve(&p, &universe(), &[]);

        assert_eq!(names(&r), vec![("det", MatchReason::Selector)]);
    }

    #[test]
    fn test_selector_requires_every_pair() {
        let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
        p.selector = selector(&[("app", "vision"), ("tier", "gpu")]);

        let r = PolicyResolver::default().resolve(&p, &universe(), &[]);

        assert_eq!(names(&r), vec![("det", MatchReason::Selector)]);
    }

    #[test]
    fn test_known_namespaces_order_scan() {
        let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
        p.global_default = true;
        let known = vec!["data".to_string(), "edge".to_string()];

        let r = PolicyResolver::default().resolve(&p, &universe(), &known);

        assert_eq!(
            names(&r),
            vec![("db", MatchReason::GlobalDefault), ("cam", MatchReason::GlobalDefault)]
        );
    }

    #[test]
    fn test_global_default_ignored_when_selector_set() {
        let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
        p.global_default = true;
        p.selector = selector(&[("app", "web")]);

        let r = PolicyResolver::default().resolve(&p, &universe(), &[]);

        assert_eq!(names(&r), vec![("api", MatchReason::Selector)]);
    }

    #[test]
    fn test_resolution_reported_to_sink() {
        let metrics = EngineMetrics::new().unwrap();
        let resolver = PolicyResolver::new(Arc::new(metrics.clone()));
        let mut p = Policy::new("vision", MaleValues::new(500, 500, 500));
        p.selector = selector(&[("app", "vision")]);

        resolver.resolve(&p, &universe(), &[]);

        let text = String::from_utf8(metrics.encode().unwrap()).unwrap();
        assert!(text.contains("male_resolved_targets{policy=\"vision\"} 2"));
    }

    fn any_universe() -> impl Strategy<Value = Vec<WorkloadRef>> {
        let names = prop_oneof![Just("a"), Just("b"), Just("c")];
        let namespaces = prop_oneof![Just("x"), Just("y")];
        let apps = prop::option::of(prop_oneof![Just("vision"), Just("web")]);
        prop::collection::vec((names, namespaces, apps), 0..12).prop_map(|items| {
            items
                .into_iter()
                .map(|(n, ns, app)| {
                    let labels: Vec<(&str, &str)> = app.map(|a| ("app", a)).into_iter().collect();
                    workload(n, ns, &labels)
                })
                .collect()
        })
    }

    fn any_policy() -> impl Strategy<Value = Policy> {
        (
            prop::collection::vec((prop_oneof![Just("a"), Just("b"), Just("z")], prop_oneof![Just("x"), Just("y")]), 0..3),
            prop::option::of(prop_oneof![Just("vision"), Just("web")]),
            any::<bool>(),
        )
            .prop_map(|(targets, app, global)| {
                let mut p = Policy::new("p", MaleValues::new(500, 500, 500));
                p.explicit_targets = targets
                    .into_iter()
                    .map(|(n, ns)| TargetRef::new(n, ns, "Deployment"))
                    .collect();
                if let Some(app) = app {
                    p.selector = selector(&[("app", app)]);
                }
                p.global_default = global;
                p
            })
    }

    proptest! {
        #[test]
        fn prop_resolve_is_idempotent(p in any_policy(), u in any_universe()) {
            let resolver = PolicyResolver::default();
            prop_assert_eq!(resolver.resolve(&p, &u, &[]), resolver.resolve(&p, &u, &[]));
        }

        #[test]
        fn prop_each_workload_resolved_once_with_best_reason(p in any_policy(), u in any_universe()) {
            let r = PolicyResolver::default().resolve(&p, &u, &[]);

            let mut seen = HashSet::new();
            for t in &r.targets {
                prop_assert!(seen.insert(t.workload.identity()));
                let explicit = p.explicit_targets.iter().any(|e| e.matches(&t.workload));
                if explicit {
                    prop_assert_eq!(t.reason, MatchReason::Explicit);
                }
            }

            let reasons: Vec<_> = r.targets.iter().map(|t| t.reason).collect();
            let mut sorted = reasons.clone();
            sorted.sort();
            prop_assert_eq!(reasons, sorted);
        }
    }
}
