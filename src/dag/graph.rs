// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::engine::StageName;
use crate::errors::{MigradagError, Result};

/// Declaration of one stage and the stages it depends on.
///
/// - `after`: stages that must *complete* before this one may start.
/// - `starts_with`: a stage this one starts alongside; it becomes eligible as
///   soon as that stage starts, without waiting for it to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub name: StageName,
    pub after: Vec<StageName>,
    pub starts_with: Option<StageName>,
}

impl StageSpec {
    pub fn new(name: impl Into<StageName>) -> Self {
        Self {
            name: name.into(),
            after: Vec::new(),
            starts_with: None,
        }
    }

    pub fn after(mut self, dep: impl Into<StageName>) -> Self {
        self.after.push(dep.into());
        self
    }

    pub fn starts_with(mut self, lead: impl Into<StageName>) -> Self {
        self.starts_with = Some(lead.into());
        self
    }
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct StageNode {
    /// Completion dependencies.
    deps: Vec<StageName>,
    /// Stage this one starts alongside.
    starts_with: Option<StageName>,
    /// Stages that list this one in `after`.
    dependents: Vec<StageName>,
    /// Stages that start alongside this one.
    companions: Vec<StageName>,
}

/// Validated workflow graph keyed by stage name.
///
/// Invariants established by [`WorkflowGraph::new`]:
/// - stage names are unique and well-formed
/// - every reference names a known stage, never the stage itself
/// - the graph is acyclic
/// - exactly one stage has no predecessors (the entry)
/// - at least one stage has no successors (a terminal)
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    nodes: HashMap<StageName, StageNode>,
    /// Stage names in a deterministic topological order.
    order: Vec<StageName>,
    entry: StageName,
}

impl WorkflowGraph {
    pub fn new(specs: Vec<StageSpec>) -> Result<Self> {
        validate_specs(&specs)?;
        let order = topological_order(&specs)?;

        let mut nodes: HashMap<StageName, StageNode> = specs
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    StageNode {
                        deps: spec.after.clone(),
                        starts_with: spec.starts_with.clone(),
                        dependents: Vec::new(),
                        companions: Vec::new(),
                    },
                )
            })
            .collect();

        // Populate reverse edges in topological order so they are deterministic.
        for name in &order {
            let (deps, lead) = match nodes.get(name) {
                Some(node) => (node.deps.clone(), node.starts_with.clone()),
                None => continue,
            };
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
            if let Some(lead) = lead {
                if let Some(lead_node) = nodes.get_mut(&lead) {
                    lead_node.companions.push(name.clone());
                }
            }
        }

        let entries: Vec<&StageName> = order
            .iter()
            .filter(|name| {
                nodes
                    .get(*name)
                    .is_some_and(|n| n.deps.is_empty() && n.starts_with.is_none())
            })
            .collect();

        let entry = match entries.as_slice() {
            [single] => (*single).clone(),
            _ => {
                return Err(MigradagError::InvalidGraph(format!(
                    "workflow must have exactly one entry stage, found {} ({})",
                    entries.len(),
                    entries
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        };

        let graph = Self {
            nodes,
            order,
            entry,
        };

        if graph.terminals().is_empty() {
            return Err(MigradagError::InvalidGraph(
                "workflow has no terminal stage".to_string(),
            ));
        }

        Ok(graph)
    }

    /// All stage names in topological order.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// The single stage with no predecessors.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Stages with no successors of any kind, in topological order.
    pub fn terminals(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.nodes
                    .get(*name)
                    .is_some_and(|n| n.dependents.is_empty() && n.companions.is_empty())
            })
            .map(|s| s.as_str())
            .collect()
    }

    /// Stages that must complete before `name` may start.
    pub fn dependencies_of(&self, name: &str) -> &[StageName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Stage that `name` starts alongside, if any.
    pub fn starts_with_of(&self, name: &str) -> Option<&str> {
        self.nodes
            .get(name)
            .and_then(|n| n.starts_with.as_deref())
    }

    /// Stages that wait for `name` to complete.
    pub fn dependents_of(&self, name: &str) -> &[StageName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Stages that start alongside `name`.
    pub fn companions_of(&self, name: &str) -> &[StageName] {
        self.nodes
            .get(name)
            .map(|n| n.companions.as_slice())
            .unwrap_or(&[])
    }

    /// Every stage `name` transitively depends on (over both edge kinds),
    /// in topological order.
    pub fn ancestors_of(&self, name: &str) -> Vec<StageName> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![name];

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                for pred in node.deps.iter().chain(node.starts_with.iter()) {
                    if seen.insert(pred.as_str()) {
                        stack.push(pred.as_str());
                    }
                }
            }
        }

        self.order
            .iter()
            .filter(|s| seen.contains(s.as_str()))
            .cloned()
            .collect()
    }
}

fn validate_specs(specs: &[StageSpec]) -> Result<()> {
    if specs.is_empty() {
        return Err(MigradagError::InvalidGraph(
            "workflow must contain at least one stage".to_string(),
        ));
    }

    let name_re = Regex::new(r"^[a-z][a-z0-9_]*$").map_err(|e| MigradagError::Other(e.into()))?;
    let mut names: HashSet<&str> = HashSet::new();

    for spec in specs {
        if !name_re.is_match(&spec.name) {
            return Err(MigradagError::InvalidGraph(format!(
                "stage name '{}' must be lowercase snake_case",
                spec.name
            )));
        }
        if !names.insert(spec.name.as_str()) {
            return Err(MigradagError::InvalidGraph(format!(
                "stage '{}' is declared more than once",
                spec.name
            )));
        }
    }

    for spec in specs {
        for dep in spec.after.iter().chain(spec.starts_with.iter()) {
            if dep == &spec.name {
                return Err(MigradagError::InvalidGraph(format!(
                    "stage '{}' cannot depend on itself",
                    spec.name
                )));
            }
            if !names.contains(dep.as_str()) {
                return Err(MigradagError::StageNotFound(format!(
                    "'{}' (referenced by stage '{}')",
                    dep, spec.name
                )));
            }
        }
    }

    Ok(())
}

fn topological_order(specs: &[StageSpec]) -> Result<Vec<StageName>> {
    // Edge direction: predecessor -> stage.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for spec in specs {
        graph.add_node(spec.name.as_str());
    }

    for spec in specs {
        for dep in spec.after.iter().chain(spec.starts_with.iter()) {
            graph.add_edge(dep.as_str(), spec.name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(MigradagError::DagCycle(format!(
            "cycle detected in workflow involving stage '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> WorkflowGraph {
        WorkflowGraph::new(vec![
            StageSpec::new("a"),
            StageSpec::new("b").after("a"),
            StageSpec::new("c").starts_with("b"),
            StageSpec::new("d").after("b").after("c"),
        ])
        .unwrap()
    }

    #[test]
    fn reverse_edges_are_split_by_kind() {
        let g = diamond();
        assert_eq!(g.entry(), "a");
        assert_eq!(g.dependents_of("b"), ["d".to_string()]);
        assert_eq!(g.companions_of("b"), ["c".to_string()]);
        assert_eq!(g.starts_with_of("c"), Some("b"));
        assert_eq!(g.terminals(), vec!["d"]);
    }

    #[test]
    fn ancestors_follow_both_edge_kinds() {
        let g = diamond();
        assert_eq!(g.ancestors_of("c"), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(g.ancestors_of("d").len(), 3);
        assert!(g.ancestors_of("a").is_empty());
    }
}
