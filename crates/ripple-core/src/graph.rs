//! File-level dependency graph with a derived reverse index

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

/// Directed "A depends on B" relation between file keys.
///
/// Only the forward map is persisted; the reverse map is rebuilt whenever a
/// graph is deserialized so `B ∈ forward[A]` iff `A ∈ reverse[B]` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct DependencyGraph {
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` depends on `to`. Self-edges are rejected.
    /// Returns true if the edge was new.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let inserted = self
            .forward
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        if inserted {
            self.reverse
                .entry(to.to_string())
                .or_default()
                .insert(from.to_string());
        }
        inserted
    }

    /// Replace the outgoing edges of `file`.
    pub fn set_dependencies<I, S>(&mut self, file: &str, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clear_outgoing(file);
        self.forward.entry(file.to_string()).or_default();
        for dep in deps {
            self.add_edge(file, dep.as_ref());
        }
    }

    /// Drop a file entirely: its outgoing edges and every edge pointing at it.
    pub fn remove_file(&mut self, file: &str) {
        self.clear_outgoing(file);
        self.forward.remove(file);
        if let Some(dependents) = self.reverse.remove(file) {
            for dependent in dependents {
                if let Some(targets) = self.forward.get_mut(&dependent) {
                    targets.remove(file);
                }
            }
        }
    }

    fn clear_outgoing(&mut self, file: &str) {
        let Some(targets) = self.forward.get_mut(file) else {
            return;
        };
        for target in std::mem::take(targets) {
            if let Some(sources) = self.reverse.get_mut(&target) {
                sources.remove(file);
                if sources.is_empty() {
                    self.reverse.remove(&target);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    /// Files `file` depends on, sorted.
    pub fn dependencies(&self, file: &str) -> Vec<String> {
        self.forward
            .get(file)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Files that depend on `file`, sorted.
    pub fn dependents(&self, file: &str) -> Vec<String> {
        self.reverse
            .get(file)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn depends_on(&self, from: &str, to: &str) -> bool {
        self.forward.get(from).is_some_and(|s| s.contains(to))
    }

    pub fn contains(&self, file: &str) -> bool {
        self.forward.contains_key(file) || self.reverse.contains_key(file)
    }

    /// Every file that appears as a source or target.
    pub fn files(&self) -> BTreeSet<&str> {
        self.forward
            .keys()
            .chain(self.reverse.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Iterate `(from, to)` pairs in sorted order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    /// Files reaching `file` through the reverse map within `max_depth` hops,
    /// excluding `file` itself. Ordered by distance, then name.
    pub fn transitive_dependents(&self, file: &str, max_depth: usize) -> Vec<(String, usize)> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        seen.insert(file);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((file, 0));
        let mut out = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let Some(sources) = self.reverse.get(current) else {
                continue;
            };
            for source in sources {
                if seen.insert(source.as_str()) {
                    out.push((source.clone(), depth + 1));
                    queue.push_back((source.as_str(), depth + 1));
                }
            }
        }
        out
    }

    /// Dependency cycles: strongly connected components with more than one
    /// file, each sorted, the list sorted by first member.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for file in self.files() {
            index.insert(file, graph.add_node(file));
        }
        for (from, to) in self.edges() {
            if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
                graph.add_edge(a, b, ());
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut names: Vec<String> =
                    component.iter().map(|&n| graph[n].to_string()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// True when the reverse map is exactly the transpose of the forward map.
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self
            .edges()
            .all(|(from, to)| self.reverse.get(to).is_some_and(|s| s.contains(from)));
        let reverse_ok = self.reverse.iter().all(|(to, froms)| {
            froms
                .iter()
                .all(|from| self.forward.get(from).is_some_and(|s| s.contains(to)))
        });
        forward_ok && reverse_ok
    }
}

impl From<BTreeMap<String, Vec<String>>> for DependencyGraph {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let mut graph = DependencyGraph::new();
        for (file, deps) in map {
            graph.set_dependencies(&file, deps);
        }
        graph
    }
}

impl From<DependencyGraph> for BTreeMap<String, Vec<String>> {
    fn from(graph: DependencyGraph) -> Self {
        graph
            .forward
            .into_iter()
            .map(|(file, deps)| (file, deps.into_iter().collect()))
            .collect()
    }
}
