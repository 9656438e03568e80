//! Asset dependency graph and topological ordering

use crate::error::{CoreError, CoreResult};
use crate::newtype_string::AssetKey;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of asset dependencies
#[derive(Debug)]
pub struct AssetDag {
    /// Edges point from upstream to downstream
    graph: DiGraph<AssetKey, ()>,

    node_map: HashMap<AssetKey, NodeIndex>,
}

impl AssetDag {
    /// Create a new empty DAG
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add an asset to the DAG
    pub fn add_asset(&mut self, name: &str) -> CoreResult<NodeIndex> {
        if let Some(&idx) = self.node_map.get(name) {
            return Ok(idx);
        }
        let key = AssetKey::try_new(name).ok_or_else(|| CoreError::InvalidName {
            name: name.to_string(),
            context: "asset key in DAG".into(),
        })?;
        let idx = self.graph.add_node(key.clone());
        self.node_map.insert(key, idx);
        Ok(idx)
    }

    /// Record that `asset` reads the output of `upstream`
    pub fn add_dependency(&mut self, asset: &str, upstream: &str) -> CoreResult<()> {
        let asset_idx = self.add_asset(asset)?;
        let upstream_idx = self.add_asset(upstream)?;
        self.graph.add_edge(upstream_idx, asset_idx, ());
        Ok(())
    }

    /// Build the DAG from a map of asset key -> upstream asset keys
    ///
    /// Upstream keys that are not themselves assets in the map are rejected,
    /// since every stage input must be produced inside the pipeline.
    pub fn build(dependencies: &HashMap<String, Vec<String>>) -> CoreResult<Self> {
        let mut dag = Self::new();

        for asset in dependencies.keys() {
            dag.add_asset(asset)?;
        }

        for (asset, upstreams) in dependencies {
            for upstream in upstreams {
                if !dependencies.contains_key(upstream) {
                    return Err(CoreError::AssetNotFound {
                        name: upstream.clone(),
                    });
                }
                dag.add_dependency(asset, upstream)?;
            }
        }

        dag.validate()?;

        Ok(dag)
    }

    /// Validate the DAG has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        self.topological_order().map(|_| ())
    }

    /// Find a cycle path starting from a node for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Assets in topological order (upstream first)
    ///
    /// Ties are broken by key so the order is stable across runs.
    pub fn topological_order(&self) -> CoreResult<Vec<AssetKey>> {
        let order = toposort(&self.graph, None).map_err(|cycle| CoreError::CircularDependency {
            cycle: self.find_cycle_path(cycle.node_id()),
        })?;

        // Kahn-style stable ordering: repeatedly take the smallest ready key.
        let mut remaining: HashMap<NodeIndex, usize> = order
            .iter()
            .map(|&idx| {
                let indegree = self.graph.edges_directed(idx, Direction::Incoming).count();
                (idx, indegree)
            })
            .collect();
        let mut result = Vec::with_capacity(order.len());
        while !remaining.is_empty() {
            let next = remaining
                .iter()
                .filter(|(_, &deg)| deg == 0)
                .map(|(&idx, _)| idx)
                .min_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
            let Some(idx) = next else { break };
            remaining.remove(&idx);
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                if let Some(deg) = remaining.get_mut(&edge.target()) {
                    *deg = deg.saturating_sub(1);
                }
            }
            result.push(self.graph[idx].clone());
        }
        Ok(result)
    }

    /// Direct upstream assets of `asset`
    pub fn dependencies(&self, asset: &str) -> Vec<String> {
        self.neighbors(asset, Direction::Incoming)
    }

    /// Direct downstream assets of `asset`
    pub fn dependents(&self, asset: &str) -> Vec<String> {
        self.neighbors(asset, Direction::Outgoing)
    }

    fn neighbors(&self, asset: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.node_map.get(asset) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| match direction {
                Direction::Incoming => self.graph[e.source()].to_string(),
                Direction::Outgoing => self.graph[e.target()].to_string(),
            })
            .collect();
        names.sort();
        names
    }

    /// All transitive upstream assets of `asset`
    pub fn ancestors(&self, asset: &str) -> Vec<String> {
        self.collect_reachable(asset, Direction::Incoming)
    }

    /// All transitive downstream assets of `asset`
    pub fn descendants(&self, asset: &str) -> Vec<String> {
        self.collect_reachable(asset, Direction::Outgoing)
    }

    fn collect_reachable(&self, asset: &str, direction: Direction) -> Vec<String> {
        let Some(&start) = self.node_map.get(asset) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            for edge in self.graph.edges_directed(idx, direction) {
                let neighbor = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                if visited.insert(neighbor) {
                    result.push(self.graph[neighbor].to_string());
                    stack.push(neighbor);
                }
            }
        }
        result
    }

    /// Resolve a comma-separated selection into assets in topological order.
    ///
    /// Each token is an asset key, optionally prefixed with `+` (include
    /// upstream) and/or suffixed with `+` (include downstream). `None` or
    /// `*` selects every asset.
    pub fn select(&self, selection: Option<&str>) -> CoreResult<Vec<AssetKey>> {
        let order = self.topological_order()?;
        let Some(selection) = selection.map(str::trim).filter(|s| !s.is_empty() && *s != "*")
        else {
            return Ok(order);
        };

        let mut selected: HashSet<String> = HashSet::new();
        for token in selection.split(',').map(str::trim) {
            let (prefix, name, suffix) = Self::parse_selector(token);
            if name.is_empty() {
                return Err(CoreError::InvalidSelector {
                    selector: token.to_string(),
                    reason: "missing asset name".to_string(),
                });
            }
            if !self.contains(name) {
                return Err(CoreError::AssetNotFound {
                    name: name.to_string(),
                });
            }
            selected.insert(name.to_string());
            if prefix {
                selected.extend(self.ancestors(name));
            }
            if suffix {
                selected.extend(self.descendants(name));
            }
        }

        Ok(order
            .into_iter()
            .filter(|k| selected.contains(k.as_str()))
            .collect())
    }

    /// Parse a selector string into (has_prefix, asset_name, has_suffix)
    fn parse_selector(selector: &str) -> (bool, &str, bool) {
        let prefix = selector.starts_with('+');
        let suffix = selector.len() > 1 && selector.ends_with('+');
        let name = selector.trim_start_matches('+').trim_end_matches('+');
        (prefix, name, suffix)
    }

    /// Check if an asset exists in the DAG
    pub fn contains(&self, asset: &str) -> bool {
        self.node_map.contains_key(asset)
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Whether the DAG has no assets
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

impl Default for AssetDag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
