//! Endpoint multigraph and single-stroke (Eulerian path) feasibility.
//!
//! Nodes are quantized curve endpoints, every curve is one edge between its
//! first and last point. Self-loops count twice towards their node's degree
//! and parallel edges are kept, since both occur in real kolam strokes.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ConnectivityConfig;
use crate::curves::Curve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EulerKind {
    /// Connected, every degree even: the stroke can close on itself.
    Circuit,
    /// Connected, exactly two odd nodes: an open stroke between them.
    OpenPath,
    /// Disconnected or more than two odd nodes.
    NotTraversable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub self_loops: usize,
    pub components: usize,
    pub odd_degree_nodes: usize,
    pub connected: bool,
    pub euler: EulerKind,
}

impl ConnectivityReport {
    /// Whether the curve set can be drawn as one connected Eulerian trail.
    pub fn is_valid(&self) -> bool {
        self.connected && self.odd_degree_nodes <= 2
    }
}

/// Disjoint-set forest with path halving and union by size.
#[derive(Debug, Clone)]
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    sets: usize,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            sets: n,
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        self.sets -= 1;
    }
}

fn quantize(p: (i32, i32), quantum: u32) -> (i32, i32) {
    let q = quantum.max(1) as i32;
    if q == 1 {
        return p;
    }
    ((p.0 + q / 2).div_euclid(q), (p.1 + q / 2).div_euclid(q))
}

/// Build the endpoint graph and summarise its connectivity and degree parity.
pub fn analyze_connectivity(curves: &[Curve], config: &ConnectivityConfig) -> ConnectivityReport {
    let mut index: BTreeMap<(i32, i32), usize> = BTreeMap::new();
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(curves.len());

    for curve in curves.iter().filter(|c| c.len() >= 2) {
        let mut node = |p: (i32, i32)| {
            let key = quantize(p, config.endpoint_quantum);
            let next = index.len();
            *index.entry(key).or_insert(next)
        };
        let a = node(curve.start());
        let b = node(curve.end());
        edges.push((a, b));
    }

    let n = index.len();
    let mut degree = vec![0usize; n];
    let mut uf = UnionFind::new(n);
    let mut self_loops = 0;
    for &(a, b) in &edges {
        degree[a] += 1;
        degree[b] += 1;
        if a == b {
            self_loops += 1;
        }
        uf.union(a, b);
    }

    let odd_degree_nodes = degree.iter().filter(|&&d| d % 2 == 1).count();
    let components = uf.sets;
    let connected = !edges.is_empty() && components == 1;
    let euler = match (connected, odd_degree_nodes) {
        (true, 0) => EulerKind::Circuit,
        (true, 2) => EulerKind::OpenPath,
        _ => EulerKind::NotTraversable,
    };

    debug!(
        "analyze_connectivity: {} nodes, {} edges, {} components, {} odd",
        n,
        edges.len(),
        components,
        odd_degree_nodes
    );

    ConnectivityReport {
        node_count: n,
        edge_count: edges.len(),
        self_loops,
        components,
        odd_degree_nodes,
        connected,
        euler,
    }
}

/// Boolean form used by the analysis record.
pub fn validate_connectivity(curves: &[Curve], config: &ConnectivityConfig) -> bool {
    analyze_connectivity(curves, config).is_valid()
}
