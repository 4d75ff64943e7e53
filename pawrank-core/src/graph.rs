/// Small directed graph over internal `usize` indices.
///
/// Only the handful of operations the ranking methods need: edge locking with
/// a reachability-based cycle guard, cycle detection, and topological
/// wavefront extraction (Kahn's algorithm, one layer at a time).
use std::collections::BTreeSet;

use crate::error::{RankError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DiGraph {
    succ: Vec<BTreeSet<usize>>,
    pred: Vec<BTreeSet<usize>>,
}

impl DiGraph {
    pub fn with_nodes(num_nodes: usize) -> Self {
        DiGraph {
            succ: vec![BTreeSet::new(); num_nodes],
            pred: vec![BTreeSet::new(); num_nodes],
        }
    }

    pub fn node_count(&self) -> usize {
        self.succ.len()
    }

    pub fn edge_count(&self) -> usize {
        self.succ.iter().map(BTreeSet::len).sum()
    }

    /// Insert `from -> to`. Returns false if the edge was already present.
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        let inserted = self.succ[from].insert(to);
        self.pred[to].insert(from);
        inserted
    }

    #[cfg(test)]
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.succ[from].contains(&to)
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.pred[node].len()
    }

    /// Depth-first reachability: is there a directed path `from ~> to`?
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut seen = vec![false; self.node_count()];
        let mut stack = vec![from];
        seen[from] = true;
        while let Some(node) = stack.pop() {
            for &next in &self.succ[node] {
                if next == to {
                    return true;
                }
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        false
    }

    /// Add `from -> to` unless it would close a cycle.
    ///
    /// The graph must be acyclic on entry; it stays acyclic on exit. Returns
    /// whether the edge was locked in.
    pub fn lock_edge(&mut self, from: usize, to: usize) -> bool {
        if self.reaches(to, from) {
            return false;
        }
        self.add_edge(from, to);
        true
    }

    /// Find one directed cycle, returned as the nodes along it in edge order.
    /// A self-loop comes back as a single node.
    pub fn find_cycle(&self) -> Option<Vec<usize>> {
        let n = self.node_count();
        let mut color = vec![Color::White; n];
        let mut parent = vec![usize::MAX; n];

        for start in 0..n {
            if color[start] != Color::White {
                continue;
            }
            color[start] = Color::Gray;
            let mut stack = vec![(start, self.succ[start].iter())];

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                match top.1.next().copied() {
                    Some(next) => match color[next] {
                        Color::White => {
                            color[next] = Color::Gray;
                            parent[next] = node;
                            stack.push((next, self.succ[next].iter()));
                        }
                        Color::Gray => {
                            // Back edge node -> next: walk parents from node up to next.
                            let mut cycle = vec![node];
                            let mut cur = node;
                            while cur != next {
                                cur = parent[cur];
                                cycle.push(cur);
                            }
                            cycle.reverse();
                            return Some(cycle);
                        }
                        Color::Black => {}
                    },
                    None => {
                        color[node] = Color::Black;
                        stack.pop();
                    }
                }
            }
        }
        None
    }

    #[cfg(test)]
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Topological layers: each wavefront is the set of remaining nodes with
    /// no incoming edge from a remaining node, in ascending index order.
    ///
    /// Fails with `DegenerateGraph` if a cycle leaves nodes that never reach
    /// in-degree zero.
    pub fn wavefronts(&self) -> Result<Vec<Vec<usize>>> {
        let n = self.node_count();
        let mut in_degree: Vec<usize> = (0..n).map(|v| self.in_degree(v)).collect();
        let mut current: Vec<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
        let mut waves = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            placed += current.len();
            let mut next = Vec::new();
            for &node in &current {
                for &succ in &self.succ[node] {
                    in_degree[succ] -= 1;
                    if in_degree[succ] == 0 {
                        next.push(succ);
                    }
                }
            }
            next.sort_unstable();
            waves.push(current);
            current = next;
        }

        if placed != n {
            return Err(RankError::DegenerateGraph(format!(
                "{} of {} nodes sit on a cycle and have no topological position",
                n - placed,
                n
            )));
        }
        Ok(waves)
    }
}
