use std::collections::{HashMap, HashSet};

use prova_ast::{Block, DeclId, DeclKind, Program};
use rayon::prelude::*;
use tracing::debug;

use crate::dependencies::DependencyNode;
use crate::program::AnalyzedProgram;

/// Pairwise dependency edges between every axiom and function of a program.
#[derive(Debug)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    edges: Vec<Vec<usize>>,
    index: HashMap<DeclId, usize>,
}

impl DependencyGraph {
    pub fn build(program: &Program) -> Self {
        let mut nodes: Vec<DependencyNode> = program
            .axioms()
            .map(|id| DependencyNode::for_axiom(program, id))
            .collect();
        nodes.extend(program.functions().map(|id| DependencyNode::for_function(program, id)));

        // Quadratic in the number of nodes; each row is independent.
        let edges: Vec<Vec<usize>> = nodes
            .par_iter()
            .map(|from| {
                nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, to)| DependencyNode::depends(from, to))
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();

        let index = nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.declaration.map(|d| (d, i)))
            .collect();

        let graph = Self { nodes, edges, index };
        debug!(nodes = graph.len(), edges = graph.edge_count(), "built dependency graph");
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn node(&self, id: DeclId) -> Option<&DependencyNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Declarations that `id` has an edge to.
    pub fn successors(&self, id: DeclId) -> Vec<DeclId> {
        let Some(&i) = self.index.get(&id) else {
            return Vec::new();
        };
        self.edges[i]
            .iter()
            .filter_map(|&j| self.nodes[j].declaration)
            .collect()
    }

    /// Graph nodes `from` depends on.
    fn hooks(&self, from: &DependencyNode) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, to)| DependencyNode::depends(from, to))
            .map(|(i, _)| i)
            .collect()
    }

    fn reachable_from(&self, hooks: Vec<usize>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        let mut todo = hooks;
        while let Some(n) = todo.pop() {
            if !visited.insert(n) {
                continue;
            }
            todo.extend(self.edges[n].iter().filter(|j| !visited.contains(*j)));
        }
        visited
    }
}

/// Variables referenced by commands other than where-clause assumptions.
pub fn live_variables(blocks: &[Block]) -> HashSet<String> {
    blocks
        .iter()
        .flat_map(|b| b.cmds.iter())
        .filter(|c| c.where_variable().is_none())
        .flat_map(|c| c.variables())
        .map(str::to_string)
        .collect()
}

/// Drops where-clause assumptions unrelated to `live`, extending `live` with every
/// variable that becomes relevant through a kept assumption.
///
/// A where-assumption relates its proxy variable to every variable its body
/// mentions, in both directions. Assumptions whose proxy ends up live are kept.
pub fn trim_where_assumes(blocks: &mut [Block], live: &mut HashSet<String>) {
    let mut related: HashMap<String, HashSet<String>> = HashMap::new();
    for cmd in blocks.iter().flat_map(|b| b.cmds.iter()) {
        let Some(proxy) = cmd.where_variable() else {
            continue;
        };
        for var in cmd.variables() {
            if var == proxy {
                continue;
            }
            related
                .entry(proxy.to_string())
                .or_default()
                .insert(var.to_string());
            related
                .entry(var.to_string())
                .or_default()
                .insert(proxy.to_string());
        }
    }

    let mut todo: Vec<String> = live.iter().cloned().collect();
    while let Some(var) = todo.pop() {
        if let Some(next) = related.get(&var) {
            for v in next {
                if live.insert(v.clone()) {
                    todo.push(v.clone());
                }
            }
        }
    }

    for block in blocks.iter_mut() {
        block
            .cmds
            .retain(|c| c.where_variable().is_none_or(|proxy| live.contains(proxy)));
    }
}

/// Reduces a program to the declarations an implementation body can need.
#[derive(Clone, Copy, Debug)]
pub struct Pruner {
    enabled: bool,
}

impl Pruner {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Declarations to send to the solver for `blocks`, the body of `implementation`.
    /// The contract of the implemented procedure counts as part of the body.
    /// Where-clause assumptions that turn out irrelevant are removed from `blocks`
    /// in place.
    ///
    /// Returns every declaration when pruning is disabled, when no dependency
    /// graph is attached, or when no blocks are given.
    pub fn prune(
        &self,
        program: &AnalyzedProgram,
        implementation: DeclId,
        blocks: Option<&mut Vec<Block>>,
    ) -> Vec<DeclId> {
        let all = || -> Vec<DeclId> { program.program().ids().collect() };
        if !self.enabled {
            return all();
        }
        let (Some(graph), Some(blocks)) = (program.dependency_graph(), blocks) else {
            return all();
        };
        let decls = program.program();

        let mut body = DependencyNode::for_blocks(decls, blocks.as_slice());
        let mut live = live_variables(blocks.as_slice());
        let contract = decls
            .get(implementation)
            .and_then(|d| d.as_implementation())
            .and_then(|imp| decls.get(imp.procedure))
            .and_then(|d| d.as_procedure());
        for e in contract.into_iter().flat_map(|p| p.contract()) {
            body.add_references(decls, e);
            live.extend(e.variables().into_iter().map(str::to_string));
        }
        trim_where_assumes(blocks.as_mut_slice(), &mut live);
        for cmd in blocks.iter().flat_map(|b| b.cmds.iter()) {
            if cmd.where_variable().is_some() {
                for e in cmd.exprs() {
                    body.add_references(decls, e);
                }
            }
        }

        let hooks = graph.hooks(&body);
        let reachable = graph.reachable_from(hooks);

        let mut kept: HashSet<DeclId> = body.outgoing.clone();
        for &n in &reachable {
            let node = &graph.nodes[n];
            kept.extend(node.declaration);
            kept.extend(node.outgoing.iter().copied());
        }

        let result: Vec<DeclId> = decls
            .iter()
            .filter(|(id, d)| match d.kind {
                DeclKind::Axiom(_) | DeclKind::Function(_) => {
                    graph.index.get(id).is_some_and(|n| reachable.contains(n))
                }
                DeclKind::Constant(_) => kept.contains(id),
                _ => true,
            })
            .map(|(id, _)| id)
            .collect();
        debug!(
            kept = result.len(),
            total = decls.len(),
            reachable = reachable.len(),
            "pruned declarations"
        );
        result
    }
}
