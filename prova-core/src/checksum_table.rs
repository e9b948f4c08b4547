use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;

use prova_ast::{DeclId, Program};

use crate::call_dependencies::CallDependencies;
use crate::checksum::{Checksum, ChecksumCombiner, CombineOrder};

/// Memo of per-declaration checksums. Each slot is computed on first demand, at most once.
#[derive(Debug, Default)]
pub struct ChecksumTable {
    own: Vec<OnceLock<Option<Checksum>>>,
    dependency: Vec<OnceLock<Option<Checksum>>>,
}

impl ChecksumTable {
    pub fn new(len: usize) -> Self {
        Self {
            own: (0..len).map(|_| OnceLock::new()).collect(),
            dependency: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn checksum(&self, program: &Program, id: DeclId) -> Option<Checksum> {
        let slot = self.own.get(id.index())?;
        *slot.get_or_init(|| {
            program
                .get(id)
                .and_then(|d| d.checksum_source())
                .map(Checksum::digest)
        })
    }

    /// Own checksum combined with every procedure dependency and every transitive
    /// function dependency. Undefined as soon as any input is undefined.
    pub fn dependency_checksum(
        &self,
        program: &Program,
        deps: &CallDependencies,
        id: DeclId,
    ) -> Option<Checksum> {
        let slot = self.dependency.get(id.index())?;
        *slot.get_or_init(|| self.compute_dependency_checksum(program, deps, id))
    }

    fn compute_dependency_checksum(
        &self,
        program: &Program,
        deps: &CallDependencies,
        id: DeclId,
    ) -> Option<Checksum> {
        let mut acc = self.checksum(program, id)?;

        let mut queue: VecDeque<DeclId> = deps.functions(id).collect();
        for procedure in deps.procedures(id) {
            let sum = self.checksum(program, procedure)?;
            acc = ChecksumCombiner::combine(acc, sum, CombineOrder::Unordered);
            queue.extend(deps.functions(procedure));
        }

        let mut seen = HashSet::new();
        while let Some(function) = queue.pop_front() {
            if !seen.insert(function) {
                continue;
            }
            let sum = self.checksum(program, function)?;
            acc = ChecksumCombiner::combine(acc, sum, CombineOrder::Unordered);
            queue.extend(deps.functions(function));
        }
        Some(acc)
    }
}
