use std::sync::OnceLock;

use prova_ast::{DeclId, Declaration, Program};
use tracing::debug;

use crate::call_dependencies::CallDependencies;
use crate::checksum::Checksum;
use crate::checksum_table::ChecksumTable;
use crate::error::ProgramError;
use crate::prune::DependencyGraph;

/// A resolved program together with everything derived from it: call
/// dependencies, memoized checksums and the dependency graph.
///
/// Derived data is computed on first demand and dropped whenever a declaration
/// is added or replaced.
#[derive(Debug)]
pub struct AnalyzedProgram {
    program: Program,
    call_dependencies: OnceLock<CallDependencies>,
    checksums: ChecksumTable,
    graph: OnceLock<DependencyGraph>,
}

impl AnalyzedProgram {
    pub fn new(program: Program) -> Self {
        let checksums = ChecksumTable::new(program.len());
        Self {
            program,
            call_dependencies: OnceLock::new(),
            checksums,
            graph: OnceLock::new(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    pub fn declaration(&self, id: DeclId) -> Result<&Declaration, ProgramError> {
        self.program
            .get(id)
            .ok_or_else(|| ProgramError::new(format!("unknown declaration {id}")))
    }

    pub fn call_dependencies(&self) -> &CallDependencies {
        self.call_dependencies
            .get_or_init(|| CallDependencies::collect(&self.program))
    }

    /// Checksum of the declaration itself; `None` when the front end supplied none.
    pub fn checksum(&self, id: DeclId) -> Option<Checksum> {
        self.checksums.checksum(&self.program, id)
    }

    /// Checksum over the declaration and everything it transitively calls.
    pub fn dependency_checksum(&self, id: DeclId) -> Option<Checksum> {
        self.checksums
            .dependency_checksum(&self.program, self.call_dependencies(), id)
    }

    pub fn add_declaration(&mut self, decl: Declaration) -> DeclId {
        let id = self.program.push(decl);
        self.invalidate();
        id
    }

    pub fn replace_declaration(
        &mut self,
        id: DeclId,
        decl: Declaration,
    ) -> Result<Declaration, ProgramError> {
        let old = self
            .program
            .replace(id, decl)
            .ok_or_else(|| ProgramError::new(format!("cannot replace unknown declaration {id}")))?;
        self.invalidate();
        Ok(old)
    }

    /// The attached dependency graph, building it first if needed.
    pub fn ensure_dependency_graph(&self) -> &DependencyGraph {
        self.graph
            .get_or_init(|| DependencyGraph::build(&self.program))
    }

    /// Attaches a graph computed elsewhere for this exact program snapshot.
    pub fn attach_dependency_graph(&self, graph: DependencyGraph) -> Result<(), ProgramError> {
        let expected = self.program.axioms().count() + self.program.functions().count();
        if graph.len() != expected {
            return Err(ProgramError::new(format!(
                "dependency graph has {} nodes, program has {expected} axioms and functions",
                graph.len()
            )));
        }
        self.graph
            .set(graph)
            .map_err(|_| ProgramError::new("a dependency graph is already attached"))
    }

    pub fn dependency_graph(&self) -> Option<&DependencyGraph> {
        self.graph.get()
    }

    fn invalidate(&mut self) {
        if self.graph.take().is_some() {
            debug!("dropped dependency graph after program change");
        }
        self.call_dependencies = OnceLock::new();
        self.checksums = ChecksumTable::new(self.program.len());
    }
}

impl From<Program> for AnalyzedProgram {
    fn from(program: Program) -> Self {
        Self::new(program)
    }
}
