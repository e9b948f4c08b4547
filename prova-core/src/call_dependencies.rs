use std::collections::BTreeSet;

use prova_ast::{DeclId, DeclKind, Expr, Program};

/// Functions referenced and procedures called by one declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclDependencies {
    pub functions: BTreeSet<DeclId>,
    pub procedures: BTreeSet<DeclId>,
}

impl DeclDependencies {
    fn collect_functions(&mut self, expr: &Expr) {
        expr.walk(|e| {
            if let Expr::Call { function, .. } = e {
                self.functions.insert(*function);
            }
        });
    }
}

/// Result of the call-dependency collection pass over a whole program.
#[derive(Clone, Debug, Default)]
pub struct CallDependencies {
    per_decl: Vec<DeclDependencies>,
}

impl CallDependencies {
    pub fn collect(program: &Program) -> Self {
        let per_decl = program
            .iter()
            .map(|(_, decl)| {
                let mut deps = DeclDependencies::default();
                match &decl.kind {
                    DeclKind::Function(f) => {
                        if let Some(body) = &f.body {
                            deps.collect_functions(body);
                        }
                    }
                    DeclKind::Axiom(a) => deps.collect_functions(&a.expr),
                    DeclKind::Procedure(p) => {
                        for e in p.contract() {
                            deps.collect_functions(e);
                        }
                    }
                    DeclKind::Implementation(imp) => {
                        deps.procedures.insert(imp.procedure);
                        for cmd in imp.blocks.iter().flat_map(|b| b.cmds.iter()) {
                            if let prova_ast::Cmd::Call { procedure, .. } = cmd {
                                deps.procedures.insert(*procedure);
                            }
                            for e in cmd.exprs() {
                                deps.collect_functions(e);
                            }
                        }
                    }
                    DeclKind::Constant(_) | DeclKind::GlobalVariable(_) | DeclKind::TypeDecl(_) => {}
                }
                deps
            })
            .collect();
        Self { per_decl }
    }

    pub fn get(&self, id: DeclId) -> Option<&DeclDependencies> {
        self.per_decl.get(id.index())
    }

    pub fn functions(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.get(id).into_iter().flat_map(|d| d.functions.iter().copied())
    }

    pub fn procedures(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.get(id).into_iter().flat_map(|d| d.procedures.iter().copied())
    }
}
