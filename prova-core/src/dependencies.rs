use std::collections::HashSet;

use prova_ast::{BinaryOp, Block, Cmd, DeclId, Expr, Program, QuantifierKind, UnaryOp};

use crate::set_of_sets::SetOfSets;

/// Position of a subexpression relative to the top of an axiom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Pos,
    Neg,
    Neither,
}

impl Polarity {
    pub fn negate(self) -> Self {
        match self {
            Polarity::Pos => Polarity::Neg,
            Polarity::Neg => Polarity::Pos,
            Polarity::Neither => Polarity::Neither,
        }
    }
}

/// Incoming and outgoing dependencies of one axiom, function, or implementation body.
///
/// `outgoing` holds the constants and functions the node mentions. `incoming` holds
/// the sets of declarations that, once all mentioned by some other node, make this
/// node relevant to it. An implementation body has no incoming sets.
#[derive(Clone, Debug, Default)]
pub struct DependencyNode {
    pub declaration: Option<DeclId>,
    pub outgoing: HashSet<DeclId>,
    pub incoming: SetOfSets<DeclId>,
}

impl DependencyNode {
    /// True iff there is an edge `from -> to`.
    pub fn depends(from: &DependencyNode, to: &DependencyNode) -> bool {
        to.incoming.contains_subset_of(&from.outgoing)
    }

    pub fn for_axiom(program: &Program, id: DeclId) -> Self {
        let mut builder = NodeBuilder::new(program, Some(id));
        if let Some(axiom) = program.get(id).and_then(|d| d.as_axiom()) {
            builder.visit_axiom_expr(&axiom.expr);
        }
        builder.finish()
    }

    pub fn for_function(program: &Program, id: DeclId) -> Self {
        let mut builder = NodeBuilder::new(program, Some(id));
        builder.add_incoming(id);
        if let Some(body) = program.get(id).and_then(|d| d.as_function()).and_then(|f| f.body.as_ref()) {
            builder.add_references(body);
        }
        builder.finish()
    }

    /// Node for an implementation body. Where-clause assumptions are left out; see
    /// [`DependencyNode::add_references`]. Contracts of called procedures count as
    /// references of the call site.
    pub fn for_blocks(program: &Program, blocks: &[Block]) -> Self {
        let mut builder = NodeBuilder::new(program, None);
        for cmd in blocks.iter().flat_map(|b| b.cmds.iter()) {
            if cmd.where_variable().is_some() {
                continue;
            }
            for e in cmd.exprs() {
                builder.add_references(e);
            }
            if let Cmd::Call { procedure, .. } = cmd {
                if let Some(callee) = program.get(*procedure).and_then(|d| d.as_procedure()) {
                    for e in callee.contract() {
                        builder.add_references(e);
                    }
                }
            }
        }
        builder.finish()
    }

    /// Adds every constant and function mentioned in `expr` to `outgoing`.
    pub fn add_references(&mut self, program: &Program, expr: &Expr) {
        let mut builder = NodeBuilder::new(program, self.declaration);
        builder.add_references(expr);
        self.outgoing.extend(builder.outgoing);
    }
}

struct NodeBuilder<'p> {
    program: &'p Program,
    owner: Option<DeclId>,
    outgoing: HashSet<DeclId>,
    incoming: SetOfSets<DeclId>,
}

impl<'p> NodeBuilder<'p> {
    fn new(program: &'p Program, owner: Option<DeclId>) -> Self {
        Self {
            program,
            owner,
            outgoing: HashSet::new(),
            incoming: SetOfSets::new(),
        }
    }

    fn finish(self) -> DependencyNode {
        DependencyNode {
            declaration: self.owner,
            outgoing: self.outgoing,
            incoming: self.incoming,
        }
    }

    fn excluded(&self, id: DeclId) -> bool {
        self.program
            .get(id)
            .is_some_and(|d| d.excluded_from_dependencies())
    }

    fn add_incoming(&mut self, id: DeclId) {
        if Some(id) == self.owner || !self.excluded(id) {
            self.incoming.add_singleton(id);
        }
    }

    fn add_outgoing(&mut self, id: DeclId) {
        if !self.excluded(id) {
            self.outgoing.insert(id);
        }
    }

    /// Constants and functions anywhere in `expr`, trigger expressions included.
    fn add_references(&mut self, expr: &Expr) {
        expr.walk(|e| match e {
            Expr::Const(c) => self.add_outgoing(*c),
            Expr::Call { function, .. } => self.add_outgoing(*function),
            _ => {}
        });
    }

    fn trigger_requirement(&self, exprs: &[Expr]) -> Vec<DeclId> {
        let mut set = HashSet::new();
        for e in exprs {
            e.walk(|sub| {
                let id = match sub {
                    Expr::Const(c) => *c,
                    Expr::Call { function, .. } => *function,
                    _ => return,
                };
                if !self.excluded(id) {
                    set.insert(id);
                }
            });
        }
        set.into_iter().collect()
    }

    fn visit_axiom_expr(&mut self, root: &Expr) {
        // (expression, polarity, whether its incoming sets are kept)
        let mut stack: Vec<(&Expr, Polarity, bool)> = vec![(root, Polarity::Pos, true)];
        while let Some((expr, polarity, keep)) = stack.pop() {
            match expr {
                Expr::Literal(_) | Expr::Var(_) => {}
                Expr::Const(c) => {
                    if keep {
                        self.add_incoming(*c);
                    }
                    self.add_outgoing(*c);
                }
                Expr::Call { function, args } => {
                    if keep {
                        self.add_incoming(*function);
                    }
                    self.add_outgoing(*function);
                    stack.extend(args.iter().map(|a| (a, Polarity::Neither, keep)));
                }
                Expr::Unary { op: UnaryOp::Not | UnaryOp::Neg, arg } => {
                    stack.push((arg, polarity.negate(), keep));
                }
                Expr::Binary { op, lhs, rhs } => {
                    let (l, r) = match op {
                        BinaryOp::And | BinaryOp::Or => (polarity, polarity),
                        BinaryOp::Implies => (polarity.negate(), polarity),
                        _ => (Polarity::Neither, Polarity::Neither),
                    };
                    stack.push((lhs, l, keep));
                    stack.push((rhs, r, keep));
                }
                Expr::Builtin { args, .. } => {
                    stack.extend(args.iter().map(|a| (a, Polarity::Neither, keep)));
                }
                Expr::Quantifier {
                    kind,
                    triggers,
                    body,
                    ..
                } => {
                    for trigger in triggers {
                        let requirement = self.trigger_requirement(&trigger.exprs);
                        if keep {
                            self.incoming.add(requirement);
                        }
                    }
                    let discard_body = match kind {
                        QuantifierKind::Forall => polarity == Polarity::Pos && !triggers.is_empty(),
                        QuantifierKind::Exists => polarity == Polarity::Neg,
                    };
                    stack.push((body, Polarity::Neither, keep && !discard_body));
                }
                Expr::Lambda { body, .. } => stack.push((body, Polarity::Neither, keep)),
                Expr::Let { bindings, body } => {
                    stack.extend(bindings.iter().map(|(_, rhs)| (rhs, Polarity::Neither, keep)));
                    stack.push((body, Polarity::Neither, keep));
                }
                Expr::Old(inner) => stack.push((inner, Polarity::Neither, keep)),
                Expr::BvExtract { bitvector, .. } => stack.push((bitvector, Polarity::Neither, keep)),
                Expr::BvConcat { lhs, rhs } => {
                    stack.push((lhs, Polarity::Neither, keep));
                    stack.push((rhs, Polarity::Neither, keep));
                }
            }
        }
    }
}
