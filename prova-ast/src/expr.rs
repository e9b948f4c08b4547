use crate::DeclId;

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    BitVector { value: u128, width: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Implies,
    Iff,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantifierKind {
    Forall,
    Exists,
}

/// One `{e1, e2, ...}` pattern of a quantifier; all expressions must match together.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub exprs: Vec<Expr>,
}

impl Trigger {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self { exprs }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Local, formal, bound or global variable, by name.
    Var(String),
    Const(DeclId),
    Call {
        function: DeclId,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Any other built-in operator (`if-then-else`, map select/store, ...).
    Builtin {
        op: String,
        args: Vec<Expr>,
    },
    Quantifier {
        kind: QuantifierKind,
        bound: Vec<String>,
        triggers: Vec<Trigger>,
        body: Box<Expr>,
    },
    Lambda {
        bound: Vec<String>,
        body: Box<Expr>,
    },
    Let {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
    },
    Old(Box<Expr>),
    BvExtract {
        bitvector: Box<Expr>,
        start: u32,
        end: u32,
    },
    BvConcat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn bool(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn int(n: i64) -> Self {
        Expr::Literal(Literal::Int(n))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn constant(id: DeclId) -> Self {
        Expr::Const(id)
    }

    pub fn call(function: DeclId, args: Vec<Expr>) -> Self {
        Expr::Call { function, args }
    }

    pub fn not(arg: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            arg: Box::new(arg),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::And, lhs, rhs)
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Or, lhs, rhs)
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Implies, lhs, rhs)
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn forall(bound: &[&str], triggers: Vec<Trigger>, body: Expr) -> Self {
        Self::quantifier(QuantifierKind::Forall, bound, triggers, body)
    }

    pub fn exists(bound: &[&str], triggers: Vec<Trigger>, body: Expr) -> Self {
        Self::quantifier(QuantifierKind::Exists, bound, triggers, body)
    }

    fn quantifier(kind: QuantifierKind, bound: &[&str], triggers: Vec<Trigger>, body: Expr) -> Self {
        Expr::Quantifier {
            kind,
            bound: bound.iter().map(|s| s.to_string()).collect(),
            triggers,
            body: Box::new(body),
        }
    }

    pub fn old(inner: Expr) -> Self {
        Expr::Old(Box::new(inner))
    }

    /// Pushes the direct subexpressions of `self` (trigger expressions included) onto `out`.
    pub fn push_children<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::Literal(_) | Expr::Var(_) | Expr::Const(_) => {}
            Expr::Call { args, .. } | Expr::Builtin { args, .. } => out.extend(args.iter()),
            Expr::Unary { arg, .. } => out.push(arg),
            Expr::Binary { lhs, rhs, .. } | Expr::BvConcat { lhs, rhs } => {
                out.push(lhs);
                out.push(rhs);
            }
            Expr::Quantifier { triggers, body, .. } => {
                for trigger in triggers {
                    out.extend(trigger.exprs.iter());
                }
                out.push(body);
            }
            Expr::Lambda { body, .. } => out.push(body),
            Expr::Let { bindings, body } => {
                out.extend(bindings.iter().map(|(_, rhs)| rhs));
                out.push(body);
            }
            Expr::Old(inner) => out.push(inner),
            Expr::BvExtract { bitvector, .. } => out.push(bitvector),
        }
    }

    /// Pre-order walk over `self` and all subexpressions, without native recursion.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(&'a Expr)) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            f(expr);
            expr.push_children(&mut stack);
        }
    }

    /// Names of free variables this expression mentions. Names bound by an enclosing
    /// quantifier, lambda or let are skipped.
    pub fn variables(&self) -> Vec<&str> {
        // Each scope records its parent and the names it binds.
        let mut scopes: Vec<(Option<usize>, Vec<&str>)> = Vec::new();
        fn is_bound(scopes: &[(Option<usize>, Vec<&str>)], mut scope: Option<usize>, name: &str) -> bool {
            while let Some(i) = scope {
                if scopes[i].1.iter().any(|b| *b == name) {
                    return true;
                }
                scope = scopes[i].0;
            }
            false
        }

        let mut vars = Vec::new();
        let mut children = Vec::new();
        let mut stack: Vec<(&Expr, Option<usize>)> = vec![(self, None)];
        while let Some((expr, scope)) = stack.pop() {
            let inner = match expr {
                Expr::Var(name) => {
                    if !is_bound(&scopes, scope, name) {
                        vars.push(name.as_str());
                    }
                    continue;
                }
                Expr::Quantifier { bound, .. } | Expr::Lambda { bound, .. } => {
                    scopes.push((scope, bound.iter().map(String::as_str).collect()));
                    Some(scopes.len() - 1)
                }
                Expr::Let { bindings, body } => {
                    // Right-hand sides are evaluated outside the new bindings.
                    stack.extend(bindings.iter().map(|(_, rhs)| (rhs, scope)));
                    scopes.push((scope, bindings.iter().map(|(n, _)| n.as_str()).collect()));
                    stack.push((body, Some(scopes.len() - 1)));
                    continue;
                }
                _ => scope,
            };
            children.clear();
            expr.push_children(&mut children);
            stack.extend(children.drain(..).map(|c| (c, inner)));
        }
        vars
    }
}
