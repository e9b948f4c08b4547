use sha2::{Digest, Sha256};

use prova_ast::{AttrValue, Cmd, DeclId, DeclKind, Declaration, Expr, Program, Transfer};

/// Fills in a `checksum` attribute for every declaration that lacks one, derived
/// from the declaration's structure. Returns how many declarations were updated.
pub fn assign_structural_checksums(program: &mut Program) -> usize {
    let missing: Vec<(DeclId, String)> = program
        .iter()
        .filter(|(_, d)| d.checksum_source().is_none())
        .map(|(id, d)| (id, structural_fingerprint(program, d)))
        .collect();
    let updated = missing.len();
    for (id, fingerprint) in missing {
        if let Some(decl) = program.get(id) {
            let decl = decl.clone().with_checksum(fingerprint);
            program.replace(id, decl);
        }
    }
    updated
}

/// Hex digest of a canonical rendering of `decl`. References to other
/// declarations are rendered by name, so the fingerprint does not depend on
/// declaration order.
pub fn structural_fingerprint(program: &Program, decl: &Declaration) -> String {
    let mut fp = Fingerprint {
        program,
        hasher: Sha256::new(),
    };
    fp.token(decl.kind_name());
    fp.token(&decl.name);
    for attr in decl.attributes.iter().filter(|a| a.key != "checksum") {
        fp.token(&format!("attr:{}/{}", attr.key, attr.params.len()));
        for param in &attr.params {
            match param {
                AttrValue::Expr(e) => fp.expr(e),
                other => fp.token(&format!("{other:?}")),
            }
        }
    }
    match &decl.kind {
        DeclKind::Axiom(a) => fp.expr(&a.expr),
        DeclKind::Function(f) => {
            fp.token(&f.params.join(","));
            if let Some(body) = &f.body {
                fp.expr(body);
            }
        }
        DeclKind::Procedure(p) => {
            fp.token(&p.params.join(","));
            fp.token(&format!("requires/{}", p.requires.len()));
            p.requires.iter().for_each(|e| fp.expr(e));
            fp.token(&format!("ensures/{}", p.ensures.len()));
            p.ensures.iter().for_each(|e| fp.expr(e));
            fp.token(&p.modifies.join(","));
        }
        DeclKind::Implementation(imp) => {
            fp.token(&fp.name(imp.procedure));
            fp.token(&imp.params.join(","));
            fp.token(&imp.locals.join(","));
            for block in &imp.blocks {
                fp.token(&format!("block:{}/{}", block.label, block.cmds.len()));
                for cmd in &block.cmds {
                    fp.cmd(cmd);
                }
                match &block.transfer {
                    Transfer::Goto(targets) => fp.token(&format!("goto:{}", targets.join(","))),
                    Transfer::Return => fp.token("return"),
                }
            }
        }
        DeclKind::Constant(c) => fp.token(if c.unique { "unique" } else { "plain" }),
        DeclKind::GlobalVariable(_) | DeclKind::TypeDecl(_) => {}
    }
    hex::encode(fp.hasher.finalize())
}

struct Fingerprint<'p> {
    program: &'p Program,
    hasher: Sha256,
}

impl Fingerprint<'_> {
    fn token(&mut self, s: &str) {
        self.hasher.update(s.as_bytes());
        self.hasher.update([0u8]);
    }

    fn name(&self, id: DeclId) -> String {
        self.program
            .get(id)
            .map_or_else(|| id.to_string(), |d| d.name.clone())
    }

    fn cmd(&mut self, cmd: &Cmd) {
        let head = match cmd {
            Cmd::Assert { .. } => "assert".to_string(),
            Cmd::Assume { attributes, .. } => match cmd.where_variable() {
                Some(proxy) => format!("assume:where:{proxy}"),
                None => format!("assume/{}", attributes.iter().count()),
            },
            Cmd::Assign { lhs, .. } => format!("assign:{}", lhs.join(",")),
            Cmd::Havoc { vars } => format!("havoc:{}", vars.join(",")),
            Cmd::Call { procedure, outs, .. } => {
                format!("call:{}:{}", self.name(*procedure), outs.join(","))
            }
        };
        self.token(&head);
        for e in cmd.exprs() {
            self.expr(e);
        }
    }

    /// Pre-order rendering; every token carries its child count, so the
    /// sequence determines the tree.
    fn expr(&mut self, root: &Expr) {
        let mut children = Vec::new();
        root.walk(|e| {
            children.clear();
            e.push_children(&mut children);
            let arity = children.len();
            let token = match e {
                Expr::Literal(l) => format!("lit:{l:?}"),
                Expr::Var(v) => format!("var:{v}"),
                Expr::Const(c) => format!("const:{}", self.name(*c)),
                Expr::Call { function, .. } => format!("call:{}", self.name(*function)),
                Expr::Unary { op, .. } => format!("un:{op:?}"),
                Expr::Binary { op, .. } => format!("bin:{op:?}"),
                Expr::Builtin { op, .. } => format!("builtin:{op}"),
                Expr::Quantifier {
                    kind,
                    bound,
                    triggers,
                    ..
                } => {
                    let shape: Vec<String> =
                        triggers.iter().map(|t| t.exprs.len().to_string()).collect();
                    format!("q:{kind:?}:{}:{}", bound.join(","), shape.join(","))
                }
                Expr::Lambda { bound, .. } => format!("lambda:{}", bound.join(",")),
                Expr::Let { bindings, .. } => {
                    let names: Vec<&str> = bindings.iter().map(|(n, _)| n.as_str()).collect();
                    format!("let:{}", names.join(","))
                }
                Expr::Old(_) => "old".to_string(),
                Expr::BvExtract { start, end, .. } => format!("extract:{start}:{end}"),
                Expr::BvConcat { .. } => "concat".to_string(),
            };
            self.token(&format!("{token}/{arity}"));
        });
    }
}
