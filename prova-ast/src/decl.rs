use crate::attr::{Attribute, Attributes};
use crate::cmd::Block;
use crate::expr::Expr;
use crate::{DeclId, SourceLocation};

#[derive(Clone, Debug, PartialEq)]
pub struct Axiom {
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub params: Vec<String>,
    /// `None` for uninterpreted functions.
    pub body: Option<Expr>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constant {
    pub unique: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalVariable;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeDecl;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Procedure {
    pub params: Vec<String>,
    pub requires: Vec<Expr>,
    pub ensures: Vec<Expr>,
    pub modifies: Vec<String>,
}

impl Procedure {
    pub fn contract(&self) -> impl Iterator<Item = &Expr> {
        self.requires.iter().chain(self.ensures.iter())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Implementation {
    pub procedure: DeclId,
    pub params: Vec<String>,
    pub locals: Vec<String>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Axiom(Axiom),
    Function(Function),
    Constant(Constant),
    GlobalVariable(GlobalVariable),
    Procedure(Procedure),
    Implementation(Implementation),
    TypeDecl(TypeDecl),
}

/// Top-level declaration of a resolved program.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub location: SourceLocation,
    pub attributes: Attributes,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            location: SourceLocation::unknown(),
            attributes: Attributes::new(),
            kind,
        }
    }

    pub fn axiom(name: impl Into<String>, expr: Expr) -> Self {
        Self::new(name, DeclKind::Axiom(Axiom { expr }))
    }

    pub fn function(name: impl Into<String>, params: &[&str], body: Option<Expr>) -> Self {
        Self::new(
            name,
            DeclKind::Function(Function {
                params: params.iter().map(|p| p.to_string()).collect(),
                body,
            }),
        )
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::Constant(Constant::default()))
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::GlobalVariable(GlobalVariable))
    }

    pub fn type_decl(name: impl Into<String>) -> Self {
        Self::new(name, DeclKind::TypeDecl(TypeDecl))
    }

    pub fn procedure(name: impl Into<String>, procedure: Procedure) -> Self {
        Self::new(name, DeclKind::Procedure(procedure))
    }

    pub fn implementation(name: impl Into<String>, procedure: DeclId, blocks: Vec<Block>) -> Self {
        Self::new(
            name,
            DeclKind::Implementation(Implementation {
                procedure,
                params: Vec::new(),
                locals: Vec::new(),
                blocks,
            }),
        )
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.attributes.set(Attribute::string("checksum", checksum));
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            DeclKind::Axiom(_) => "axiom",
            DeclKind::Function(_) => "function",
            DeclKind::Constant(_) => "constant",
            DeclKind::GlobalVariable(_) => "variable",
            DeclKind::Procedure(_) => "procedure",
            DeclKind::Implementation(_) => "implementation",
            DeclKind::TypeDecl(_) => "type",
        }
    }

    /// Axioms, functions and constants; the only kinds pruning may drop.
    pub fn is_prunable(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Axiom(_) | DeclKind::Function(_) | DeclKind::Constant(_)
        )
    }

    pub fn as_axiom(&self) -> Option<&Axiom> {
        match &self.kind {
            DeclKind::Axiom(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_procedure(&self) -> Option<&Procedure> {
        match &self.kind {
            DeclKind::Procedure(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_implementation(&self) -> Option<&Implementation> {
        match &self.kind {
            DeclKind::Implementation(i) => Some(i),
            _ => None,
        }
    }

    pub fn excluded_from_dependencies(&self) -> bool {
        self.attributes.find_bool("exclude_dep").unwrap_or(false)
    }

    pub fn checksum_source(&self) -> Option<&str> {
        self.attributes.find_str("checksum")
    }

    pub fn priority(&self) -> i64 {
        self.attributes.find_int("priority").unwrap_or(1)
    }

    pub fn skip_verification(&self) -> bool {
        self.attributes.find_bool("verify") == Some(false)
    }

    /// Per-declaration time limit in seconds.
    pub fn time_limit(&self) -> Option<u64> {
        self.attributes
            .find_int("timeLimit")
            .and_then(|t| u64::try_from(t).ok())
    }

    pub fn msg_if_verifies(&self) -> Option<&str> {
        self.attributes.find_str("msg_if_verifies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_accessors_defaults() {
        let d = Declaration::implementation("Main", DeclId::new(0), Vec::new());
        assert_eq!(d.priority(), 1);
        assert!(!d.skip_verification());
        assert!(!d.excluded_from_dependencies());
        assert_eq!(d.checksum_source(), None);
        assert_eq!(d.time_limit(), None);
    }

    #[test]
    fn test_attribute_accessors_set() {
        let d = Declaration::implementation("Main", DeclId::new(0), Vec::new())
            .with_attribute(Attribute::int("priority", 7))
            .with_attribute(Attribute::boolean("verify", false))
            .with_attribute(Attribute::int("timeLimit", 30))
            .with_checksum("v1")
            .with_checksum("v2");
        assert_eq!(d.priority(), 7);
        assert!(d.skip_verification());
        assert_eq!(d.time_limit(), Some(30));
        assert_eq!(d.checksum_source(), Some("v2"));
    }

    #[test]
    fn test_prunable_kinds() {
        assert!(Declaration::constant("c").is_prunable());
        assert!(Declaration::axiom("ax", Expr::bool(true)).is_prunable());
        assert!(!Declaration::global("g").is_prunable());
        assert!(!Declaration::type_decl("T").is_prunable());
    }
}
