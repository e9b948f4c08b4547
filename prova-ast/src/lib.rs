#![forbid(unsafe_code)]

mod attr;
mod cmd;
mod decl;
mod expr;
mod program;

use std::fmt;
use std::sync::Arc;

use miette::SourceSpan;

pub use attr::{AttrValue, Attribute, Attributes};
pub use cmd::{Block, Cmd, Transfer};
pub use decl::{
    Axiom, Constant, DeclKind, Declaration, Function, GlobalVariable, Implementation, Procedure,
    TypeDecl,
};
pub use expr::{BinaryOp, Expr, Literal, QuantifierKind, Trigger, UnaryOp};
pub use program::Program;

pub type Span = SourceSpan;

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

/// Stable handle of a declaration inside a [`Program`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(u32);

impl DeclId {
    pub fn new(index: usize) -> Self {
        DeclId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a construct in its source file, used for error reports.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    pub span: Option<(usize, usize)>,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some((span.offset(), span.len()));
        self
    }

    pub fn span(&self) -> Option<Span> {
        self.span.map(|(start, len)| span(start, len))
    }

    /// Location used for synthesized declarations that have no source.
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.file, self.line, self.column)
    }
}
