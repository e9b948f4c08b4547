#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use prova_ast::Span;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("program error: {message}")]
#[diagnostic(code(prova::program))]
#[allow(unused_assignments)]
pub struct ProgramError {
    pub message: String,
    #[label]
    pub span: Option<Span>,
}

impl ProgramError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}
