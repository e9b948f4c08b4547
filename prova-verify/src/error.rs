#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use prova_core::ProgramError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("engine error: {message}")]
#[diagnostic(code(prova::engine))]
#[allow(unused_assignments)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::new(e.to_string())
    }
}

impl From<ProgramError> for EngineError {
    fn from(e: ProgramError) -> Self {
        EngineError::new(e.message)
    }
}
