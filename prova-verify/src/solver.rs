#![forbid(unsafe_code)]

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use prova_ast::{Block, DeclId};
use prova_core::AnalyzedProgram;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::outcome::{Counterexample, Outcome};

/// Faults raised by a verifier. Only [`VerifierFault::SolverDied`] aborts the
/// batch; the others downgrade the affected implementation's outcome.
#[derive(Debug, Error, Diagnostic)]
pub enum VerifierFault {
    #[error("solver communication failed: {0}")]
    #[diagnostic(code(prova::solver::died))]
    SolverDied(String),

    #[error("unexpected prover output: {0}")]
    #[diagnostic(code(prova::solver::unexpected_output))]
    UnexpectedOutput(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(prova::solver::io))]
    Io(#[from] io::Error),

    #[error("{0}")]
    #[diagnostic(code(prova::vcgen))]
    VcGeneration(String),
}

impl VerifierFault {
    pub fn is_fatal(&self) -> bool {
        matches!(self, VerifierFault::SolverDied(_))
    }
}

/// Everything a verifier gets to see for one implementation.
#[derive(Clone, Debug)]
pub struct VerificationJob {
    pub request_id: String,
    pub program: Arc<AnalyzedProgram>,
    pub implementation: DeclId,
    pub name: String,
    /// The implementation body after where-clause trimming.
    pub blocks: Vec<Block>,
    /// Declarations left after pruning.
    pub declarations: Vec<DeclId>,
    /// Seconds; 0 means no limit.
    pub time_limit: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VerifierOutput {
    pub outcome: Outcome,
    pub counterexamples: Vec<Counterexample>,
    pub resource_count: u64,
    pub proof_obligations: u64,
}

impl VerifierOutput {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            counterexamples: Vec::new(),
            resource_count: 0,
            proof_obligations: 0,
        }
    }
}

/// VC generation plus solver checking for a single implementation.
///
/// Sessions are pooled by the engine; a session is used by one unit at a time.
#[async_trait]
pub trait ImplementationVerifier: Send + Sync + 'static {
    type Session: Send + 'static;

    fn open_session(&self) -> Result<Self::Session, VerifierFault>;

    /// Implementations should return promptly once `cancel` fires; the engine
    /// stops waiting either way.
    async fn verify(
        &self,
        session: &mut Self::Session,
        job: &VerificationJob,
        cancel: CancellationToken,
    ) -> Result<VerifierOutput, VerifierFault>;
}

/// Fallback verifier used when no solver backend is configured.
///
/// Every implementation comes back inconclusive.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSolverVerifier;

#[async_trait]
impl ImplementationVerifier for NoSolverVerifier {
    type Session = ();

    fn open_session(&self) -> Result<(), VerifierFault> {
        Ok(())
    }

    async fn verify(
        &self,
        _session: &mut (),
        job: &VerificationJob,
        _cancel: CancellationToken,
    ) -> Result<VerifierOutput, VerifierFault> {
        let mut output = VerifierOutput::new(Outcome::Inconclusive);
        output.proof_obligations = job
            .blocks
            .iter()
            .flat_map(|b| b.cmds.iter())
            .filter(|c| matches!(c, prova_ast::Cmd::Assert { .. }))
            .count() as u64;
        Ok(output)
    }
}
