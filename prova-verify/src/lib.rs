#![forbid(unsafe_code)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod options;
pub mod outcome;
pub mod output;
pub mod pool;
pub mod report;
pub mod solver;
pub mod stats;
pub mod telemetry;

pub use cache::{CachePriority, ImplementationFingerprint, VerificationResultCache};
pub use engine::{BatchReport, EngineBuilder, ExecutionEngine, PipelineOutcome, UnitRun};
pub use error::EngineError;
pub use options::{CacheMode, ConfigError, ExecutionOptions, RoutineFilter};
pub use outcome::{Counterexample, CounterexampleKind, Outcome, TraceStep, VerificationResult};
pub use output::{CapturedOutput, OutputCollector, SharedSink};
pub use report::{CollectingReporter, ErrorInformation, ErrorKind, ErrorReporter};
pub use solver::{
    ImplementationVerifier, NoSolverVerifier, VerificationJob, VerifierFault, VerifierOutput,
};
pub use stats::{PipelineStatistics, StatisticsSnapshot};
