use std::fmt;
use std::time::{Duration, SystemTime};

use prova_ast::SourceLocation;
use prova_core::Checksum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Correct,
    Errors,
    TimedOut,
    OutOfResource,
    OutOfMemory,
    Inconclusive,
    SolverException,
    ReachedBound,
}

impl Outcome {
    /// Word printed after an implementation's name in trace output.
    pub fn indication(self, error_count: usize) -> &'static str {
        match self {
            Outcome::Correct | Outcome::ReachedBound => "verified",
            Outcome::Errors if error_count == 1 => "error",
            Outcome::Errors => "errors",
            Outcome::TimedOut => "timed out",
            Outcome::OutOfResource => "out of resource",
            Outcome::OutOfMemory => "out of memory",
            Outcome::Inconclusive => "inconclusive",
            Outcome::SolverException => "solver exception",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Correct => "correct",
            Outcome::Errors => "errors",
            Outcome::TimedOut => "timed_out",
            Outcome::OutOfResource => "out_of_resource",
            Outcome::OutOfMemory => "out_of_memory",
            Outcome::Inconclusive => "inconclusive",
            Outcome::SolverException => "solver_exception",
            Outcome::ReachedBound => "reached_bound",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CounterexampleKind {
    Assertion,
    /// Failing call; `requires` is the precondition that might not hold.
    Precondition { requires: SourceLocation },
    /// Failing return; `ensures` is the postcondition that might not hold.
    Postcondition { ensures: SourceLocation },
    LoopInvariantEntry,
    LoopInvariantMaintenance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceStep {
    pub location: SourceLocation,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counterexample {
    pub kind: CounterexampleKind,
    pub location: SourceLocation,
    pub message: Option<String>,
    pub related: Vec<(SourceLocation, String)>,
    pub trace: Vec<TraceStep>,
    /// Check reported only to explain a timeout; not an error of its own.
    pub auxiliary_for_timeout: bool,
}

impl Counterexample {
    pub fn new(kind: CounterexampleKind, location: SourceLocation) -> Self {
        Self {
            kind,
            location,
            message: None,
            related: Vec::new(),
            trace: Vec::new(),
            auxiliary_for_timeout: false,
        }
    }

    pub fn assertion(location: SourceLocation) -> Self {
        Self::new(CounterexampleKind::Assertion, location)
    }

    pub fn precondition(call_site: SourceLocation, requires: SourceLocation) -> Self {
        Self::new(CounterexampleKind::Precondition { requires }, call_site)
    }

    pub fn postcondition(return_site: SourceLocation, ensures: SourceLocation) -> Self {
        Self::new(CounterexampleKind::Postcondition { ensures }, return_site)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_trace(mut self, trace: Vec<TraceStep>) -> Self {
        self.trace = trace;
        self
    }

    pub fn related_to(mut self, location: SourceLocation, message: impl Into<String>) -> Self {
        self.related.push((location, message.into()));
        self
    }

    pub fn auxiliary(mut self) -> Self {
        self.auxiliary_for_timeout = true;
        self
    }

    /// The message reported for this counterexample, falling back to the
    /// standard text for its kind.
    pub fn describe(&self) -> String {
        if let Some(msg) = &self.message {
            return msg.clone();
        }
        match self.kind {
            CounterexampleKind::Assertion => "This assertion might not hold.",
            CounterexampleKind::Precondition { .. } => "A precondition for this call might not hold.",
            CounterexampleKind::Postcondition { .. } => {
                "A postcondition might not hold on this return path."
            }
            CounterexampleKind::LoopInvariantEntry => "This loop invariant might not hold on entry.",
            CounterexampleKind::LoopInvariantMaintenance => {
                "This loop invariant might not be maintained by the loop."
            }
        }
        .to_string()
    }
}

/// Outcome of verifying one implementation for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationResult {
    pub request_id: String,
    pub implementation: String,
    pub location: SourceLocation,
    pub checksum: Option<Checksum>,
    pub dependency_checksum: Option<Checksum>,
    pub outcome: Outcome,
    pub counterexamples: Vec<Counterexample>,
    pub start: SystemTime,
    pub elapsed: Duration,
    pub resource_count: u64,
    pub proof_obligations: u64,
    /// Time limit in seconds the run was given; 0 means none.
    pub time_limit: u64,
    pub was_cached: bool,
    pub msg_if_verifies: Option<String>,
}

impl VerificationResult {
    pub fn new(request_id: impl Into<String>, implementation: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            request_id: request_id.into(),
            implementation: implementation.into(),
            location: SourceLocation::unknown(),
            checksum: None,
            dependency_checksum: None,
            outcome,
            counterexamples: Vec::new(),
            start: SystemTime::now(),
            elapsed: Duration::ZERO,
            resource_count: 0,
            proof_obligations: 0,
            time_limit: 0,
            was_cached: false,
            msg_if_verifies: None,
        }
    }

    /// Counterexamples that count as errors.
    pub fn error_count(&self) -> usize {
        self.counterexamples
            .iter()
            .filter(|c| !c.auxiliary_for_timeout)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indication_pluralizes_errors() {
        assert_eq!(Outcome::Errors.indication(1), "error");
        assert_eq!(Outcome::Errors.indication(3), "errors");
        assert_eq!(Outcome::ReachedBound.indication(0), "verified");
    }

    #[test]
    fn test_error_count_skips_auxiliary() {
        let mut r = VerificationResult::new("r1", "Main", Outcome::TimedOut);
        r.counterexamples.push(Counterexample::assertion(SourceLocation::unknown()).auxiliary());
        r.counterexamples.push(Counterexample::assertion(SourceLocation::unknown()));
        assert_eq!(r.error_count(), 1);
    }

    #[test]
    fn test_describe_defaults() {
        let loc = SourceLocation::new("a.bpl", 1, 1);
        let pre = Counterexample::precondition(loc.clone(), loc.clone());
        assert_eq!(pre.describe(), "A precondition for this call might not hold.");
        let custom = Counterexample::assertion(loc).with_message("x must be positive");
        assert_eq!(custom.describe(), "x must be positive");
    }
}
