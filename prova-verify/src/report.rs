use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Mutex;

use prova_ast::SourceLocation;

use crate::options::ExecutionOptions;
use crate::outcome::{Counterexample, CounterexampleKind, Outcome, VerificationResult};
use crate::stats::PipelineStatistics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Assertion,
    Precondition,
    Postcondition,
    InvariantEntry,
    InvariantMaintenance,
    TimeOut,
    OutOfResource,
    OutOfMemory,
    SolverException,
    Inconclusive,
    Verifier,
}

impl From<&CounterexampleKind> for ErrorKind {
    fn from(kind: &CounterexampleKind) -> Self {
        match kind {
            CounterexampleKind::Assertion => ErrorKind::Assertion,
            CounterexampleKind::Precondition { .. } => ErrorKind::Precondition,
            CounterexampleKind::Postcondition { .. } => ErrorKind::Postcondition,
            CounterexampleKind::LoopInvariantEntry => ErrorKind::InvariantEntry,
            CounterexampleKind::LoopInvariantMaintenance => ErrorKind::InvariantMaintenance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuxErrorInfo {
    pub location: SourceLocation,
    pub message: String,
    pub category: Option<String>,
}

/// One user-visible diagnostic, with its related locations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorInformation {
    pub location: SourceLocation,
    pub message: String,
    pub category: Option<String>,
    pub aux: Vec<AuxErrorInfo>,
    pub request_id: String,
    pub implementation: String,
    pub kind: ErrorKind,
}

impl ErrorInformation {
    pub fn new(
        kind: ErrorKind,
        location: SourceLocation,
        message: impl Into<String>,
        result: &VerificationResult,
    ) -> Self {
        Self {
            location,
            message: clean_message(message.into()),
            category: None,
            aux: Vec::new(),
            request_id: result.request_id.clone(),
            implementation: result.implementation.clone(),
            kind,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn add_aux(
        &mut self,
        location: SourceLocation,
        message: impl Into<String>,
        category: Option<&str>,
    ) {
        self.aux.push(AuxErrorInfo {
            location,
            message: clean_message(message.into()),
            category: category.map(str::to_string),
        });
    }

    /// Text form: one line for the error, then one per auxiliary entry.
    /// Execution-trace entries are grouped under an `Execution trace:` heading.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {}: {}",
            self.location,
            self.category.as_deref().unwrap_or("Error"),
            self.message
        );
        let mut in_trace = false;
        for aux in &self.aux {
            if aux.category.as_deref() == Some(EXECUTION_TRACE) {
                if !in_trace {
                    out.push_str("Execution trace:\n");
                    in_trace = true;
                }
                let _ = writeln!(out, "    {}: {}", aux.location, aux.message);
            } else {
                match &aux.category {
                    Some(c) => {
                        let _ = writeln!(out, "{}: {}: {}", aux.location, c, aux.message);
                    }
                    None => {
                        let _ = writeln!(out, "{}: {}", aux.location, aux.message);
                    }
                }
            }
        }
        out
    }
}

const RELATED_LOCATION: &str = "Related location";
const EXECUTION_TRACE: &str = "Execution trace";

fn clean_message(message: String) -> String {
    match message.strip_prefix("error: ") {
        Some(rest) => rest.to_string(),
        None => message,
    }
}

/// Receives every error produced while verifying a batch.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &ErrorInformation);
}

/// Keeps reported errors in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    errors: Mutex<Vec<ErrorInformation>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<ErrorInformation> {
        match self.errors.lock() {
            Ok(errors) => errors.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &ErrorInformation) {
        match self.errors.lock() {
            Ok(mut errors) => errors.push(error.clone()),
            Err(poisoned) => poisoned.into_inner().push(error.clone()),
        }
    }
}

/// Timing and effort shown next to an outcome when tracing.
pub fn time_indication(result: &VerificationResult, options: &ExecutionOptions) -> String {
    let n = result.proof_obligations;
    let suffix = if n == 1 { "" } else { "s" };
    if options.trace {
        format!(
            "  [{:.3} s, solver resource count: {}, {} proof obligation{}]  ",
            result.elapsed.as_secs_f64(),
            result.resource_count,
            n,
            suffix
        )
    } else if options.trace_proof_obligations {
        format!("  [{} proof obligation{}]  ", n, suffix)
    } else {
        String::new()
    }
}

/// The diagnostic describing a non-error outcome, if there is one.
pub fn outcome_report(result: &VerificationResult) -> Option<ErrorInformation> {
    let name = &result.implementation;
    let loc = result.location.clone();
    let info = match result.outcome {
        Outcome::Correct => {
            let msg = result.msg_if_verifies.as_deref()?;
            ErrorInformation::new(ErrorKind::Verifier, loc, msg, result).with_category("Info")
        }
        Outcome::ReachedBound => ErrorInformation::new(
            ErrorKind::Verifier,
            loc,
            "Stratified Inlining: Reached recursion bound",
            result,
        )
        .with_category("Info"),
        Outcome::Errors => return None,
        Outcome::TimedOut => {
            let mut msg = format!(
                "Verification of '{}' timed out after {} seconds",
                name, result.time_limit
            );
            let aux: BTreeSet<SourceLocation> = result
                .counterexamples
                .iter()
                .filter(|c| c.auxiliary_for_timeout)
                .map(|c| c.location.clone())
                .collect();
            if !aux.is_empty() {
                let n = aux.len();
                let _ = write!(
                    msg,
                    " with {} check{} that timed out individually",
                    n,
                    if n == 1 { "" } else { "s" }
                );
            }
            let mut info = ErrorInformation::new(ErrorKind::TimeOut, loc, msg, result);
            for location in aux {
                info.add_aux(location, "Unverified check due to timeout", Some(RELATED_LOCATION));
            }
            info
        }
        Outcome::OutOfResource => ErrorInformation::new(
            ErrorKind::OutOfResource,
            loc,
            format!("Verification out of resource ({})", name),
            result,
        ),
        Outcome::OutOfMemory => ErrorInformation::new(
            ErrorKind::OutOfMemory,
            loc,
            format!("Verification out of memory ({})", name),
            result,
        ),
        Outcome::SolverException => ErrorInformation::new(
            ErrorKind::SolverException,
            loc,
            format!("Verification encountered solver exception ({})", name),
            result,
        ),
        Outcome::Inconclusive => ErrorInformation::new(
            ErrorKind::Inconclusive,
            loc,
            format!("Verification inconclusive ({})", name),
            result,
        ),
    };
    Some(info)
}

/// One diagnostic per non-auxiliary counterexample, ordered by location.
pub fn error_reports(result: &VerificationResult) -> Vec<ErrorInformation> {
    let mut counterexamples: Vec<&Counterexample> = result
        .counterexamples
        .iter()
        .filter(|c| !c.auxiliary_for_timeout)
        .collect();
    counterexamples.sort_by(|a, b| a.location.cmp(&b.location));

    counterexamples
        .into_iter()
        .map(|cex| {
            let mut info = ErrorInformation::new(
                ErrorKind::from(&cex.kind),
                cex.location.clone(),
                cex.describe(),
                result,
            );
            match &cex.kind {
                CounterexampleKind::Precondition { requires } => info.add_aux(
                    requires.clone(),
                    "This is the precondition that might not hold.",
                    Some(RELATED_LOCATION),
                ),
                CounterexampleKind::Postcondition { ensures } => info.add_aux(
                    ensures.clone(),
                    "This is the postcondition that might not hold.",
                    Some(RELATED_LOCATION),
                ),
                _ => {}
            }
            for (location, message) in &cex.related {
                info.add_aux(location.clone(), message.as_str(), Some(RELATED_LOCATION));
            }
            for step in &cex.trace {
                info.add_aux(step.location.clone(), step.label.as_str(), Some(EXECUTION_TRACE));
            }
            info
        })
        .collect()
}

/// Updates statistics for `result` and writes its report into `out`.
///
/// The outcome line is only written when tracing; diagnostics always are.
/// Every diagnostic is also handed to `reporter`.
pub fn process_result(
    result: &VerificationResult,
    options: &ExecutionOptions,
    stats: &PipelineStatistics,
    reporter: Option<&dyn ErrorReporter>,
    out: &mut String,
) {
    let errors = error_reports(result);
    stats.record(result.outcome, errors.len(), result.was_cached);

    if options.trace || options.trace_proof_obligations {
        let _ = writeln!(
            out,
            "{}{}",
            time_indication(result, options),
            result.outcome.indication(errors.len())
        );
    }

    let outcome_info = outcome_report(result);
    for info in outcome_info.iter().chain(errors.iter()) {
        out.push_str(&info.render());
        if let Some(reporter) = reporter {
            reporter.report(info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::TraceStep;
    use std::time::Duration;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("t.bpl", line, 3)
    }

    #[test]
    fn test_errors_sorted_with_related_locations() {
        let mut result = VerificationResult::new("r1", "Main", Outcome::Errors);
        result.counterexamples = vec![
            Counterexample::postcondition(loc(20), loc(2)),
            Counterexample::assertion(loc(10)).with_trace(vec![TraceStep {
                location: loc(5),
                label: "anon0".to_string(),
            }]),
            Counterexample::assertion(loc(1)).auxiliary(),
        ];
        let reports = error_reports(&result);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].kind, ErrorKind::Assertion);
        assert_eq!(reports[1].aux[0].message, "This is the postcondition that might not hold.");
        assert_eq!(
            reports[0].render(),
            "t.bpl(10,3): Error: This assertion might not hold.\nExecution trace:\n    t.bpl(5,3): anon0\n"
        );
    }

    #[test]
    fn test_timeout_report_counts_distinct_checks() {
        let mut result = VerificationResult::new("r1", "Main", Outcome::TimedOut);
        result.time_limit = 10;
        result.counterexamples = vec![
            Counterexample::assertion(loc(4)).auxiliary(),
            Counterexample::assertion(loc(4)).auxiliary(),
            Counterexample::assertion(loc(8)).auxiliary(),
        ];
        let info = outcome_report(&result).expect("timeout report");
        assert_eq!(
            info.message,
            "Verification of 'Main' timed out after 10 seconds with 2 checks that timed out individually"
        );
        assert_eq!(info.aux.len(), 2);
    }

    #[test]
    fn test_message_prefix_stripped() {
        let mut result = VerificationResult::new("r1", "Main", Outcome::Errors);
        result.counterexamples =
            vec![Counterexample::assertion(loc(1)).with_message("error: x is negative")];
        assert_eq!(error_reports(&result)[0].message, "x is negative");
    }

    #[test]
    fn test_process_result_trace_line() {
        let mut result = VerificationResult::new("r1", "Main", Outcome::Correct);
        result.elapsed = Duration::from_millis(1500);
        result.resource_count = 42;
        result.proof_obligations = 1;
        let options = ExecutionOptions {
            trace: true,
            ..ExecutionOptions::default()
        };
        let stats = PipelineStatistics::new();
        let reporter = CollectingReporter::new();
        let mut out = String::new();
        process_result(&result, &options, &stats, Some(&reporter as &dyn ErrorReporter), &mut out);
        assert_eq!(
            out,
            "  [1.500 s, solver resource count: 42, 1 proof obligation]  verified\n"
        );
        assert_eq!(stats.snapshot().verified, 1);
        assert!(reporter.errors().is_empty());

        let mut quiet = String::new();
        process_result(&result, &ExecutionOptions::default(), &stats, None, &mut quiet);
        assert!(quiet.is_empty());
    }
}
