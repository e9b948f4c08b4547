use std::sync::atomic::{AtomicUsize, Ordering};

use crate::outcome::Outcome;

/// Per-category counters shared by all units of a batch.
#[derive(Debug, Default)]
pub struct PipelineStatistics {
    verified: AtomicUsize,
    errors: AtomicUsize,
    inconclusive: AtomicUsize,
    timed_out: AtomicUsize,
    out_of_resource: AtomicUsize,
    out_of_memory: AtomicUsize,
    solver_exceptions: AtomicUsize,
    cached_verified: AtomicUsize,
    cached_errors: AtomicUsize,
    cached_inconclusive: AtomicUsize,
    cached_timed_out: AtomicUsize,
    cached_out_of_resource: AtomicUsize,
    cached_out_of_memory: AtomicUsize,
    cached_solver_exceptions: AtomicUsize,
}

impl PipelineStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished implementation. `errors` is the number of
    /// non-auxiliary counterexamples.
    pub fn record(&self, outcome: Outcome, errors: usize, cached: bool) {
        let (count, cached_count, n) = match outcome {
            Outcome::Correct | Outcome::ReachedBound => (&self.verified, &self.cached_verified, 1),
            Outcome::Errors => (&self.errors, &self.cached_errors, errors),
            Outcome::TimedOut => (&self.timed_out, &self.cached_timed_out, 1),
            Outcome::OutOfResource => (&self.out_of_resource, &self.cached_out_of_resource, 1),
            Outcome::OutOfMemory => (&self.out_of_memory, &self.cached_out_of_memory, 1),
            Outcome::SolverException => {
                (&self.solver_exceptions, &self.cached_solver_exceptions, 1)
            }
            Outcome::Inconclusive => (&self.inconclusive, &self.cached_inconclusive, 1),
        };
        count.fetch_add(n, Ordering::Relaxed);
        if cached {
            cached_count.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        StatisticsSnapshot {
            verified: get(&self.verified),
            errors: get(&self.errors),
            inconclusive: get(&self.inconclusive),
            timed_out: get(&self.timed_out),
            out_of_resource: get(&self.out_of_resource),
            out_of_memory: get(&self.out_of_memory),
            solver_exceptions: get(&self.solver_exceptions),
            cached_verified: get(&self.cached_verified),
            cached_errors: get(&self.cached_errors),
            cached_inconclusive: get(&self.cached_inconclusive),
            cached_timed_out: get(&self.cached_timed_out),
            cached_out_of_resource: get(&self.cached_out_of_resource),
            cached_out_of_memory: get(&self.cached_out_of_memory),
            cached_solver_exceptions: get(&self.cached_solver_exceptions),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub verified: usize,
    pub errors: usize,
    pub inconclusive: usize,
    pub timed_out: usize,
    pub out_of_resource: usize,
    pub out_of_memory: usize,
    pub solver_exceptions: usize,
    pub cached_verified: usize,
    pub cached_errors: usize,
    pub cached_inconclusive: usize,
    pub cached_timed_out: usize,
    pub cached_out_of_resource: usize,
    pub cached_out_of_memory: usize,
    pub cached_solver_exceptions: usize,
}

impl StatisticsSnapshot {
    pub fn cached_total(&self) -> usize {
        self.cached_verified
            + self.cached_errors
            + self.cached_inconclusive
            + self.cached_timed_out
            + self.cached_out_of_resource
            + self.cached_out_of_memory
            + self.cached_solver_exceptions
    }

    /// The trailer printed after a batch, e.g.
    /// `prova finished with 3 verified, 1 error, 1 time out`.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "prova finished with {} verified, {} error{}",
            self.verified,
            self.errors,
            plural(self.errors)
        );
        if self.inconclusive > 0 {
            out.push_str(&format!(", {} inconclusive", self.inconclusive));
        }
        if self.timed_out > 0 {
            out.push_str(&format!(", {} time out{}", self.timed_out, plural(self.timed_out)));
        }
        if self.out_of_resource > 0 {
            out.push_str(&format!(", {} out of resource", self.out_of_resource));
        }
        if self.out_of_memory > 0 {
            out.push_str(&format!(", {} out of memory", self.out_of_memory));
        }
        if self.solver_exceptions > 0 {
            out.push_str(&format!(
                ", {} solver exception{}",
                self.solver_exceptions,
                plural(self.solver_exceptions)
            ));
        }
        if self.cached_total() > 0 {
            let mut parts = vec![
                format!("{} verified", self.cached_verified),
                format!("{} error{}", self.cached_errors, plural(self.cached_errors)),
            ];
            if self.cached_inconclusive > 0 {
                parts.push(format!("{} inconclusive", self.cached_inconclusive));
            }
            if self.cached_timed_out > 0 {
                parts.push(format!(
                    "{} time out{}",
                    self.cached_timed_out,
                    plural(self.cached_timed_out)
                ));
            }
            if self.cached_out_of_resource > 0 {
                parts.push(format!("{} out of resource", self.cached_out_of_resource));
            }
            if self.cached_out_of_memory > 0 {
                parts.push(format!("{} out of memory", self.cached_out_of_memory));
            }
            if self.cached_solver_exceptions > 0 {
                parts.push(format!(
                    "{} solver exception{}",
                    self.cached_solver_exceptions,
                    plural(self.cached_solver_exceptions)
                ));
            }
            out.push_str(&format!(" [cached: {}]", parts.join(", ")));
        }
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_count_counterexamples() {
        let stats = PipelineStatistics::new();
        stats.record(Outcome::Correct, 0, false);
        stats.record(Outcome::Errors, 2, false);
        stats.record(Outcome::ReachedBound, 0, true);
        let snap = stats.snapshot();
        assert_eq!(snap.verified, 2);
        assert_eq!(snap.errors, 2);
        assert_eq!(snap.cached_verified, 1);
    }

    #[test]
    fn test_summary_format() {
        let stats = PipelineStatistics::new();
        stats.record(Outcome::Correct, 0, false);
        stats.record(Outcome::Errors, 1, false);
        stats.record(Outcome::TimedOut, 0, false);
        assert_eq!(
            stats.snapshot().summary(),
            "prova finished with 1 verified, 1 error, 1 time out"
        );

        stats.record(Outcome::Correct, 0, true);
        assert_eq!(
            stats.snapshot().summary(),
            "prova finished with 2 verified, 1 error, 1 time out [cached: 1 verified, 0 errors]"
        );
    }
}
