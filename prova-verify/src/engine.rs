//! Concurrent verification of the implementations of a program.
//!
//! Each implementation is an independent unit on a large-stack runtime. Units
//! of one request share a cancellation token; a newer run of an
//! implementation cancels any older run still in flight. Output reaches the
//! sink in selection order no matter which unit finishes first.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

use prova_ast::{DeclId, Declaration};
use prova_core::{AnalyzedProgram, Pruner};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{CachePriority, ImplementationFingerprint, VerificationResultCache};
use crate::error::EngineError;
use crate::options::{CacheMode, ExecutionOptions, RoutineFilter};
use crate::outcome::{Outcome, VerificationResult};
use crate::output::{OutputCollector, SharedSink, lock, stdout_sink};
use crate::pool::{LargeStackRuntime, SessionPool};
use crate::report::{ErrorInformation, ErrorKind, ErrorReporter, process_result};
use crate::solver::{ImplementationVerifier, VerificationJob, VerifierFault};
use crate::stats::{PipelineStatistics, StatisticsSnapshot};

const REQUEST_ID_PREFIX: &str = "auto_request_id_";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    VerificationCompleted,
    Cancelled,
    FatalError(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnitRun {
    Completed(VerificationResult),
    Cancelled,
    Fatal(String),
}

impl UnitRun {
    pub fn result(&self) -> Option<&VerificationResult> {
        match self {
            UnitRun::Completed(r) => Some(r),
            _ => None,
        }
    }
}

/// Everything one call to [`ExecutionEngine::schedule_and_run`] produced.
#[derive(Clone, Debug)]
pub struct BatchReport {
    pub request_id: String,
    pub outcome: PipelineOutcome,
    /// One entry per scheduled implementation, in scheduling order.
    pub runs: Vec<UnitRun>,
    pub statistics: StatisticsSnapshot,
}

impl BatchReport {
    pub fn results(&self) -> impl Iterator<Item = &VerificationResult> {
        self.runs.iter().filter_map(UnitRun::result)
    }

    pub fn summary(&self) -> String {
        self.statistics.summary()
    }
}

pub struct EngineBuilder<V: ImplementationVerifier> {
    options: ExecutionOptions,
    verifier: V,
    cache: Option<Arc<VerificationResultCache>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    sink: Option<SharedSink>,
}

impl<V: ImplementationVerifier> EngineBuilder<V> {
    pub fn new(options: ExecutionOptions, verifier: V) -> Self {
        Self {
            options,
            verifier,
            cache: None,
            reporter: None,
            sink: None,
        }
    }

    /// Shares a cache with other engines; otherwise the engine owns a fresh one.
    pub fn cache(mut self, cache: Arc<VerificationResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Where unit output goes; stdout by default.
    pub fn output(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<ExecutionEngine<V>, EngineError> {
        let options = self.options;
        options
            .validate()
            .map_err(|e| EngineError::new(e.to_string()))?;
        let filter = options
            .routine_filter()
            .map_err(|e| EngineError::new(e.to_string()))?;
        let runtime = LargeStackRuntime::new(options.max_threads, options.stack_size)?;
        let permits = Arc::new(Semaphore::new(options.max_concurrent_units()));

        let shared = Shared {
            pruner: Pruner::new(options.prune),
            filter,
            verifier: self.verifier,
            cache: self.cache.unwrap_or_default(),
            sessions: SessionPool::new(),
            requests: Mutex::new(RequestTable::default()),
            running: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            request_counter: AtomicU64::new(0),
            permits,
            reporter: self.reporter,
            sink: self.sink.unwrap_or_else(stdout_sink),
            options,
        };
        Ok(ExecutionEngine {
            shared: Arc::new(shared),
            runtime,
        })
    }
}

/// Outstanding requests. Several batches may share one request id.
#[derive(Debug, Default)]
struct RequestTable {
    entries: HashMap<String, RequestEntry>,
    /// Batches still running, cancelled ones included.
    running: usize,
    serial: u64,
}

#[derive(Debug)]
struct RequestEntry {
    serial: u64,
    token: CancellationToken,
    batches: usize,
}

struct Shared<V: ImplementationVerifier> {
    options: ExecutionOptions,
    filter: RoutineFilter,
    pruner: Pruner,
    verifier: V,
    cache: Arc<VerificationResultCache>,
    sessions: SessionPool<V::Session>,
    requests: Mutex<RequestTable>,
    /// In-flight run per implementation identity, tagged with its generation.
    running: Mutex<HashMap<String, (u64, CancellationToken)>>,
    generation: AtomicU64,
    request_counter: AtomicU64,
    permits: Arc<Semaphore>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    sink: SharedSink,
}

impl<V: ImplementationVerifier> Shared<V> {
    fn fingerprint(&self, program: &AnalyzedProgram, id: DeclId, name: &str) -> ImplementationFingerprint {
        ImplementationFingerprint::new(name, program.checksum(id), program.dependency_checksum(id))
    }

    /// Starts a new run for `name`, cancelling any older one.
    fn supersede(&self, name: &str, request: &CancellationToken) -> (u64, CancellationToken) {
        let token = request.child_token();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = lock(&self.running).insert(name.to_string(), (generation, token.clone()));
        if let Some((_, older)) = previous {
            debug!(implementation = %name, "superseding older run");
            older.cancel();
        }
        (generation, token)
    }

    fn retire(&self, name: &str, generation: u64) {
        let mut running = lock(&self.running);
        if running.get(name).is_some_and(|(g, _)| *g == generation) {
            running.remove(name);
        }
    }

    /// Registers a batch under `request_id`, joining the token of batches already
    /// running under the same id.
    fn join_request(&self, request_id: &str) -> (u64, CancellationToken) {
        let mut table = lock(&self.requests);
        table.running += 1;
        table.serial += 1;
        let serial = table.serial;
        let entry = table
            .entries
            .entry(request_id.to_string())
            .or_insert_with(|| RequestEntry {
                serial,
                token: CancellationToken::new(),
                batches: 0,
            });
        entry.batches += 1;
        (entry.serial, entry.token.clone())
    }

    /// Unregisters a finished batch. Solver sessions are released once no batch
    /// is running.
    fn finish_request(&self, request_id: &str, serial: u64) {
        let mut table = lock(&self.requests);
        table.running = table.running.saturating_sub(1);
        let last = match table.entries.get_mut(request_id) {
            Some(entry) if entry.serial == serial => {
                entry.batches = entry.batches.saturating_sub(1);
                entry.batches == 0
            }
            _ => false,
        };
        if last {
            table.entries.remove(request_id);
        }
        if table.running == 0 {
            let released = self.sessions.clear();
            if released > 0 {
                debug!(released, "no outstanding requests; released solver sessions");
            }
        }
    }

    fn cancel_request(&self, request_id: &str) -> bool {
        match lock(&self.requests).entries.remove(request_id) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Schedules verification units and collects their results.
pub struct ExecutionEngine<V: ImplementationVerifier> {
    shared: Arc<Shared<V>>,
    runtime: LargeStackRuntime,
}

impl<V: ImplementationVerifier> ExecutionEngine<V> {
    pub fn new(options: ExecutionOptions, verifier: V) -> Result<Self, EngineError> {
        EngineBuilder::new(options, verifier).build()
    }

    pub fn builder(options: ExecutionOptions, verifier: V) -> EngineBuilder<V> {
        EngineBuilder::new(options, verifier)
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.shared.options
    }

    pub fn cache(&self) -> &Arc<VerificationResultCache> {
        &self.shared.cache
    }

    /// Solver sessions currently idle in the pool.
    pub fn idle_sessions(&self) -> usize {
        self.shared.sessions.idle()
    }

    pub fn fresh_request_id(&self) -> String {
        let n = self.shared.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{REQUEST_ID_PREFIX}{n}")
    }

    /// The counter value embedded in an id from [`Self::fresh_request_id`].
    pub fn auto_request_id_number(request_id: &str) -> Option<u64> {
        request_id.strip_prefix(REQUEST_ID_PREFIX)?.parse().ok()
    }

    pub fn fingerprint(&self, program: &AnalyzedProgram, id: DeclId) -> Option<ImplementationFingerprint> {
        let decl = program.program().get(id)?;
        Some(self.shared.fingerprint(program, id, &decl.name))
    }

    /// Implementations to verify, highest priority first.
    ///
    /// An explicit `priority` attribute wins; otherwise the cache decides.
    /// Ties keep declaration order.
    pub fn select_implementations(&self, program: &AnalyzedProgram) -> Vec<DeclId> {
        let decls = program.program();
        let mut selected: Vec<(DeclId, i64)> = decls
            .implementations()
            .map(|(id, _)| (id, &decls[id]))
            .filter(|(_, d)| !d.skip_verification() && self.shared.filter.accepts(&d.name))
            .map(|(id, d)| {
                let priority = if d.priority() != 1 {
                    d.priority()
                } else if self.shared.options.cache_mode == CacheMode::Off {
                    CachePriority::Unverified.value()
                } else {
                    let fp = self.shared.fingerprint(program, id, &d.name);
                    self.shared.cache.priority(&fp).value()
                };
                (id, priority)
            })
            .collect();
        selected.sort_by_key(|&(_, p)| Reverse(p));
        selected.into_iter().map(|(id, _)| id).collect()
    }

    /// Verifies `implementations` concurrently under `request_id`.
    ///
    /// A solver failure ends the batch with [`PipelineOutcome::FatalError`];
    /// cancelling the request ends it with [`PipelineOutcome::Cancelled`].
    /// The `Err` case is reserved for malformed input.
    pub async fn schedule_and_run(
        &self,
        program: Arc<AnalyzedProgram>,
        implementations: &[DeclId],
        request_id: &str,
    ) -> Result<BatchReport, EngineError> {
        for &id in implementations {
            let decl = program.declaration(id)?;
            if decl.as_implementation().is_none() {
                return Err(EngineError::new(format!(
                    "'{}' ({}) is a {}, not an implementation",
                    decl.name,
                    id,
                    decl.kind_name()
                )));
            }
        }

        let (serial, token) = self.shared.join_request(request_id);
        info!(request_id = %request_id, implementations = implementations.len(), "starting verification");

        let result = self.run_batch(program, implementations, request_id, &token).await;
        self.shared.finish_request(request_id, serial);
        result
    }

    async fn run_batch(
        &self,
        program: Arc<AnalyzedProgram>,
        implementations: &[DeclId],
        request_id: &str,
        token: &CancellationToken,
    ) -> Result<BatchReport, EngineError> {
        if self.shared.pruner.enabled() && program.dependency_graph().is_none() {
            let p = Arc::clone(&program);
            self.runtime
                .handle()
                .spawn_blocking(move || {
                    p.ensure_dependency_graph();
                })
                .await
                .map_err(|e| EngineError::new(format!("building dependency graph failed: {e}")))?;
        }

        let stats = Arc::new(PipelineStatistics::new());
        let collector = Arc::new(OutputCollector::new(
            implementations.len(),
            Arc::clone(&self.shared.sink),
        ));

        let handles: Vec<_> = implementations
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let unit = Unit {
                    shared: Arc::clone(&self.shared),
                    program: Arc::clone(&program),
                    id,
                    index,
                    request_id: request_id.to_string(),
                    request: token.clone(),
                    stats: Arc::clone(&stats),
                    collector: Arc::clone(&collector),
                };
                self.runtime.spawn(unit.run())
            })
            .collect();

        let mut runs = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            let run = match handle.await {
                Ok(run) => run,
                Err(e) => {
                    token.cancel();
                    collector.add(index, String::new());
                    UnitRun::Fatal(format!("verification task failed: {e}"))
                }
            };
            runs.push(run);
        }
        collector.write_more_output()?;

        let fatal = runs.iter().find_map(|r| match r {
            UnitRun::Fatal(msg) => Some(msg.clone()),
            _ => None,
        });
        let outcome = match fatal {
            Some(msg) => {
                error!(request_id = %request_id, "{msg}");
                let mut sink = lock(&self.shared.sink);
                writeln!(sink, "Fatal Error: ProverException: {msg}")?;
                sink.flush()?;
                PipelineOutcome::FatalError(msg)
            }
            None if runs.iter().any(|r| matches!(r, UnitRun::Cancelled)) => {
                info!(request_id = %request_id, "verification cancelled");
                PipelineOutcome::Cancelled
            }
            None => PipelineOutcome::VerificationCompleted,
        };

        let statistics = stats.snapshot();
        debug!(
            request_id = %request_id,
            verified = statistics.verified,
            errors = statistics.errors,
            cached = statistics.cached_total(),
            "verification finished"
        );
        Ok(BatchReport {
            request_id: request_id.to_string(),
            outcome,
            runs,
            statistics,
        })
    }

    /// Selects and verifies every implementation of `program` under a fresh
    /// request id, then writes the summary trailer.
    pub async fn verify_program(&self, program: Arc<AnalyzedProgram>) -> Result<BatchReport, EngineError> {
        let implementations = self.select_implementations(&program);
        let request_id = self.fresh_request_id();
        let report = self
            .schedule_and_run(program, &implementations, &request_id)
            .await?;
        if !matches!(report.outcome, PipelineOutcome::FatalError(_)) {
            let mut sink = lock(&self.shared.sink);
            writeln!(sink, "\n{}", report.summary())?;
            sink.flush()?;
        }
        Ok(report)
    }

    /// [`Self::verify_program`] for synchronous callers. Must not be called
    /// from inside an async context.
    pub fn verify_program_blocking(&self, program: Arc<AnalyzedProgram>) -> Result<BatchReport, EngineError> {
        self.runtime.block_on(self.verify_program(program))
    }

    /// Cancels every unit of `request_id`. Returns false for unknown requests.
    pub fn cancel_request(&self, request_id: &str) -> bool {
        let found = self.shared.cancel_request(request_id);
        if found {
            info!(request_id = %request_id, "cancellation requested");
        }
        found
    }
}

/// One implementation's verification within a batch.
struct Unit<V: ImplementationVerifier> {
    shared: Arc<Shared<V>>,
    program: Arc<AnalyzedProgram>,
    id: DeclId,
    index: usize,
    request_id: String,
    request: CancellationToken,
    stats: Arc<PipelineStatistics>,
    collector: Arc<OutputCollector>,
}

impl<V: ImplementationVerifier> Unit<V> {
    async fn run(self) -> UnitRun {
        let Some(decl) = self.program.program().get(self.id) else {
            self.collector.add(self.index, String::new());
            return UnitRun::Fatal(format!("unknown declaration {}", self.id));
        };
        let (generation, cancel) = self.shared.supersede(&decl.name, &self.request);

        let (run, output) = self.verify(decl, &cancel).await;
        self.shared.retire(&decl.name, generation);

        if let UnitRun::Fatal(_) = run {
            self.request.cancel();
        }
        let output = if matches!(run, UnitRun::Cancelled) {
            String::new()
        } else {
            output
        };
        self.collector.add(self.index, output);
        if let Err(e) = self.collector.write_more_output() {
            warn!(implementation = %decl.name, "failed to write output: {e}");
        }
        run
    }

    async fn verify(&self, decl: &Declaration, cancel: &CancellationToken) -> (UnitRun, String) {
        let shared = &*self.shared;
        let options = &shared.options;
        let name = decl.name.as_str();
        let mut out = String::new();
        if cancel.is_cancelled() {
            return (UnitRun::Cancelled, out);
        }

        if options.trace {
            let _ = writeln!(out, "Verifying {name} ...");
        }
        debug!(request_id = %self.request_id, implementation = %name, "verifying");

        let fingerprint = shared.fingerprint(&self.program, self.id, name);
        if options.cache_mode != CacheMode::Off {
            let reusable = |r: &VerificationResult| {
                options.cache_mode == CacheMode::On || r.outcome == Outcome::Correct
            };
            if let (Some(mut cached), CachePriority::Skip) = shared.cache.lookup_if(&fingerprint, reusable) {
                if options.trace {
                    let _ = writeln!(
                        out,
                        "Retrieving cached verification result for implementation {name}..."
                    );
                }
                cached.request_id = self.request_id.clone();
                process_result(&cached, options, &self.stats, shared.reporter.as_deref(), &mut out);
                return (UnitRun::Completed(cached), out);
            }
        }

        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return (UnitRun::Cancelled, out),
            permit = Arc::clone(&shared.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return (UnitRun::Cancelled, out),
            },
        };

        let mut session = match shared.sessions.checkout(|| shared.verifier.open_session()) {
            Ok(session) => session,
            Err(fault) => return self.fault(decl, fault, &fingerprint, out),
        };

        let Some(imp) = decl.as_implementation() else {
            shared.sessions.give_back(session);
            return (UnitRun::Fatal(format!("'{name}' is not an implementation")), out);
        };
        let mut blocks = imp.blocks.clone();
        let declarations = shared.pruner.prune(&self.program, self.id, Some(&mut blocks));
        let job = VerificationJob {
            request_id: self.request_id.clone(),
            program: Arc::clone(&self.program),
            implementation: self.id,
            name: name.to_string(),
            blocks,
            declarations,
            time_limit: decl.time_limit().unwrap_or(options.time_limit),
        };

        let start = SystemTime::now();
        let started = Instant::now();
        let verified = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            r = shared.verifier.verify(&mut session, &job, cancel.clone()) => Some(r),
        };

        let output = match verified {
            None => {
                shared.sessions.give_back(session);
                debug!(implementation = %name, "cancelled");
                return (UnitRun::Cancelled, out);
            }
            Some(Err(fault)) => {
                shared.sessions.discard(session);
                return self.fault(decl, fault, &fingerprint, out);
            }
            Some(Ok(output)) => {
                shared.sessions.give_back(session);
                output
            }
        };

        let mut result = self.result_for(decl, output.outcome, &fingerprint);
        result.counterexamples = output.counterexamples;
        result.start = start;
        result.elapsed = started.elapsed();
        result.resource_count = output.resource_count;
        result.proof_obligations = output.proof_obligations;
        result.time_limit = job.time_limit;

        if options.cache_mode != CacheMode::Off {
            shared.cache.insert(&fingerprint, result.clone());
        }
        process_result(&result, options, &self.stats, shared.reporter.as_deref(), &mut out);
        (UnitRun::Completed(result), out)
    }

    fn result_for(
        &self,
        decl: &Declaration,
        outcome: Outcome,
        fingerprint: &ImplementationFingerprint,
    ) -> VerificationResult {
        let mut result = VerificationResult::new(self.request_id.clone(), decl.name.clone(), outcome);
        result.location = decl.location.clone();
        result.checksum = fingerprint.checksum;
        result.dependency_checksum = fingerprint.dependency_checksum;
        result.time_limit = decl.time_limit().unwrap_or(self.shared.options.time_limit);
        result.msg_if_verifies = decl.msg_if_verifies().map(str::to_string);
        result
    }

    /// Converts a verifier fault into this unit's run. Recoverable faults are
    /// reported but never cached.
    fn fault(
        &self,
        decl: &Declaration,
        fault: VerifierFault,
        fingerprint: &ImplementationFingerprint,
        mut out: String,
    ) -> (UnitRun, String) {
        let shared = &*self.shared;
        let name = decl.name.as_str();
        let reporter = shared.reporter.as_deref();

        let result = match fault {
            VerifierFault::SolverDied(msg) => {
                error!(request_id = %self.request_id, implementation = %name, "solver failed: {msg}");
                return (UnitRun::Fatal(msg), out);
            }
            VerifierFault::UnexpectedOutput(msg) => {
                warn!(implementation = %name, "unexpected prover output: {msg}");
                let _ = writeln!(
                    out,
                    "Advisory: {name} SKIPPED because of internal error: unexpected prover output: {msg}"
                );
                self.result_for(decl, Outcome::Inconclusive, fingerprint)
            }
            VerifierFault::Io(e) => {
                warn!(implementation = %name, "I/O error during verification: {e}");
                let _ = writeln!(out, "Advisory: {name} SKIPPED due to I/O exception: {e}");
                self.result_for(decl, Outcome::SolverException, fingerprint)
            }
            VerifierFault::VcGeneration(msg) => {
                warn!(implementation = %name, "VC generation failed: {msg}");
                let result = self.result_for(decl, Outcome::Inconclusive, fingerprint);
                let info = ErrorInformation::new(
                    ErrorKind::Verifier,
                    decl.location.clone(),
                    format!("{msg} (encountered in implementation {name})."),
                    &result,
                );
                out.push_str(&info.render());
                if let Some(reporter) = reporter {
                    reporter.report(&info);
                }
                result
            }
        };
        process_result(&result, &shared.options, &self.stats, reporter, &mut out);
        (UnitRun::Completed(result), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::NoSolverVerifier;
    use prova_ast::{Attribute, Block, Cmd, Expr, Procedure, Program, SourceLocation};

    fn program() -> AnalyzedProgram {
        let mut p = Program::new();
        let procedure = p.push(Declaration::procedure("P", Procedure::default()));
        let body = || {
            vec![Block::returning(
                "entry",
                vec![Cmd::assert(SourceLocation::unknown(), Expr::bool(true))],
            )]
        };
        p.push(Declaration::implementation("Low", procedure, body()));
        p.push(
            Declaration::implementation("High", procedure, body())
                .with_attribute(Attribute::int("priority", 5)),
        );
        p.push(
            Declaration::implementation("Skipped", procedure, body())
                .with_attribute(Attribute::boolean("verify", false)),
        );
        AnalyzedProgram::new(p)
    }

    fn options() -> ExecutionOptions {
        ExecutionOptions {
            max_threads: 2,
            stack_size: 2 * 1024 * 1024,
            ..ExecutionOptions::default()
        }
    }

    #[test]
    fn test_request_ids_are_sequential() {
        let engine = ExecutionEngine::new(options(), NoSolverVerifier).unwrap();
        let first = engine.fresh_request_id();
        let second = engine.fresh_request_id();
        assert_eq!(first, "auto_request_id_1");
        assert_eq!(ExecutionEngine::<NoSolverVerifier>::auto_request_id_number(&second), Some(2));
        assert_eq!(ExecutionEngine::<NoSolverVerifier>::auto_request_id_number("manual"), None);
    }

    #[test]
    fn test_selection_orders_by_priority_and_skips() {
        let engine = ExecutionEngine::new(options(), NoSolverVerifier).unwrap();
        let analyzed = program();
        let names: Vec<&str> = engine
            .select_implementations(&analyzed)
            .into_iter()
            .map(|id| analyzed.program()[id].name.as_str())
            .collect();
        assert_eq!(names, vec!["High", "Low"]);

        let filtered = ExecutionEngine::new(
            ExecutionOptions {
                check_only: vec!["L*".to_string()],
                ..options()
            },
            NoSolverVerifier,
        )
        .unwrap();
        assert_eq!(filtered.select_implementations(&analyzed).len(), 1);
    }

    #[test]
    fn test_rejects_non_implementations() {
        let engine = ExecutionEngine::new(options(), NoSolverVerifier).unwrap();
        let analyzed = Arc::new(program());
        let procedure = analyzed.program().find("P").unwrap();
        let err = engine
            .runtime
            .block_on(engine.schedule_and_run(analyzed, &[procedure], "r1"))
            .unwrap_err();
        assert!(err.message.contains("not an implementation"));
    }

    #[test]
    fn test_cancel_unknown_request() {
        let engine = ExecutionEngine::new(options(), NoSolverVerifier).unwrap();
        assert!(!engine.cancel_request("nope"));
    }
}
