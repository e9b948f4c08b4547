use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prova_ast::{Block, Cmd, DeclId, Declaration, Expr, Procedure, Program, SourceLocation};
use prova_core::AnalyzedProgram;
use prova_verify::{
    CacheMode, CapturedOutput, CollectingReporter, Counterexample, ExecutionEngine,
    ExecutionOptions, ImplementationVerifier, NoSolverVerifier, Outcome, PipelineOutcome,
    StatisticsSnapshot, UnitRun, VerificationJob, VerifierFault, VerifierOutput,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
enum Behavior {
    Finish { delay_ms: u64, outcome: Outcome },
    Fail,
    Hang,
    /// Hangs on the first call for this implementation, finishes afterwards.
    HangFirst,
    Unexpected,
    Io,
    Died,
    VcGen,
}

#[derive(Default)]
struct MockState {
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<HashMap<String, usize>>,
    declarations: Mutex<HashMap<String, Vec<DeclId>>>,
    started: Notify,
    sessions_opened: AtomicUsize,
}

#[derive(Clone, Default)]
struct MockVerifier {
    state: Arc<MockState>,
}

impl MockVerifier {
    fn with(self, name: &str, behavior: Behavior) -> Self {
        self.state
            .behaviors
            .lock()
            .unwrap()
            .insert(name.to_string(), behavior);
        self
    }

    fn calls(&self, name: &str) -> usize {
        self.state.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.state.calls.lock().unwrap().values().sum()
    }

    fn declarations(&self, name: &str) -> Vec<DeclId> {
        self.state
            .declarations
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    async fn first_start(&self) {
        self.state.started.notified().await;
    }
}

#[async_trait]
impl ImplementationVerifier for MockVerifier {
    type Session = usize;

    fn open_session(&self) -> Result<usize, VerifierFault> {
        Ok(self.state.sessions_opened.fetch_add(1, Ordering::SeqCst))
    }

    async fn verify(
        &self,
        _session: &mut usize,
        job: &VerificationJob,
        cancel: CancellationToken,
    ) -> Result<VerifierOutput, VerifierFault> {
        let call = {
            let mut calls = self.state.calls.lock().unwrap();
            let n = calls.entry(job.name.clone()).or_insert(0);
            *n += 1;
            *n
        };
        self.state
            .declarations
            .lock()
            .unwrap()
            .insert(job.name.clone(), job.declarations.clone());
        self.state.started.notify_one();

        let behavior = self
            .state
            .behaviors
            .lock()
            .unwrap()
            .get(&job.name)
            .cloned()
            .unwrap_or(Behavior::Finish {
                delay_ms: 0,
                outcome: Outcome::Correct,
            });

        let hang = matches!(behavior, Behavior::Hang)
            || (matches!(behavior, Behavior::HangFirst) && call == 1);
        if hang {
            cancel.cancelled().await;
            return Ok(VerifierOutput::new(Outcome::Inconclusive));
        }

        match behavior {
            Behavior::Finish { delay_ms, outcome } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let mut output = VerifierOutput::new(outcome);
                output.proof_obligations = 1;
                Ok(output)
            }
            Behavior::Fail => {
                let mut output = VerifierOutput::new(Outcome::Errors);
                output.counterexamples =
                    vec![Counterexample::assertion(SourceLocation::new("t.bpl", 4, 5))];
                Ok(output)
            }
            Behavior::Hang | Behavior::HangFirst => Ok(VerifierOutput::new(Outcome::Correct)),
            Behavior::Unexpected => Err(VerifierFault::UnexpectedOutput("garbled".to_string())),
            Behavior::Io => Err(VerifierFault::Io(io::Error::other("broken pipe"))),
            Behavior::Died => Err(VerifierFault::SolverDied("solver crashed".to_string())),
            Behavior::VcGen => Err(VerifierFault::VcGeneration("unsupported construct".to_string())),
        }
    }
}

fn options() -> ExecutionOptions {
    ExecutionOptions {
        max_threads: 4,
        stack_size: 4 * 1024 * 1024,
        ..ExecutionOptions::default()
    }
}

fn engine(
    options: ExecutionOptions,
    verifier: MockVerifier,
    out: &CapturedOutput,
) -> ExecutionEngine<MockVerifier> {
    ExecutionEngine::builder(options, verifier)
        .output(out.sink())
        .build()
        .expect("engine")
}

fn body(line: u32, expr: Expr) -> Vec<Block> {
    vec![Block::returning(
        "entry",
        vec![Cmd::assert(SourceLocation::new("t.bpl", line, 5), expr)],
    )]
}

fn program_with(names: &[&str]) -> Arc<AnalyzedProgram> {
    let mut p = Program::new();
    let procedure = p.push(Declaration::procedure("P", Procedure::default()).with_checksum("p-v1"));
    for (i, name) in names.iter().enumerate() {
        p.push(
            Declaration::implementation(*name, procedure, body(i as u32 + 1, Expr::bool(true)))
                .with_checksum(format!("{name}-v1")),
        );
    }
    Arc::new(AnalyzedProgram::new(p))
}

fn names(program: &AnalyzedProgram, ids: &[DeclId]) -> Vec<String> {
    ids.iter().map(|&id| program.program()[id].name.clone()).collect()
}

#[tokio::test]
async fn output_is_flushed_in_selection_order() {
    let mock = MockVerifier::default()
        .with("A", Behavior::Finish { delay_ms: 150, outcome: Outcome::Correct })
        .with("B", Behavior::Finish { delay_ms: 75, outcome: Outcome::Correct })
        .with("C", Behavior::Finish { delay_ms: 0, outcome: Outcome::Correct });
    let out = CapturedOutput::new();
    let engine = engine(ExecutionOptions { trace: true, ..options() }, mock.clone(), &out);

    let report = engine
        .verify_program(program_with(&["A", "B", "C"]))
        .await
        .expect("batch");

    assert_eq!(report.outcome, PipelineOutcome::VerificationCompleted);
    assert_eq!(report.results().count(), 3);
    assert_eq!(report.statistics.verified, 3);

    let text = out.contents();
    let a = text.find("Verifying A ...").expect("A output");
    let b = text.find("Verifying B ...").expect("B output");
    let c = text.find("Verifying C ...").expect("C output");
    assert!(a < b && b < c, "unexpected order:\n{text}");
    assert!(text.trim_end().ends_with("prova finished with 3 verified, 0 errors"));
}

#[tokio::test]
async fn cancelling_a_request_cancels_every_unit_without_caching() {
    let mock = MockVerifier::default()
        .with("A", Behavior::Hang)
        .with("B", Behavior::Hang);
    let out = CapturedOutput::new();
    let engine = engine(
        ExecutionOptions {
            cache_mode: CacheMode::On,
            max_concurrent_units: Some(1),
            ..options()
        },
        mock.clone(),
        &out,
    );
    let program = program_with(&["A", "B"]);
    let ids = engine.select_implementations(&program);

    let (report, found) = tokio::join!(
        engine.schedule_and_run(program.clone(), &ids, "req-1"),
        async {
            mock.first_start().await;
            engine.cancel_request("req-1")
        }
    );
    let report = report.expect("batch");

    assert!(found);
    assert_eq!(report.outcome, PipelineOutcome::Cancelled);
    assert!(report.runs.iter().all(|r| *r == UnitRun::Cancelled));
    assert!(engine.cache().is_empty());
    assert_eq!(report.statistics, StatisticsSnapshot::default());
    assert_eq!(mock.total_calls(), 1);
}

#[tokio::test]
async fn request_stays_cancellable_while_any_of_its_batches_runs() {
    let mock = MockVerifier::default().with("Slow", Behavior::Hang);
    let out = CapturedOutput::new();
    let engine = engine(options(), mock.clone(), &out);
    let program = program_with(&["Slow", "Fast"]);
    let slow = program.program().find("Slow").expect("Slow");
    let fast = program.program().find("Fast").expect("Fast");

    let slow_units = [slow];
    let run = async {
        tokio::join!(
            engine.schedule_and_run(program.clone(), &slow_units, "req"),
            async {
                mock.first_start().await;
                let fast = engine
                    .schedule_and_run(program.clone(), &[fast], "req")
                    .await
                    .expect("fast batch");
                let idle = engine.idle_sessions();
                (fast, idle, engine.cancel_request("req"))
            }
        )
    };
    let (slow, (fast, idle, found)) = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("slow batch was never cancelled");

    assert_eq!(fast.outcome, PipelineOutcome::VerificationCompleted);
    assert_eq!(idle, 1, "sessions released while a batch was still running");
    assert!(found);
    assert_eq!(slow.expect("slow batch").outcome, PipelineOutcome::Cancelled);
    assert!(!engine.cancel_request("req"));
    assert_eq!(engine.idle_sessions(), 0);
}

#[tokio::test]
async fn newer_run_supersedes_older_run_of_same_implementation() {
    let mock = MockVerifier::default().with("A", Behavior::HangFirst);
    let out = CapturedOutput::new();
    let engine = engine(options(), mock.clone(), &out);
    let program = program_with(&["A"]);
    let ids = engine.select_implementations(&program);

    let (first, second) = tokio::join!(
        engine.schedule_and_run(program.clone(), &ids, "r1"),
        async {
            mock.first_start().await;
            engine.schedule_and_run(program.clone(), &ids, "r2").await
        }
    );

    let first = first.expect("first batch");
    let second = second.expect("second batch");
    assert_eq!(first.outcome, PipelineOutcome::Cancelled);
    assert_eq!(second.outcome, PipelineOutcome::VerificationCompleted);
    assert_eq!(second.results().next().map(|r| r.outcome), Some(Outcome::Correct));
    assert_eq!(mock.calls("A"), 2);
}

#[tokio::test]
async fn solver_failure_is_fatal_for_the_batch() {
    let mock = MockVerifier::default()
        .with("A", Behavior::Died)
        .with("B", Behavior::Hang);
    let out = CapturedOutput::new();
    let engine = engine(options(), mock.clone(), &out);

    let report = engine
        .verify_program(program_with(&["A", "B"]))
        .await
        .expect("batch");

    assert_eq!(
        report.outcome,
        PipelineOutcome::FatalError("solver crashed".to_string())
    );
    assert_eq!(report.runs[0], UnitRun::Fatal("solver crashed".to_string()));
    assert_eq!(report.runs[1], UnitRun::Cancelled);

    let text = out.contents();
    assert_eq!(text.matches("Fatal Error: ProverException: solver crashed").count(), 1);
    assert!(!text.contains("prova finished"));
}

#[tokio::test]
async fn recoverable_faults_only_downgrade_their_own_unit() {
    let mock = MockVerifier::default()
        .with("A", Behavior::Unexpected)
        .with("B", Behavior::Io)
        .with("C", Behavior::VcGen);
    let out = CapturedOutput::new();
    let reporter = Arc::new(CollectingReporter::new());
    let engine = ExecutionEngine::builder(options(), mock.clone())
        .output(out.sink())
        .reporter(reporter.clone())
        .build()
        .expect("engine");

    let report = engine
        .verify_program(program_with(&["A", "B", "C", "D"]))
        .await
        .expect("batch");

    assert_eq!(report.outcome, PipelineOutcome::VerificationCompleted);
    let outcomes: Vec<Outcome> = report.results().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Inconclusive,
            Outcome::SolverException,
            Outcome::Inconclusive,
            Outcome::Correct
        ]
    );
    assert_eq!(report.statistics.inconclusive, 2);
    assert_eq!(report.statistics.solver_exceptions, 1);
    assert_eq!(report.statistics.verified, 1);

    let text = out.contents();
    assert!(text.contains(
        "Advisory: A SKIPPED because of internal error: unexpected prover output: garbled"
    ));
    assert!(text.contains("Advisory: B SKIPPED due to I/O exception: broken pipe"));
    assert!(text.contains("Verification inconclusive (A)"));
    assert!(text.contains("Verification encountered solver exception (B)"));

    let messages: Vec<String> = reporter.errors().into_iter().map(|e| e.message).collect();
    assert!(messages.contains(&"unsupported construct (encountered in implementation C).".to_string()));
    assert_eq!(engine.idle_sessions(), 0);
}

#[tokio::test]
async fn counterexamples_are_reported_with_locations() {
    let mock = MockVerifier::default().with("A", Behavior::Fail);
    let out = CapturedOutput::new();
    let reporter = Arc::new(CollectingReporter::new());
    let engine = ExecutionEngine::builder(options(), mock)
        .output(out.sink())
        .reporter(reporter.clone())
        .build()
        .expect("engine");

    let report = engine
        .verify_program(program_with(&["A"]))
        .await
        .expect("batch");

    assert_eq!(report.statistics.errors, 1);
    assert!(out.contents().contains("t.bpl(4,5): Error: This assertion might not hold."));
    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].implementation, "A");
    assert_eq!(errors[0].request_id, report.request_id);
}

#[tokio::test]
async fn cached_results_skip_the_verifier() {
    let mock = MockVerifier::default();
    let out = CapturedOutput::new();
    let engine = engine(
        ExecutionOptions {
            cache_mode: CacheMode::On,
            trace: true,
            ..options()
        },
        mock.clone(),
        &out,
    );
    let program = program_with(&["A", "B"]);

    let first = engine.verify_program(program.clone()).await.expect("first");
    assert!(first.results().all(|r| !r.was_cached));
    assert_eq!(engine.cache().len(), 2);

    let second = engine.verify_program(program).await.expect("second");
    assert_eq!(mock.total_calls(), 2);
    assert!(second.results().all(|r| r.was_cached));
    assert_eq!(second.statistics.cached_verified, 2);
    assert!(second.summary().ends_with("[cached: 2 verified, 0 errors]"));
    assert!(out
        .contents()
        .contains("Retrieving cached verification result for implementation A..."));
}

#[tokio::test]
async fn correct_only_mode_reverifies_failures() {
    let mock = MockVerifier::default().with("A", Behavior::Fail);
    let out = CapturedOutput::new();
    let engine = engine(
        ExecutionOptions {
            cache_mode: CacheMode::CorrectOnly,
            ..options()
        },
        mock.clone(),
        &out,
    );
    let program = program_with(&["A", "B"]);

    engine.verify_program(program.clone()).await.expect("first");
    engine.verify_program(program).await.expect("second");
    assert_eq!(mock.calls("A"), 2);
    assert_eq!(mock.calls("B"), 1);
    // Only B's second run reused a cached result.
    assert_eq!(engine.cache().hits(), 1);
    assert_eq!(engine.cache().misses(), 3);
}

fn versioned_program(f_checksum: &str, with_new: bool) -> Arc<AnalyzedProgram> {
    let mut p = Program::new();
    let f = p.push(Declaration::function("f", &[], None).with_checksum(f_checksum));
    let procedure = p.push(Declaration::procedure("P", Procedure::default()).with_checksum("p-v1"));
    p.push(Declaration::implementation("A", procedure, body(1, Expr::bool(true))).with_checksum("A-v1"));
    p.push(
        Declaration::implementation(
            "B",
            procedure,
            body(2, Expr::eq(Expr::call(f, vec![]), Expr::int(0))),
        )
        .with_checksum("B-v1"),
    );
    p.push(Declaration::implementation("C", procedure, body(3, Expr::bool(true))).with_checksum("C-v1"));
    if with_new {
        p.push(
            Declaration::implementation("D", procedure, body(4, Expr::bool(true)))
                .with_checksum("D-v1"),
        );
    }
    Arc::new(AnalyzedProgram::new(p))
}

#[tokio::test]
async fn cache_priority_orders_selection() {
    let mock = MockVerifier::default();
    let out = CapturedOutput::new();
    let engine = engine(
        ExecutionOptions {
            cache_mode: CacheMode::On,
            ..options()
        },
        mock.clone(),
        &out,
    );
    engine
        .verify_program(versioned_program("f-v1", false))
        .await
        .expect("first");

    let changed = versioned_program("f-v2", true);
    let order = engine.select_implementations(&changed);
    assert_eq!(names(&changed, &order), vec!["A", "C", "B", "D"]);

    engine.verify_program(changed).await.expect("second");
    assert_eq!(mock.calls("A"), 1);
    assert_eq!(mock.calls("B"), 2);
    assert_eq!(mock.calls("D"), 1);
}

#[tokio::test]
async fn units_receive_pruned_declarations() {
    let mut p = Program::new();
    let f = p.push(Declaration::function("f", &[], None));
    let g = p.push(Declaration::function("g", &[], None));
    let ax_g = p.push(Declaration::axiom(
        "ax_g",
        Expr::eq(Expr::call(g, vec![]), Expr::int(1)),
    ));
    let procedure = p.push(Declaration::procedure("P", Procedure::default()));
    p.push(Declaration::implementation(
        "A",
        procedure,
        body(1, Expr::eq(Expr::call(f, vec![]), Expr::int(0))),
    ));
    let program = Arc::new(AnalyzedProgram::new(p));

    let mock = MockVerifier::default();
    let out = CapturedOutput::new();
    let pruning = engine(options(), mock.clone(), &out);
    pruning.verify_program(program.clone()).await.expect("pruned run");
    let kept = mock.declarations("A");
    assert!(kept.contains(&f));
    assert!(kept.contains(&procedure));
    assert!(!kept.contains(&g));
    assert!(!kept.contains(&ax_g));

    let unpruned = MockVerifier::default();
    let plain = engine(ExecutionOptions { prune: false, ..options() }, unpruned.clone(), &out);
    plain.verify_program(program.clone()).await.expect("plain run");
    assert_eq!(unpruned.declarations("A").len(), program.program().len());
}

#[test]
fn blocking_run_with_fallback_verifier() {
    let out = CapturedOutput::new();
    let engine = ExecutionEngine::builder(options(), NoSolverVerifier)
        .output(out.sink())
        .build()
        .expect("engine");

    let report = engine
        .verify_program_blocking(program_with(&["A"]))
        .expect("batch");

    assert_eq!(report.outcome, PipelineOutcome::VerificationCompleted);
    let text = out.contents();
    assert!(text.contains("Verification inconclusive (A)"));
    assert!(text.contains("prova finished with 0 verified, 0 errors, 1 inconclusive"));
}
