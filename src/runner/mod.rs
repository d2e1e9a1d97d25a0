//! A small host that executes test definitions and produces the result tree.
//!
//! Files are spread over worker threads, the tests of one file run one after
//! another on the same worker. Every test gets its own [`TestScope`] from the
//! configured [`TestScopeFactory`], which is how console capture hooks in:
//!
//! ```no_run
//! use untangle::{capture::{self, SetupConfig}, runner::{FileDef, Runner, TestDef}};
//!
//! let files = [FileDef::new("math.rs", "/work/tests/math.rs")
//!     .with_task(TestDef::new("adds", || assert_eq!(1 + 1, 2)))];
//!
//! let report = Runner::default()
//!     .with_test_scope_factory(capture::setup(SetupConfig::new()))
//!     .run(&files);
//! assert!(report.passed());
//! ```

use std::{
    cmp,
    error::Error,
    num::NonZeroUsize,
    process::{ExitCode, Termination},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, trace};

use crate::{
    naming::NAME_SEPARATOR,
    scope::{NoScopeFactory, TestScope, TestScopeFactory, TestState},
    task::{self, File, Suite, Task, TaskError, TaskMeta, TaskResult, TaskState, Test},
};

mod def;
pub use def::*;

mod panic;

/// Everything a finished run produced.
#[derive(Debug)]
#[non_exhaustive]
pub struct RunReport {
    pub files: Vec<File>,
    /// Errors that happened outside of any test, e.g. failing after hooks.
    pub errors: Vec<TaskError>,
    pub duration: Duration,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
            && self
                .files
                .iter()
                .all(|file| file.result.as_ref().map(|r| r.state) != Some(TaskState::Fail))
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.passed() {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }
}

impl Termination for RunReport {
    fn report(self) -> ExitCode {
        self.exit_code()
    }
}

#[derive(Debug)]
pub struct Runner<ScopeFactory = NoScopeFactory> {
    threads: NonZeroUsize,
    scope_factory: ScopeFactory,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            scope_factory: NoScopeFactory,
        }
    }
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<ScopeFactory> Runner<ScopeFactory> {
    pub fn with_thread_count(self, count: NonZeroUsize) -> Self {
        Self {
            threads: count,
            ..self
        }
    }

    pub fn with_test_scope_factory<WithScopeFactory: TestScopeFactory>(
        self,
        scope_factory: WithScopeFactory,
    ) -> Runner<WithScopeFactory> {
        Runner {
            threads: self.threads,
            scope_factory,
        }
    }

    pub fn worker_count(&self, file_count: usize) -> NonZeroUsize {
        NonZeroUsize::new(cmp::min(self.threads.get(), file_count)).unwrap_or(NonZeroUsize::MIN)
    }
}

impl<ScopeFactory: TestScopeFactory + Sync> Runner<ScopeFactory> {
    pub fn run(&self, files: &[FileDef]) -> RunReport {
        panic::install_hook();
        let now = Instant::now();
        let worker_count = self.worker_count(files.len());
        debug!(files = files.len(), workers = worker_count.get(), "starting run");

        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        for job in files.iter().enumerate() {
            job_tx.send(job).expect("job receiver is still alive");
        }
        drop(job_tx);

        let (out_tx, out_rx) = crossbeam_channel::unbounded();
        thread::scope(|scope| {
            for _ in 0..worker_count.get() {
                let job_rx = job_rx.clone();
                let out_tx = out_tx.clone();
                scope.spawn(move || {
                    while let Ok((idx, def)) = job_rx.recv() {
                        if out_tx.send((idx, self.run_file(def))).is_err() {
                            // Nobody collects results anymore.
                            return;
                        }
                    }
                });
            }
        });
        drop(out_tx);

        let mut outcomes: Vec<_> = out_rx.iter().collect();
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut report = RunReport {
            files: Vec::with_capacity(outcomes.len()),
            errors: Vec::new(),
            duration: Duration::ZERO,
        };
        for (_, (file, errors)) in outcomes {
            report.files.push(file);
            report.errors.extend(errors);
        }
        report.duration = now.elapsed();

        debug!(
            duration = ?report.duration,
            tests = task::tests(&report.files).len(),
            "finished run"
        );
        report
    }

    fn run_file(&self, def: &FileDef) -> (File, Vec<TaskError>) {
        let now = Instant::now();
        let mut run_errors = Vec::new();
        let mut names = Vec::new();
        let tasks: Vec<Task> = def
            .tasks
            .iter()
            .map(|task| self.run_task(def, task, &mut names, false, &mut run_errors))
            .collect();

        let file = File {
            name: def.name.clone(),
            filepath: def.filepath.clone(),
            project_name: def.project_name.clone(),
            result: Some(TaskResult::aggregate(Vec::new(), &tasks, now.elapsed())),
            tasks,
        };
        (file, run_errors)
    }

    fn run_task<'d>(
        &self,
        file: &'d FileDef,
        def: &'d TaskDef,
        names: &mut Vec<&'d str>,
        skip: bool,
        run_errors: &mut Vec<TaskError>,
    ) -> Task {
        match def {
            TaskDef::Suite(suite) => Task::Suite(self.run_suite(file, suite, names, skip, run_errors)),
            TaskDef::Test(test) => Task::Test(self.run_test(file, test, names, skip, run_errors)),
        }
    }

    fn run_suite<'d>(
        &self,
        file: &'d FileDef,
        def: &'d SuiteDef,
        names: &mut Vec<&'d str>,
        skip: bool,
        run_errors: &mut Vec<TaskError>,
    ) -> Suite {
        let now = Instant::now();
        let mut errors = Vec::new();
        if !skip
            && let Some(before_all) = &def.before_all
            && let Err(err) = panic::run_body(before_all)
        {
            errors.push(err);
        }

        let skip_tasks = skip || !errors.is_empty();
        let named = !def.name.is_empty();
        if named {
            names.push(&def.name);
        }
        let tasks: Vec<Task> = def
            .tasks
            .iter()
            .map(|task| self.run_task(file, task, names, skip_tasks, run_errors))
            .collect();
        if named {
            names.pop();
        }

        let result = match skip {
            true => TaskResult::skipped(),
            false => TaskResult::aggregate(errors, &tasks, now.elapsed()),
        };
        Suite {
            name: def.name.clone(),
            result: Some(result),
            tasks,
        }
    }

    fn run_test(
        &self,
        file: &FileDef,
        def: &TestDef,
        names: &[&str],
        skip: bool,
        run_errors: &mut Vec<TaskError>,
    ) -> Test {
        let test = Test::new(def.name.as_str());
        if skip || def.skip {
            return test.with_result(TaskResult::skipped());
        }

        let mut current_test_name = names.join(NAME_SEPARATOR);
        if !current_test_name.is_empty() {
            current_test_name.push_str(NAME_SEPARATOR);
        }
        current_test_name.push_str(&def.name);
        let state = TestState {
            test_path: Some(file.filepath.clone()),
            current_test_name: Some(current_test_name),
        };
        trace!(file = %file.filepath.display(), test = ?state.current_test_name, "running test");

        let now = Instant::now();
        let mut scope = self.scope_factory.make_scope();
        let outcome = match scope.before_test(&state) {
            Ok(()) => panic::run_body(&def.body),
            Err(err) => Err(TaskError::new(render_error(&*err)).with_stack(err.to_string())),
        };
        let result = match outcome {
            Ok(()) => TaskResult::passed(now.elapsed()),
            Err(err) => TaskResult::failed(vec![err], now.elapsed()),
        };

        if let Err(err) = scope.after_test(&state, &result) {
            run_errors.push(TaskError::new(format!(
                "after hook of {} failed: {}",
                state.current_test_name.as_deref().unwrap_or_default(),
                render_error(&*err)
            )));
        }

        let meta = match result.state {
            TaskState::Fail => TaskMeta {
                fail_screenshot_path: def.fail_screenshot_path.clone(),
            },
            TaskState::Pass | TaskState::Skip => TaskMeta::default(),
        };
        Test {
            meta,
            ..test.with_result(result)
        }
    }
}

/// The error and all of its sources, separated by `": "`.
fn render_error(err: &(dyn Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        rendered.push_str(": ");
        rendered.push_str(&err.to_string());
        source = err.source();
    }
    rendered
}
