//! The result tree of a finished run.
//!
//! A run produces one [`File`] per test file. Files contain suites and tests,
//! suites nest arbitrarily. Every node may carry a [`TaskResult`].
//!
//! Reporting needs to look at nodes together with their surroundings (the
//! file they live in, the suites enclosing them), so [`suites`] and [`tests`]
//! flatten the tree into [`TaskRef`]s that borrow that context.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::naming::NAME_SEPARATOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pass,
    Fail,
    Skip,
}

/// An error attached to a result.
///
/// The rendered `stack` doubles as the error signature: two errors with the
/// same stack text are considered the same failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    pub message: String,
    pub stack: Option<String>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(self, stack: impl Into<String>) -> Self {
        Self {
            stack: Some(stack.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub state: TaskState,
    pub errors: Vec<TaskError>,
    pub duration: Duration,
}

impl TaskResult {
    pub fn passed(duration: Duration) -> Self {
        Self {
            state: TaskState::Pass,
            errors: Vec::new(),
            duration,
        }
    }

    pub fn failed(errors: Vec<TaskError>, duration: Duration) -> Self {
        Self {
            state: TaskState::Fail,
            errors,
            duration,
        }
    }

    pub fn skipped() -> Self {
        Self {
            state: TaskState::Skip,
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Result of a container derived from its own errors and its children.
    pub fn aggregate<'a>(
        errors: Vec<TaskError>,
        children: impl IntoIterator<Item = &'a Task>,
        duration: Duration,
    ) -> Self {
        let mut any_failed = false;
        let mut all_skipped = true;
        let mut any_child = false;
        for child in children {
            any_child = true;
            match child.result().map(|result| result.state) {
                Some(TaskState::Fail) => any_failed = true,
                Some(TaskState::Skip) => (),
                Some(TaskState::Pass) | None => all_skipped = false,
            }
        }

        let state = match (errors.is_empty(), any_failed, any_child && all_skipped) {
            (false, _, _) | (true, true, _) => TaskState::Fail,
            (true, false, true) => TaskState::Skip,
            (true, false, false) => TaskState::Pass,
        };

        Self {
            state,
            errors,
            duration,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskMeta {
    pub fail_screenshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    pub name: String,
    pub result: Option<TaskResult>,
    pub meta: TaskMeta,
}

impl Test {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: None,
            meta: TaskMeta::default(),
        }
    }

    pub fn with_result(self, result: TaskResult) -> Self {
        Self {
            result: Some(result),
            ..self
        }
    }

    pub fn with_fail_screenshot(self, path: impl Into<PathBuf>) -> Self {
        Self {
            meta: TaskMeta {
                fail_screenshot_path: Some(path.into()),
            },
            ..self
        }
    }
}

/// A suite of tasks, an empty name marks an anonymous suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub result: Option<TaskResult>,
    pub tasks: Vec<Task>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_result(self, result: TaskResult) -> Self {
        Self {
            result: Some(result),
            ..self
        }
    }

    pub fn with_task(mut self, task: impl Into<Task>) -> Self {
        self.tasks.push(task.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Suite(Suite),
    Test(Test),
}

impl Task {
    pub fn name(&self) -> &str {
        match self {
            Task::Suite(suite) => &suite.name,
            Task::Test(test) => &test.name,
        }
    }

    pub fn result(&self) -> Option<&TaskResult> {
        match self {
            Task::Suite(suite) => suite.result.as_ref(),
            Task::Test(test) => test.result.as_ref(),
        }
    }
}

impl From<Suite> for Task {
    fn from(value: Suite) -> Self {
        Task::Suite(value)
    }
}

impl From<Test> for Task {
    fn from(value: Test) -> Self {
        Task::Test(value)
    }
}

/// A test file, the root of every task tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Name of the file, usually relative to the project root.
    pub name: String,
    /// Absolute path of the file.
    pub filepath: PathBuf,
    pub project_name: Option<String>,
    pub result: Option<TaskResult>,
    pub tasks: Vec<Task>,
}

impl File {
    pub fn new(name: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            filepath: filepath.into(),
            project_name: None,
            result: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_project(self, project_name: impl Into<String>) -> Self {
        Self {
            project_name: Some(project_name.into()),
            ..self
        }
    }

    pub fn with_result(self, result: TaskResult) -> Self {
        Self {
            result: Some(result),
            ..self
        }
    }

    pub fn with_task(mut self, task: impl Into<Task>) -> Self {
        self.tasks.push(task.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TaskKind<'a> {
    File,
    Suite(&'a Suite),
    Test(&'a Test),
}

/// A node of the result tree together with the file it belongs to and the
/// names of its enclosing, non-anonymous suites (outermost first).
#[derive(Debug, Clone)]
pub struct TaskRef<'a> {
    pub file: &'a File,
    pub suites: Vec<&'a str>,
    pub kind: TaskKind<'a>,
}

impl<'a> TaskRef<'a> {
    pub fn name(&self) -> &'a str {
        match self.kind {
            TaskKind::File => self.file.name.as_str(),
            TaskKind::Suite(suite) => suite.name.as_str(),
            TaskKind::Test(test) => test.name.as_str(),
        }
    }

    pub fn result(&self) -> Option<&'a TaskResult> {
        match self.kind {
            TaskKind::File => self.file.result.as_ref(),
            TaskKind::Suite(suite) => suite.result.as_ref(),
            TaskKind::Test(test) => test.result.as_ref(),
        }
    }

    pub fn errors(&self) -> &'a [TaskError] {
        self.result()
            .map(|result| result.errors.as_slice())
            .unwrap_or_default()
    }

    /// Project of the task, empty if the file has none.
    pub fn project_name(&self) -> &'a str {
        self.file.project_name.as_deref().unwrap_or_default()
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, TaskKind::File)
    }

    pub fn is_test(&self) -> bool {
        matches!(self.kind, TaskKind::Test(_))
    }

    pub fn fail_screenshot_path(&self) -> Option<&'a Path> {
        match self.kind {
            TaskKind::Test(test) => test.meta.fail_screenshot_path.as_deref(),
            TaskKind::File | TaskKind::Suite(_) => None,
        }
    }

    /// Names from the file down to this task, the file given by its name.
    pub fn names(&self) -> Vec<&'a str> {
        match self.kind {
            TaskKind::File => vec![self.file.name.as_str()],
            TaskKind::Suite(_) | TaskKind::Test(_) => std::iter::once(self.file.name.as_str())
                .chain(self.suites.iter().copied())
                .chain(std::iter::once(self.name()))
                .collect(),
        }
    }

    /// Names from the file down to this task, the file given by its absolute
    /// path.
    ///
    /// Joined with [`NAME_SEPARATOR`] this is the identity the capture hook
    /// used to name the task's log file.
    pub fn names_with_abs_path(&self) -> Vec<Cow<'a, str>> {
        match self.kind {
            TaskKind::File => vec![Cow::Borrowed(self.file.name.as_str())],
            TaskKind::Suite(_) | TaskKind::Test(_) => {
                std::iter::once(self.file.filepath.to_string_lossy())
                    .chain(self.suites.iter().map(|name| Cow::Borrowed(*name)))
                    .chain(std::iter::once(Cow::Borrowed(self.name())))
                    .collect()
            }
        }
    }

    pub fn identity(&self) -> String {
        self.names_with_abs_path().join(NAME_SEPARATOR)
    }
}

/// All files and their nested suites, depth first.
pub fn suites(files: &[File]) -> Vec<TaskRef<'_>> {
    let mut out = Vec::new();
    for file in files {
        out.push(TaskRef {
            file,
            suites: Vec::new(),
            kind: TaskKind::File,
        });
        walk(file, &file.tasks, &mut Vec::new(), &mut |task| {
            if let TaskKind::Suite(_) = task.kind {
                out.push(task);
            }
        });
    }
    out
}

/// All tests of all files, depth first.
pub fn tests(files: &[File]) -> Vec<TaskRef<'_>> {
    let mut out = Vec::new();
    for file in files {
        walk(file, &file.tasks, &mut Vec::new(), &mut |task| {
            if let TaskKind::Test(_) = task.kind {
                out.push(task);
            }
        });
    }
    out
}

fn walk<'a>(
    file: &'a File,
    tasks: &'a [Task],
    enclosing: &mut Vec<&'a str>,
    visit: &mut impl FnMut(TaskRef<'a>),
) {
    for task in tasks {
        match task {
            Task::Test(test) => visit(TaskRef {
                file,
                suites: enclosing.clone(),
                kind: TaskKind::Test(test),
            }),
            Task::Suite(suite) => {
                visit(TaskRef {
                    file,
                    suites: enclosing.clone(),
                    kind: TaskKind::Suite(suite),
                });
                let named = !suite.name.is_empty();
                if named {
                    enclosing.push(&suite.name);
                }
                walk(file, &suite.tasks, enclosing, visit);
                if named {
                    enclosing.pop();
                }
            }
        }
    }
}
