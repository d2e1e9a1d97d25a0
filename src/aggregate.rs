//! Grouping failures by error signature.
//!
//! Repeated failures, like a flaky helper failing the same way in many tests
//! of one project, collapse into a single [`FailureGroup`] that still lists
//! every affected task.

use crate::task::{self, File, TaskError, TaskRef, TaskState};

/// One error and every task that failed with it, in discovery order.
#[derive(Debug, Clone)]
pub struct FailureGroup<'a> {
    pub error: &'a TaskError,
    pub tasks: Vec<TaskRef<'a>>,
}

/// Files and suites that carry at least one error.
pub fn failed_suites(files: &[File]) -> Vec<TaskRef<'_>> {
    task::suites(files)
        .into_iter()
        .filter(|suite| !suite.errors().is_empty())
        .collect()
}

/// Tests in the [`TaskState::Fail`] state.
pub fn failed_tests(files: &[File]) -> Vec<TaskRef<'_>> {
    task::tests(files)
        .into_iter()
        .filter(|test| test.result().map(|result| result.state) == Some(TaskState::Fail))
        .collect()
}

/// Number of individual errors, a task may carry several.
pub fn count_errors(tasks: &[TaskRef<'_>]) -> usize {
    tasks.iter().map(|task| task.errors().len()).sum()
}

/// Group the errors of `tasks` by stack text and project.
///
/// Groups appear in the order their error was first seen. Errors without a
/// stack always start a group of their own.
pub fn group_failures<'a>(tasks: &[TaskRef<'a>]) -> Vec<FailureGroup<'a>> {
    let mut groups: Vec<FailureGroup<'a>> = Vec::new();

    for task in tasks {
        for error in task.errors() {
            let existing = error.stack.as_deref().and_then(|stack| {
                groups.iter_mut().find(|group| {
                    group.error.stack.as_deref() == Some(stack)
                        && group.tasks[0].project_name() == task.project_name()
                })
            });

            match existing {
                Some(group) => group.tasks.push(task.clone()),
                None => groups.push(FailureGroup {
                    error,
                    tasks: vec![task.clone()],
                }),
            }
        }
    }

    groups
}
