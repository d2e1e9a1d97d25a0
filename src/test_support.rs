use std::time::Duration;

use crate::task::{File, TaskError, TaskResult, Test};

/// A failed result with one error per stack, the message is the first line.
pub fn failed_with(stacks: &[&str]) -> TaskResult {
    let errors = stacks
        .iter()
        .map(|stack| {
            let message = stack.lines().next().unwrap_or_default();
            TaskError::new(message).with_stack(*stack)
        })
        .collect();
    TaskResult::failed(errors, Duration::ZERO)
}

pub fn failing_test(name: &str, stack: &str) -> Test {
    Test::new(name).with_result(failed_with(&[stack]))
}

pub fn project_file(name: &str, project: &str) -> File {
    File::new(name, format!("/work/{name}")).with_project(project)
}

macro_rules! nonzero {
    (0) => {
        compile_error!("0 is zero")
    };

    ($value:literal) => {
        std::convert::TryFrom::try_from($value).unwrap()
    };
}

pub(crate) use nonzero;
