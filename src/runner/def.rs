//! Definitions of the tests a [`Runner`](super::Runner) executes.

use std::{panic::RefUnwindSafe, path::PathBuf};

use crate::body::{IntoTestResult, TestBody};

#[derive(Debug)]
pub struct FileDef {
    /// Name of the file as shown in reports, usually relative to the root.
    pub name: String,
    /// Absolute path of the file, part of every test identity.
    pub filepath: PathBuf,
    pub project_name: Option<String>,
    pub tasks: Vec<TaskDef>,
}

impl FileDef {
    pub fn new(name: impl Into<String>, filepath: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            filepath: filepath.into(),
            project_name: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_project(self, project_name: impl Into<String>) -> Self {
        Self {
            project_name: Some(project_name.into()),
            ..self
        }
    }

    pub fn with_task(mut self, task: impl Into<TaskDef>) -> Self {
        self.tasks.push(task.into());
        self
    }
}

#[derive(Debug)]
pub enum TaskDef {
    Suite(SuiteDef),
    Test(TestDef),
}

impl From<SuiteDef> for TaskDef {
    fn from(value: SuiteDef) -> Self {
        TaskDef::Suite(value)
    }
}

impl From<TestDef> for TaskDef {
    fn from(value: TestDef) -> Self {
        TaskDef::Test(value)
    }
}

#[derive(Debug, Default)]
pub struct SuiteDef {
    pub name: String,
    /// Runs once before the tests of the suite, a failure skips all of them.
    pub before_all: Option<TestBody>,
    pub tasks: Vec<TaskDef>,
}

impl SuiteDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_before_all<F, T>(self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + RefUnwindSafe + 'static,
        T: IntoTestResult,
    {
        Self {
            before_all: Some(TestBody::new(f)),
            ..self
        }
    }

    pub fn with_task(mut self, task: impl Into<TaskDef>) -> Self {
        self.tasks.push(task.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct TestDef {
    pub name: String,
    pub body: TestBody,
    pub skip: bool,
    /// Attached to the result when the test fails.
    pub fail_screenshot_path: Option<PathBuf>,
}

impl TestDef {
    pub fn new<F, T>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + RefUnwindSafe + 'static,
        T: IntoTestResult,
    {
        Self {
            name: name.into(),
            body: TestBody::new(f),
            ..Default::default()
        }
    }

    pub fn skipped(self) -> Self {
        Self { skip: true, ..self }
    }

    pub fn with_fail_screenshot(self, path: impl Into<PathBuf>) -> Self {
        Self {
            fail_screenshot_path: Some(path.into()),
            ..self
        }
    }
}
