//! Per test scoping hooks.
//!
//! This module defines the small abstraction the runner uses to run lifecycle
//! hooks before and after each test, without having to replace the runner.

use std::{error::Error, path::PathBuf};

use crate::task::TaskResult;

pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// What the host knows about the test that is about to run.
///
/// Both fields are optional, a host may run code outside of any test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestState {
    /// Absolute path of the file the test lives in.
    pub test_path: Option<PathBuf>,
    /// Named enclosing suites and the test name, joined by `" > "`.
    pub current_test_name: Option<String>,
}

/// Per test lifecycle hooks.
///
/// A scope instance is created for a single test and is used for both the
/// [`before_test`](Self::before_test) and [`after_test`](Self::after_test)
/// call of that test.
///
/// An error from `before_test` fails the test without running it.
/// `after_test` is called regardless, also when the test failed or panicked,
/// so resources acquired in `before_test` are always released.
pub trait TestScope {
    fn before_test(&mut self, state: &TestState) -> Result<(), BoxError> {
        let _ = state;
        Ok(())
    }

    fn after_test(&mut self, state: &TestState, result: &TaskResult) -> Result<(), BoxError> {
        let _ = (state, result);
        Ok(())
    }
}

/// Factory for creating [`TestScope`] instances, one per test.
pub trait TestScopeFactory {
    /// The scope type produced by this factory, it may borrow from the factory.
    type Scope<'f>: TestScope + 'f
    where
        Self: 'f;

    fn make_scope(&self) -> Self::Scope<'_>;
}

/// A [`TestScope`] that does nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NoScope;

impl TestScope for NoScope {}

/// A [`TestScopeFactory`] that always produces [`NoScope`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NoScopeFactory;

impl TestScopeFactory for NoScopeFactory {
    type Scope<'f>
        = NoScope
    where
        Self: 'f;

    fn make_scope(&self) -> Self::Scope<'_> {
        NoScope
    }
}
