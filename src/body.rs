use std::{fmt, panic::RefUnwindSafe};

/// Conversion of whatever a test body returns into pass or fail.
pub trait IntoTestResult {
    fn into_test_result(self) -> Result<(), String>;
}

impl IntoTestResult for () {
    fn into_test_result(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: fmt::Debug> IntoTestResult for Result<(), E> {
    fn into_test_result(self) -> Result<(), String> {
        self.map_err(|err| format!("{err:?}"))
    }
}

type BoxedBody = Box<dyn Fn() -> Result<(), String> + Send + Sync + RefUnwindSafe>;

/// The code of a test or of a suite hook.
pub struct TestBody(BoxedBody);

impl TestBody {
    pub fn new<F, T>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + RefUnwindSafe + 'static,
        T: IntoTestResult,
    {
        Self(Box::new(move || f().into_test_result()))
    }

    pub fn call(&self) -> Result<(), String> {
        (self.0)()
    }
}

impl Default for TestBody {
    fn default() -> Self {
        Self::new(|| ())
    }
}

impl fmt::Debug for TestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TestBody(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_convert() {
        assert_eq!(TestBody::default().call(), Ok(()));
        assert_eq!(
            TestBody::new(|| Err::<(), _>("nope")).call(),
            Err(String::from("\"nope\""))
        );
        assert_eq!(TestBody::new(|| Ok::<(), String>(())).call(), Ok(()));
    }
}
