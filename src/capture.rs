//! Redirect console output of a test into its own log file.
//!
//! Every worker thread has a console slot. While a [`LogStream`] is installed
//! in it, the crate's [`print!`](crate::print), [`println!`](crate::println),
//! [`eprint!`](crate::eprint), [`eprintln!`](crate::eprintln) and
//! [`dbg!`](crate::dbg) macros write into that stream instead of the
//! terminal. Without a stream they behave like their `std` counterparts.
//!
//! The stream for a test is opened by [`before_each_listener`] and closed by
//! [`after_each_listener`]. Its location is derived from the test identity
//! with [`log_file_path`](crate::naming::log_file_path), the reporter later
//! derives the same path to print the output next to the failure.

use std::{
    cell::RefCell,
    fmt, fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use thiserror::Error;
use tracing::debug;

use crate::{
    naming::{self, DEFAULT_OUTPUT_DIR, NAME_SEPARATOR},
    scope::{BoxError, TestScope, TestScopeFactory, TestState},
    task::TaskResult,
};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to create console log directory `{}`", .dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open console log file `{}`", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A shared handle to an open console log file.
///
/// Clones refer to the same file. Once [`end`](Self::end) was called, further
/// writes are discarded.
#[derive(Debug, Clone)]
pub struct LogStream {
    path: PathBuf,
    writer: Arc<Mutex<Option<BufWriter<fs::File>>>>,
}

impl LogStream {
    /// Create (or truncate) the file at `path`, creating missing directories.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let path = path.into();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|source| CaptureError::CreateDir {
                dir: dir.to_path_buf(),
                source,
            })?;
        }

        let file = fs::File::create(&path).map_err(|source| CaptureError::Open {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "opened console log");

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        match self.lock()?.as_mut() {
            Some(writer) => writer.write_all(buf),
            None => Ok(()),
        }
    }

    /// Format `args`, then write the text.
    ///
    /// Formatting runs before the lock is taken, `Display` impls may print or
    /// panic themselves.
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        let text = fmt::format(args);
        self.write_all(text.as_bytes())
    }

    pub fn is_ended(&self) -> bool {
        self.lock().map(|writer| writer.is_none()).unwrap_or(true)
    }

    /// Flush and close the file. Calling this again does nothing.
    pub fn end(&self) -> io::Result<()> {
        let Some(mut writer) = self.lock()?.take() else {
            return Ok(());
        };
        writer.flush()?;
        debug!(path = %self.path.display(), "closed console log");
        Ok(())
    }

    /// Whether both handles refer to the same opened file.
    pub fn same_stream(&self, other: &LogStream) -> bool {
        Arc::ptr_eq(&self.writer, &other.writer)
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Option<BufWriter<fs::File>>>> {
        self.writer
            .lock()
            .map_err(|_| io::Error::other("poison error"))
    }
}

thread_local! {
    static CONSOLE: RefCell<Option<LogStream>> = const { RefCell::new(None) };
}

/// Install `stream` as this thread's console, returning the replaced one.
pub fn install_console(stream: LogStream) -> Option<LogStream> {
    CONSOLE.with_borrow_mut(|console| console.replace(stream))
}

/// Remove this thread's console, console macros go to the terminal again.
pub fn restore_console() -> Option<LogStream> {
    CONSOLE.with_borrow_mut(Option::take)
}

pub fn current_console() -> Option<LogStream> {
    CONSOLE.with_borrow(Clone::clone)
}

#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

#[doc(hidden)]
pub fn _print(stream: ConsoleStream, args: fmt::Arguments<'_>) {
    // Cloned so the slot is not borrowed while formatting code runs.
    let _ = match current_console() {
        Some(log) => log.write_fmt(args),
        None => match stream {
            ConsoleStream::Stdout => io::stdout().write_fmt(args),
            ConsoleStream::Stderr => io::stderr().write_fmt(args),
        },
    };
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::capture::_print(
            $crate::capture::ConsoleStream::Stdout,
            ::std::format_args!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::capture::_print(
            $crate::capture::ConsoleStream::Stdout,
            ::std::format_args!("{}\n", ::std::format_args!($($arg)*)),
        )
    };
}

#[macro_export]
macro_rules! eprint {
    ($($arg:tt)*) => {
        $crate::capture::_print(
            $crate::capture::ConsoleStream::Stderr,
            ::std::format_args!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! eprintln {
    () => {
        $crate::eprint!("\n")
    };
    ($($arg:tt)*) => {
        $crate::capture::_print(
            $crate::capture::ConsoleStream::Stderr,
            ::std::format_args!("{}\n", ::std::format_args!($($arg)*)),
        )
    };
}

#[macro_export]
macro_rules! dbg {
    () => {
        $crate::eprintln!("[{}:{}:{}]", ::std::file!(), ::std::line!(), ::std::column!())
    };
    ($val:expr $(,)?) => {
        match $val {
            tmp => {
                $crate::eprintln!(
                    "[{}:{}:{}] {} = {:#?}",
                    ::std::file!(),
                    ::std::line!(),
                    ::std::column!(),
                    ::std::stringify!($val),
                    &&tmp as &dyn ::std::fmt::Debug,
                );
                tmp
            }
        }
    };
    ($($val:expr),+ $(,)?) => {
        ($($crate::dbg!($val)),+,)
    };
}

/// Configuration of the capture hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupConfig {
    output_dir: Option<PathBuf>,
}

impl SetupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory to write the log files to, defaults to `tmp/`.
    pub fn with_output_dir(self, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_OUTPUT_DIR))
    }
}

/// Per test context of the capture hook.
#[derive(Debug, Default)]
pub struct CaptureContext {
    pub output_stream: Option<LogStream>,
}

/// Start capturing the console of the test described by `state`.
///
/// Returns `Ok(None)` without touching the console if the state does not
/// name a test.
pub fn capture_console(
    state: &TestState,
    output_dir: impl AsRef<Path>,
) -> Result<Option<LogStream>, CaptureError> {
    let (Some(test_path), Some(test_name)) = (
        state.test_path.as_deref(),
        state.current_test_name.as_deref(),
    ) else {
        return Ok(None);
    };

    let full_test_name = format!("{}{NAME_SEPARATOR}{test_name}", test_path.to_string_lossy());
    let stream = LogStream::create(naming::log_file_path(&full_test_name, output_dir))?;
    install_console(stream.clone());
    Ok(Some(stream))
}

/// To be called before each test.
pub fn before_each_listener(
    ctx: &mut CaptureContext,
    state: &TestState,
    config: &SetupConfig,
) -> Result<(), CaptureError> {
    ctx.output_stream = capture_console(state, config.output_dir())?;
    Ok(())
}

/// To be called after each test, whatever its outcome.
pub fn after_each_listener(ctx: &mut CaptureContext) -> io::Result<()> {
    let Some(stream) = ctx.output_stream.take() else {
        return Ok(());
    };

    CONSOLE.with_borrow_mut(|console| {
        if console
            .as_ref()
            .is_some_and(|current| current.same_stream(&stream))
        {
            *console = None;
        }
    });
    stream.end()
}

/// Create the capture hook for a runner.
pub fn setup(config: SetupConfig) -> ConsoleCapture {
    ConsoleCapture { config }
}

/// [`TestScopeFactory`] that captures the console of every test.
#[derive(Debug, Clone, Default)]
pub struct ConsoleCapture {
    config: SetupConfig,
}

impl ConsoleCapture {
    pub fn config(&self) -> &SetupConfig {
        &self.config
    }
}

#[derive(Debug)]
pub struct ConsoleCaptureScope<'f> {
    config: &'f SetupConfig,
    ctx: CaptureContext,
}

impl TestScopeFactory for ConsoleCapture {
    type Scope<'f>
        = ConsoleCaptureScope<'f>
    where
        Self: 'f;

    fn make_scope(&self) -> Self::Scope<'_> {
        ConsoleCaptureScope {
            config: &self.config,
            ctx: CaptureContext::default(),
        }
    }
}

impl TestScope for ConsoleCaptureScope<'_> {
    fn before_test(&mut self, state: &TestState) -> Result<(), BoxError> {
        before_each_listener(&mut self.ctx, state, self.config)?;
        Ok(())
    }

    fn after_test(&mut self, _: &TestState, _: &TaskResult) -> Result<(), BoxError> {
        after_each_listener(&mut self.ctx)?;
        Ok(())
    }
}

impl Drop for ConsoleCaptureScope<'_> {
    fn drop(&mut self) {
        let _ = after_each_listener(&mut self.ctx);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn state(path: &Path, name: &str) -> TestState {
        TestState {
            test_path: Some(path.to_path_buf()),
            current_test_name: Some(name.to_string()),
        }
    }

    #[test]
    fn no_identity_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let config = SetupConfig::new().with_output_dir(dir.path());
        let mut ctx = CaptureContext::default();

        before_each_listener(&mut ctx, &TestState::default(), &config).unwrap();
        assert!(ctx.output_stream.is_none());
        assert!(current_console().is_none());

        let only_name = TestState {
            test_path: None,
            current_test_name: Some("lonely".into()),
        };
        before_each_listener(&mut ctx, &only_name, &config).unwrap();
        assert!(ctx.output_stream.is_none());

        after_each_listener(&mut ctx).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn console_goes_to_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SetupConfig::new().with_output_dir(dir.path());
        let mut ctx = CaptureContext::default();
        let test_path = Path::new("/work/tests/io.rs");

        before_each_listener(&mut ctx, &state(test_path, "suite > writes"), &config).unwrap();
        let path = ctx.output_stream.as_ref().unwrap().path().to_path_buf();
        assert_eq!(
            path,
            naming::log_file_path("/work/tests/io.rs > suite > writes", dir.path())
        );

        crate::print!("a");
        crate::println!("b {}", 1);
        crate::eprintln!("to stderr");
        after_each_listener(&mut ctx).unwrap();
        assert!(ctx.output_stream.is_none());
        assert!(current_console().is_none());

        assert_eq!(fs::read_to_string(&path).unwrap(), "ab 1\nto stderr\n");
    }

    #[test]
    fn display_may_print_while_captured() {
        struct Chatty;

        impl fmt::Display for Chatty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                crate::println!("inner");
                f.write_str("outer")
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let config = SetupConfig::new().with_output_dir(dir.path());
        let mut ctx = CaptureContext::default();
        before_each_listener(&mut ctx, &state(Path::new("/work/tests/io.rs"), "chatty"), &config)
            .unwrap();

        crate::println!("{}", Chatty);
        let path = ctx.output_stream.as_ref().unwrap().path().to_path_buf();
        after_each_listener(&mut ctx).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "inner\nouter\n");
    }

    #[test]
    fn recapture_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let config = SetupConfig::new().with_output_dir(dir.path());
        let test_state = state(Path::new("/work/tests/io.rs"), "again");

        let mut ctx = CaptureContext::default();
        before_each_listener(&mut ctx, &test_state, &config).unwrap();
        crate::println!("first run with a long line");
        after_each_listener(&mut ctx).unwrap();

        before_each_listener(&mut ctx, &test_state, &config).unwrap();
        crate::println!("second");
        let path = ctx.output_stream.as_ref().unwrap().path().to_path_buf();
        after_each_listener(&mut ctx).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "second\n");
    }

    #[test]
    fn writes_after_end_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let stream = LogStream::create(dir.path().join("nested/out.log")).unwrap();
        stream.write_all(b"kept").unwrap();
        assert!(!stream.is_ended());

        stream.end().unwrap();
        stream.end().unwrap();
        assert!(stream.is_ended());
        stream.write_all(b"dropped").unwrap();

        assert_eq!(fs::read_to_string(stream.path()).unwrap(), "kept");
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let config = SetupConfig::new().with_output_dir(blocker.join("logs"));

        let mut ctx = CaptureContext::default();
        let err = before_each_listener(
            &mut ctx,
            &state(Path::new("/work/tests/io.rs"), "fails"),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, CaptureError::CreateDir { .. }));
        assert!(ctx.output_stream.is_none());
        assert!(current_console().is_none());
    }

    #[test]
    fn scope_releases_stream_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let capture = setup(SetupConfig::new().with_output_dir(dir.path()));

        let stream = {
            let mut scope = capture.make_scope();
            scope
                .before_test(&state(Path::new("/work/tests/io.rs"), "dropped"))
                .unwrap();
            crate::println!("inside");
            current_console().unwrap()
        };

        assert!(stream.is_ended());
        assert!(current_console().is_none());
        assert_eq!(fs::read_to_string(stream.path()).unwrap(), "inside\n");
    }

    #[test]
    fn default_output_dir() {
        assert_eq!(SetupConfig::default().output_dir(), Path::new("tmp/"));
    }
}
