use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use owo_colors::OwoColorize;
use tracing::warn;

use crate::{
    aggregate::{self, FailureGroup},
    formatter::{
        DefaultErrorPrinter, DefaultSummary, ErrorPrinter, PrintErrorOptions, RenderContext,
        RunSummary, SummaryRenderer,
        common::{
            color::{ColorSetting, Styles, SupportsColor, format_project_name},
            divider::{columns, divider, error_banner, terminal_columns},
        },
    },
    naming::{self, DEFAULT_OUTPUT_DIR, NAME_SEPARATOR},
    runner::RunReport,
    task::{File, TaskError, TaskRef},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterOptions {
    /// Directory the capture hook wrote the console logs to.
    pub output_dir: PathBuf,
    /// Overrides terminal detection of the target.
    ///
    /// The value is handed to the summary renderer and also decides
    /// [`ColorSetting::Automatic`], so `Some(false)` turns colors off there.
    pub is_tty: Option<bool>,
    pub color: ColorSetting,
    /// Overrides the detected terminal width, still clamped.
    pub columns: Option<usize>,
    /// Base of the file paths shown next to failed tasks.
    pub root: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            is_tty: None,
            color: ColorSetting::default(),
            columns: None,
            root: env::current_dir().ok(),
            verbose: false,
        }
    }
}

impl ReporterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(self, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..self
        }
    }

    pub fn with_tty(self, is_tty: bool) -> Self {
        Self {
            is_tty: Some(is_tty),
            ..self
        }
    }

    pub fn with_color_setting(self, color: impl Into<ColorSetting>) -> Self {
        Self {
            color: color.into(),
            ..self
        }
    }

    pub fn with_columns(self, columns: usize) -> Self {
        Self {
            columns: Some(columns),
            ..self
        }
    }

    pub fn with_root(self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..self
        }
    }

    pub fn with_verbose(self, verbose: bool) -> Self {
        Self { verbose, ..self }
    }
}

/// Prints the failures of a finished run, each followed by the console
/// output the failed test produced.
#[derive(Debug)]
pub struct Reporter<W: io::Write, Summary = DefaultSummary, Errors = DefaultErrorPrinter> {
    target: W,
    options: ReporterOptions,
    summary: Summary,
    error_printer: Errors,
}

impl Default for Reporter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            options: ReporterOptions::default(),
            summary: DefaultSummary,
            error_printer: DefaultErrorPrinter,
        }
    }
}

impl Reporter<io::Stdout> {
    pub fn new(options: ReporterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

impl<W: io::Write, Summary, Errors> Reporter<W, Summary, Errors> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        target: WithTarget,
    ) -> Reporter<WithTarget, Summary, Errors> {
        Reporter {
            target,
            options: self.options,
            summary: self.summary,
            error_printer: self.error_printer,
        }
    }

    pub fn with_options(self, options: ReporterOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_summary<WithSummary: SummaryRenderer>(
        self,
        summary: WithSummary,
    ) -> Reporter<W, WithSummary, Errors> {
        Reporter {
            target: self.target,
            options: self.options,
            summary,
            error_printer: self.error_printer,
        }
    }

    pub fn with_error_printer<WithErrors: ErrorPrinter>(
        self,
        error_printer: WithErrors,
    ) -> Reporter<W, Summary, WithErrors> {
        Reporter {
            target: self.target,
            options: self.options,
            summary: self.summary,
            error_printer,
        }
    }

    pub fn options(&self) -> &ReporterOptions {
        &self.options
    }

    pub fn into_target(self) -> W {
        self.target
    }

    /// `path` relative to the configured root, unchanged outside of it.
    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        self.options
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
    }
}

impl<W, Summary, Errors> Reporter<W, Summary, Errors>
where
    W: io::Write + SupportsColor,
    Summary: SummaryRenderer,
    Errors: ErrorPrinter,
{
    /// Whether the report goes to a terminal, unless overridden by the options.
    pub fn is_tty(&self) -> bool {
        self.options
            .is_tty
            .unwrap_or_else(|| self.target.supports_color())
    }

    /// Return whether this reporter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        match self.options.color {
            ColorSetting::Automatic => self.is_tty(),
            ColorSetting::Always => true,
            ColorSetting::Never => false,
        }
    }

    pub fn report(&mut self, report: &RunReport) -> io::Result<()> {
        self.on_finished(&report.files, &report.errors, report.duration)
    }

    /// Print failed suites, failed tests, run level errors and the summary.
    pub fn on_finished(
        &mut self,
        files: &[File],
        errors: &[TaskError],
        duration: Duration,
    ) -> io::Result<()> {
        let mut styles = Styles::default();
        if self.use_color() {
            styles.colorize();
        }
        let ctx = RenderContext {
            styles: &styles,
            columns: columns(self.options.columns.or_else(terminal_columns)),
            verbose: self.options.verbose,
        };

        let failed_suites = aggregate::failed_suites(files);
        let failed_tests = aggregate::failed_tests(files);
        let mut counter = Counter {
            current: 1,
            total: aggregate::count_errors(&failed_suites) + aggregate::count_errors(&failed_tests),
        };

        if !failed_suites.is_empty() {
            let banner = format!("Failed Suites {}", failed_suites.len());
            writeln!(self.target, "\n{}\n", error_banner(&banner, &styles, ctx.columns))?;
            self.print_task_errors(&failed_suites, &mut counter, &ctx)?;
        }

        if !failed_tests.is_empty() {
            let banner = format!("Failed Tests {}", failed_tests.len());
            writeln!(self.target, "{}\n", error_banner(&banner, &styles, ctx.columns))?;
            self.print_task_errors(&failed_tests, &mut counter, &ctx)?;
        }

        if !errors.is_empty() {
            self.error_printer
                .print_unhandled_errors(&mut self.target, errors, &ctx)?;
            writeln!(self.target)?;
        }

        let summary = RunSummary {
            files,
            errors,
            duration,
            is_tty: self.is_tty(),
        };
        self.summary
            .render_summary(&mut self.target, &summary, &ctx)?;
        self.target.flush()
    }

    fn print_task_errors(
        &mut self,
        tasks: &[TaskRef<'_>],
        counter: &mut Counter,
        ctx: &RenderContext<'_>,
    ) -> io::Result<()> {
        for group in aggregate::group_failures(tasks) {
            self.print_group(&group, ctx)?;

            let label = format!("[{}/{}]", counter.current, counter.total);
            let line = divider(Some(&label), None, Some(1), ctx.columns);
            writeln!(self.target, "{}\n", line.style(ctx.styles.counter))?;
            counter.current += 1;
        }
        Ok(())
    }

    fn print_group(&mut self, group: &FailureGroup<'_>, ctx: &RenderContext<'_>) -> io::Result<()> {
        let styles = ctx.styles;
        for task in &group.tasks {
            let separator = NAME_SEPARATOR.style(styles.dim).to_string();
            let mut name = task.names().join(&separator);
            if task.is_file() || task.is_test() {
                let location = format!(" [ {} ]", self.relative(&task.file.filepath).display());
                name.push_str(&location.style(styles.dim).to_string());
            }
            writeln!(
                self.target,
                "{} {}{name}",
                " FAIL ".style(styles.fail_tag),
                format_project_name(task.project_name(), styles)
            )?;

            if task.is_test() {
                self.print_console_output(task, styles)?;
            }
        }

        let screenshot_paths: Vec<&Path> = group
            .tasks
            .iter()
            .filter_map(|task| task.fail_screenshot_path())
            .collect();
        let first = &group.tasks[0];
        let options = PrintErrorOptions {
            project: Some(first.project_name()).filter(|project| !project.is_empty()),
            screenshot_paths: &screenshot_paths,
            task: Some(first),
        };
        self.error_printer
            .print_error(&mut self.target, group.error, options, ctx)
    }

    fn print_console_output(&mut self, task: &TaskRef<'_>, styles: &Styles) -> io::Result<()> {
        let path = naming::log_file_path(&task.identity(), &self.options.output_dir);
        match fs::read_to_string(&path) {
            Ok(data) => {
                writeln!(self.target, "Console output: ")?;
                writeln!(self.target, "{data}")
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "could not read console log");
                let message = format!(
                    "Error reading console log output file, the console capture hook must be installed: {err}"
                );
                writeln!(self.target, "{}", message.style(styles.error))
            }
        }
    }
}

struct Counter {
    current: usize,
    total: usize,
}
