use std::{io, time::Duration};

use owo_colors::{OwoColorize, Style};

use crate::{
    formatter::{RenderContext, common::color::Styles},
    task::{self, File, TaskError, TaskState},
};

/// What the summary at the end of a report is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'s> {
    pub files: &'s [File],
    pub errors: &'s [TaskError],
    pub duration: Duration,
    /// Whether the report goes to a terminal.
    pub is_tty: bool,
}

pub trait SummaryRenderer {
    fn render_summary(
        &self,
        w: &mut dyn io::Write,
        summary: &RunSummary<'_>,
        ctx: &RenderContext<'_>,
    ) -> io::Result<()>;
}

/// Count rows for files and tests followed by the run duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSummary;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    failed: usize,
    passed: usize,
    skipped: usize,
    /// Tasks without a result yet.
    pending: usize,
    total: usize,
}

impl FromIterator<Option<TaskState>> for Counts {
    fn from_iter<T: IntoIterator<Item = Option<TaskState>>>(iter: T) -> Self {
        let mut counts = Counts::default();
        for state in iter {
            counts.total += 1;
            match state {
                Some(TaskState::Fail) => counts.failed += 1,
                Some(TaskState::Pass) => counts.passed += 1,
                Some(TaskState::Skip) => counts.skipped += 1,
                None => counts.pending += 1,
            }
        }
        counts
    }
}

impl Counts {
    fn render(&self, styles: &Styles) -> String {
        if self.total == 0 {
            return "no tests".style(styles.dim).to_string();
        }

        let parts: [(usize, &str, Style); 4] = [
            (self.failed, "failed", styles.fail),
            (self.passed, "passed", styles.pass),
            (self.skipped, "skipped", styles.skip),
            (self.pending, "pending", styles.dim),
        ];
        let separator = " | ".style(styles.dim).to_string();
        let counts = parts
            .into_iter()
            .filter(|(count, ..)| *count > 0)
            .map(|(count, label, style)| format!("{count} {label}").style(style).to_string())
            .collect::<Vec<_>>()
            .join(&separator);
        format!("{counts} {}", format!("({})", self.total).style(styles.dim))
    }
}

impl SummaryRenderer for DefaultSummary {
    fn render_summary(
        &self,
        w: &mut dyn io::Write,
        summary: &RunSummary<'_>,
        ctx: &RenderContext<'_>,
    ) -> io::Result<()> {
        let styles = ctx.styles;
        let files: Counts = summary
            .files
            .iter()
            .map(|file| file.result.as_ref().map(|result| result.state))
            .collect();
        let tests: Counts = task::tests(summary.files)
            .iter()
            .map(|test| test.result().map(|result| result.state))
            .collect();

        writeln!(w)?;
        writeln!(w, " Test Files  {}", files.render(styles))?;
        writeln!(w, "      Tests  {}", tests.render(styles))?;
        if !summary.errors.is_empty() {
            let errors = match summary.errors.len() {
                1 => "1 error".to_string(),
                count => format!("{count} errors"),
            };
            writeln!(w, "     Errors  {}", errors.style(styles.fail))?;
        }
        writeln!(
            w,
            "   Duration  {:.2}s",
            summary.duration.as_secs_f64()
        )?;
        writeln!(w)
    }
}
