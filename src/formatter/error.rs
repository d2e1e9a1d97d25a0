use std::{io, path::Path};

use owo_colors::OwoColorize;

use crate::{
    formatter::{
        RenderContext,
        common::divider::{divider, error_banner},
    },
    task::{TaskError, TaskRef},
};

/// Stack lines shown per error unless rendering verbosely.
pub const MAX_STACK_LINES: usize = 10;

/// Context of an error printed for a group of failed tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintErrorOptions<'o> {
    /// Project of the first failed task, `None` outside of projects.
    pub project: Option<&'o str>,
    pub screenshot_paths: &'o [&'o Path],
    /// First task of the group, `None` for errors outside of any task.
    pub task: Option<&'o TaskRef<'o>>,
}

pub trait ErrorPrinter {
    fn print_error(
        &self,
        w: &mut dyn io::Write,
        error: &TaskError,
        options: PrintErrorOptions<'_>,
        ctx: &RenderContext<'_>,
    ) -> io::Result<()>;

    /// Print errors that happened outside of any test.
    fn print_unhandled_errors(
        &self,
        w: &mut dyn io::Write,
        errors: &[TaskError],
        ctx: &RenderContext<'_>,
    ) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorPrinter;

impl ErrorPrinter for DefaultErrorPrinter {
    fn print_error(
        &self,
        w: &mut dyn io::Write,
        error: &TaskError,
        options: PrintErrorOptions<'_>,
        ctx: &RenderContext<'_>,
    ) -> io::Result<()> {
        let styles = ctx.styles;
        writeln!(w, "{}", error.message.style(styles.error_title))?;

        if let Some(stack) = &error.stack {
            let limit = match ctx.verbose {
                true => usize::MAX,
                false => MAX_STACK_LINES,
            };
            for line in stack_frames(stack, &error.message).take(limit) {
                writeln!(w, "{}", line.style(styles.dim))?;
            }
        }

        if !options.screenshot_paths.is_empty() {
            writeln!(w, "{}", "Failure screenshot:".style(styles.dim))?;
            for path in options.screenshot_paths {
                writeln!(w, "  - {}", path.display())?;
            }
        }

        writeln!(w)
    }

    fn print_unhandled_errors(
        &self,
        w: &mut dyn io::Write,
        errors: &[TaskError],
        ctx: &RenderContext<'_>,
    ) -> io::Result<()> {
        let (label, noun) = match errors.len() {
            1 => ("Unhandled Error", "error"),
            _ => ("Unhandled Errors", "errors"),
        };
        writeln!(w, "\n{}", error_banner(label, ctx.styles, ctx.columns))?;
        writeln!(
            w,
            "{}\n",
            format!("Caught {} unhandled {noun} during the test run.", errors.len())
                .style(ctx.styles.error)
        )?;

        for error in errors {
            self.print_error(w, error, PrintErrorOptions::default(), ctx)?;
        }

        write!(
            w,
            "{}",
            divider(None, None, None, ctx.columns).style(ctx.styles.banner)
        )?;
        writeln!(w)
    }
}

/// Lines of `stack` after the ones repeating `message`.
fn stack_frames<'s>(stack: &'s str, message: &str) -> impl Iterator<Item = &'s str> {
    let repeats = |line: &str| {
        !message.is_empty() && (line.contains(message) || message.contains(line))
    };
    let frames = match stack.strip_prefix(message) {
        Some(rest) if !message.is_empty() && (rest.is_empty() || rest.starts_with('\n')) => rest,
        _ => match stack.split_once('\n') {
            Some((first, rest)) if repeats(first) => rest,
            None if repeats(stack) => "",
            _ => stack,
        },
    };
    frames.lines().filter(|line| !line.trim().is_empty())
}
