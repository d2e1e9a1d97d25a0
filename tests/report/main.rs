use std::{num::NonZeroUsize, path::Path};

use pretty_assertions::assert_eq;
use untangle::{
    formatter::common::divider::visible_width,
    prelude::*,
    println,
    runner::RunReport,
};

mod lib;
use lib::*;

fn files() -> Vec<FileDef> {
    vec![
        FileDef::new("math.rs", "/work/math.rs")
            .with_project("core")
            .with_task(TestDef::new("adds", || {
                println!("1 + 2");
                assert_eq!(1 + 2, 3)
            }))
            .with_task(
                SuiteDef::new("carry")
                    .with_task(TestDef::new("first", || {
                        println!("first says hi");
                        Err::<(), _>("carry lost")
                    }))
                    .with_task(TestDef::new("second", || {
                        println!("second says hi");
                        Err::<(), _>("carry lost")
                    })),
            ),
        FileDef::new("io.rs", "/work/io.rs").with_task(
            SuiteDef::new("db")
                .with_before_all(|| Err::<(), _>("connection refused"))
                .with_task(TestDef::new("reads", || ())),
        ),
        FileDef::new("boom.rs", "/work/boom.rs").with_task(TestDef::new(
            "explodes",
            || -> Result<(), String> { panic!("exploded") },
        )),
    ]
}

fn run(output_dir: Option<&Path>) -> RunReport {
    let runner = Runner::default().with_thread_count(const { NonZeroUsize::new(2).unwrap() });
    match output_dir {
        Some(dir) => runner
            .with_test_scope_factory(setup(SetupConfig::new().with_output_dir(dir)))
            .run(&files()),
        None => runner.run(&files()),
    }
}

fn render(report: &RunReport, options: ReporterOptions) -> String {
    let buffer = Buffer::default();
    Reporter::new(options)
        .with_target(buffer.clone())
        .report(report)
        .unwrap();
    buffer.try_to_string().unwrap()
}

fn options(output_dir: &Path) -> ReporterOptions {
    ReporterOptions::new()
        .with_output_dir(output_dir)
        .with_columns(40)
        .with_root("/work")
}

fn counter(current: usize, total: usize) -> String {
    format!("{}[{current}/{total}]⎯", dashes(34))
}

#[test]
fn failures_come_with_their_console_output() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(Some(dir.path()));
    assert!(!report.passed());
    assert!(report.errors.is_empty());

    let actual = render(
        &report,
        options(dir.path()).with_color_setting(ColorSetting::Never),
    );
    let expected = [
        String::new(),
        format!("{} Failed Suites 1 {}", dashes(11), dashes(12)),
        String::new(),
        " FAIL  io.rs > db".into(),
        "\"connection refused\"".into(),
        String::new(),
        counter(1, 4),
        String::new(),
        format!("{} Failed Tests 3 {}", dashes(12), dashes(12)),
        String::new(),
        " FAIL  |core| math.rs > carry > first [ math.rs ]".into(),
        "Console output: ".into(),
        "first says hi".into(),
        String::new(),
        " FAIL  |core| math.rs > carry > second [ math.rs ]".into(),
        "Console output: ".into(),
        "second says hi".into(),
        String::new(),
        "\"carry lost\"".into(),
        String::new(),
        counter(2, 4),
        String::new(),
        " FAIL  boom.rs > explodes [ boom.rs ]".into(),
        "Console output: ".into(),
        "thread '<thread>' panicked at tests/report/main.rs:<line>:<col>:".into(),
        "exploded".into(),
        String::new(),
        "exploded".into(),
        " ❯ tests/report/main.rs:<line>:<col>".into(),
        String::new(),
        counter(3, 4),
        String::new(),
        String::new(),
        " Test Files  3 failed (3)".into(),
        "      Tests  3 failed | 1 passed | 1 skipped (5)".into(),
        "   Duration  <duration>".into(),
        String::new(),
        String::new(),
    ]
    .join("\n");
    assert_eq!(sanitize_report(&actual), expected);
}

#[test]
fn missing_capture_is_reported_per_test() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(None);

    let actual = render(
        &report,
        options(dir.path()).with_color_setting(ColorSetting::Never),
    );
    let warnings = actual
        .lines()
        .filter(|line| {
            line.starts_with(
                "Error reading console log output file, the console capture hook must be installed: ",
            )
        })
        .count();
    assert_eq!(warnings, 3, "{actual}");
    assert!(!actual.contains("Console output: "), "{actual}");
    assert!(actual.contains(&counter(3, 4)), "{actual}");
}

#[test]
fn colored_lines_keep_their_width() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(Some(dir.path()));

    let actual = render(
        &report,
        options(dir.path()).with_color_setting(ColorSetting::Always),
    );
    assert!(actual.contains('\x1b'), "{actual}");

    let plain = strip_ansi_escapes::strip_str(&actual);
    assert!(plain.contains(" FAIL   core  math.rs > carry > first [ math.rs ]"), "{plain}");

    let dividers: Vec<_> = actual.lines().filter(|line| line.contains('⎯')).collect();
    assert_eq!(dividers.len(), 5);
    for line in dividers {
        assert_eq!(visible_width(line), 40, "{line:?}");
    }
}

#[test]
fn passing_run_only_prints_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let files = [FileDef::new("ok.rs", "/work/ok.rs").with_task(TestDef::new("fine", || ()))];
    let report = Runner::default()
        .with_test_scope_factory(setup(SetupConfig::new().with_output_dir(dir.path())))
        .run(&files);
    assert!(report.passed());

    let actual = render(
        &report,
        options(dir.path()).with_color_setting(ColorSetting::Never),
    );
    assert_eq!(
        sanitize_report(&actual),
        "\n Test Files  1 passed (1)\n      Tests  1 passed (1)\n   Duration  <duration>\n\n"
    );
}
