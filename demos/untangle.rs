use std::{num::NonZeroUsize, process::Termination, thread, time::Duration};

use tracing_subscriber::EnvFilter;
use untangle::{prelude::*, println};

fn slow_add(a: u32, b: u32) -> u32 {
    println!("adding {a} and {b}");
    thread::sleep(Duration::from_millis(u64::from(a) * 10));
    a + b
}

fn files() -> Vec<FileDef> {
    let cwd = std::env::current_dir().unwrap_or_default();
    vec![
        FileDef::new("demos/math.rs", cwd.join("demos/math.rs"))
            .with_project("math")
            .with_task(TestDef::new("adds small numbers", || {
                assert_eq!(slow_add(1, 2), 3)
            }))
            .with_task(
                SuiteDef::new("carry")
                    .with_task(TestDef::new("adds with carry", || {
                        assert_eq!(slow_add(5, 6), 12, "off by one")
                    }))
                    .with_task(TestDef::new("adds bigger numbers", || {
                        assert_eq!(slow_add(7, 8), 16, "off by one")
                    })),
            ),
        FileDef::new("demos/io.rs", cwd.join("demos/io.rs"))
            .with_project("io")
            .with_task(
                SuiteDef::new("database")
                    .with_before_all(|| Err::<(), _>("connection refused"))
                    .with_task(TestDef::new("reads rows", || ())),
            )
            .with_task(
                TestDef::new("renders page", || {
                    println!("rendering /index.html");
                    Err::<(), _>("page did not load")
                })
                .with_fail_screenshot("tmp/renders-page.png"),
            ),
    ]
}

fn main() -> impl Termination {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("UNTANGLE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let report = Runner::default()
        .with_thread_count(const { NonZeroUsize::new(2).unwrap() })
        .with_test_scope_factory(setup(SetupConfig::new()))
        .run(&files());

    if let Err(err) = Reporter::default().report(&report) {
        std::eprintln!("failed to print report: {err}");
    }
    report
}
