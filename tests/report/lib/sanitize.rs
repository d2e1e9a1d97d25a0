use std::sync::LazyLock;

use regex::Regex;

static THREAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: thread 'something' or thread '<unnamed>'
    Regex::new(r"thread '([^']+)'").unwrap()
});

static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Example matches:
    //   tests\report\main.rs:40:13
    //   tests/report/main.rs:40:13
    Regex::new(r"(?P<path>tests[^\n:]+\.rs):(?P<line>\d+):(?P<col>\d+)").unwrap()
});

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration  \d+\.\d+s").unwrap());

pub fn sanitize_report(input: &str) -> String {
    let tmp = THREAD_RE.replace_all(input, "thread '<thread>'");

    let tmp = PATH_RE.replace_all(tmp.as_ref(), |caps: &regex::Captures| {
        let path = caps["path"].replace('\\', "/");
        format!("{path}:<line>:<col>")
    });

    DURATION_RE
        .replace_all(tmp.as_ref(), "Duration  <duration>")
        .to_string()
}
