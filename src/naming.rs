//! Deterministic log file naming.
//!
//! The capture hook and the reporter never talk to each other while tests
//! run. They agree on where a test's console output lives purely by deriving
//! the same path from the same test identity, so everything in here has to
//! stay stable across processes.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

/// Prefix of every captured log file.
///
/// Other tooling may glob for these files, keep it stable.
pub const LOG_FILE_PREFIX: &str = "vitest-untangle.";

/// Extension of every captured log file, including the dot.
pub const LOG_FILE_SUFFIX: &str = ".log";

/// Directory log files are written to when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "tmp/";

/// Separator between the segments of a test identity.
pub const NAME_SEPARATOR: &str = " > ";

/// Turn a test identity into a filesystem friendly key.
///
/// Separators collapse to `%` before bare spaces become `_`, so the spaces
/// inside a separator are never replaced on their own.
pub fn identity_key(test_name: &str) -> String {
    test_name.replace(NAME_SEPARATOR, "%").replace(' ', "_")
}

/// Lower-case hex SHA-1 digest of `key`, always 40 characters long.
pub fn content_hash(key: &str) -> String {
    hex::encode(Sha1::digest(key.as_bytes()))
}

/// Path of the log file for the test identified by `test_name`.
pub fn log_file_path(test_name: &str, output_dir: impl AsRef<Path>) -> PathBuf {
    let file_name = format!(
        "{LOG_FILE_PREFIX}{}{LOG_FILE_SUFFIX}",
        content_hash(&identity_key(test_name))
    );
    output_dir.as_ref().join(file_name)
}
