//! Harness configuration
//!
//! [`HarnessConfig`] holds the process-wide knobs (report root, rebaseline
//! toggle) and [`DecoderConfig`] the suite-level paths. Both are plain values
//! handed to the runner and the suites; nothing reads the environment after
//! start-up.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable enabling reference rebaselining
pub const UPDATE_REFERENCE_ENV: &str = "UPDATE_REFERENCE_ON_FAILURE";
/// Environment variable holding the report root directory
pub const REPORT_ROOTDIR_ENV: &str = "GOLDENRUN_REPORT_ROOTDIR";

/// Process-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Report root; `None` disables reporting
    pub report_rootdir: Option<PathBuf>,
    /// Overwrite references instead of failing
    pub update_references: bool,
}

impl HarnessConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let report_rootdir = lookup(REPORT_ROOTDIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let update_references = lookup(UPDATE_REFERENCE_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self {
            report_rootdir,
            update_references,
        }
    }

    /// Apply command line overrides on top of this configuration.
    pub fn with_overrides(mut self, report_rootdir: Option<PathBuf>, update_references: bool) -> Self {
        if report_rootdir.is_some() {
            self.report_rootdir = report_rootdir;
        }
        self.update_references |= update_references;
        self
    }
}

/// Whether an environment flag value means "on".
///
/// Everything except an empty string and `0`/`false`/`no`/`off` (any case)
/// is on.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value.eq_ignore_ascii_case("off"))
}

/// Paths a decoder-driven suite needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Decoder executable under test
    pub decoder: PathBuf,
    /// Fixture directory with `<name>.wav` inputs and `<name>_reference.png`
    pub test_srcdir: PathBuf,
}

impl DecoderConfig {
    pub fn new(decoder: impl Into<PathBuf>, test_srcdir: impl Into<PathBuf>) -> Self {
        Self {
            decoder: decoder.into(),
            test_srcdir: test_srcdir.into(),
        }
    }

    /// Fail unless both the decoder and the fixture directory exist.
    pub fn validate(&self) -> Result<()> {
        if !self.decoder.is_file() {
            return Err(Error::missing_path("Decoder", &self.decoder));
        }
        if !self.test_srcdir.is_dir() {
            return Err(Error::missing_path("Test source directory", &self.test_srcdir));
        }
        Ok(())
    }

    /// Input media of a test
    pub fn input_path(&self, test_name: &str) -> PathBuf {
        self.test_srcdir.join(format!("{}.wav", test_name))
    }

    /// Golden image of a test
    pub fn reference_path(&self, test_name: &str) -> PathBuf {
        self.test_srcdir.join(format!("{}_reference.png", test_name))
    }

    /// Resolve relative paths against `base`.
    pub fn resolved_against(self, base: &Path) -> Self {
        Self {
            decoder: resolve(base, self.decoder),
            test_srcdir: resolve(base, self.test_srcdir),
        }
    }
}

pub(crate) fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
