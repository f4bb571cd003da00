//! Persistent report store
//!
//! Each suite owns one directory under the report root holding a
//! `result.json` document and one sub-directory of artifacts per test:
//!
//! ```text
//! <root>/report.html
//! <root>/<suite_dir>/report.html
//! <root>/<suite_dir>/result.json
//! <root>/<suite_dir>/<test_dir>/{actual,reference,difference}.png
//! ```
//!
//! The JSON document is the source of truth. It is re-read before every
//! append and replaced through a temporary file plus rename, so a concurrent
//! reader sees either the old or the new document and never a torn write.
//! Processes writing different suites never touch the same file.
//!
//! When no root is configured every operation is a no-op.

pub mod html;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::Result;
use crate::suite::{name_to_filename, Test, TestSuite};

/// Name of the per-suite result document
pub const RESULT_FILE_NAME: &str = "result.json";
/// Name of every generated HTML page
pub const REPORT_FILE_NAME: &str = "report.html";

/// Current schema version of [`SuiteResult`] documents
pub const RESULT_VERSION: u32 = 1;

fn default_version() -> u32 {
    RESULT_VERSION
}

/// Outcome of a single test as persisted in a suite document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    /// `<tr>` row rendered by the suite when the test finished
    pub report_html: String,
}

/// Persisted state of a suite: AND of all test results plus the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResult {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub tests: Vec<TestResult>,
}

impl SuiteResult {
    /// A fresh, passing suite document with no results
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: RESULT_VERSION,
            name: name.into(),
            passed: true,
            tests: Vec::new(),
        }
    }

    /// Append a result and fold it into the suite state.
    pub fn push(&mut self, result: TestResult) {
        self.passed = self.passed && result.passed;
        self.tests.push(result);
    }
}

/// A suite registered in the current process.
#[derive(Debug, Clone)]
struct RegisteredSuite {
    name: String,
    dir: PathBuf,
    header: String,
}

/// Report context shared by the runner and every suite call.
#[derive(Debug, Default)]
pub struct ReportStore {
    root: Option<PathBuf>,
    suites: Vec<RegisteredSuite>,
}

impl ReportStore {
    /// Create a store writing under `root`, or a disabled store for `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            suites: Vec::new(),
        }
    }

    /// A store which records nothing.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Ensure the report root exists.
    pub fn setup(&self) -> Result<()> {
        if let Some(root) = &self.root {
            fs::create_dir_all(root)?;
            debug!(root = %root.display(), "report root ready");
        }
        Ok(())
    }

    /// Path of the overview page, when reporting is enabled.
    pub fn report_path(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(REPORT_FILE_NAME))
    }

    // ------------------------------------------------------------------------
    // Directory layout
    // ------------------------------------------------------------------------

    /// Directory holding a suite's report, relative to the root
    pub fn suite_relative_dir(suite_name: &str) -> PathBuf {
        PathBuf::from(name_to_filename(suite_name))
    }

    /// Directory holding a suite's report
    pub fn suite_dir(&self, suite_name: &str) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(Self::suite_relative_dir(suite_name)))
    }

    /// Directory holding a test's artifacts, relative to its suite directory
    pub fn test_data_relative_dir<T: Test + ?Sized>(&self, test: &T) -> PathBuf {
        PathBuf::from(name_to_filename(&test.name()))
    }

    /// Directory holding a test's artifacts
    pub fn test_data_dir<S, T>(&self, suite: &S, test: &T) -> Option<PathBuf>
    where
        S: TestSuite + ?Sized,
        T: Test + ?Sized,
    {
        self.suite_dir(&suite.name())
            .map(|dir| dir.join(self.test_data_relative_dir(test)))
    }

    // ------------------------------------------------------------------------
    // Registration and results
    // ------------------------------------------------------------------------

    /// Register a suite for this run, wiping results left by earlier runs.
    pub fn register_suite<S: TestSuite + ?Sized>(&mut self, suite: &S) -> Result<()> {
        let name = suite.name();
        let Some(dir) = self.suite_dir(&name) else {
            return Ok(());
        };

        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        info!(suite = %name, dir = %dir.display(), "registered suite");

        self.suites.push(RegisteredSuite {
            name,
            dir,
            header: suite.render_table_header(),
        });
        Ok(())
    }

    /// Append the outcome of `test` to its suite's result document.
    pub fn record_test_result<S: TestSuite + ?Sized>(
        &self,
        suite: &S,
        test: &S::Test,
        passed: bool,
    ) -> Result<()> {
        let name = suite.name();
        let Some(dir) = self.suite_dir(&name) else {
            return Ok(());
        };

        let mut result = read_suite_result(&dir)?.unwrap_or_else(|| SuiteResult::new(&name));
        result.push(TestResult {
            name: test.name(),
            passed,
            report_html: suite.render_result_row(self, test, passed),
        });
        write_suite_result(&dir, &result)
    }

    /// Read back the current document of a suite, if one was written.
    pub fn suite_result(&self, suite_name: &str) -> Result<Option<SuiteResult>> {
        match self.suite_dir(suite_name) {
            Some(dir) => read_suite_result(&dir),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------------
    // HTML generation
    // ------------------------------------------------------------------------

    /// Regenerate the overview page and the pages of this run's suites.
    pub fn finalize(&self) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let all_results = gather_suite_results(root)?;
        fs::write(root.join(REPORT_FILE_NAME), html::render_overview(&all_results))?;
        info!(
            root = %root.display(),
            suites = all_results.len(),
            "wrote report overview"
        );

        for suite in &self.suites {
            let result = read_suite_result(&suite.dir)?
                .unwrap_or_else(|| SuiteResult::new(&suite.name));
            let page = html::render_suite_page(&suite.name, &suite.header, &result);
            fs::write(suite.dir.join(REPORT_FILE_NAME), page)?;
            debug!(suite = %suite.name, "wrote suite report");
        }
        Ok(())
    }
}

/// Read `<dir>/result.json`; `None` when the suite has no document yet.
pub fn read_suite_result(dir: &Path) -> Result<Option<SuiteResult>> {
    let path = dir.join(RESULT_FILE_NAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    debug!(path = %path.display(), "read suite result");
    Ok(Some(serde_json::from_str(&text)?))
}

/// Atomically replace `<dir>/result.json` with `result`.
pub fn write_suite_result(dir: &Path, result: &SuiteResult) -> Result<()> {
    let path = dir.join(RESULT_FILE_NAME);

    // The temporary file must live in the same directory for the rename to
    // stay on one filesystem.
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut tmp, result)?;
    tmp.flush()?;
    tmp.persist(&path).map_err(|e| e.error)?;

    debug!(path = %path.display(), tests = result.tests.len(), "wrote suite result");
    Ok(())
}

fn gather_suite_results(root: &Path) -> Result<Vec<SuiteResult>> {
    let mut results = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(result) = read_suite_result(&entry.path())? {
            results.push(result);
        }
    }
    results.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(results)
}
