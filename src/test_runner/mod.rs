//! Suite runner
//!
//! Drives a single run through `COLLECT → SETUP → RUN → TEARDOWN → REPORT`:
//!
//! - COLLECT happens in [`TestRunner::add_suite`]: suites without tests are
//!   dropped right away.
//! - SETUP prepares the report root, then sets up and registers every suite.
//!   Any error here aborts the run.
//! - RUN executes tests one at a time. A failing test is printed and
//!   recorded, and the run goes on.
//! - TEARDOWN tears the suites down and regenerates the HTML report.
//! - REPORT prints the gtest-style summary.
//!
//! # Example
//!
//! ```no_run
//! use goldenrun::config::DecoderConfig;
//! use goldenrun::reference::{ReferenceImageSuite, ReferenceImageTest};
//! use goldenrun::report::ReportStore;
//! use goldenrun::test_runner::TestRunner;
//!
//! let suite = ReferenceImageSuite::new("PictureSSTV", DecoderConfig::new("sstv_decoder", "data"))
//!     .with_test(ReferenceImageTest::new("PD120").with_mode("PD120"));
//!
//! let mut runner = TestRunner::new(ReportStore::new(Some("report".into())));
//! runner.add_suite(suite);
//! let summary = runner.run().unwrap();
//! std::process::exit(if summary.all_passed() { 0 } else { 1 });
//! ```

pub mod console;

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::Result;
use crate::report::ReportStore;
use crate::suite::{Test, TestSuite};
use console::{suite_word, test_word, Console};

// ---------------------------------------------------------------------------
// Suite erasure
// ---------------------------------------------------------------------------

/// Object-safe view of a suite together with its collected tests.
trait SuiteRun {
    fn name(&self) -> String;
    fn test_names(&self) -> Vec<String>;
    fn setup(&mut self) -> Result<()>;
    fn register(&self, report: &mut ReportStore) -> Result<()>;
    fn run_test(&mut self, report: &ReportStore, index: usize) -> Result<()>;
    fn record_test_result(&self, report: &ReportStore, index: usize, passed: bool) -> Result<()>;
    fn teardown(&mut self) -> Result<()>;
}

struct SuiteEntry<S: TestSuite> {
    suite: S,
    tests: Vec<S::Test>,
}

impl<S: TestSuite> SuiteRun for SuiteEntry<S> {
    fn name(&self) -> String {
        self.suite.name()
    }

    fn test_names(&self) -> Vec<String> {
        self.tests.iter().map(|t| t.name()).collect()
    }

    fn setup(&mut self) -> Result<()> {
        self.suite.setup()
    }

    fn register(&self, report: &mut ReportStore) -> Result<()> {
        report.register_suite(&self.suite)
    }

    fn run_test(&mut self, report: &ReportStore, index: usize) -> Result<()> {
        let test = &self.tests[index];
        self.suite.run_test(report, test)
    }

    fn record_test_result(&self, report: &ReportStore, index: usize, passed: bool) -> Result<()> {
        report.record_test_result(&self.suite, &self.tests[index], passed)
    }

    fn teardown(&mut self) -> Result<()> {
        self.suite.teardown()
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Aggregate statistics of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub num_run_tests: usize,
    pub num_run_suites: usize,
    pub num_passed_tests: usize,
    /// Full `Suite.Test` names of failed tests, in run order
    pub failed_tests: Vec<String>,
    /// Wall-clock time spent running tests
    pub run_time: Duration,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed_tests.is_empty()
    }

    /// Process exit status: 0 when every test passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} test {}: {} passed, {} failed ({} ms)",
            self.num_run_tests,
            test_word(self.num_run_tests),
            self.num_run_suites,
            suite_word(self.num_run_suites),
            self.num_passed_tests,
            self.failed_tests.len(),
            self.run_time.as_millis()
        )
    }
}

// ---------------------------------------------------------------------------
// TestRunner
// ---------------------------------------------------------------------------

/// Runs every collected suite against one report store.
pub struct TestRunner {
    report: ReportStore,
    suites: Vec<Box<dyn SuiteRun>>,
}

impl TestRunner {
    pub fn new(report: ReportStore) -> Self {
        Self {
            report,
            suites: Vec::new(),
        }
    }

    /// Collect a suite. Suites without tests are excluded from the run.
    pub fn add_suite<S: TestSuite + 'static>(&mut self, suite: S) -> &mut Self {
        let tests = suite.tests();
        if tests.is_empty() {
            debug!(suite = %suite.name(), "skipping suite without tests");
            return self;
        }
        self.suites.push(Box::new(SuiteEntry { suite, tests }));
        self
    }

    /// Number of collected suites
    pub fn num_suites(&self) -> usize {
        self.suites.len()
    }

    pub fn report(&self) -> &ReportStore {
        &self.report
    }

    /// Run on stdout, with colors when stdout is a terminal.
    pub fn run(&mut self) -> Result<RunSummary> {
        let stdout = io::stdout();
        let colors = stdout.is_terminal();
        let mut out = stdout.lock();
        self.run_with_output(&mut out, colors)
    }

    /// Run every collected suite, printing progress to `out`.
    ///
    /// Failing tests are part of the returned summary; an `Err` means the run
    /// itself could not complete (suite setup or report persistence failed).
    pub fn run_with_output(&mut self, out: &mut dyn Write, colors: bool) -> Result<RunSummary> {
        let mut console = Console::new(out, colors);
        let mut summary = RunSummary::default();

        let num_tests: usize = self.suites.iter().map(|s| s.test_names().len()).sum();
        let num_suites = self.suites.len();
        console.info_h1(&format!(
            "Running {} {} from {} test {}.",
            num_tests,
            test_word(num_tests),
            num_suites,
            suite_word(num_suites)
        ))?;
        info!(num_tests, num_suites, "starting run");

        self.setup_global_environment(&mut console)?;

        let start = Instant::now();
        for index in 0..self.suites.len() {
            self.run_suite(&mut console, index, &mut summary)?;
        }
        summary.run_time = start.elapsed();

        self.teardown_global_environment(&mut console)?;
        print_run_summary(&mut console, &summary)?;

        if let Some(path) = self.report.report_path() {
            console.line("")?;
            console.line(&format!("Tests report has been saved to {}", path.display()))?;
        }

        info!(%summary, "run finished");
        Ok(summary)
    }

    fn setup_global_environment(&mut self, console: &mut Console<'_>) -> Result<()> {
        console.info_h2("Global test environment set-up.")?;

        self.report.setup()?;
        for suite in &mut self.suites {
            suite.setup()?;
            suite.register(&mut self.report)?;
        }
        Ok(())
    }

    fn teardown_global_environment(&mut self, console: &mut Console<'_>) -> Result<()> {
        console.info_h2("Global test environment tear-down")?;

        for suite in &mut self.suites {
            suite.teardown()?;
        }
        self.report.finalize()
    }

    fn run_suite(&mut self, console: &mut Console<'_>, index: usize, summary: &mut RunSummary) -> Result<()> {
        let suite = &mut self.suites[index];
        let suite_name = suite.name();
        let test_names = suite.test_names();
        let num_tests = test_names.len();

        console.info_h2(&format!("{} {} from {}", num_tests, test_word(num_tests), suite_name))?;
        summary.num_run_suites += 1;

        let start = Instant::now();
        for (test_index, test_name) in test_names.iter().enumerate() {
            let full_name = format!("{}.{}", suite_name, test_name);
            summary.num_run_tests += 1;
            console.run_start(&full_name)?;

            let test_start = Instant::now();
            let outcome = suite.run_test(&self.report, test_index);
            let run_time_ms = test_start.elapsed().as_millis();

            let passed = match outcome {
                Ok(()) => true,
                Err(e) => {
                    console.line(&format!("Failure: {}", e))?;
                    if let Some(output) = e.captured_output() {
                        console.line(output.trim_end())?;
                    }
                    debug!(test = %full_name, category = %e.category(), "test failed");
                    false
                }
            };

            if passed {
                console.run_ok(&format!("{} ({} ms)", full_name, run_time_ms))?;
                summary.num_passed_tests += 1;
            } else {
                console.run_failed(&format!("{} ({} ms)", full_name, run_time_ms))?;
                summary.failed_tests.push(full_name);
            }

            suite.record_test_result(&self.report, test_index, passed)?;
        }

        console.info_h2(&format!(
            "{} {} from {} ({} ms total)",
            num_tests,
            test_word(num_tests),
            suite_name,
            start.elapsed().as_millis()
        ))?;
        console.line("")?;
        Ok(())
    }
}

fn print_run_summary(console: &mut Console<'_>, summary: &RunSummary) -> io::Result<()> {
    console.info_h1(&format!(
        "{} {} from {} test {} ran. ({} ms total)",
        summary.num_run_tests,
        test_word(summary.num_run_tests),
        summary.num_run_suites,
        suite_word(summary.num_run_suites),
        summary.run_time.as_millis()
    ))?;

    let num_passed = summary.num_passed_tests;
    console.passed(&format!("{} {}.", num_passed, test_word(num_passed)))?;

    let num_failed = summary.failed_tests.len();
    if num_failed > 0 {
        console.failed(&format!("{} {}, listed below:", num_failed, test_word(num_failed)))?;
        for name in &summary.failed_tests {
            console.failed(name)?;
        }
        console.line("")?;
        console.line(&format!(
            " {} FAILED {}",
            num_failed,
            test_word(num_failed).to_uppercase()
        ))?;
    }
    Ok(())
}
