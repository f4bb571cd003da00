//! Test and test suite contracts
//!
//! A [`Test`] only identifies what to run; the owning [`TestSuite`] knows how
//! to run it and how to present its result in the HTML report.
//!
//! # Example
//!
//! ```no_run
//! use goldenrun::report::ReportStore;
//! use goldenrun::suite::{Test, TestSuite};
//! use goldenrun::{Error, Result};
//!
//! struct Answer(u32);
//!
//! impl Test for Answer {
//!     fn name(&self) -> String {
//!         format!("answer_{}", self.0)
//!     }
//! }
//!
//! struct AnswerSuite;
//!
//! impl TestSuite for AnswerSuite {
//!     type Test = Answer;
//!
//!     fn tests(&self) -> Vec<Answer> {
//!         vec![Answer(42), Answer(7)]
//!     }
//!
//!     fn run_test(&mut self, _report: &ReportStore, test: &Answer) -> Result<()> {
//!         if test.0 == 42 {
//!             Ok(())
//!         } else {
//!             Err(Error::test_failure("not the answer"))
//!         }
//!     }
//! }
//! ```

use crate::error::Result;
use crate::report::ReportStore;

/// Identifying record of a single test.
pub trait Test {
    /// Name shown in run logs and used for the test's report directory
    fn name(&self) -> String;
}

/// A named group of tests sharing setup, teardown and comparison policy.
pub trait TestSuite {
    /// Kind of test this suite enumerates
    type Test: Test;

    /// Name shown in run logs; defaults to the concrete type's name.
    fn name(&self) -> String {
        short_type_name::<Self>().to_string()
    }

    /// Prepare the suite before any of its tests run.
    ///
    /// An error here aborts the whole run.
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release suite resources after all its tests ran.
    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }

    /// Tests to run, in order. An empty list excludes the suite from the run.
    fn tests(&self) -> Vec<Self::Test>;

    /// Run one test. A returned error marks the test as failed.
    fn run_test(&mut self, report: &ReportStore, test: &Self::Test) -> Result<()>;

    /// `<tr>` header row of the suite's report table
    fn render_table_header(&self) -> String {
        "<tr><th>Test</th><th width=\"5%\">Result</th></tr>".to_string()
    }

    /// `<tr>` row describing one test result
    fn render_result_row(&self, _report: &ReportStore, test: &Self::Test, passed: bool) -> String {
        let (class, label) = result_labels(passed);
        format!(
            "<tr class=\"{}\"><td>{}</td><td><b>{}</b></td></tr>",
            class,
            escape_html(&test.name()),
            label
        )
    }
}

/// Convert a suite or test name into a filesystem-safe name.
///
/// Every character that is not alphanumeric becomes `_`.
pub fn name_to_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// CSS class and label for a result
pub fn result_labels(passed: bool) -> (&'static str, &'static str) {
    if passed {
        ("passed", "PASSED")
    } else {
        ("failed", "FAILED")
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Strip generic arguments before taking the last path segment.
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
