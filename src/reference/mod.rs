//! Reference image test suites
//!
//! A [`ReferenceImageSuite`] runs an external decoder for each test, loads the
//! image it produced and compares it against `<name>_reference.png` in the
//! fixture directory. With rebaselining enabled, a missing or mismatching
//! reference is replaced by the actual image and the test passes.

pub mod decoder;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::compare::{blank_difference, compare_images, ComparisonPolicy};
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::pixel::PixelImage;
use crate::report::ReportStore;
use crate::suite::{escape_html, result_labels, Test, TestSuite};

/// Artifact holding the decoder output
pub const ACTUAL_ARTIFACT: &str = "actual.png";
/// Artifact holding the reference used for comparison
pub const REFERENCE_ARTIFACT: &str = "reference.png";
/// Artifact holding the normalized difference
pub const DIFFERENCE_ARTIFACT: &str = "difference.png";

/// A single decode-and-compare test.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceImageTest {
    /// Base name of the `<name>.wav` input and `<name>_reference.png` output
    pub name: String,
    /// Decoder mode passed as `--mode`
    pub mode: Option<String>,
    pub policy: ComparisonPolicy,
}

impl ReferenceImageTest {
    /// Create a test using the image comparison policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: None,
            policy: ComparisonPolicy::IMAGE,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_policy(mut self, policy: ComparisonPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Test for ReferenceImageTest {
    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Suite of decoder tests sharing one decoder and one fixture directory.
#[derive(Debug, Clone)]
pub struct ReferenceImageSuite {
    name: String,
    config: DecoderConfig,
    update_references: bool,
    tests: Vec<ReferenceImageTest>,
}

impl ReferenceImageSuite {
    pub fn new(name: impl Into<String>, config: DecoderConfig) -> Self {
        Self {
            name: name.into(),
            config,
            update_references: false,
            tests: Vec::new(),
        }
    }

    /// Replace failing references instead of failing.
    pub fn with_update_references(mut self, update_references: bool) -> Self {
        self.update_references = update_references;
        self
    }

    pub fn with_test(mut self, test: ReferenceImageTest) -> Self {
        self.tests.push(test);
        self
    }

    pub fn with_tests(mut self, tests: impl IntoIterator<Item = ReferenceImageTest>) -> Self {
        self.tests.extend(tests);
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn update_references(&self) -> bool {
        self.update_references
    }

    /// Golden image path of `test`
    pub fn reference_path(&self, test: &ReferenceImageTest) -> PathBuf {
        self.config.reference_path(&test.name)
    }

    /// Compare `actual` against the reference of `test`, rebaselining when
    /// enabled. Diagnostic artifacts go to the test's report directory.
    pub fn check_against_reference(
        &self,
        report: &ReportStore,
        test: &ReferenceImageTest,
        actual: &PixelImage,
    ) -> Result<()> {
        let data_dir = self.artifact_dir(report, test)?;
        let data_dir = data_dir.as_deref();
        let reference_path = self.reference_path(test);

        let reference = match PixelImage::load(&reference_path) {
            Ok(reference) => reference,
            Err(Error::ImageNotFound { .. }) if self.update_references => {
                return self.rebaseline(data_dir, test, actual);
            }
            Err(e) => return Err(e),
        };

        if let Some(dir) = data_dir {
            reference.save(dir.join(REFERENCE_ARTIFACT))?;
        }

        let comparison = match compare_images(actual, &reference, &test.policy) {
            Ok(comparison) => comparison,
            Err(Error::ShapeMismatch { .. }) if self.update_references => {
                return self.rebaseline(data_dir, test, actual);
            }
            Err(e) => return Err(e),
        };

        if let Some(dir) = data_dir {
            comparison.difference.save(dir.join(DIFFERENCE_ARTIFACT))?;
        }

        debug!(
            test = %test.name,
            num_failed = comparison.num_failed,
            num_accepted = comparison.num_accepted_failed,
            max_difference = comparison.max_difference,
            "compared against reference"
        );

        if !comparison.passed() && self.update_references {
            return self.rebaseline(data_dir, test, actual);
        }
        comparison.into_result().map(|_| ())
    }

    fn artifact_dir(&self, report: &ReportStore, test: &ReferenceImageTest) -> Result<Option<PathBuf>> {
        let Some(dir) = report.test_data_dir(self, test) else {
            return Ok(None);
        };
        fs::create_dir_all(&dir)?;
        Ok(Some(dir))
    }

    fn rebaseline(
        &self,
        data_dir: Option<&Path>,
        test: &ReferenceImageTest,
        actual: &PixelImage,
    ) -> Result<()> {
        let reference_path = self.reference_path(test);
        warn!(
            suite = %self.name,
            test = %test.name,
            path = %reference_path.display(),
            "updating reference image"
        );
        actual.save(&reference_path)?;

        if let Some(dir) = data_dir {
            actual.save(dir.join(REFERENCE_ARTIFACT))?;
            blank_difference(actual.shape()).save(dir.join(DIFFERENCE_ARTIFACT))?;
        }
        Ok(())
    }
}

impl TestSuite for ReferenceImageSuite {
    type Test = ReferenceImageTest;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn setup(&mut self) -> Result<()> {
        self.config.validate()?;
        debug!(
            suite = %self.name,
            decoder = %self.config.decoder.display(),
            test_srcdir = %self.config.test_srcdir.display(),
            update_references = self.update_references,
            "suite set up"
        );
        Ok(())
    }

    fn tests(&self) -> Vec<ReferenceImageTest> {
        self.tests.clone()
    }

    fn run_test(&mut self, report: &ReportStore, test: &ReferenceImageTest) -> Result<()> {
        let data_dir = self.artifact_dir(report, test)?;

        let actual = decoder::run_decoder(
            &self.config.decoder,
            &self.config.input_path(&test.name),
            test.mode.as_deref(),
        )?;
        if let Some(dir) = &data_dir {
            actual.save(dir.join(ACTUAL_ARTIFACT))?;
        }

        self.check_against_reference(report, test, &actual)
    }

    fn render_table_header(&self) -> String {
        concat!(
            "<tr>",
            "<th>Test</th>",
            "<th width=\"5%\">Result</th>",
            "<th width=\"25%\">Output</th>",
            "<th width=\"25%\">Reference</th>",
            "<th width=\"25%\">Difference</th>",
            "</tr>"
        )
        .to_string()
    }

    fn render_result_row(&self, report: &ReportStore, test: &ReferenceImageTest, passed: bool) -> String {
        let (class, label) = result_labels(passed);
        let data_dir = report.test_data_relative_dir(test);
        let data_dir = data_dir.to_string_lossy();

        let thumbnail = |artifact: &str| {
            let src = escape_html(&format!("{}/{}", data_dir, artifact));
            format!("<td><a href=\"{0}\"><img src=\"{0}\"></a></td>", src)
        };

        format!(
            "<tr class=\"{}\"><td>{}</td><td><b>{}</b></td>{}{}{}</tr>",
            class,
            escape_html(&test.name),
            label,
            thumbnail(ACTUAL_ARTIFACT),
            thumbnail(REFERENCE_ARTIFACT),
            thumbnail(DIFFERENCE_ARTIFACT)
        )
    }
}
