//! Prelude module for convenient imports
//!
//! ```no_run
//! use goldenrun::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = HarnessConfig::from_env();
//!     let suite = ReferenceImageSuite::new("PictureAPT", DecoderConfig::new("apt_decoder", "data"))
//!         .with_update_references(config.update_references)
//!         .with_test(ReferenceImageTest::new("NOAA19"));
//!
//!     let mut runner = TestRunner::new(ReportStore::new(config.report_rootdir));
//!     runner.add_suite(suite);
//!     let summary = runner.run()?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

// Error handling
pub use crate::error::{Error, ErrorCategory, Result, Shape};

// Images and comparison
pub use crate::compare::{compare_images, ComparisonPolicy, ImageComparison};
pub use crate::pixel::PixelImage;

// Suites and running
pub use crate::reference::{ReferenceImageSuite, ReferenceImageTest};
pub use crate::suite::{Test, TestSuite};
pub use crate::test_runner::{RunSummary, TestRunner};

// Reporting and configuration
pub use crate::config::{DecoderConfig, HarnessConfig};
pub use crate::report::{ReportStore, SuiteResult, TestResult};
