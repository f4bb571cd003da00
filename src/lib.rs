//! Goldenrun: reference-image regression testing for signal decoders
//!
//! Goldenrun runs external decoders (for example SSTV or APT picture decoders
//! fed with recorded audio), compares the pictures they produce against
//! golden reference images and keeps a browsable HTML report of the results.
//! Correctness is "visually close enough", controlled per test by a
//! [`ComparisonPolicy`](compare::ComparisonPolicy).
//!
//! # Quick Start
//!
//! ```no_run
//! use goldenrun::prelude::*;
//!
//! fn main() -> goldenrun::Result<()> {
//!     let suite = ReferenceImageSuite::new(
//!         "PictureSSTV",
//!         DecoderConfig::new("build/bin/sstv_decoder", "test/data"),
//!     )
//!     .with_test(ReferenceImageTest::new("PD120").with_mode("PD120"));
//!
//!     let mut runner = TestRunner::new(ReportStore::new(Some("build/report".into())));
//!     runner.add_suite(suite);
//!     let summary = runner.run()?;
//!     std::process::exit(summary.exit_code() as i32);
//! }
//! ```
//!
//! # Module Overview
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Images** | [`pixel`], [`compare`] |
//! | **Suites** | [`suite`], [`reference`] |
//! | **Running** | [`test_runner`], [`report`] |
//! | **Setup** | [`config`], [`manifest`] |

pub mod compare;
pub mod config;
pub mod manifest;
pub mod pixel;
pub mod prelude;
pub mod reference;
pub mod report;
pub mod suite;
pub mod test_runner;

mod error;

pub use error::{Error, ErrorCategory, Result, Shape};

/// Goldenrun version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
