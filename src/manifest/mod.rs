//! JSON suite manifests
//!
//! A manifest declares reference image suites for the command line runner:
//!
//! ```json
//! {
//!   "suites": [
//!     {
//!       "name": "PictureSSTV",
//!       "decoder": "../build/bin/sstv_decoder",
//!       "test_srcdir": "data",
//!       "tests": [
//!         { "name": "PD120", "mode": "PD120" },
//!         { "name": "Martin1", "mode": "Martin1", "percentage_threshold": 2.0 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the manifest's directory. Suites
//! without a `decoder` or `test_srcdir` fall back to the command line values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::compare::ComparisonPolicy;
use crate::config::{resolve, DecoderConfig};
use crate::error::{Error, Result};
use crate::reference::{ReferenceImageSuite, ReferenceImageTest};

/// Top-level manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub suites: Vec<SuiteSpec>,
}

/// One suite entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSpec {
    pub name: String,
    #[serde(default)]
    pub decoder: Option<PathBuf>,
    #[serde(default)]
    pub test_srcdir: Option<PathBuf>,
    /// Suite-wide default for tests that do not set their own
    #[serde(default)]
    pub value_threshold: Option<f64>,
    #[serde(default)]
    pub percentage_threshold: Option<f64>,
    #[serde(default)]
    pub tests: Vec<TestSpec>,
}

/// One test entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSpec {
    pub name: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub value_threshold: Option<f64>,
    #[serde(default)]
    pub percentage_threshold: Option<f64>,
}

/// Values used where a manifest leaves a suite path out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteDefaults {
    pub decoder: Option<PathBuf>,
    pub test_srcdir: Option<PathBuf>,
    pub update_references: bool,
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_manifest_str(&content).map_err(|e| match e {
        Error::Manifest { message, .. } => Error::Manifest {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Parse a manifest from a JSON string.
pub fn parse_manifest_str(content: &str) -> Result<Manifest> {
    serde_json::from_str(content).map_err(|e| Error::Manifest {
        path: PathBuf::new(),
        message: format!("invalid JSON: {}", e),
    })
}

/// Load a manifest and build its suites.
pub fn load_suites(path: &Path, defaults: &SuiteDefaults) -> Result<Vec<ReferenceImageSuite>> {
    let manifest = load_manifest(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let suites = manifest.into_suites(base, defaults).map_err(|e| match e {
        Error::Manifest { message, .. } => Error::Manifest {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;
    debug!(manifest = %path.display(), suites = suites.len(), "loaded manifest");
    Ok(suites)
}

impl Manifest {
    /// Build suites, resolving manifest paths against `base`.
    pub fn into_suites(self, base: &Path, defaults: &SuiteDefaults) -> Result<Vec<ReferenceImageSuite>> {
        self.suites
            .into_iter()
            .map(|spec| spec.into_suite(base, defaults))
            .collect()
    }
}

impl SuiteSpec {
    fn into_suite(self, base: &Path, defaults: &SuiteDefaults) -> Result<ReferenceImageSuite> {
        let decoder = pick_path(self.decoder, &defaults.decoder, base)
            .ok_or_else(|| missing_field(&self.name, "decoder"))?;
        let test_srcdir = pick_path(self.test_srcdir, &defaults.test_srcdir, base)
            .ok_or_else(|| missing_field(&self.name, "test_srcdir"))?;

        let suite_policy = ComparisonPolicy::new(
            self.value_threshold
                .unwrap_or(ComparisonPolicy::IMAGE.value_threshold),
            self.percentage_threshold
                .unwrap_or(ComparisonPolicy::IMAGE.percentage_threshold),
        );

        let tests = self.tests.into_iter().map(|spec| {
            let policy = ComparisonPolicy::new(
                spec.value_threshold.unwrap_or(suite_policy.value_threshold),
                spec.percentage_threshold
                    .unwrap_or(suite_policy.percentage_threshold),
            );
            let test = ReferenceImageTest::new(spec.name).with_policy(policy);
            match spec.mode {
                Some(mode) => test.with_mode(mode),
                None => test,
            }
        });

        Ok(
            ReferenceImageSuite::new(self.name, DecoderConfig::new(decoder, test_srcdir))
                .with_update_references(defaults.update_references)
                .with_tests(tests),
        )
    }
}

fn pick_path(own: Option<PathBuf>, fallback: &Option<PathBuf>, base: &Path) -> Option<PathBuf> {
    match own {
        Some(path) => Some(resolve(base, path)),
        None => fallback.clone(),
    }
}

fn missing_field(suite: &str, field: &str) -> Error {
    Error::Manifest {
        path: PathBuf::new(),
        message: format!("suite {} has no {} and none was given on the command line", suite, field),
    }
}
