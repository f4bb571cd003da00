//! Shared test helpers for integration tests

#![allow(dead_code)]

use goldenrun::pixel::PixelImage;
use goldenrun::report::ReportStore;
use goldenrun::suite::{Test, TestSuite};
use goldenrun::{Error, Result, Shape};
use std::path::{Path, PathBuf};

/// A test whose outcome is fixed up front
#[derive(Debug, Clone)]
pub struct FixedTest {
    pub name: String,
    pub passes: bool,
}

impl Test for FixedTest {
    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Suite replaying a fixed list of outcomes
pub struct FixedSuite {
    pub name: String,
    pub tests: Vec<FixedTest>,
}

impl FixedSuite {
    pub fn new(name: &str, outcomes: &[(&str, bool)]) -> Self {
        Self {
            name: name.to_string(),
            tests: outcomes
                .iter()
                .map(|&(name, passes)| FixedTest {
                    name: name.to_string(),
                    passes,
                })
                .collect(),
        }
    }

    pub fn test(&self, name: &str) -> &FixedTest {
        self.tests
            .iter()
            .find(|t| t.name == name)
            .expect("unknown test")
    }
}

impl TestSuite for FixedSuite {
    type Test = FixedTest;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn tests(&self) -> Vec<FixedTest> {
        self.tests.clone()
    }

    fn run_test(&mut self, _report: &ReportStore, test: &FixedTest) -> Result<()> {
        if test.passes {
            Ok(())
        } else {
            Err(Error::test_failure(format!("{} was told to fail", test.name)))
        }
    }
}

/// Solid-color image of the given shape
pub fn solid_image(shape: Shape, value: f32) -> PixelImage {
    PixelImage::from_samples(shape, vec![value; shape.num_samples()]).unwrap()
}

/// Horizontal gradient, exactly representable in 8 bits
pub fn gradient_image(shape: Shape) -> PixelImage {
    let samples = (0..shape.num_samples())
        .map(|i| (i % 256) as f32 / 255.0)
        .collect();
    PixelImage::from_samples(shape, samples).unwrap()
}

/// Write an executable `/bin/sh` script into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stand-in decoder copying `image` into its output directory (last argument).
#[cfg(unix)]
pub fn copying_decoder(dir: &Path, image: &Path) -> PathBuf {
    write_script(
        dir,
        "copy_decoder.sh",
        &format!(
            "for out; do :; done\ncp '{}' \"$out/decoded.png\"",
            image.display()
        ),
    )
}

/// Fixture directory with an empty `<name>.wav` input per test.
pub fn fixture_dir(root: &Path, tests: &[&str]) -> PathBuf {
    let dir = root.join("fixtures");
    std::fs::create_dir_all(&dir).unwrap();
    for name in tests {
        std::fs::write(dir.join(format!("{}.wav", name)), b"RIFF").unwrap();
    }
    dir
}
