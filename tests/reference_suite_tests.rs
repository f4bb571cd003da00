//! Decoder-driven reference suite tests using `/bin/sh` stand-in decoders

#![cfg(unix)]

mod common;

use common::{copying_decoder, fixture_dir, gradient_image, solid_image, write_script};
use goldenrun::compare::{compare_images, ComparisonPolicy};
use goldenrun::config::DecoderConfig;
use goldenrun::pixel::PixelImage;
use goldenrun::reference::{
    ReferenceImageSuite, ReferenceImageTest, ACTUAL_ARTIFACT, DIFFERENCE_ARTIFACT,
    REFERENCE_ARTIFACT,
};
use goldenrun::report::ReportStore;
use goldenrun::suite::TestSuite;
use goldenrun::{Error, ErrorCategory, Shape};
use pretty_assertions::assert_eq;
use std::path::Path;

fn suite_with(decoder: &Path, srcdir: &Path, test: &str) -> ReferenceImageSuite {
    ReferenceImageSuite::new("Decode", DecoderConfig::new(decoder, srcdir))
        .with_test(ReferenceImageTest::new(test).with_mode("PD120"))
}

fn run_single(suite: &mut ReferenceImageSuite, report: &ReportStore) -> goldenrun::Result<()> {
    let test = suite.tests().remove(0);
    suite.setup()?;
    suite.run_test(report, &test)
}

#[test]
fn test_decoder_exit_code_is_a_test_failure() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let decoder = write_script(dir.path(), "fail.sh", "echo 'bad sync' >&2\nexit 1");

    let err = run_single(&mut suite_with(&decoder, &srcdir, "pic"), &ReportStore::disabled()).unwrap_err();

    assert_eq!(err.category(), ErrorCategory::TestFailure);
    assert!(matches!(err, Error::DecoderExit { code: Some(1), .. }));
    assert_eq!(err.to_string(), "Decoder exited with non-zero code 1");
    assert_eq!(err.captured_output().map(str::trim), Some("bad sync"));
}

#[test]
fn test_decoder_writing_no_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let decoder = write_script(dir.path(), "silent.sh", "exit 0");

    let err = run_single(&mut suite_with(&decoder, &srcdir, "pic"), &ReportStore::disabled()).unwrap_err();
    assert!(matches!(err, Error::DecoderOutputCount { count: 0, .. }));
}

#[test]
fn test_decoder_writing_two_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let image = dir.path().join("source.png");
    solid_image(Shape::new(2, 2, 1), 0.5).save(&image).unwrap();
    let decoder = write_script(
        dir.path(),
        "twice.sh",
        &format!(
            "for out; do :; done\ncp '{0}' \"$out/a.png\"\ncp '{0}' \"$out/b.png\"",
            image.display()
        ),
    );

    let err = run_single(&mut suite_with(&decoder, &srcdir, "pic"), &ReportStore::disabled()).unwrap_err();
    assert!(matches!(err, Error::DecoderOutputCount { count: 2, .. }));
}

#[test]
fn test_decoder_receives_contract_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let args_log = dir.path().join("args.txt");
    let decoder = write_script(
        dir.path(),
        "record.sh",
        &format!("echo \"$@\" > '{}'\nexit 3", args_log.display()),
    );

    let err = run_single(&mut suite_with(&decoder, &srcdir, "pic"), &ReportStore::disabled()).unwrap_err();
    assert!(matches!(err, Error::DecoderExit { code: Some(3), .. }));

    let args = std::fs::read_to_string(&args_log).unwrap();
    let args: Vec<&str> = args.split_whitespace().collect();
    assert_eq!(args[..4].to_vec(), vec!["--format", "PNG", "--mode", "PD120"]);
    assert_eq!(args[4], srcdir.join("pic.wav").to_str().unwrap());
    assert_eq!(args.len(), 6);
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &[]);
    let decoder = write_script(dir.path(), "ok.sh", "exit 0");

    let err = run_single(&mut suite_with(&decoder, &srcdir, "absent"), &ReportStore::disabled()).unwrap_err();
    assert!(matches!(err, Error::InputNotFound { .. }));
}

#[test]
fn test_missing_reference_without_rebaseline_fails() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let image = dir.path().join("source.png");
    gradient_image(Shape::new(3, 5, 3)).save(&image).unwrap();
    let decoder = copying_decoder(dir.path(), &image);

    let err = run_single(&mut suite_with(&decoder, &srcdir, "pic"), &ReportStore::disabled()).unwrap_err();
    assert!(matches!(err, Error::ImageNotFound { ref path } if path == &srcdir.join("pic_reference.png")));
    assert!(!srcdir.join("pic_reference.png").exists());
}

#[test]
fn test_rebaseline_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let image = dir.path().join("source.png");
    let decoded = gradient_image(Shape::new(3, 5, 3));
    decoded.save(&image).unwrap();
    let decoder = copying_decoder(dir.path(), &image);

    let mut suite = suite_with(&decoder, &srcdir, "pic").with_update_references(true);
    run_single(&mut suite, &ReportStore::disabled()).unwrap();

    let reference_path = srcdir.join("pic_reference.png");
    assert!(reference_path.is_file());

    let root = dir.path().join("report");
    let mut suite = suite_with(&decoder, &srcdir, "pic");
    run_single(&mut suite, &ReportStore::new(Some(root.clone()))).unwrap();

    let data_dir = root.join("Decode").join("pic");
    let difference = PixelImage::load(data_dir.join(DIFFERENCE_ARTIFACT)).unwrap();
    assert!(difference.samples().iter().all(|&d| d == 0.0));

    let reference = PixelImage::load(&reference_path).unwrap();
    let cmp = compare_images(&decoded, &reference, &ComparisonPolicy::GENERIC).unwrap();
    assert_eq!(cmp.max_difference, 0.0);
}

#[test]
fn test_mismatch_beyond_threshold_fails_then_rebaselines() {
    let dir = tempfile::tempdir().unwrap();
    let srcdir = fixture_dir(dir.path(), &["pic"]);
    let image = dir.path().join("source.png");
    solid_image(Shape::new(4, 4, 1), 1.0).save(&image).unwrap();
    solid_image(Shape::new(4, 4, 1), 0.0)
        .save(srcdir.join("pic_reference.png"))
        .unwrap();
    let decoder = copying_decoder(dir.path(), &image);
    let root = dir.path().join("report");
    let report = ReportStore::new(Some(root.clone()));

    let err = run_single(&mut suite_with(&decoder, &srcdir, "pic"), &report).unwrap_err();
    assert_eq!(err.to_string(), "Too many failed pixel values: 16 at threshold 0");

    let data_dir = root.join("Decode").join("pic");
    for artifact in [ACTUAL_ARTIFACT, REFERENCE_ARTIFACT, DIFFERENCE_ARTIFACT] {
        assert!(data_dir.join(artifact).is_file(), "{artifact}");
    }
    let difference = PixelImage::load(data_dir.join(DIFFERENCE_ARTIFACT)).unwrap();
    assert!(difference.samples().iter().all(|&d| d == 1.0));

    let mut suite = suite_with(&decoder, &srcdir, "pic").with_update_references(true);
    run_single(&mut suite, &report).unwrap();
    let reference = PixelImage::load(srcdir.join("pic_reference.png")).unwrap();
    assert_eq!(reference, solid_image(Shape::new(4, 4, 1), 1.0));
    let difference = PixelImage::load(data_dir.join(DIFFERENCE_ARTIFACT)).unwrap();
    assert!(difference.samples().iter().all(|&d| d == 0.0));
}

#[test]
fn test_setup_requires_existing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut suite = suite_with(&dir.path().join("no_decoder"), dir.path(), "pic");
    let err = suite.setup().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Setup);

    let decoder = write_script(dir.path(), "ok.sh", "exit 0");
    let mut suite = suite_with(&decoder, &dir.path().join("no_fixtures"), "pic");
    assert!(matches!(suite.setup(), Err(Error::MissingPath { .. })));
}
