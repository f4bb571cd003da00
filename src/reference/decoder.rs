//! External decoder invocation
//!
//! The decoder is an opaque executable called as
//! `<decoder> --format PNG [--mode <mode>] <input> <scratch_dir>`. It must
//! exit with status 0 and leave exactly one file in `scratch_dir`.

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, Result};
use crate::pixel::PixelImage;

/// Output format requested from the decoder
pub const OUTPUT_FORMAT: &str = "PNG";

/// Build the decoder argument list.
pub fn decoder_args(mode: Option<&str>, input: &Path, output_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--format".into(), OUTPUT_FORMAT.into()];
    if let Some(mode) = mode {
        args.push("--mode".into());
        args.push(mode.into());
    }
    args.push(input.into());
    args.push(output_dir.into());
    args
}

/// Run `decoder` on `input` and load the single image it writes.
///
/// The scratch directory is removed on every return path.
pub fn run_decoder(decoder: &Path, input: &Path, mode: Option<&str>) -> Result<PixelImage> {
    if !input.is_file() {
        return Err(Error::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    let scratch = TempDir::new()?;
    let args = decoder_args(mode, input, scratch.path());

    // One anonymous file receives both streams so their interleaving is kept.
    let mut capture = tempfile::tempfile()?;
    let stderr = capture.try_clone()?;

    debug!(decoder = %decoder.display(), ?args, "running decoder");
    let status = Command::new(decoder)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(capture.try_clone()?))
        .stderr(Stdio::from(stderr))
        .status()
        .map_err(|e| {
            Error::test_failure(format!(
                "Failed to run decoder {}: {}",
                decoder.display(),
                e
            ))
        })?;

    if !status.success() {
        capture.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        capture.read_to_end(&mut raw)?;
        return Err(Error::DecoderExit {
            code: status.code(),
            output: String::from_utf8_lossy(&raw).into_owned(),
        });
    }

    let output = single_output_file(scratch.path())?;
    debug!(output = %output.display(), "decoder finished");
    PixelImage::load(&output)
}

/// The only entry of `dir`, or [`Error::DecoderOutputCount`].
pub fn single_output_file(dir: &Path) -> Result<PathBuf> {
    let files = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;

    match files.as_slice() {
        [file] => Ok(file.clone()),
        _ => Err(Error::DecoderOutputCount {
            count: files.len(),
            dir: dir.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_with_mode() {
        let args = decoder_args(Some("PD120"), Path::new("/in.wav"), Path::new("/out"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["--format", "PNG", "--mode", "PD120", "/in.wav", "/out"]);
    }

    #[test]
    fn test_args_without_mode() {
        let args = decoder_args(None, Path::new("/in.wav"), Path::new("/out"));
        assert_eq!(args.len(), 4);
        assert_eq!(args[2], OsString::from("/in.wav"));
    }

    #[test]
    fn test_single_output_file_counts() {
        let dir = tempfile::tempdir().unwrap();
        let err = single_output_file(dir.path()).unwrap_err();
        assert!(matches!(err, Error::DecoderOutputCount { count: 0, .. }));

        fs::write(dir.path().join("a.png"), b"").unwrap();
        assert_eq!(single_output_file(dir.path()).unwrap(), dir.path().join("a.png"));

        fs::write(dir.path().join("b.png"), b"").unwrap();
        let err = single_output_file(dir.path()).unwrap_err();
        assert!(matches!(err, Error::DecoderOutputCount { count: 2, .. }));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.wav");
        let err = run_decoder(Path::new("/bin/true"), &input, None).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { path } if path == input));
    }
}
