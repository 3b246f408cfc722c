//! Conversion of filled documents to PDF by an external office program

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why a conversion failed
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to start converter: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("converter exited with status {0}")]
    Exit(i32),

    #[error("converter did not finish within {0} seconds")]
    Timeout(u64),

    #[error("converter produced no output at {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Turns a `.docx` file into a PDF next to it
pub trait DocumentConverter {
    /// Convert `input`, returning the path of the produced PDF
    fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError>;
}

/// LibreOffice-compatible headless converter
///
/// Runs `<program> --headless --convert-to pdf --outdir <dir> <input>` and
/// expects `<dir>/<stem>.pdf` afterwards.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: String,
    timeout: Duration,
}

impl OfficeConverter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl DocumentConverter for OfficeConverter {
    fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError> {
        let out_dir = input.parent().unwrap_or_else(|| Path::new("."));
        let output = expected_output(input);

        debug!("running {} on {}", self.program, input.display());
        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ConvertError::Spawn)?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(ConvertError::Spawn)? {
                Some(status) => break status,
                None if started.elapsed() >= self.timeout => {
                    warn!(
                        "{} timed out after {:?}, killing it",
                        self.program, self.timeout
                    );
                    // The child may have exited between the poll and the kill.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ConvertError::Timeout(self.timeout.as_secs()));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            return Err(ConvertError::Exit(status.code().unwrap_or(-1)));
        }
        if !output.is_file() {
            return Err(ConvertError::MissingOutput(output));
        }

        debug!(
            "converted in {} ms: {}",
            started.elapsed().as_millis(),
            output.display()
        );
        Ok(output)
    }
}

/// `<dir>/<stem>.pdf` for an input file
pub fn expected_output(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_output() {
        assert_eq!(
            expected_output(Path::new("/tmp/x/proposta-maria.docx")),
            PathBuf::from("/tmp/x/proposta-maria.pdf")
        );
    }

    #[test]
    fn test_missing_program() {
        let converter = OfficeConverter::new("/nonexistent/soffice", Duration::from_secs(1));
        let err = converter.convert(Path::new("/tmp/a.docx")).unwrap_err();
        assert!(matches!(err, ConvertError::Spawn(_)));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script standing in for the office program
        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-office");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn input(dir: &Path) -> PathBuf {
            let path = dir.join("proposta-maria.docx");
            fs::write(&path, b"docx").unwrap();
            path
        }

        #[test]
        fn test_success() {
            let dir = tempfile::tempdir().unwrap();
            // $5 is the output directory, $6 the input file.
            let program = script(
                dir.path(),
                r#"stem=$(basename "$6" .docx); printf '%%PDF-1.4' > "$5/$stem.pdf""#,
            );
            let converter = OfficeConverter::new(program.to_string_lossy(), Duration::from_secs(10));
            let output = converter.convert(&input(dir.path())).unwrap();
            assert_eq!(output, dir.path().join("proposta-maria.pdf"));
            assert_eq!(fs::read(output).unwrap(), b"%PDF-1.4");
        }

        #[test]
        fn test_exit_status() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "exit 3");
            let converter = OfficeConverter::new(program.to_string_lossy(), Duration::from_secs(10));
            let err = converter.convert(&input(dir.path())).unwrap_err();
            assert!(matches!(err, ConvertError::Exit(3)));
        }

        #[test]
        fn test_missing_output() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "exit 0");
            let converter = OfficeConverter::new(program.to_string_lossy(), Duration::from_secs(10));
            let err = converter.convert(&input(dir.path())).unwrap_err();
            assert!(matches!(err, ConvertError::MissingOutput(_)));
        }

        #[test]
        fn test_timeout_kills_child() {
            let dir = tempfile::tempdir().unwrap();
            let program = script(dir.path(), "exec sleep 5");
            let converter = OfficeConverter::new(program.to_string_lossy(), Duration::from_secs(1));
            let started = Instant::now();
            let err = converter.convert(&input(dir.path())).unwrap_err();
            assert!(matches!(err, ConvertError::Timeout(1)));
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
