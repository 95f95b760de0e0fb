//! External markup conversion
//!
//! Converting CommonMark to reStructuredText is delegated to pandoc. Each
//! conversion spawns a process, so callers batch their text and convert it
//! in as few calls as possible (see `CommentBatcher`).

use protoc_docs_common::ConverterConfig;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised by an external converter
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to spawn converter: {0}")]
    SpawnFailed(String),

    #[error("converter exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("converter timed out after {0:?}")]
    Timeout(Duration),

    #[error("converter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Converts text between markup formats
///
/// Implementations must be deterministic for identical input and must pass
/// the batch separator token through unescaped.
#[cfg_attr(test, mockall::automock)]
pub trait MarkupConverter {
    fn convert(
        &self,
        text: &str,
        source_format: &str,
        target_format: &str,
    ) -> Result<String, ConvertError>;
}

/// Runs `pandoc --from <source> --to <target>` over stdin/stdout
#[derive(Debug, Clone)]
pub struct PandocConverter {
    command: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl PandocConverter {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_line(&self, source_format: &str, target_format: &str) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--from")
            .arg(source_format)
            .arg("--to")
            .arg(target_format)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl MarkupConverter for PandocConverter {
    fn convert(
        &self,
        text: &str,
        source_format: &str,
        target_format: &str,
    ) -> Result<String, ConvertError> {
        log::debug!(
            "Invoking converter: {} --from {} --to {} ({} bytes)",
            self.command.display(),
            source_format,
            target_format,
            text.len()
        );

        let mut child = self
            .command_line(source_format, target_format)
            .spawn()
            .map_err(|e| {
                log::error!("Failed to spawn converter '{}': {}", self.command.display(), e);
                ConvertError::SpawnFailed(format!("{}: {}", self.command.display(), e))
            })?;

        // Feed stdin and drain both output pipes on their own threads so a
        // large batch cannot deadlock against a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.as_bytes().to_vec();
            thread::spawn(move || stdin.write_all(&input))
        });
        let stdout = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe)));
        let stderr = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe)));

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                log::warn!("Converter timed out after {:?}, killing it", self.timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConvertError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = join_pipe(stdout)?;
        let stderr = join_pipe(stderr)?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr).to_string();
            log::warn!("Converter exited with code {:?}: {}", status.code(), stderr);
            return Err(ConvertError::NonZeroExit {
                code: status.code().unwrap_or(-1),
                stderr,
            });
        }

        if let Some(writer) = writer {
            match writer.join() {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ConvertError::Io(std::io::Error::other(
                        "converter stdin writer panicked",
                    )))
                }
            }
        }

        let converted = String::from_utf8_lossy(&stdout).to_string();
        log::debug!(
            "Converter succeeded: {} bytes output in {:?}",
            converted.len(),
            start.elapsed()
        );
        Ok(converted)
    }
}

fn drain<R: Read>(mut pipe: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}

fn join_pipe(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Vec<u8>, ConvertError> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(ConvertError::Io(io::Error::other(
                "converter output reader panicked",
            ))),
        },
        None => Ok(Vec::new()),
    }
}
