//! External document converters (legacy .doc and .wps)
//!
//! Each conversion writes the attachment into its own temporary directory,
//! runs the helper process with a timeout, and drops the directory on every
//! exit path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::types::ExtractionResult;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("required tool '{tool}' is not installed or not on PATH")]
    ToolMissing { tool: String },

    #[error("{tool} failed (exit {code}): {stderr}")]
    Failed {
        tool: String,
        code: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {secs}s")]
    TimedOut { tool: String, secs: u64 },

    #[error("{tool} reported success but produced no output file {file}")]
    MissingOutput { tool: String, file: String },

    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConversionError> for ExtractionResult {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::ToolMissing { .. } => ExtractionResult::tool_missing(err.to_string()),
            other => ExtractionResult::failed(other.to_string()),
        }
    }
}

/// Capability interface for converting a document to plain text
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert the document bytes to text
    ///
    /// # Arguments
    ///
    /// * `data` - Raw document bytes
    /// * `filename` - Client-supplied filename (untrusted, used for naming only)
    async fn convert(&self, data: &[u8], filename: &str) -> Result<String, ConversionError>;
}

/// Reduce an untrusted filename to a bare, non-hidden file name
pub fn safe_file_name(filename: &str, fallback_ext: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.');

    if base.is_empty() {
        format!("attachment.{}", fallback_ext)
    } else {
        base.to_string()
    }
}

/// Create a scoped working directory and write the input file into it
async fn stage_input(
    prefix: &str,
    data: &[u8],
    file_name: &str,
) -> Result<(TempDir, PathBuf), ConversionError> {
    let workdir = tempfile::Builder::new().prefix(prefix).tempdir()?;
    let input = workdir.path().join(file_name);
    tokio::fs::write(&input, data).await?;
    Ok((workdir, input))
}

/// Run a helper process with a timeout, mapping spawn and exit failures
async fn run_tool(
    tool: &str,
    cmd: &mut Command,
    timeout: Duration,
) -> Result<Output, ConversionError> {
    cmd.kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            return Err(ConversionError::TimedOut {
                tool: tool.to_string(),
                secs: timeout.as_secs(),
            })
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConversionError::ToolMissing {
                tool: tool.to_string(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(output)) => output,
    };

    if output.status.success() {
        return Ok(output);
    }

    // 127 is how wrappers and shells report "command not found"
    if output.status.code() == Some(127) {
        return Err(ConversionError::ToolMissing {
            tool: tool.to_string(),
        });
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(ConversionError::Failed {
        tool: tool.to_string(),
        code: output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string()),
        stderr: if stderr.is_empty() {
            "no error output".to_string()
        } else {
            stderr
        },
    })
}

fn tool_name(bin: &Path) -> String {
    bin.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| bin.display().to_string())
}

/// Legacy Word converter backed by `antiword`, which prints text to stdout
pub struct AntiwordConverter {
    bin: PathBuf,
    timeout: Duration,
}

impl AntiwordConverter {
    pub fn new(bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DocumentConverter for AntiwordConverter {
    async fn convert(&self, data: &[u8], filename: &str) -> Result<String, ConversionError> {
        let (workdir, input) =
            stage_input("doc-processing-", data, &safe_file_name(filename, "doc")).await?;

        debug!(input = %input.display(), "converting with antiword");
        let output = run_tool(
            &tool_name(&self.bin),
            Command::new(&self.bin).arg(&input),
            self.timeout,
        )
        .await;

        drop(workdir);
        Ok(String::from_utf8_lossy(&output?.stdout).into_owned())
    }
}

/// WPS converter backed by a headless LibreOffice (`soffice --convert-to txt`)
pub struct SofficeConverter {
    bin: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DocumentConverter for SofficeConverter {
    async fn convert(&self, data: &[u8], filename: &str) -> Result<String, ConversionError> {
        let file_name = safe_file_name(filename, "wps");
        let (workdir, input) = stage_input("wps-processing-", data, &file_name).await?;

        let stem = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let output_file = workdir.path().join(format!("{}.txt", stem));
        // Private profile so parallel conversions do not fight over one lock file
        let profile = format!("file://{}", workdir.path().join("profile").display());

        debug!(input = %input.display(), "converting with soffice");
        let tool = tool_name(&self.bin);
        run_tool(
            &tool,
            Command::new(&self.bin)
                .arg(format!("-env:UserInstallation={}", profile))
                .arg("--headless")
                .arg("--convert-to")
                .arg("txt:Text (encoded):UTF8")
                .arg("--outdir")
                .arg(workdir.path())
                .arg(&input),
            self.timeout,
        )
        .await?;

        let bytes = match tokio::fs::read(&output_file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConversionError::MissingOutput {
                    tool,
                    file: format!("{}.txt", stem),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
