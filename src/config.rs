//! Server configuration: CLI flags with environment fallbacks

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Chat relay server
#[derive(Debug, Clone, Parser)]
#[command(name = "chat-relay", version, about)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "RELAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// JSON file holding the model configurations
    #[arg(long, env = "RELAY_MODELS_FILE", default_value = "models.json")]
    pub models_file: PathBuf,

    /// Maximum JSON request body size, in megabytes
    #[arg(long, env = "RELAY_BODY_LIMIT_MB", default_value_t = 50)]
    pub body_limit_mb: u64,

    /// Legacy .doc to text converter
    #[arg(long, env = "RELAY_ANTIWORD_BIN", default_value = "antiword")]
    pub antiword_bin: PathBuf,

    /// LibreOffice binary used for .wps conversion
    #[arg(long, env = "RELAY_SOFFICE_BIN", default_value = "soffice")]
    pub soffice_bin: PathBuf,

    /// Tesseract OCR binary
    #[arg(long, env = "RELAY_TESSERACT_BIN", default_value = "tesseract")]
    pub tesseract_bin: PathBuf,

    /// OCR language models, Tesseract `+` syntax
    #[arg(long, env = "RELAY_OCR_LANGUAGES", default_value = "eng+chi_sim")]
    pub ocr_languages: String,

    /// Timeout for one external document conversion
    #[arg(long, env = "RELAY_CONVERTER_TIMEOUT_SECS", default_value_t = 60)]
    pub converter_timeout_secs: u64,

    /// Timeout for one OCR run
    #[arg(long, env = "RELAY_OCR_TIMEOUT_SECS", default_value_t = 120)]
    pub ocr_timeout_secs: u64,

    /// Connect timeout for the upstream LLM endpoint
    #[arg(long, env = "RELAY_UPSTREAM_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_connect_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> u64 {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout_secs)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            antiword_bin: self.antiword_bin.clone(),
            soffice_bin: self.soffice_bin.clone(),
            tesseract_bin: self.tesseract_bin.clone(),
            ocr_languages: self.ocr_languages.clone(),
            converter_timeout: Duration::from_secs(self.converter_timeout_secs),
            ocr_timeout: Duration::from_secs(self.ocr_timeout_secs),
        }
    }
}

/// Settings for the extractors that shell out to helper programs
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub antiword_bin: PathBuf,
    pub soffice_bin: PathBuf,
    pub tesseract_bin: PathBuf,
    pub ocr_languages: String,
    pub converter_timeout: Duration,
    pub ocr_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            antiword_bin: PathBuf::from("antiword"),
            soffice_bin: PathBuf::from("soffice"),
            tesseract_bin: PathBuf::from("tesseract"),
            ocr_languages: "eng+chi_sim".to_string(),
            converter_timeout: Duration::from_secs(60),
            ocr_timeout: Duration::from_secs(120),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse_from(["chat-relay"]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.body_limit_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.ocr_languages, "eng+chi_sim");

        let extractors = config.extractor_config();
        assert_eq!(extractors.converter_timeout, Duration::from_secs(60));
        assert_eq!(extractors.antiword_bin, PathBuf::from("antiword"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "chat-relay",
            "--port",
            "8080",
            "--host",
            "0.0.0.0",
            "--ocr-languages",
            "eng",
            "--converter-timeout-secs",
            "5",
        ]);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.ocr_languages, "eng");
        assert_eq!(
            config.extractor_config().converter_timeout,
            Duration::from_secs(5)
        );
    }
}
