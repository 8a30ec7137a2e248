//! Configuration module for the kode-share backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default request body limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the JSON document holding all snippets and files
    pub data_path: PathBuf,
    /// Directory for uploaded file blobs
    pub upload_dir: PathBuf,
    /// Whether file upload and binary download are available
    pub uploads_enabled: bool,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
    /// Optional directory served as static front-end files
    pub static_dir: Option<PathBuf>,
    /// Base URL used for share links; derived from the Host header when unset
    pub public_base_url: Option<String>,
    /// Use the first X-Forwarded-For entry as the client identity
    pub trust_forwarded_for: bool,
    /// Pre-shared key required by destructive endpoints (open when unset)
    pub admin_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_path = env::var("KODE_DATA_PATH")
            .unwrap_or_else(|_| "./data.json".to_string())
            .into();

        let upload_dir = env::var("KODE_UPLOAD_DIR")
            .unwrap_or_else(|_| "./uploads".to_string())
            .into();

        let uploads_enabled = env_flag("KODE_UPLOADS_ENABLED", true);

        let max_upload_bytes = env::var("KODE_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let static_dir = env::var("KODE_STATIC_DIR").ok().map(PathBuf::from);

        let public_base_url = env::var("KODE_PUBLIC_BASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let trust_forwarded_for = env_flag("KODE_TRUST_FORWARDED_FOR", false);

        let admin_psk = env::var("KODE_ADMIN_PSK").ok().filter(|k| !k.is_empty());

        let bind_addr = match env::var("KODE_BIND_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                eprintln!("Invalid KODE_BIND_ADDR {raw:?}, using {DEFAULT_BIND_ADDR}");
                default_bind_addr()
            }),
            Err(_) => default_bind_addr(),
        };

        let log_level = env::var("KODE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("KODE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            data_path,
            upload_dir,
            uploads_enabled,
            max_upload_bytes,
            static_dir,
            public_base_url,
            trust_forwarded_for,
            admin_psk,
            bind_addr,
            log_level,
            log_format,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// Parse a boolean flag, accepting 1/0, true/false, yes/no and on/off.
fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
