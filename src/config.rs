#[cfg(feature = "cli")]
use clap::Parser;
use std::path::PathBuf;
use url::Url;

/// # Gateway Configuration
///
/// Command-line arguments and environment variables, with optional `.env`
/// loading. The parsed value is handed to [`crate::gateway::Gateway::new`];
/// nothing reads configuration from global state afterwards.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "augment-gateway"))]
#[cfg_attr(feature = "cli", command(about = "OpenAI-compatible gateway in front of an Augment chat-stream backend"))]
#[cfg_attr(feature = "cli", command(version))]
pub struct Config {
    // =============================================================================
    // CORE SERVER CONFIGURATION
    // =============================================================================

    /// Server port to listen on
    #[cfg_attr(feature = "cli", arg(short, long, env = "PORT", default_value = "8080"))]
    pub port: u16,

    /// Server host to bind to
    #[cfg_attr(feature = "cli", arg(long, env = "HOST", default_value = "0.0.0.0"))]
    pub host: String,

    /// Shared secret callers must present as `Authorization: Bearer <token>`
    #[cfg_attr(feature = "cli", arg(long, env = "UNIFIED_TOKEN"))]
    pub unified_token: Option<String>,

    // =============================================================================
    // CREDENTIAL SEEDING
    // =============================================================================

    /// Backend tenant URL for a single seeded credential
    #[cfg_attr(feature = "cli", arg(long, env = "BACKEND_URL"))]
    pub backend_url: Option<String>,

    /// Backend token for a single seeded credential
    #[cfg_attr(feature = "cli", arg(long, env = "BACKEND_TOKEN"))]
    pub backend_token: Option<String>,

    /// JSON file holding an array of credential rows
    #[cfg_attr(feature = "cli", arg(long, env = "CREDENTIALS_FILE"))]
    pub credentials_file: Option<PathBuf>,

    /// Model used when a request does not name one
    #[cfg_attr(feature = "cli", arg(long, env = "DEFAULT_MODEL", default_value = "claude-3.7-chat"))]
    pub default_model: String,

    // =============================================================================
    // BACKEND HTTP CLIENT
    // =============================================================================

    /// HTTP client timeout in seconds (covers the whole streamed response)
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CLIENT_TIMEOUT", default_value = "300"))]
    pub http_client_timeout: u64,

    /// HTTP connect timeout in seconds
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CLIENT_CONNECT_TIMEOUT", default_value = "10"))]
    pub http_client_connect_timeout: u64,

    /// Maximum idle connections kept per backend host
    #[cfg_attr(feature = "cli", arg(long, env = "HTTP_CLIENT_MAX_CONNECTIONS_PER_HOST", default_value = "10"))]
    pub http_client_max_connections_per_host: usize,

    /// Upper bound on the backend error body echoed back to callers
    #[cfg_attr(feature = "cli", arg(long, env = "MAX_ERROR_BODY_BYTES", default_value = "4096"))]
    pub max_error_body_bytes: usize,

    // =============================================================================
    // STREAMING
    // =============================================================================

    /// Longest backend stream line accepted before it is dropped as malformed
    #[cfg_attr(feature = "cli", arg(long, env = "MAX_FRAME_BYTES", default_value = "1048576"))]
    pub max_frame_bytes: usize,

    /// SSE keep-alive interval in seconds
    #[cfg_attr(feature = "cli", arg(long, env = "STREAMING_KEEP_ALIVE_INTERVAL", default_value = "15"))]
    pub streaming_keep_alive_interval: u64,

    // =============================================================================
    // LOGGING AND SECURITY
    // =============================================================================

    /// Log filter: a level (error, warn, info, debug, trace) or full directives
    /// such as `info,tower_http=debug`
    #[cfg_attr(feature = "cli", arg(long, env = "RUST_LOG", default_value = "info"))]
    pub log_level: String,

    /// Environment (development, staging, production)
    #[cfg_attr(feature = "cli", arg(long, env = "ENVIRONMENT", default_value = "development"))]
    pub environment: String,

    /// CORS origin (use * for development only)
    #[cfg_attr(feature = "cli", arg(long, env = "CORS_ORIGIN", default_value = "*"))]
    pub cors_origin: String,
}

impl Config {
    /// Parse configuration from command line arguments and environment variables.
    ///
    /// Loads `.env` first, then parses, sets up logging and validates. Exits
    /// the process with a message if validation fails.
    #[cfg(feature = "cli")]
    pub fn parse_args() -> Self {
        let _ = dotenv::dotenv();

        let config = Self::parse();
        config.setup_logging();

        if let Err(err) = config.validate() {
            eprintln!("Configuration validation failed: {}", err);
            std::process::exit(1);
        }

        config
    }

    /// Create a test configuration with every field populated.
    pub fn for_test() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            unified_token: Some("test-unified-token".to_string()),
            backend_url: None,
            backend_token: None,
            credentials_file: None,
            default_model: "claude-3.7-chat".to_string(),
            http_client_timeout: 30,
            http_client_connect_timeout: 5,
            http_client_max_connections_per_host: 10,
            max_error_body_bytes: 4096,
            max_frame_bytes: 1024 * 1024,
            streaming_keep_alive_interval: 15,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            cors_origin: "*".to_string(),
        }
    }

    /// Install the tracing subscriber.
    #[cfg(feature = "cli")]
    pub fn setup_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(&self.log_level)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .try_init();
    }

    /// Whether bearer authentication is enforced on `/v1` routes.
    pub fn auth_enabled(&self) -> bool {
        self.unified_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    /// The single credential seeded from `backend_url` + `backend_token`, if both are set.
    pub fn seed_credential(&self) -> Option<(String, String)> {
        match (&self.backend_token, &self.backend_url) {
            (Some(token), Some(url)) if !token.is_empty() && !url.is_empty() => {
                Some((token.clone(), url.clone()))
            }
            _ => None,
        }
    }

    /// Validate configuration values and provide helpful error messages.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0. Please specify a valid port number (1-65535).".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty. Please specify a valid host (e.g., '0.0.0.0', 'localhost', or an IP address).".to_string());
        }

        if let Some(url) = &self.backend_url {
            validate_http_url(url)?;
            if self.backend_token.is_none() {
                eprintln!(
                    "⚠️  Warning: BACKEND_URL is set without BACKEND_TOKEN; no credential will be seeded."
                );
            }
        }

        if self.default_model.trim().is_empty() {
            return Err("Default model cannot be empty.".to_string());
        }

        if self.http_client_timeout == 0 {
            return Err("HTTP client timeout must be greater than 0 seconds.".to_string());
        }
        if self.http_client_connect_timeout == 0 {
            return Err("HTTP connect timeout must be greater than 0 seconds.".to_string());
        }
        if self.http_client_max_connections_per_host == 0 {
            return Err("HTTP client max connections per host must be greater than 0.".to_string());
        }
        if self.max_frame_bytes == 0 {
            return Err("Max frame bytes must be greater than 0.".to_string());
        }
        if self.streaming_keep_alive_interval == 0 {
            return Err("Streaming keep-alive interval must be greater than 0 seconds.".to_string());
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.environment.as_str()) {
            return Err(format!(
                "Invalid environment '{}'. Valid options are: {}",
                self.environment,
                valid_environments.join(", ")
            ));
        }

        validate_log_filter(&self.log_level)?;

        if self.environment == "production" {
            if !self.auth_enabled() {
                eprintln!(
                    "⚠️  Warning: UNIFIED_TOKEN is not set; /v1 routes are open to anyone."
                );
            }
            if self.cors_origin == "*" {
                eprintln!(
                    "⚠️  Warning: Using CORS origin '*' in production is not recommended."
                );
            }
        }

        Ok(())
    }
}

#[cfg(feature = "cli")]
fn validate_log_filter(filter: &str) -> Result<(), String> {
    tracing_subscriber::EnvFilter::try_new(filter).map(|_| ()).map_err(|err| {
        format!(
            "Invalid log filter '{}': {}. Use a level (e.g., 'info') or directives (e.g., 'info,tower_http=debug').",
            filter, err
        )
    })
}

// Without the subscriber there is nothing to interpret the filter.
#[cfg(not(feature = "cli"))]
fn validate_log_filter(_filter: &str) -> Result<(), String> {
    Ok(())
}

fn validate_http_url(raw: &str) -> Result<(), String> {
    match Url::parse(raw) {
        Ok(url) => {
            if !["http", "https"].contains(&url.scheme()) {
                return Err(format!(
                    "Invalid URL scheme '{}'. Only 'http' and 'https' are supported.",
                    url.scheme()
                ));
            }
            if url.host().is_none() {
                return Err(format!("URL '{}' must include a host.", raw));
            }
            Ok(())
        }
        Err(err) => Err(format!(
            "Invalid URL format '{}': {}. Please provide a valid URL (e.g., 'https://tenant.example.com/').",
            raw, err
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_test_is_valid() {
        assert!(Config::for_test().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = Config::for_test();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_backend_url() {
        let mut config = Config::for_test();
        config.backend_url = Some("ftp://example.com".to_string());
        assert!(config.validate().unwrap_err().contains("scheme"));

        config.backend_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_log_filter_accepts_directives() {
        let mut config = Config::for_test();
        config.log_level = "info,tower_http=debug".to_string();
        assert!(config.validate().is_ok());

        config.log_level = "augment_gateway=trace".to_string();
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_rejects_invalid_log_filter() {
        let mut config = Config::for_test();
        config.log_level = "info,tower_http=loud".to_string();
        assert!(config.validate().unwrap_err().contains("log filter"));
    }

    #[test]
    fn test_rejects_zero_max_frame_bytes() {
        let mut config = Config::for_test();
        config.max_frame_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seed_credential_requires_both() {
        let mut config = Config::for_test();
        assert!(config.seed_credential().is_none());

        config.backend_url = Some("https://tenant.example.com/".to_string());
        assert!(config.seed_credential().is_none());

        config.backend_token = Some("tok".to_string());
        assert_eq!(
            config.seed_credential(),
            Some(("tok".to_string(), "https://tenant.example.com/".to_string()))
        );
    }

    #[test]
    fn test_auth_enabled() {
        let mut config = Config::for_test();
        assert!(config.auth_enabled());
        config.unified_token = Some(String::new());
        assert!(!config.auth_enabled());
        config.unified_token = None;
        assert!(!config.auth_enabled());
    }
}
