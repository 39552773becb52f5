// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

/// Default request body cap for replay uploads (64 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Reward-table snapshot loaded at startup and written on save.
    pub learning_snapshot_path: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Whether to run in local mode (no rate limiting).
    pub local_mode: bool,
    /// Rate-limit on `x-forwarded-for` instead of the peer address.
    pub trust_forwarded_for: bool,
    /// Directory containing pre-built frontend files to serve.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite:lolcourt.db?mode=rwc".to_string(),
            port: 3000,
            learning_snapshot_path: PathBuf::from("learning_snapshot.json"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            local_mode: false,
            trust_forwarded_for: false,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:lolcourt.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `LEARNING_SNAPSHOT_PATH` - reward table snapshot (default: `learning_snapshot.json`)
    /// - `MAX_UPLOAD_BYTES` - request body limit (default: 64 MiB)
    /// - `LOLCOURT_LOCAL_MODE` - Set to `true` to enable local mode
    /// - `TRUST_FORWARDED_FOR` - Set to `true` when running behind a reverse proxy
    /// - `STATIC_DIR` - Path to frontend dist directory for static file serving
    ///
    /// CLI flags:
    /// - `--local` - Enable local mode (same as `LOLCOURT_LOCAL_MODE=true`)
    /// - `--port <PORT>` - Override the port
    /// - `--trust-proxy` - Same as `TRUST_FORWARDED_FOR=true`
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let defaults = Config::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.port);

        let learning_snapshot_path = std::env::var("LEARNING_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.learning_snapshot_path);

        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        let local_mode = args.iter().any(|a| a == "--local") || Self::env_flag("LOLCOURT_LOCAL_MODE");
        let trust_forwarded_for =
            args.iter().any(|a| a == "--trust-proxy") || Self::env_flag("TRUST_FORWARDED_FOR");

        let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        Config {
            database_url,
            port,
            learning_snapshot_path,
            max_upload_bytes,
            local_mode,
            trust_forwarded_for,
            static_dir,
        }
    }

    fn env_flag(name: &str) -> bool {
        std::env::var(name)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

/// Global flag indicating local mode is active.
/// This is set once at startup and read by the rate limiter.
static LOCAL_MODE: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Set the local mode flag (called once at startup).
pub fn set_local_mode(enabled: bool) {
    LOCAL_MODE.store(enabled, std::sync::atomic::Ordering::Relaxed);
}

/// Check if local mode is active.
pub fn is_local_mode() -> bool {
    LOCAL_MODE.load(std::sync::atomic::Ordering::Relaxed)
}
