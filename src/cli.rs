//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::AuthConfig;
use crate::rate_limit::{DEFAULT_LOGIN_BURST, DEFAULT_LOGIN_PER_SEC};
use crate::store::{UserStore, hash_password};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "keygate", about = "Token login and request gating service")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "KEYGATE_PORT", default_value = "7300")]
    pub port: u16,

    /// Request header carrying the token
    #[arg(long, env = "KEYGATE_HEADER_NAME", default_value = "Authorization")]
    pub header_name: String,

    /// Scheme expected before the token. Pass an empty string to read the bare header value
    #[arg(long, env = "KEYGATE_SCHEME", default_value = "Bearer")]
    pub scheme: String,

    /// Token lifetime in seconds, 0 issues tokens that never expire
    #[arg(long, env = "KEYGATE_TIMEOUT_SECS", default_value = "3600")]
    pub timeout_secs: u64,

    /// Claim naming the token's subject
    #[arg(long, env = "KEYGATE_SUBJECT_FIELD", default_value = "sub")]
    pub subject_field: String,

    /// Include the token signature in login responses
    #[arg(long, env = "KEYGATE_EXPOSE_SIGNATURE")]
    pub expose_signature: bool,

    /// File with one `subject:<bcrypt hash>[:role]` entry per line
    #[arg(short, long, env = "KEYGATE_USERS_FILE")]
    pub users_file: Option<String>,

    /// Print the bcrypt hash of a password for the users file and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,

    /// Login attempts per second per client
    #[arg(long, env = "KEYGATE_LOGIN_PER_SEC", default_value_t = DEFAULT_LOGIN_PER_SEC)]
    pub login_per_sec: u32,

    /// Login attempts a client may burst
    #[arg(long, env = "KEYGATE_LOGIN_BURST", default_value_t = DEFAULT_LOGIN_BURST)]
    pub login_burst: u32,

    /// Rate limit clients by X-Forwarded-For (only behind a trusted proxy)
    #[arg(long, env = "KEYGATE_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    /// Log output format
    #[arg(short, long, env = "KEYGATE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the user table.
/// Returns None and logs an error if the file cannot be read or parsed.
pub fn load_users(path: Option<&str>) -> Option<UserStore> {
    let Some(path) = path else {
        warn!("No users file given, every login will be rejected");
        return Some(UserStore::new());
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read users file");
            return None;
        }
    };

    match UserStore::parse(&content) {
        Ok(users) => {
            info!(path = %path, count = users.len(), "Users loaded");
            Some(users)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Invalid users file");
            None
        }
    }
}

/// Handle the --hash-password flag: print the hash for a users file entry.
pub fn handle_hash_password(password: &str) {
    match hash_password(password) {
        Ok(hash) => println!("{}", hash),
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            std::process::exit(1);
        }
    }
}

/// Build the engine configuration from arguments.
pub fn auth_config(args: &Args) -> AuthConfig {
    AuthConfig::default()
        .with_header_name(args.header_name.clone())
        .with_scheme(args.scheme.clone())
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_subject_field(args.subject_field.clone())
        .with_expose_signature(args.expose_signature)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, users: UserStore) -> ServerConfig {
    let mut config = ServerConfig::new(auth_config(args), users);
    config.login_per_sec = args.login_per_sec;
    config.login_burst = args.login_burst;
    config.trust_forwarded_for = args.trust_forwarded_for;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["keygate"]);
        let config = auth_config(&args);

        assert_eq!(args.port, 7300);
        assert_eq!(config, AuthConfig::default());
        assert!(args.users_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "keygate",
            "--header-name",
            "X-Token",
            "--scheme",
            "",
            "--timeout-secs",
            "0",
            "--subject-field",
            "user_id",
            "--expose-signature",
        ]);
        let config = auth_config(&args);

        assert_eq!(config.header_name, "X-Token");
        assert_eq!(config.scheme, "");
        assert_eq!(config.timeout_secs(), None);
        assert_eq!(config.subject_field, "user_id");
        assert!(config.expose_signature);
    }

    #[test]
    fn test_hash_password_flag() {
        let args = Args::parse_from(["keygate", "--hash-password", "hunter2"]);
        assert_eq!(args.hash_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_load_users_file() {
        let path = std::env::temp_dir().join(format!("keygate-users-{}", std::process::id()));
        let hash = bcrypt::hash("wonderland", 4).unwrap();
        std::fs::write(&path, format!("alice:{}:admin\n", hash)).unwrap();

        let users = load_users(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(users.get("alice").unwrap().verify_password("wonderland"));
    }

    #[test]
    fn test_load_users_rejects_plaintext() {
        let path = std::env::temp_dir().join(format!("keygate-plain-{}", std::process::id()));
        std::fs::write(&path, "alice:wonderland\n").unwrap();

        let users = load_users(path.to_str());
        std::fs::remove_file(&path).ok();

        assert!(users.is_none());
    }

    #[test]
    fn test_load_users_missing_file() {
        assert!(load_users(Some("/nonexistent/keygate-users")).is_none());
    }

    #[test]
    fn test_load_users_without_file() {
        assert!(load_users(None).unwrap().is_empty());
    }
}
