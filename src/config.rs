use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sled_path: String,
    pub cors_origins: Vec<String>,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_iss: String,
    pub token_aud: String,
    pub token_ttl_seconds: u64,
    /// Clock-skew tolerance applied to `exp`. Zero by default: a token is
    /// rejected from its exact expiry instant.
    pub token_leeway_seconds: u64,
    /// Secure attribute on the token cookie. Defaults to true; turned off
    /// for plain-http development setups.
    pub cookie_secure: bool,
}

/// Match an origin against a wildcard pattern from CORS_ORIGINS
/// (e.g. `https://*.example.com`).
pub fn is_origin_allowed(patterns: &[String], origin: &str) -> bool {
    patterns.iter().any(|p| origin_matches(p, origin))
}

fn origin_matches(pattern: &str, origin: &str) -> bool {
    // Convert wildcard pattern to anchored regex
    let mut re_pat = String::new();
    re_pat.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re_pat.push_str(".*"),
            '.' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\' => {
                re_pat.push('\\');
                re_pat.push(ch);
            }
            _ => re_pat.push(ch),
        }
    }
    re_pat.push('$');
    Regex::new(&re_pat)
        .map(|re| re.is_match(origin))
        .unwrap_or(false)
}

pub fn load_config_from_file(config_path: &str) -> AppConfig {
    // Load .env file if it exists
    let abs_config_path = Path::new(config_path)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(config_path));

    if Path::new(config_path).exists() {
        match dotenvy::from_filename(config_path) {
            Ok(_) => tracing::info!("Loaded .env file from: {}", abs_config_path.display()),
            Err(e) => tracing::warn!(
                "Failed to load .env file from {}: {}",
                abs_config_path.display(),
                e
            ),
        }
    } else {
        tracing::warn!(
            ".env file not found at: {} (using defaults)",
            abs_config_path.display()
        );
    }

    let server = ServerConfig {
        host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port: std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5001),
        name: std::env::var("SERVER_NAME").unwrap_or_else(|_| "partsdesk".to_string()),
    };

    let logging = LoggingConfig {
        level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        file_enabled: std::env::var("LOG_FILE_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false),
        file_path: std::env::var("LOG_FILE_PATH").ok(),
    };

    // Sled path: DB_PATH directory + DB_NAME
    let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "partsdesk_data".to_string());
    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "data".to_string());
    let sled_path = if db_path.ends_with('/') {
        format!("{}{}", db_path, db_name)
    } else {
        format!("{}/{}", db_path, db_name)
    };

    // Comma-separated origin patterns; empty means CORS effectively disabled.
    let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let security = SecurityConfig {
        jwt_secret: std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "partsdesk_dev_secret".to_string()),
        token_iss: std::env::var("TOKEN_ISS").unwrap_or_else(|_| "partsdesk".into()),
        token_aud: std::env::var("TOKEN_AUD").unwrap_or_else(|_| "partsdesk_dashboard".into()),
        token_ttl_seconds: std::env::var("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "43200".into())
            .parse()
            .unwrap_or(43200),
        token_leeway_seconds: std::env::var("TOKEN_LEEWAY_SECONDS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .unwrap_or(0),
        cookie_secure: std::env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .unwrap_or(true),
    };

    AppConfig {
        server,
        sled_path,
        cors_origins,
        logging,
        security,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn origin_wildcards() {
        let patterns = vec![
            "http://localhost:*".to_string(),
            "https://*.example.com".to_string(),
        ];
        assert!(is_origin_allowed(&patterns, "http://localhost:5173"));
        assert!(is_origin_allowed(&patterns, "https://admin.example.com"));
        assert!(!is_origin_allowed(&patterns, "https://evil.com"));
        assert!(!is_origin_allowed(&patterns, "https://example.com.evil.com"));
    }

    #[test]
    #[serial]
    fn defaults_without_env() {
        temp_env::with_vars_unset(
            [
                "HOST",
                "PORT",
                "DB_PATH",
                "DB_NAME",
                "JWT_SECRET",
                "TOKEN_TTL_SECONDS",
                "TOKEN_LEEWAY_SECONDS",
                "COOKIE_SECURE",
                "CORS_ORIGINS",
            ],
            || {
                let cfg = load_config_from_file("/nonexistent/.env");
                assert_eq!(cfg.server.port, 5001);
                assert_eq!(cfg.sled_path, "data/partsdesk_data");
                assert_eq!(cfg.security.token_ttl_seconds, 43200);
                assert_eq!(cfg.security.token_leeway_seconds, 0);
                assert!(cfg.security.cookie_secure);
                assert!(cfg.cors_origins.is_empty());
            },
        );
    }

    #[test]
    #[serial]
    fn env_overrides() {
        temp_env::with_vars(
            [
                ("PORT", Some("9000")),
                ("CORS_ORIGINS", Some("http://a.dev, http://b.dev")),
                ("TOKEN_TTL_SECONDS", Some("60")),
                ("COOKIE_SECURE", Some("false")),
            ],
            || {
                let cfg = load_config_from_file("/nonexistent/.env");
                assert_eq!(cfg.server.port, 9000);
                assert_eq!(cfg.cors_origins, vec!["http://a.dev", "http://b.dev"]);
                assert_eq!(cfg.security.token_ttl_seconds, 60);
                assert!(!cfg.security.cookie_secure);
            },
        );
    }
}
