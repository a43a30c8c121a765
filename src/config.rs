use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub backend_base_url: String,
    pub backend_timeout_secs: u64,

    // Sessions
    pub session_ttl_secs: u64, // idle timeout
    pub session_capacity: u64,
    pub cookie_secure: bool,

    // Payslip poll
    pub payslip_poll_attempts: u32,
    pub payslip_poll_delay_secs: u64,

    pub max_upload_bytes: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_password_reset_per_min: u32,
    pub rate_portal_per_min: u32,

    pub portal_prefix: String,
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            backend_base_url: "http://localhost:5000".to_string(),
            backend_timeout_secs: 30,
            session_ttl_secs: 8 * 60 * 60,
            session_capacity: 10_000,
            cookie_secure: false,
            payslip_poll_attempts: 5,
            payslip_poll_delay_secs: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_password_reset_per_min: 10,
            rate_portal_per_min: 1000,
            portal_prefix: "/portal".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

/// Reads `key`, falling back to `default` when unset. A set but malformed value is an error.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let d = Config::default();

        let backend_base_url: String = env_or("BACKEND_BASE_URL", d.backend_base_url)?;
        let portal_prefix: String = env_or("PORTAL_PREFIX", d.portal_prefix)?;

        let config = Self {
            server_addr: env_or("SERVER_ADDR", d.server_addr)?,
            backend_base_url: backend_base_url.trim_end_matches('/').to_string(),
            backend_timeout_secs: env_or("BACKEND_TIMEOUT_SECS", d.backend_timeout_secs)?,
            session_ttl_secs: env_or("SESSION_TTL_SECS", d.session_ttl_secs)?,
            session_capacity: env_or("SESSION_CAPACITY", d.session_capacity)?,
            cookie_secure: env_or("COOKIE_SECURE", d.cookie_secure)?,
            payslip_poll_attempts: env_or("PAYSLIP_POLL_ATTEMPTS", d.payslip_poll_attempts)?,
            payslip_poll_delay_secs: env_or("PAYSLIP_POLL_DELAY_SECS", d.payslip_poll_delay_secs)?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", d.max_upload_bytes)?,
            rate_login_per_min: env_or("RATE_LOGIN_PER_MIN", d.rate_login_per_min)?,
            rate_register_per_min: env_or("RATE_REGISTER_PER_MIN", d.rate_register_per_min)?,
            rate_password_reset_per_min: env_or(
                "RATE_PASSWORD_RESET_PER_MIN",
                d.rate_password_reset_per_min,
            )?,
            rate_portal_per_min: env_or("RATE_PORTAL_PER_MIN", d.rate_portal_per_min)?,
            portal_prefix: portal_prefix.trim_end_matches('/').to_string(),
            log_dir: env_or("LOG_DIR", d.log_dir)?,
        };

        anyhow::ensure!(
            config.payslip_poll_attempts > 0,
            "PAYSLIP_POLL_ATTEMPTS must be at least 1"
        );

        Ok(config)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn payslip_poll_delay(&self) -> Duration {
        Duration::from_secs(self.payslip_poll_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_poll_policy() {
        let config = Config::default();
        assert_eq!(config.payslip_poll_attempts, 5);
        assert_eq!(config.payslip_poll_delay(), Duration::from_secs(5));
        assert_eq!(config.portal_prefix, "/portal");
    }

    #[test]
    fn malformed_number_is_rejected() {
        // SAFETY: test-local variable name, no other test reads it.
        unsafe { env::set_var("HR_PORTAL_TEST_NUMBER", "five") };
        let parsed: Result<u32> = env_or("HR_PORTAL_TEST_NUMBER", 5);
        assert!(parsed.is_err());

        let fallback: u32 = env_or("HR_PORTAL_TEST_UNSET", 7).unwrap();
        assert_eq!(fallback, 7);
    }
}
