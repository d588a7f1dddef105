use std::env;

/// Errors raised while reading the environment at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} must be true or false, got {value:?}")]
    NotABool { name: &'static str, value: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// SMTP relay settings. Absent when `SMTP_HOST` is unset.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL. When unset the service keeps everything in memory.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub cookie_secure: bool,
    pub frontend_url: String,
    pub facebook_graph_url: String,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: number("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
            }),
            None => None,
        };

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            server_port: number("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            // One year at most, which keeps chrono's duration constructors in range.
            access_token_ttl_minutes: bounded("ACCESS_TOKEN_TTL_MINUTES", 15, 1, 525_600)?,
            refresh_token_ttl_days: bounded("REFRESH_TOKEN_TTL_DAYS", 7, 1, 365)?,
            cookie_secure: boolean("COOKIE_SECURE", false)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            facebook_graph_url: env::var("FACEBOOK_GRAPH_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com".to_string()),
            smtp,
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Todo API <noreply@localhost>".to_string()),
            bcrypt_cost: bounded("BCRYPT_COST", i64::from(bcrypt::DEFAULT_COST), 4, 31)? as u32,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
        None => Ok(default),
    }
}

fn bounded(name: &'static str, default: i64, min: i64, max: i64) -> Result<i64, ConfigError> {
    let value = number(name, default)?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn boolean(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::NotABool { name, value }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every environment mutation lives in this one test so parallel tests never race on it.
    #[test]
    fn test_config_from_env() {
        env::remove_var("DATABASE_URL");
        env::remove_var("SMTP_HOST");
        env::remove_var("JWT_SECRET");
        env::set_var("REFRESH_TOKEN_SECRET", "refresh");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));

        env::set_var("JWT_SECRET", "access");
        let config = Config::from_env().unwrap();

        assert!(config.database_url.is_none());
        assert!(config.smtp.is_none());
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.access_token_ttl_minutes, 15);
        assert_eq!(config.refresh_token_ttl_days, 7);
        assert!(!config.cookie_secure);
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");

        // Custom values
        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("COOKIE_SECURE", "true");
        env::set_var("SMTP_HOST", "smtp.example.com");

        let config = Config::from_env().unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert!(config.cookie_secure);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);

        env::set_var("REFRESH_TOKEN_TTL_DAYS", "9223372036854775807");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::OutOfRange { name: "REFRESH_TOKEN_TTL_DAYS", .. })
        ));
        env::set_var("REFRESH_TOKEN_TTL_DAYS", "30");
        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::OutOfRange { name: "ACCESS_TOKEN_TTL_MINUTES", .. })
        ));
        env::set_var("ACCESS_TOKEN_TTL_MINUTES", "5");
        env::set_var("BCRYPT_COST", "99");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::OutOfRange { name: "BCRYPT_COST", .. })
        ));
        env::set_var("BCRYPT_COST", "4");
        let config = Config::from_env().unwrap();
        assert_eq!(config.access_token_ttl_minutes, 5);
        assert_eq!(config.refresh_token_ttl_days, 30);
        assert_eq!(config.bcrypt_cost, 4);

        env::set_var("SERVER_PORT", "eighty");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::NotANumber { name: "SERVER_PORT", .. })
        ));

        for name in [
            "SERVER_PORT",
            "SERVER_HOST",
            "COOKIE_SECURE",
            "SMTP_HOST",
            "ACCESS_TOKEN_TTL_MINUTES",
            "REFRESH_TOKEN_TTL_DAYS",
            "BCRYPT_COST",
            "JWT_SECRET",
            "REFRESH_TOKEN_SECRET",
        ] {
            env::remove_var(name);
        }
    }
}
