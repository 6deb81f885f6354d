use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub subgraph_base_url: String,
    pub price_api_url: String,
    pub price_api_key: Option<String>,
    pub page_size: usize,
    pub hourly_price_max_age_days: i64,
    pub http_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let subgraph_base_url = env_map
            .get("SUBGRAPH_BASE_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("SUBGRAPH_BASE_URL".to_string()))?;

        let price_api_url = env_map
            .get("PRICE_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("PRICE_API_URL".to_string()))?;

        let price_api_key = env_map
            .get("PRICE_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let page_size = env_map
            .get("PAGE_SIZE")
            .map(|s| s.as_str())
            .unwrap_or("1000")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PAGE_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let hourly_price_max_age_days = env_map
            .get("HOURLY_PRICE_MAX_AGE_DAYS")
            .map(|s| s.as_str())
            .unwrap_or("90")
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "HOURLY_PRICE_MAX_AGE_DAYS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let http_timeout_secs = env_map
            .get("HTTP_TIMEOUT_SECS")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "HTTP_TIMEOUT_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            subgraph_base_url,
            price_api_url,
            price_api_key,
            page_size,
            hourly_price_max_age_days,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "SUBGRAPH_BASE_URL".to_string(),
            "https://subgraph-endpoints.superfluid.dev".to_string(),
        );
        map.insert(
            "PRICE_API_URL".to_string(),
            "https://pro-api.coingecko.com".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.hourly_price_max_age_days, 90);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.price_api_key.is_none());
    }

    #[test]
    fn test_missing_subgraph_base_url() {
        let mut env_map = setup_required_env();
        env_map.remove("SUBGRAPH_BASE_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "SUBGRAPH_BASE_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_price_api_url() {
        let mut env_map = setup_required_env();
        env_map.remove("PRICE_API_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "PRICE_API_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("PAGE_SIZE".to_string(), "0".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PAGE_SIZE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let mut env_map = setup_required_env();
        env_map.insert("PRICE_API_KEY".to_string(), "  ".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.price_api_key.is_none());
    }
}
