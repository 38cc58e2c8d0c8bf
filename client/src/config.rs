use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network location of the reporting service, split out of the configured URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub path: String,
}

impl Endpoint {
    /// Parse an endpoint URL. Transport security follows the scheme and the
    /// port falls back to the scheme's well-known port.
    pub fn parse(url: &str) -> Result<Self, String> {
        let parsed = Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;

        let secure = match parsed.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(format!("Unsupported URL scheme '{}'", other)),
        };

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| format!("URL '{}' has no host", url))?
            .to_string();

        let port = parsed
            .port_or_known_default()
            .unwrap_or(if secure { 443 } else { 80 });

        Ok(Self {
            host,
            port,
            secure,
            path: parsed.path().to_string(),
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme(), self.host, self.port, self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub endpoint: Endpoint,
    pub api_key: String,
    pub timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(endpoint: Endpoint, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_url(url: &str, api_key: impl Into<String>) -> Result<Self, String> {
        Ok(Self::new(Endpoint::parse(url)?, api_key))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.host.is_empty() {
            return Err("Endpoint host cannot be empty".to_string());
        }

        if self.endpoint.port == 0 {
            return Err("Endpoint port must be greater than 0".to_string());
        }

        if self.api_key.trim().is_empty() {
            return Err("API key cannot be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_endpoint() {
        let endpoint =
            Endpoint::parse("https://testlink.example.com/lib/api/xmlrpc/v1/xmlrpc.php").unwrap();
        assert_eq!(endpoint.host, "testlink.example.com");
        assert_eq!(endpoint.port, 443);
        assert!(endpoint.secure);
        assert_eq!(endpoint.path, "/lib/api/xmlrpc/v1/xmlrpc.php");
    }

    #[test]
    fn test_parse_http_endpoint_with_port() {
        let endpoint = Endpoint::parse("http://localhost:8080/testlink").unwrap();
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 8080);
        assert!(!endpoint.secure);
        assert_eq!(endpoint.url(), "http://localhost:8080/testlink");
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(Endpoint::parse("").is_err());
        assert!(Endpoint::parse("not a url").is_err());
        assert!(Endpoint::parse("ftp://example.com/").is_err());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = ConnectionSettings::from_url("http://localhost", "key").unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeout, Duration::from_secs(30));

        settings.api_key = "  ".to_string();
        assert!(settings.validate().is_err());

        settings.api_key = "key".to_string();
        settings = settings.with_timeout(Duration::from_secs(0));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_serialization() {
        let settings = ConnectionSettings::from_url("https://tl.example.com", "secret").unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        let deserialized: ConnectionSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings.endpoint, deserialized.endpoint);
        assert_eq!(settings.api_key, deserialized.api_key);
    }
}
