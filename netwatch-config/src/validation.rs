//! Custom validation functions for configuration.
//!
//! Shared validation logic used across the configuration sections.

use validator::ValidationError;

/// Validate that an interface name follows Linux naming conventions.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-zA-Z0-9_.:-]+$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;

    if !name.is_empty() && name.len() <= 15 && re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate that an endpoint is an absolute http(s) URL.
pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^https?://[^\\s]+$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(url) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_http_url"))
    }
}

/// Validate a message bus topic name (broker-legal character set).
pub fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-zA-Z0-9._-]+$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if !topic.is_empty() && topic.len() <= 249 && re.is_match(topic) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_topic"))
    }
}

/// Validate a comma-separated `host:port` broker list.
pub fn validate_brokers(brokers: &str) -> Result<(), ValidationError> {
    let valid = !brokers.trim().is_empty()
        && brokers
            .split(',')
            .all(|b| b.contains(':') && !b.trim().is_empty());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_broker_list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_names() {
        assert!(validate_interface("eth0").is_ok());
        assert!(validate_interface("wlp3s0").is_ok());
        assert!(validate_interface("").is_err());
        assert!(validate_interface("way_too_long_interface_name").is_err());
        assert!(validate_interface("eth0; rm -rf").is_err());
    }

    #[test]
    fn broker_lists() {
        assert!(validate_brokers("localhost:9092").is_ok());
        assert!(validate_brokers("k1:9092,k2:9092").is_ok());
        assert!(validate_brokers("").is_err());
        assert!(validate_brokers("no-port").is_err());
    }

    #[test]
    fn topic_names() {
        assert!(validate_topic("netwatch.raw-packets").is_ok());
        assert!(validate_topic("bad topic").is_err());
    }
}
