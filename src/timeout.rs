use std::time::Duration;

/// Timeouts applied by [`ReqwestTransport`](crate::transport::ReqwestTransport)
///
/// A timeout set on an individual [`Request`](crate::Request) takes precedence
/// over [`timeout`](Self::timeout) for that request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Overall request timeout
    pub timeout: Option<Duration>,
    /// Connection establishment timeout
    pub connect_timeout: Option<Duration>,
    /// How long an idle pooled connection is kept
    pub pool_idle_timeout: Option<Duration>,
}

impl TimeoutConfig {
    /// Create a configuration with only an overall timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            connect_timeout: None,
            pool_idle_timeout: None,
        }
    }

    /// Create a configuration without any timeout
    pub fn none() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            pool_idle_timeout: None,
        }
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the pool idle timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Timeout for one request: its own if set, otherwise the configured one
    pub fn effective_timeout(&self, request_timeout: Option<Duration>) -> Option<Duration> {
        request_timeout.or(self.timeout)
    }

    /// Apply the connection level settings to a reqwest client builder
    pub(crate) fn apply_to_builder(
        &self,
        mut builder: reqwest::ClientBuilder,
    ) -> reqwest::ClientBuilder {
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(timeout);
        }
        builder
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            pool_idle_timeout: Some(Duration::from_secs(90)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = TimeoutConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.pool_idle_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_builder_methods() {
        let config = TimeoutConfig::none()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(1));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.pool_idle_timeout, None);
    }

    #[test]
    fn test_request_timeout_wins() {
        let config = TimeoutConfig::new(Duration::from_secs(30));
        assert_eq!(
            config.effective_timeout(Some(Duration::from_millis(50))),
            Some(Duration::from_millis(50))
        );
        assert_eq!(config.effective_timeout(None), Some(Duration::from_secs(30)));
        assert_eq!(TimeoutConfig::none().effective_timeout(None), None);
    }
}
