use crate::http::HttpConfig;

/// Settings the response synthesis needs from the server configuration
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Value of the `Server` header on every response
    pub server_name: String,
    /// Largest body a `content` directive may ask for
    pub max_content_length: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        HttpConfig::default().into()
    }
}

impl From<HttpConfig> for SynthesisConfig {
    fn from(config: HttpConfig) -> Self {
        Self::from(&config)
    }
}

impl From<&HttpConfig> for SynthesisConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            server_name: config.server_name.clone(),
            max_content_length: config.max_content_length,
        }
    }
}
