use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::executor::{ExecutorConfig, RequestExecutor};
use super::DocbaseClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, Transport};

pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_APP_ID_HEADER: &str = "x-app-id";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub struct DocbaseClientBuilder {
    base_url: String,
    api_key: Option<String>,
    app_id: Option<String>,
    offline: bool,
    timeout_ms: Option<u64>,
    api_key_header: String,
    app_id_header: String,
    transport: Option<Arc<dyn Transport>>,
}

impl DocbaseClientBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().to_string(),
            api_key: None,
            app_id: None,
            offline: false,
            timeout_ms: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            app_id_header: DEFAULT_APP_ID_HEADER.to_string(),
            transport: None,
        }
    }

    pub fn api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Scope every call to one application within the tenant.
    pub fn app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    /// Queue writes that fail for lack of network instead of dropping them.
    pub fn offline(mut self, enabled: bool) -> Self {
        self.offline = enabled;
        self
    }

    /// Only applies to the default HTTP transport.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn api_key_header(mut self, name: &str) -> Self {
        self.api_key_header = name.to_string();
        self
    }

    pub fn app_id_header(mut self, name: &str) -> Self {
        self.app_id_header = name.to_string();
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> ClientResult<DocbaseClient> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::invalid_request(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_request(format!(
                "Base URL '{}' cannot be used as an endpoint",
                self.base_url
            )));
        }

        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClientError::invalid_request("An API key is required"))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let timeout = Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
                let http = HttpTransport::with_timeout(timeout)
                    .map_err(|e| ClientError::invalid_request(e.message))?;
                Arc::new(http) as Arc<dyn Transport>
            }
        };

        let config = ExecutorConfig {
            base_url,
            api_key,
            app_id: self.app_id.filter(|a| !a.is_empty()),
            api_key_header: self.api_key_header,
            app_id_header: self.app_id_header,
            offline: self.offline,
        };

        Ok(DocbaseClient::from_executor(RequestExecutor::new(
            transport, config,
        )))
    }
}
