// 🌐 HTTP Backend - POST {base}/integrations/{slug}/load

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::credentials::CredentialBundle;
use crate::error::LoadError;
use crate::loader::Backend;
use crate::provider::Provider;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder().timeout(timeout).build()?;

        Ok(HttpBackend { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn load_url(&self, provider: Provider) -> String {
        format!("{}/integrations/{}/load", self.base_url, provider.slug())
    }
}

/// Pull a string `detail` out of an error body, if there is one
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn load(&self, provider: Provider, bundle: &CredentialBundle) -> Result<Value, LoadError> {
        let credentials = serde_json::to_string(bundle.credentials())?;

        let resp = self
            .http
            .post(self.load_url(provider))
            .form(&[("credentials", credentials)])
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!(provider = provider.name(), status = status.as_u16(), "backend responded");

        if status.is_success() {
            return Ok(resp.json::<Value>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(LoadError::Backend {
            status: status.as_u16(),
            detail: error_detail(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_url_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();

        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(
            backend.load_url(Provider::HubSpot),
            "http://localhost:8000/integrations/hubspot/load"
        );
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail":"invalid token"}"#), Some("invalid token".to_string()));
        assert_eq!(error_detail(r#"{"detail":[{"loc":["body"]}]}"#), None);
        assert_eq!(error_detail("Internal Server Error"), None);
        assert_eq!(error_detail(""), None);
    }
}
