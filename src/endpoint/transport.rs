//! Per-endpoint HTTP session
//!
//! Each configured account gets its own `reqwest::Client`. TLS verification,
//! proxies, timeout and the API-key header are fixed when the client is built
//! and never change afterwards, so concurrent endpoints cannot affect each other.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::error::{EndpointError, EndpointResult};

/// Immutable connection settings for one endpoint
#[derive(Clone)]
pub struct SessionSettings {
    /// Display label used in log lines
    pub label: String,
    pub base_url: String,
    pub auth_header: &'static str,
    pub auth_value: String,
    pub proxies: Option<BTreeMap<String, String>>,
    pub ssl_verify: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("label", &self.label)
            .field("base_url", &self.base_url)
            .field("auth_header", &self.auth_header)
            .field("proxies", &self.proxies)
            .field("ssl_verify", &self.ssl_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Authenticated HTTP session bound to one endpoint
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    base_url: String,
    label: String,
}

impl HttpSession {
    pub fn build(settings: &SessionSettings) -> EndpointResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&settings.auth_value).map_err(|_| {
            EndpointError::Client {
                message: format!("API keys for {} contain invalid characters", settings.label),
            }
        })?;
        auth_value.set_sensitive(true);
        headers.insert(HeaderName::from_static(settings.auth_header), auth_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(crate::core::version::user_agent())
            .timeout(settings.timeout);

        if !settings.ssl_verify {
            log::debug!(
                "TLS certificate verification disabled for {}",
                settings.label
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(proxies) = &settings.proxies {
            for (scheme, address) in proxies {
                let proxy = match scheme.as_str() {
                    "http" => reqwest::Proxy::http(address.as_str()),
                    "https" => reqwest::Proxy::https(address.as_str()),
                    "all" => reqwest::Proxy::all(address.as_str()),
                    other => {
                        return Err(EndpointError::Client {
                            message: format!("unsupported proxy scheme '{}'", other),
                        })
                    }
                }
                .map_err(|e| EndpointError::Client {
                    message: format!("invalid {} proxy '{}': {}", scheme, address, e),
                })?;
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().map_err(|e| EndpointError::Client {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            label: settings.label.clone(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, String)]) -> RequestBuilder {
        let url = self.build_url(path);
        log::debug!("{} {} {}", self.label, method, url);
        let request = self.client.request(method, url);
        if query.is_empty() {
            request
        } else {
            request.query(query)
        }
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> EndpointResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| EndpointError::from_transport(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EndpointError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> EndpointResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EndpointError::from_transport(operation, e))?;
        serde_json::from_slice(&bytes).map_err(|source| EndpointError::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    /// GET with query parameters, decoding a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> EndpointResult<T> {
        let response = self
            .send(operation, self.request(Method::GET, path, query))
            .await?;
        Self::decode(operation, response).await
    }

    /// POST a JSON body, decoding a JSON response
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> EndpointResult<T> {
        let request = self.request(Method::POST, path, query).json(body);
        let response = self.send(operation, request).await?;
        Self::decode(operation, response).await
    }

    /// Stream a response body into `destination`. A partial file is removed on failure.
    pub async fn download_to<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&B>,
        destination: &Path,
    ) -> EndpointResult<u64> {
        let mut request = self.request(method, path, &[]);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(operation, request).await?;

        match stream_to_file(operation, response, destination).await {
            Ok(written) => Ok(written),
            Err(e) => {
                let _ = tokio::fs::remove_file(destination).await;
                Err(e)
            }
        }
    }

    /// Multipart upload of a local file under `field`, decoding a JSON response
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        field: &'static str,
        file: &Path,
    ) -> EndpointResult<T> {
        let contents = tokio::fs::read(file)
            .await
            .map_err(|e| EndpointError::io(operation, file, e))?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "scan.nessus".to_string());

        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name);
        let form = reqwest::multipart::Form::new().part(field, part);

        let request = self.request(Method::POST, path, &[]).multipart(form);
        let response = self.send(operation, request).await?;
        Self::decode(operation, response).await
    }
}

async fn stream_to_file(
    operation: &str,
    mut response: Response,
    destination: &Path,
) -> EndpointResult<u64> {
    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| EndpointError::io(operation, destination, e))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| EndpointError::from_transport(operation, e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| EndpointError::io(operation, destination, e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| EndpointError::io(operation, destination, e))?;

    Ok(written)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

/// Render a JSON id (number or string) as a plain string
pub fn id_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
