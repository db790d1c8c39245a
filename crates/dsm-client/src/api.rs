//! Single-request client for `auth.cgi` / `entry.cgi`.
//!
//! This layer never retries and never looks at the session state: it sends
//! exactly one HTTP request and reports either a transport failure or the
//! decoded envelope. Relogin policy lives in [`crate::SessionManager`].

use reqwest::{multipart, Client, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;

use crate::{DsmConfig, DsmError, Envelope};

pub const AUTH_API: &str = "SYNO.API.Auth";
const SID_PARAM: &str = "_sid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Auth,
    Entry,
}

impl Endpoint {
    fn file_name(self) -> &'static str {
        match self {
            Self::Auth => "auth.cgi",
            Self::Entry => "entry.cgi",
        }
    }
}

/// File content attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Everything in the query string
    Query,
    /// Everything in an url-encoded body
    Form,
    /// Parameters as text parts followed by the file part
    Multipart(FilePart),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub api: &'static str,
    pub version: u32,
    pub method: &'static str,
    pub params: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(api: &'static str, version: u32, method: &'static str) -> Self {
        Self {
            endpoint: Endpoint::Entry,
            api,
            version,
            method,
            params: Vec::new(),
            body: RequestBody::Query,
        }
    }

    pub fn post(api: &'static str, version: u32, method: &'static str) -> Self {
        Self {
            body: RequestBody::Form,
            ..Self::get(api, version, method)
        }
    }

    pub fn auth(version: u32, method: &'static str) -> Self {
        Self {
            endpoint: Endpoint::Auth,
            ..Self::get(AUTH_API, version, method)
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn bool_param(self, key: impl Into<String>, value: bool) -> Self {
        self.param(key, if value { "true" } else { "false" })
    }

    /// JSON-encoded parameter, used for array arguments such as `additional`.
    pub fn json_param(self, key: impl Into<String>, value: &Value) -> Self {
        self.param(key, value.to_string())
    }

    pub fn with_file(mut self, file: FilePart) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }

    pub fn into_form(mut self) -> Self {
        self.body = RequestBody::Form;
        self
    }

    fn base_params(&self) -> [(&'static str, String); 3] {
        [
            ("api", self.api.to_string()),
            ("version", self.version.to_string()),
            ("method", self.method.to_string()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    webapi: Url,
}

impl ApiClient {
    pub fn new(config: &DsmConfig) -> Result<Self, DsmError> {
        let webapi = config.webapi_base()?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        if !config.verify_tls {
            tracing::debug!(host = %webapi, "TLS certificate validation disabled");
        }

        Ok(Self { http, webapi })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, DsmError> {
        self.webapi
            .join(endpoint.file_name())
            .map_err(|e| DsmError::Configuration(format!("invalid endpoint URL: {}", e)))
    }

    /// Sends one request and decodes the envelope.
    pub async fn call(&self, request: &ApiRequest, sid: Option<&str>) -> Result<Envelope, DsmError> {
        let response = self.build(request, sid)?.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            api = request.api,
            method = request.method,
            status = status.as_u16(),
            bytes = body.len(),
            "DSM response"
        );

        match Envelope::parse(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(DsmError::InvalidResponse(format!(
                "HTTP {} from {}.{}",
                status, request.api, request.method
            ))),
            Err(e) => Err(e),
        }
    }

    /// Sends one request and unwraps the envelope into its payload.
    pub async fn send(&self, request: &ApiRequest, sid: Option<&str>) -> Result<Value, DsmError> {
        self.call(request, sid)
            .await?
            .into_result(request.api, request.method)
    }

    /// Sends a request whose success response is raw file content.
    ///
    /// Failures still come back as a JSON envelope, so a JSON body that
    /// decodes to `success: false` is reported as a failure; anything else is
    /// the file itself.
    pub async fn download(&self, request: &ApiRequest, sid: Option<&str>) -> Result<Vec<u8>, DsmError> {
        let response = self.build(request, sid)?.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json") || v.starts_with("text/json"));
        let body = response.bytes().await?;

        if is_json {
            if let Ok(envelope @ Envelope::Failure { .. }) = Envelope::parse(&body) {
                return envelope
                    .into_result(request.api, request.method)
                    .map(|_| Vec::new());
            }
        }

        if !status.is_success() {
            return Err(DsmError::InvalidResponse(format!(
                "HTTP {} from {}.{}",
                status, request.api, request.method
            )));
        }

        Ok(body.to_vec())
    }

    fn build(&self, request: &ApiRequest, sid: Option<&str>) -> Result<RequestBuilder, DsmError> {
        let url = self.endpoint_url(request.endpoint)?;
        let base = request.base_params();

        tracing::debug!(
            api = request.api,
            method = request.method,
            version = request.version,
            "DSM request"
        );

        let builder = match &request.body {
            RequestBody::Query => {
                let mut query: Vec<(&str, &str)> =
                    base.iter().map(|(k, v)| (*k, v.as_str())).collect();
                query.extend(request.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                if let Some(sid) = sid {
                    query.push((SID_PARAM, sid));
                }
                self.http.get(url).query(&query)
            }
            RequestBody::Form => {
                let mut form: Vec<(&str, &str)> =
                    base.iter().map(|(k, v)| (*k, v.as_str())).collect();
                form.extend(request.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                if let Some(sid) = sid {
                    form.push((SID_PARAM, sid));
                }
                self.http.post(url).form(&form)
            }
            RequestBody::Multipart(file) => {
                let mut form = multipart::Form::new();
                for (key, value) in base {
                    form = form.text(key, value);
                }
                for (key, value) in &request.params {
                    form = form.text(key.clone(), value.clone());
                }
                let part = multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str("application/octet-stream")?;
                form = form.part("file", part);

                // The upload CGI only reads the SID from the query string.
                let mut builder = self.http.post(url);
                if let Some(sid) = sid {
                    builder = builder.query(&[(SID_PARAM, sid)]);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}
