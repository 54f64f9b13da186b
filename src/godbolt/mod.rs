//! Reqwest-based client for the Compiler Explorer REST API.

use anyhow::{bail, Context, Result};
use reqwest::{header::ACCEPT, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

pub mod libraries;
#[cfg(test)]
pub mod fake;

pub use libraries::{IncludePaths, Library};

/// Flags appended after the resolved include paths on every compile.
pub const BASE_COMPILER_FLAGS: &[&str] = &[
    "-O3",
    "-fcoroutines-ts",
    "-pthread",
    "-std=c++2a",
    "-stdlib=libc++",
];

/// The two operations the submit pipeline needs from the compiler service.
#[allow(async_fn_in_trait)]
pub trait CompileService {
    async fn libraries(&self) -> Result<Vec<Library>>;
    async fn compile(&self, request: &CompileRequest) -> Result<CompileResponse>;
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileRequest {
    pub source: String,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub compiler_options: serde_json::Map<String, serde_json::Value>,
    pub user_arguments: String,
    pub filters: Filters,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Filters {
    pub execute: bool,
}

impl CompileRequest {
    /// `include_flags` go first, then [`BASE_COMPILER_FLAGS`], joined by single spaces.
    pub fn new(source: String, include_flags: &[String], execute: bool) -> Self {
        let user_arguments = include_flags
            .iter()
            .map(String::as_str)
            .chain(BASE_COMPILER_FLAGS.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            source,
            options: RequestOptions {
                compiler_options: serde_json::Map::new(),
                user_arguments,
                filters: Filters { execute },
            },
        }
    }
}

/// Compile result. Every field may be omitted by the service; omitted codes are 0
/// and omitted lists are empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResponse {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub stderr: Vec<OutputLine>,
    #[serde(default)]
    pub exec_result: Option<ExecResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecResult {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub stdout: Vec<OutputLine>,
    #[serde(default)]
    pub stderr: Vec<OutputLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputLine {
    #[serde(default)]
    pub text: String,
}

impl CompileResponse {
    pub fn runtime_code(&self) -> i32 {
        self.exec_result.as_ref().map_or(0, |e| e.code)
    }

    pub fn runtime_stdout(&self) -> &[OutputLine] {
        self.exec_result.as_ref().map(|e| e.stdout.as_slice()).unwrap_or_default()
    }

    pub fn runtime_stderr(&self) -> &[OutputLine] {
        self.exec_result.as_ref().map(|e| e.stderr.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct GodboltClient {
    http: Client,
    base_url: String,
    compiler: String,
}

impl GodboltClient {
    pub fn from_config(cfg: &Config, compiler_override: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let compiler = compiler_override
            .map(str::to_string)
            .unwrap_or_else(|| cfg.compiler());
        Ok(Self::with_client(http, &cfg.api_base_url(), compiler))
    }

    pub fn with_client(http: Client, base_url: &str, compiler: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            compiler,
        }
    }

    fn libraries_url(&self) -> String {
        format!("{}/libraries/c++", self.base_url)
    }

    fn compile_url(&self) -> String {
        format!("{}/compiler/{}/compile", self.base_url, self.compiler)
    }
}

impl CompileService for GodboltClient {
    async fn libraries(&self) -> Result<Vec<Library>> {
        let url = self.libraries_url();
        debug!(%url, "fetching library metadata");
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("library metadata request failed: {} - {}", status, text);
        }
        resp.json::<Vec<Library>>()
            .await
            .with_context(|| format!("malformed library metadata from {}", url))
    }

    async fn compile(&self, request: &CompileRequest) -> Result<CompileResponse> {
        let url = self.compile_url();
        debug!(
            %url,
            arguments = %request.options.user_arguments,
            execute = request.options.filters.execute,
            "submitting source"
        );
        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("compile request failed: {} - {}", status, text);
        }
        resp.json::<CompileResponse>()
            .await
            .with_context(|| format!("malformed compile response from {}", url))
    }
}
