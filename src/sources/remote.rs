//! Source resolution for assets on foreign repositories.
//!
//! A foreign repository may or may not run this engine. When it does, a
//! derivatives query returns the remote source list, which is cached in a
//! shared tier with a repository-defined expiry; when it does not
//! (capability-negative response), the asset degrades to its primary
//! source. Remote failures are never fatal to the caller.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use vf_core::{Error, Result};

use crate::asset::FileAsset;
use crate::sources::descriptor::{ResolveOptions, SourceDescriptor};

/// Outcome of a remote derivatives query.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteDerivativesResponse {
    /// The remote repository answered with its source list.
    Derivatives(Vec<SourceDescriptor>),
    /// The remote repository does not support derivative queries.
    Unsupported,
}

/// Remote repository collaborator.
pub trait RemoteRepo: Send + Sync {
    /// Repository name, used as the cache tier key prefix.
    fn name(&self) -> &str;

    /// Expiry applied to cached source lists; `None` disables caching for
    /// this repository.
    fn cache_expiry(&self) -> Option<Duration>;

    /// Ask the remote endpoint for the derivatives of a title.
    fn query_derivatives(&self, title: &str) -> Result<RemoteDerivativesResponse>;
}

/// Shared cache tier for remote source lists, keyed by (repository, file).
pub trait SourceCache: Send + Sync {
    fn get(&self, repo: &str, name: &str) -> Option<Vec<SourceDescriptor>>;
    fn put(&self, repo: &str, name: &str, sources: &[SourceDescriptor], ttl: Duration);
}

/// In-memory [`SourceCache`] with per-entry deadlines.
#[derive(Default)]
pub struct MemorySourceCache {
    entries: RwLock<HashMap<(String, String), (Instant, Vec<SourceDescriptor>)>>,
}

impl MemorySourceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceCache for MemorySourceCache {
    fn get(&self, repo: &str, name: &str) -> Option<Vec<SourceDescriptor>> {
        let key = (repo.to_string(), name.to_string());
        let entries = self.entries.read();
        let (deadline, sources) = entries.get(&key)?;
        if Instant::now() >= *deadline {
            return None;
        }
        Some(sources.clone())
    }

    fn put(&self, repo: &str, name: &str, sources: &[SourceDescriptor], ttl: Duration) {
        let key = (repo.to_string(), name.to_string());
        self.entries
            .write()
            .insert(key, (Instant::now() + ttl, sources.to_vec()));
    }
}

/// Resolver for foreign assets: shared cache tier in front of the remote
/// endpoint, degrading to the primary source on any shortfall.
pub struct RemoteSourceResolver {
    repo: Arc<dyn RemoteRepo>,
    cache: Arc<dyn SourceCache>,
    base_url: Option<String>,
}

impl RemoteSourceResolver {
    pub fn new(repo: Arc<dyn RemoteRepo>, cache: Arc<dyn SourceCache>) -> Self {
        Self {
            repo,
            cache,
            base_url: None,
        }
    }

    /// Base URL used when expanding the primary-source fallback.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    pub fn resolve(
        &self,
        asset: &dyn FileAsset,
        opts: &ResolveOptions,
    ) -> Result<Vec<SourceDescriptor>> {
        let expiry = self.repo.cache_expiry();

        if expiry.is_some() {
            if let Some(hit) = self.cache.get(self.repo.name(), asset.name()) {
                tracing::debug!(file = %asset.name(), repo = %self.repo.name(), "remote sources cache hit");
                return Ok(hit);
            }
        }

        let primary_only =
            || vec![SourceDescriptor::primary(asset, opts, self.base_url.as_deref())];

        match self.repo.query_derivatives(asset.name()) {
            Ok(RemoteDerivativesResponse::Derivatives(sources)) => {
                if let Some(ttl) = expiry {
                    if !sources.is_empty() {
                        self.cache.put(self.repo.name(), asset.name(), &sources, ttl);
                    }
                }
                Ok(sources)
            }
            Ok(RemoteDerivativesResponse::Unsupported) => {
                // Remote repository without this engine installed: fall
                // back to the plain file metadata.
                Ok(primary_only())
            }
            Err(e) => {
                tracing::warn!(file = %asset.name(), repo = %self.repo.name(), "remote derivatives query failed: {e}");
                Ok(primary_only())
            }
        }
    }
}

/// HTTP implementation of [`RemoteRepo`] against a wiki-style action API
/// query endpoint.
pub struct HttpRemoteRepo {
    name: String,
    endpoint: String,
    cache_expiry: Option<Duration>,
    client: reqwest::blocking::Client,
}

impl HttpRemoteRepo {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        cache_expiry: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            cache_expiry,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl RemoteRepo for HttpRemoteRepo {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache_expiry(&self) -> Option<Duration> {
        self.cache_expiry
    }

    fn query_derivatives(&self, title: &str) -> Result<RemoteDerivativesResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "videoinfo"),
                ("viprop", "derivatives"),
                ("titles", title),
            ])
            .send()
            .map_err(|e| Error::remote(format!("request to {} failed: {e}", self.endpoint)))?;

        let body: Value = response
            .json()
            .map_err(|e| Error::remote(format!("malformed response from {}: {e}", self.endpoint)))?;

        parse_remote_response(&body)
    }
}

/// Interpret a remote query response body.
///
/// A warning complaining about the `videoinfo` prop means the remote
/// repository has no derivative support; otherwise the derivatives list is
/// pulled out of the first page's videoinfo entry.
pub fn parse_remote_response(body: &Value) -> Result<RemoteDerivativesResponse> {
    if let Some(warning) = body
        .pointer("/warnings/query/*")
        .and_then(Value::as_str)
    {
        if warning.contains("Unrecognized value for parameter 'prop'") {
            return Ok(RemoteDerivativesResponse::Unsupported);
        }
    }

    let Some(pages) = body.pointer("/query/pages").and_then(Value::as_object) else {
        return Ok(RemoteDerivativesResponse::Derivatives(Vec::new()));
    };

    let mut sources = Vec::new();
    if let Some(page) = pages.values().next() {
        if let Some(derivatives) = page
            .pointer("/videoinfo/0/derivatives")
            .and_then(Value::as_array)
        {
            for entry in derivatives {
                let descriptor: SourceDescriptor = serde_json::from_value(entry.clone())
                    .map_err(|e| Error::remote(format!("bad derivative entry: {e}")))?;
                sources.push(descriptor);
            }
        }
    }

    Ok(RemoteDerivativesResponse::Derivatives(sources))
}
