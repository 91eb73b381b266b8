//! Source resolution: the entry point of the engine.
//!
//! For a local asset the resolver walks the enabled profile list, exposes
//! ready derivatives, lazily admits encode jobs for eligible-but-missing
//! ones, and runs a second coverage pass so every enabled codec family is
//! represented by at least one ready-or-pending derivative. Foreign assets
//! are delegated to the remote resolver.

use std::collections::HashSet;
use std::sync::Arc;

use vf_core::{CodecFamily, EngineConfig, Result};

use crate::asset::FileAsset;
use crate::catalog::DerivativeCatalog;
use crate::files::DerivativeStore;
use crate::geometry;
use crate::queue::{JobQueue, JobQueueGateway};
use crate::sources::descriptor::{ResolveOptions, SourceDescriptor};
use crate::sources::remote::RemoteSourceResolver;
use crate::store::{StateStore, TranscodeStateStore};

/// Top-level orchestrator for derivative resolution.
pub struct SourceResolver {
    config: EngineConfig,
    catalog: DerivativeCatalog,
    state_backend: Arc<dyn StateStore>,
    gateway: JobQueueGateway,
    derivatives: Arc<dyn DerivativeStore>,
    remote: Option<RemoteSourceResolver>,
}

impl SourceResolver {
    pub fn new(
        config: EngineConfig,
        catalog: DerivativeCatalog,
        state_backend: Arc<dyn StateStore>,
        queue: Arc<dyn JobQueue>,
        derivatives: Arc<dyn DerivativeStore>,
    ) -> Self {
        Self {
            config,
            catalog,
            state_backend,
            gateway: JobQueueGateway::new(queue),
            derivatives,
            remote: None,
        }
    }

    /// Attach the resolver used for assets on foreign repositories.
    pub fn with_remote(mut self, remote: RemoteSourceResolver) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DerivativeCatalog {
        &self.catalog
    }

    /// Create the session-scoped state cache for one resolution request.
    ///
    /// Hosts create one per request and drop it at request end; the cache
    /// is never shared across requests.
    pub fn new_session(&self) -> TranscodeStateStore {
        TranscodeStateStore::new(Arc::clone(&self.state_backend))
    }

    /// Resolve the ordered source list for an asset, primary first.
    ///
    /// Local assets go through the state table and job queue; foreign
    /// assets are answered by the remote resolver, degrading to the
    /// primary source alone when none is attached.
    pub fn resolve(
        &self,
        session: &TranscodeStateStore,
        asset: &dyn FileAsset,
        opts: &ResolveOptions,
    ) -> Result<Vec<SourceDescriptor>> {
        if asset.is_local() {
            return self.resolve_local(session, asset, opts);
        }
        match self.remote {
            Some(ref remote) => remote.resolve(asset, opts),
            None => {
                tracing::debug!(file = %asset.name(), "foreign asset with no remote resolver attached");
                Ok(vec![SourceDescriptor::primary(
                    asset,
                    opts,
                    self.config.base_url.as_deref(),
                )])
            }
        }
    }

    fn resolve_local(
        &self,
        session: &TranscodeStateStore,
        asset: &dyn FileAsset,
        opts: &ResolveOptions,
    ) -> Result<Vec<SourceDescriptor>> {
        let base_url = self.config.base_url.as_deref();
        let mut sources = vec![SourceDescriptor::primary(asset, opts, base_url)];

        // No derivatives for disabled transcoding, historical revisions,
        // or audio (audio has no derivative profiles in this engine).
        if !self.config.enable_transcode || asset.is_old() || asset.is_audio() {
            return Ok(sources);
        }

        // Families the source container already satisfies.
        let mut covered: HashSet<CodecFamily> = HashSet::new();
        if let Some(family) = CodecFamily::from_extension(asset.container()) {
            covered.insert(family);
        }

        // First pass: profiles whose bound would upscale the source are
        // skipped outright, with no state read and no admission. Everything
        // else counts as family coverage whether it ends up ready or merely
        // pending.
        for key in &self.config.enabled_transcodes {
            let profile = self.catalog.profile(key)?;
            if geometry::is_larger_than_source(asset.width(), asset.height(), &profile.max_size) {
                continue;
            }
            covered.insert(profile.codec);
            self.add_source_if_ready(session, asset, key, opts, &mut sources)?;
        }

        // Coverage pass: the first enabled profile of each still-uncovered
        // family gets attempted. With the legacy flag set this ignores the
        // oversized check and may admit an upscaling encode; playability
        // per family is traded against encode capacity.
        for key in &self.config.enabled_transcodes {
            let profile = self.catalog.profile(key)?;
            if covered.contains(&profile.codec) {
                continue;
            }
            if !self.config.force_coverage_ignoring_upscale
                && geometry::is_larger_than_source(asset.width(), asset.height(), &profile.max_size)
            {
                continue;
            }
            covered.insert(profile.codec);
            self.add_source_if_ready(session, asset, key, opts, &mut sources)?;
        }

        Ok(sources)
    }

    /// Append a derivative descriptor when its encode is ready; otherwise
    /// admit a job and contribute nothing to the output.
    fn add_source_if_ready(
        &self,
        session: &TranscodeStateStore,
        asset: &dyn FileAsset,
        key: &str,
        opts: &ResolveOptions,
        sources: &mut Vec<SourceDescriptor>,
    ) -> Result<()> {
        let profile = self.catalog.profile(key)?;
        let records = session.get(asset.name());
        match records.get(key) {
            Some(row) if row.is_ready() => {
                sources.push(SourceDescriptor::derivative(
                    asset,
                    profile,
                    row,
                    opts,
                    self.config.base_url.as_deref(),
                ));
            }
            _ => {
                self.gateway.enqueue_if_absent(session, asset.name(), key);
            }
        }
        Ok(())
    }

    /// Remove derivative state for an asset: the physical files
    /// (best-effort), the state records, and any still-pending jobs, then
    /// drop the session-cache entry.
    ///
    /// `key = None` targets every profile with a state record. The steps
    /// are deliberately not atomic: a failure partway leaves an orphaned
    /// file or record for a maintenance pass to reconcile.
    pub fn remove_derivatives(
        &self,
        session: &TranscodeStateStore,
        asset: &dyn FileAsset,
        key: Option<&str>,
    ) -> Result<()> {
        let keys: Vec<String> = match key {
            Some(k) => vec![k.to_string()],
            None => self
                .state_backend
                .read_all(asset.name())?
                .into_iter()
                .map(|r| r.key)
                .collect(),
        };

        for k in &keys {
            if !self.derivatives.exists(asset, k) {
                continue;
            }
            if let Err(e) = self.derivatives.purge(asset, k) {
                tracing::warn!(file = %asset.name(), key = %k, "could not delete derivative file: {e}");
            }
        }

        let removed = self.state_backend.delete(asset.name(), key)?;
        let jobs = self.gateway.queue().remove_pending(asset.name(), key)?;
        tracing::info!(
            file = %asset.name(),
            records = removed,
            jobs = jobs,
            "removed transcode state"
        );

        session.invalidate(asset.name());
        Ok(())
    }
}
