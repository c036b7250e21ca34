use crate::config::Config;
use crate::descriptor::CallableDescriptor;
use crate::diagnostic::{DiagnosticBatcher, GroupGuard};
use crate::error::RedirectError;
use crate::fallback::FallbackDispatcher;
use crate::patcher::raw::{NativeRedirect, NoopRedirect, RawRedirect};
use crate::patcher::{CodePatcher, Patched};
use crate::registry::{FunctionRegistry, RedirectionRecord};
use crate::{error, info, warn};
use std::sync::Arc;

/// The redirection engine: one registry, one patcher, one fallback dispatcher and one
/// diagnostic batcher that belong together.
///
/// Independent instances do not see each other's redirections.
#[derive(Debug)]
pub struct Redirector {
    config: Config,
    registry: Arc<FunctionRegistry>,
    batcher: Arc<DiagnosticBatcher>,
    patcher: CodePatcher,
    fallbacks: FallbackDispatcher,
}

impl Redirector {
    /// Create an engine for `config`.
    ///
    /// Falls back to the no-op backend when writing code is disabled or unsupported here.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let backend: Box<dyn RawRedirect> = if config.write_code() {
            if let Some(native) = NativeRedirect::host() {
                Box::new(native)
            } else {
                warn!("patching code is not supported on this platform, nothing will be written");
                Box::new(NoopRedirect::default())
            }
        } else {
            Box::new(NoopRedirect::default())
        };
        Self::with_backend(config, backend)
    }

    /// Create an engine writing through `backend`, whatever `config.write_code()` says.
    #[must_use]
    pub fn with_backend(config: &Config, backend: Box<dyn RawRedirect>) -> Self {
        let registry = Arc::new(FunctionRegistry::default());
        let batcher = Arc::new(DiagnosticBatcher::default());
        let patcher = CodePatcher::new(
            registry.clone(),
            batcher.clone(),
            backend,
            config.strict(),
        );
        info!("redirector init with {:?}, backend {}", config, patcher.backend());
        Self {
            config: *config,
            fallbacks: FallbackDispatcher::new(registry.clone()),
            registry,
            batcher,
            patcher,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Redirect `source` to `destination`, see [`CodePatcher::patch`].
    ///
    /// # Safety
    ///
    /// Same as [`CodePatcher::patch`].
    pub unsafe fn patch(
        &self,
        source: &CallableDescriptor,
        destination: &CallableDescriptor,
    ) -> Result<Patched, RedirectError> {
        self.patcher.patch(source, destination)
    }

    /// Redirect `source` to `destination`, offering a failure to the fallbacks of `owner`.
    ///
    /// Returns `Ok(true)` if patched, `Ok(false)` if a fallback handled the failure, and the
    /// failure itself if nothing did.
    ///
    /// # Safety
    ///
    /// Same as [`CodePatcher::patch`].
    pub unsafe fn patch_or_recover(
        &self,
        owner: &str,
        source: &CallableDescriptor,
        destination: &CallableDescriptor,
    ) -> std::io::Result<bool> {
        match self.patch(source, destination) {
            Ok(_) => Ok(true),
            Err(e) => {
                if self
                    .fallbacks
                    .on_redirection_failure(owner, source, destination, &e)
                {
                    return Ok(false);
                }
                error!("unhandled redirection failure in {}: {}", owner, e);
                Err(e.into())
            }
        }
    }

    /// Register a fallback for redirections declared by `owner`, see
    /// [`FallbackDispatcher::register`].
    pub fn register_fallback<I, S, F>(
        &self,
        owner: &str,
        targets: I,
        descriptor: CallableDescriptor,
        invoke: F,
    ) -> Result<(), RedirectError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&CallableDescriptor, Option<&str>, &RedirectError) -> std::io::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.fallbacks.register(owner, targets, descriptor, invoke)
    }

    /// The destination `source` now jumps to.
    #[must_use]
    pub fn try_get_redirection_target(&self, source: &str) -> Option<String> {
        self.registry.lookup(source)
    }

    /// Every active redirection, in the order they were made.
    #[must_use]
    pub fn redirections(&self) -> Vec<RedirectionRecord> {
        self.registry.enumerate()
    }

    /// Start collecting successful redirections into one report.
    ///
    /// Returns the report of a group left open before, see [`DiagnosticBatcher::begin_group`].
    pub fn begin_group(&self) -> Option<String> {
        if self.config.batch() {
            return self.batcher.begin_group();
        }
        None
    }

    /// Report the collected redirections under `label`. Returns the report, if any.
    pub fn flush_group(&self, label: &str) -> Option<String> {
        self.batcher.flush_group(label)
    }

    /// Begin a group that is flushed under `label` when the guard drops.
    pub fn group(&self, label: impl Into<String>) -> Option<GroupGuard<'_>> {
        if self.config.batch() {
            return Some(self.batcher.group(label));
        }
        None
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn fallbacks(&self) -> &FallbackDispatcher {
        &self.fallbacks
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }
}

impl Default for Redirector {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
