use crate::common::constants::UNKNOWN_MODULE;
use crate::descriptor::CallableDescriptor;
use crate::diagnostic::DiagnosticBatcher;
use crate::error::RedirectError;
use crate::registry::{FunctionRegistry, RedirectionRecord};
use crate::validator::validate;
use crate::{error, warn};
use std::sync::Arc;

/// Jump encodings.
pub mod jump;

/// Writing to executable memory.
mod memory;

/// The raw redirect backends.
pub mod raw;

use raw::RawRedirect;

/// The outcome of a successful [`CodePatcher::patch`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Patched {
    record: RedirectionRecord,
    warning: Option<String>,
    written: usize,
}

impl Patched {
    /// The redirection as registered.
    #[must_use]
    pub fn record(&self) -> &RedirectionRecord {
        &self.record
    }

    /// The failed compatibility check the patch went ahead despite.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Bytes the backend overwrote at the source entry.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Validates, resolves and overwrites, then records the redirection.
#[derive(Debug)]
pub struct CodePatcher {
    registry: Arc<FunctionRegistry>,
    batcher: Arc<DiagnosticBatcher>,
    backend: Box<dyn RawRedirect>,
    strict: bool,
}

impl CodePatcher {
    /// Create a patcher writing through `backend`.
    ///
    /// With `strict` a failed compatibility check stops the patch instead of warning.
    #[must_use]
    pub fn new(
        registry: Arc<FunctionRegistry>,
        batcher: Arc<DiagnosticBatcher>,
        backend: Box<dyn RawRedirect>,
        strict: bool,
    ) -> Self {
        Self {
            registry,
            batcher,
            backend,
            strict,
        }
    }

    /// Name of the backend in use.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.backend.name()
    }

    /// Redirect `source` to `destination`.
    ///
    /// A source can be redirected once. An incompatible pair is reported and patched anyway,
    /// unless the patcher is strict.
    ///
    /// # Safety
    ///
    /// Entries of both descriptors must resolve to the starts of compiled functions with the
    /// same ABI, and no other thread may run `source` while it is patched.
    pub unsafe fn patch(
        &self,
        source: &CallableDescriptor,
        destination: &CallableDescriptor,
    ) -> Result<Patched, RedirectError> {
        let source_id = source.identity();
        let destination_id = destination.identity();
        if let Some(existing) = self.registry.lookup(&source_id) {
            let error = RedirectError::AlreadyRedirected {
                source: source_id,
                existing,
            };
            error!("{}", error);
            return Err(error);
        }
        let outcome = validate(Some(source), Some(destination));
        let warning = match outcome.reason() {
            None => None,
            Some(reason) if self.strict => {
                let error = RedirectError::Rejected {
                    source: source_id,
                    destination: destination_id,
                    reason: reason.to_string(),
                };
                error!("{}", error);
                return Err(error);
            }
            Some(reason) => {
                warn!(
                    "{} -> {} may misbehave, patching anyway: {}",
                    source_id,
                    destination_id,
                    reason
                );
                Some(reason.to_string())
            }
        };
        let source_address = Self::resolve(source)?;
        let destination_address = Self::resolve(destination)?;
        let written = self
            .backend
            .redirect(source_address, destination_address)
            .map_err(|cause| {
                let error = RedirectError::Patch {
                    source: source_id.clone(),
                    destination: destination_id.clone(),
                    module: destination.module().unwrap_or(UNKNOWN_MODULE).to_string(),
                    cause,
                };
                error!("{}", error);
                error
            })?;
        let record = self.registry.register(
            RedirectionRecord::new(source_id, destination_id)
                .with_addresses(source_address, destination_address),
        )?;
        self.batcher.record(record.source(), record.destination());
        Ok(Patched {
            record,
            warning,
            written,
        })
    }

    fn resolve(callable: &CallableDescriptor) -> Result<usize, RedirectError> {
        let entry = callable
            .entry()
            .ok_or_else(|| RedirectError::AddressResolution {
                callable: callable.identity(),
                reason: "no entry point".to_string(),
            })?;
        entry.resolve().map_err(|e| {
            let error = RedirectError::AddressResolution {
                callable: callable.identity(),
                reason: e.to_string(),
            };
            error!("{}", error);
            error
        })
    }
}
