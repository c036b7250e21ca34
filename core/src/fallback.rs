use crate::common::constants::{ParamModifier, CALLABLE_TYPE, ERROR_TYPE, VOID_TYPE};
use crate::descriptor::CallableDescriptor;
use crate::error::RedirectError;
use crate::registry::FunctionRegistry;
use crate::{catch, error, info, warn};
use dashmap::DashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// What a fallback handler runs: attempted destination, destination that already owns the
/// source if any, and the failure.
pub type FallbackFn = Arc<
    dyn Fn(&CallableDescriptor, Option<&str>, &RedirectError) -> std::io::Result<()> + Send + Sync,
>;

/// A recovery handler registered against an owner type.
#[derive(Clone)]
pub struct FallbackHandler {
    targets: Vec<String>,
    descriptor: CallableDescriptor,
    invoke: FallbackFn,
}

impl FallbackHandler {
    /// Returns `true` if the handler covers the member `name`.
    /// No targets means every member of the owner.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|target| target == name)
    }

    /// Member names this handler is limited to.
    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// The handler's own descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &CallableDescriptor {
        &self.descriptor
    }
}

impl Debug for FallbackHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackHandler")
            .field("handler", &self.descriptor.identity())
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

/// Finds and runs the recovery handler for a failed redirection.
#[derive(Debug)]
pub struct FallbackDispatcher {
    registry: Arc<FunctionRegistry>,
    handlers: DashMap<String, Vec<FallbackHandler>>,
}

impl FallbackDispatcher {
    /// Create a dispatcher reporting pre-existing redirections from `registry`.
    #[must_use]
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            handlers: DashMap::new(),
        }
    }

    /// Check that `descriptor` has the shape every handler must have:
    /// `static void handler(Callable attempted, Callable existing, Error error)`.
    pub fn check_shape(descriptor: &CallableDescriptor) -> Result<(), String> {
        if !descriptor.is_static() {
            return Err("must be static".to_string());
        }
        if descriptor.is_receiver_first() {
            return Err("must not be receiver-first".to_string());
        }
        let expected = [CALLABLE_TYPE, CALLABLE_TYPE, ERROR_TYPE];
        let parameters = descriptor.parameters();
        if parameters.len() != expected.len() {
            return Err(format!(
                "must take {} parameters, takes {}",
                expected.len(),
                parameters.len()
            ));
        }
        for (index, (parameter, expected)) in parameters.iter().zip(expected).enumerate() {
            if parameter.ty().name() != expected || ParamModifier::Value != parameter.modifier() {
                return Err(format!(
                    "parameter {index} must be {} {expected}, found {} {}",
                    ParamModifier::Value,
                    parameter.modifier(),
                    parameter.ty().name()
                ));
            }
        }
        if descriptor.return_type().name() != VOID_TYPE {
            return Err(format!(
                "must return {VOID_TYPE}, returns {}",
                descriptor.return_type().name()
            ));
        }
        Ok(())
    }

    /// Register a handler for redirections declared by `owner`.
    ///
    /// An empty `targets` covers every member of `owner`. A handler of the wrong shape is
    /// discarded and never runs.
    pub fn register<I, S, F>(
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
        if let Err(reason) = Self::check_shape(&descriptor) {
            let error = RedirectError::HandlerSignatureInvalid {
                owner: owner.to_string(),
                handler: descriptor.identity(),
                reason,
            };
            error!("{}", error);
            return Err(error);
        }
        let handler = FallbackHandler {
            targets: targets.into_iter().map(Into::into).collect(),
            descriptor,
            invoke: Arc::new(invoke),
        };
        info!("{} registered as fallback of {}", handler.descriptor.identity(), owner);
        self.handlers
            .entry(owner.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }

    /// Handlers registered against `owner`, in registration order.
    #[must_use]
    pub fn handlers(&self, owner: &str) -> Vec<FallbackHandler> {
        self.handlers
            .get(owner)
            .map(|handlers| handlers.clone())
            .unwrap_or_default()
    }

    /// Offer the failed redirection of `source` to `destination`, declared by `owner`, to
    /// the first matching handler.
    ///
    /// Only that handler runs even if later ones match too. A handler that fails or panics
    /// is logged and counts as not run. Returns whether a handler ran.
    pub fn on_redirection_failure(
        &self,
        owner: &str,
        source: &CallableDescriptor,
        destination: &CallableDescriptor,
        error: &RedirectError,
    ) -> bool {
        // cloned out so the handler may register more fallbacks
        let Some(handler) = self.handlers.get(owner).and_then(|handlers| {
            handlers
                .iter()
                .find(|handler| handler.matches(destination.name()))
                .cloned()
        }) else {
            return false;
        };
        let existing = self.registry.lookup(&source.identity());
        let name = handler.descriptor.identity();
        match catch!(
            || (handler.invoke)(destination, existing.as_deref(), error),
            format!("fallback {name} failed without message"),
            format!("fallback {name}")
        ) {
            Ok(Ok(())) => {
                warn!(
                    "{} handled failed redirection {} -> {}: {}",
                    name,
                    source.identity(),
                    destination.identity(),
                    error
                );
                true
            }
            Ok(Err(e)) => {
                error!("fallback {} failed with error:{}", name, e);
                false
            }
            Err(_) => false,
        }
    }
}
