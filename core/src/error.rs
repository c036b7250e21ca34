use std::fmt::{Display, Formatter};
use std::io::{Error, ErrorKind};

/// Why a redirection, or the registration of a fallback handler, did not happen.
#[derive(Debug)]
pub enum RedirectError {
    /// The source already jumps somewhere. Nothing was written.
    AlreadyRedirected {
        /// Identity of the source.
        source: String,
        /// Identity of the destination that won.
        existing: String,
    },
    /// No stable entry address could be obtained. Nothing was written.
    AddressResolution {
        /// Identity of the callable that could not be resolved.
        callable: String,
        /// What went wrong.
        reason: String,
    },
    /// A fallback handler does not have the mandated shape and was discarded.
    HandlerSignatureInvalid {
        /// Type the handler was registered against.
        owner: String,
        /// Identity of the handler.
        handler: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Strict mode turned a failed compatibility check into a hard stop. Nothing was written.
    Rejected {
        /// Identity of the source.
        source: String,
        /// Identity of the destination.
        destination: String,
        /// The failed check.
        reason: String,
    },
    /// The backend failed while writing the jump.
    Patch {
        /// Identity of the source.
        source: String,
        /// Identity of the destination.
        destination: String,
        /// Module that declared the destination.
        module: String,
        /// Backend error.
        cause: Error,
    },
}

impl RedirectError {
    /// The `ErrorKind` this error maps to when surfaced as `std::io::Error`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RedirectError::AlreadyRedirected { .. } => ErrorKind::AlreadyExists,
            RedirectError::AddressResolution { .. } => ErrorKind::NotFound,
            RedirectError::HandlerSignatureInvalid { .. } => ErrorKind::InvalidInput,
            RedirectError::Rejected { .. } => ErrorKind::InvalidData,
            RedirectError::Patch { cause, .. } => cause.kind(),
        }
    }
}

impl Display for RedirectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RedirectError::AlreadyRedirected { source, existing } => {
                write!(f, "{source} is already redirected to {existing}")
            }
            RedirectError::AddressResolution { callable, reason } => {
                write!(f, "failed to resolve the entry address of {callable}: {reason}")
            }
            RedirectError::HandlerSignatureInvalid {
                owner,
                handler,
                reason,
            } => write!(f, "fallback handler {handler} of {owner} is invalid: {reason}"),
            RedirectError::Rejected {
                source,
                destination,
                reason,
            } => write!(f, "redirecting {source} to {destination} rejected: {reason}"),
            RedirectError::Patch {
                source,
                destination,
                module,
                cause,
            } => write!(
                f,
                "redirecting {source} to {destination} (declared in {module}) failed: {cause}"
            ),
        }
    }
}

impl std::error::Error for RedirectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RedirectError::Patch { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl From<RedirectError> for Error {
    fn from(error: RedirectError) -> Self {
        Error::new(error.kind(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_conversion_keeps_kind_and_message() {
        let error = RedirectError::AlreadyRedirected {
            source: "Window.Draw()".to_string(),
            existing: "PatchedWindow.Draw()".to_string(),
        };
        let io: Error = error.into();
        assert_eq!(ErrorKind::AlreadyExists, io.kind());
        assert_eq!(
            "Window.Draw() is already redirected to PatchedWindow.Draw()",
            io.to_string()
        );
    }

    #[test]
    fn patch_error_carries_context() {
        let error = RedirectError::Patch {
            source: "Window.Draw()".to_string(),
            destination: "PatchedWindow.Draw()".to_string(),
            module: "ui.dll".to_string(),
            cause: Error::new(ErrorKind::PermissionDenied, "mprotect failed"),
        };
        assert_eq!(ErrorKind::PermissionDenied, error.kind());
        assert!(std::error::Error::source(&error).is_some());
        let message = error.to_string();
        assert!(message.contains("ui.dll"));
        assert!(message.contains("mprotect failed"));
    }
}
