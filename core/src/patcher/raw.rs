use crate::patcher::jump::{Arch, JumpPatch};
use crate::patcher::memory::write_code;
use crate::trace;
use std::fmt::Debug;
use std::sync::Mutex;

/// Writes the jump from one entry address to another.
///
/// Everything above this trait is platform independent.
pub trait RawRedirect: Debug + Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Make `source` transfer control to `destination`. Returns the number of bytes written.
    ///
    /// The original bytes at `source` are lost.
    ///
    /// # Safety
    ///
    /// `source` must be the entry of a compiled function that no thread executes while the
    /// bytes are written, and `destination` the entry of a function with the same ABI.
    unsafe fn redirect(&self, source: usize, destination: usize) -> std::io::Result<usize>;
}

/// Patches the executable memory of this process.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NativeRedirect {
    arch: Arch,
}

impl NativeRedirect {
    /// A backend for the host architecture, `None` if patching is unsupported here.
    #[must_use]
    pub fn host() -> Option<Self> {
        cfg_if::cfg_if! {
            if #[cfg(any(unix, windows))] {
                Arch::host().map(|arch| Self { arch })
            } else {
                None
            }
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.arch
    }
}

impl RawRedirect for NativeRedirect {
    fn name(&self) -> &'static str {
        "native"
    }

    unsafe fn redirect(&self, source: usize, destination: usize) -> std::io::Result<usize> {
        let patch = JumpPatch::encode(self.arch, source, destination)?;
        trace!(
            "{:?} {} jump {:#x} -> {:#x}: {:02x?}",
            self.arch,
            patch.kind(),
            source,
            destination,
            patch.bytes()
        );
        write_code(source, patch.bytes())?;
        Ok(patch.len())
    }
}

/// Writes nothing, only remembers what it was asked to do.
///
/// Used where patching is unsupported and for dry runs.
#[derive(Debug, Default)]
pub struct NoopRedirect {
    requested: Mutex<Vec<(usize, usize)>>,
}

impl NoopRedirect {
    /// `(source, destination)` address pairs requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<(usize, usize)> {
        self.requested.lock().expect("lock failed").clone()
    }
}

impl RawRedirect for NoopRedirect {
    fn name(&self) -> &'static str {
        "noop"
    }

    unsafe fn redirect(&self, source: usize, destination: usize) -> std::io::Result<usize> {
        self.requested
            .lock()
            .expect("lock failed")
            .push((source, destination));
        Ok(0)
    }
}
