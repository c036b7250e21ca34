#![deny(
    // The following are allowed by default lints according to
    // https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html
    absolute_paths_not_starting_with_crate,
    explicit_outlives_requirements,
    macro_use_extern_crate,
    anonymous_parameters,
    bare_trait_objects,
    // elided_lifetimes_in_paths, // allow anonymous lifetime
    missing_debug_implementations,
    missing_docs,
    // single_use_lifetimes, // TODO: fix lifetime names only used once
    // trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    // unsafe_code,
    unstable_features,
    // unused_crate_dependencies,
    unused_lifetimes,
    unused_macro_rules,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,

    clippy::all,
    // clippy::restriction,
    clippy::pedantic,
    // clippy::nursery, // It's still under development
    clippy::cargo,
)]
#![allow(
    // Some explicitly allowed Clippy lints, must have clear reason to allow
    clippy::blanket_clippy_restriction_lints, // allow clippy::restriction
    clippy::implicit_return, // actually omitting the return keyword is idiomatic Rust code
    clippy::module_name_repetitions, // repeation of module name in a struct name is not big deal
    clippy::multiple_crate_versions, // multi-version dependency crates is not able to fix
    clippy::missing_errors_doc, // TODO: add error docs
    clippy::missing_panics_doc, // TODO: add panic docs
    clippy::panic_in_result_fn,
    clippy::shadow_same, // Not too much bad
    clippy::shadow_reuse, // Not too much bad
    clippy::exhaustive_enums,
    clippy::exhaustive_structs,
    clippy::indexing_slicing,
    clippy::separated_literal_suffix, // conflicts with clippy::unseparated_literal_suffix
)]
//! Redirect calls of compiled functions to replacements while the process runs.
//!
//! This crate holds one process wide [`Redirector`]. Use [`init`] or `#[redirect::main]` to
//! configure it, or let the first call create it with [`Config::default`].
//!
//! ```no_run
//! use redirect::{CallableDescriptor, EntryPoint, TypeDescriptor};
//! use std::sync::Arc;
//!
//! extern "C" fn original() -> i32 { 1 }
//! extern "C" fn replacement() -> i32 { 2 }
//!
//! let int = Arc::new(TypeDescriptor::new("int"));
//! let (lib, patch) = (Arc::new(TypeDescriptor::new("Lib")), Arc::new(TypeDescriptor::new("Mod")));
//! let source = CallableDescriptor::function(lib, "value", int.clone())
//!     .with_entry(EntryPoint::from_ptr(original as *const ()));
//! let destination = CallableDescriptor::function(patch, "value", int)
//!     .with_entry(EntryPoint::from_ptr(replacement as *const ()));
//! let _ = unsafe { redirect::patch(&source, &destination) };
//! ```

use once_cell::sync::OnceCell;
use redirect_core::diagnostic::GroupGuard;
use std::io::{Error, ErrorKind};

pub use redirect_core::common::constants::{
    JumpKind, ParamModifier, ReceiverClassification, Visibility, CALLABLE_TYPE, ERROR_TYPE,
    VOID_TYPE,
};
pub use redirect_core::config::Config;
pub use redirect_core::descriptor::{
    CallableDescriptor, EntryPoint, FieldDescriptor, Parameter, TypeDescriptor,
};
pub use redirect_core::error::RedirectError;
pub use redirect_core::patcher::Patched;
pub use redirect_core::redirector::Redirector;
pub use redirect_core::registry::RedirectionRecord;
pub use redirect_core::validator::{classify, validate, ValidationOutcome};
pub use redirect_macros::*;

static INSTANCE: OnceCell<Redirector> = OnceCell::new();

/// Create the process wide engine with `config`.
///
/// Fails with [`ErrorKind::AlreadyExists`] if it was created before, with another config.
pub fn init(config: Config) -> std::io::Result<&'static Redirector> {
    redirect_core::common::init_log();
    let redirector = INSTANCE.get_or_init(|| Redirector::new(&config));
    if redirector.config() != config {
        return Err(Error::new(
            ErrorKind::AlreadyExists,
            format!(
                "redirect already initialized with {:?}",
                redirector.config()
            ),
        ));
    }
    Ok(redirector)
}

/// The process wide engine, created with [`Config::default`] if [`init`] was never called.
pub fn instance() -> &'static Redirector {
    INSTANCE.get_or_init(|| {
        redirect_core::common::init_log();
        Redirector::default()
    })
}

/// Redirect `source` to `destination`.
///
/// # Safety
///
/// Entries of both descriptors must resolve to the starts of compiled functions with the same
/// ABI, and no other thread may run `source` while it is patched.
pub unsafe fn patch(
    source: &CallableDescriptor,
    destination: &CallableDescriptor,
) -> Result<Patched, RedirectError> {
    instance().patch(source, destination)
}

/// Redirect `source` to `destination`, offering a failure to the fallbacks of `owner`.
///
/// # Safety
///
/// Same as [`patch`].
pub unsafe fn patch_or_recover(
    owner: &str,
    source: &CallableDescriptor,
    destination: &CallableDescriptor,
) -> std::io::Result<bool> {
    instance().patch_or_recover(owner, source, destination)
}

/// Register a fallback for redirections declared by `owner`.
pub fn register_fallback<I, S, F>(
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
    instance().register_fallback(owner, targets, descriptor, invoke)
}

/// The destination `source` jumps to, if it was redirected.
#[must_use]
pub fn try_get_redirection_target(source: &str) -> Option<String> {
    instance().try_get_redirection_target(source)
}

/// Every active redirection, in the order they were made.
#[must_use]
pub fn redirections() -> Vec<RedirectionRecord> {
    instance().redirections()
}

/// Start collecting successful redirections into one report.
///
/// Returns the report of a group left open before.
pub fn begin_group() -> Option<String> {
    instance().begin_group()
}

/// Report the collected redirections under `label`.
pub fn flush_group(label: &str) -> Option<String> {
    instance().flush_group(label)
}

/// Begin a group that is flushed under `label` when the guard drops.
pub fn group(label: impl Into<String>) -> Option<GroupGuard<'static>> {
    instance().group(label)
}
