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
//! The call redirection engine.
//!
//! A discovery layer hands the engine pairs of [`descriptor::CallableDescriptor`]s. For each
//! pair the engine checks compatibility, overwrites the entry of the source function with a
//! jump to the destination, records the redirection and reports it. Failures can be offered
//! to registered fallback handlers instead of taking the host down.

/// Common traits and impl.
pub mod common;

/// Configuration for the `Redirector`.
#[allow(missing_docs)]
pub mod config;

/// Descriptors of callables and types, supplied by the discovery layer.
pub mod descriptor;

/// Redirection errors.
pub mod error;

/// Advisory compatibility checks between a source function and its replacement.
pub mod validator;

/// Append-only table of active redirections.
pub mod registry;

/// Grouped reporting of successful redirections.
pub mod diagnostic;

/// Recovery handlers for failed redirections.
pub mod fallback;

/// Entry point patching and the raw redirect backends.
pub mod patcher;

/// The engine composed from the parts above.
pub mod redirector;
