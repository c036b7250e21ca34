#![deny(
    // The following are allowed by default lints according to
    // https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html
    anonymous_parameters,
    bare_trait_objects,
    // elided_lifetimes_in_paths, // allow anonymous lifetime
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs, // TODO: add documents
    single_use_lifetimes, // TODO: fix lifetime names only used once
    trivial_casts, // TODO: remove trivial casts in code
    trivial_numeric_casts,
    // unreachable_pub, allow clippy::redundant_pub_crate lint instead
    // unsafe_code,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    variant_size_differences,

    warnings, // treat all wanings as errors

    clippy::all,
    // clippy::restriction,
    clippy::pedantic,
    // clippy::nursery, // It's still under development
    clippy::cargo,
    unreachable_pub,
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
    clippy::single_char_lifetime_names, // TODO: change lifetime names
)]
//! Attribute macros for `redirect`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn, LitBool, LitStr};

/// use this macro like `#[redirect::main(write_code = false, strict = true, group = "my-mod")]`.
///
/// The engine is initialized before the body runs, and every redirection the body makes is
/// reported as one group when it returns, early returns and panics included. The group label
/// defaults to the function name.
///
/// Panics if the process-wide engine already exists with a different config, e.g. because an
/// earlier `redirect::*` call created it with the default one.
#[proc_macro_attribute]
pub fn main(args: TokenStream, func: TokenStream) -> TokenStream {
    let mut write_code = true;
    let mut strict = false;
    let mut batch = true;
    let mut group: Option<String> = None;
    if !args.is_empty() {
        let redirect_parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("write_code") {
                write_code = meta.value()?.parse::<LitBool>()?.value();
            } else if meta.path.is_ident("strict") {
                strict = meta.value()?.parse::<LitBool>()?.value();
            } else if meta.path.is_ident("batch") {
                batch = meta.value()?.parse::<LitBool>()?.value();
            } else if meta.path.is_ident("group") {
                group = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unsupported redirect::main argument"));
            }
            Ok(())
        });
        parse_macro_input!(args with redirect_parser);
    }

    let func = parse_macro_input!(func as ItemFn);
    let func_attrs = &func.attrs;
    let func_vis = &func.vis; // like pub
    let func_block = &func.block; // { some statement or expression here }

    let func_decl = func.sig;
    let func_name = &func_decl.ident; // function name
    let func_generics = &func_decl.generics;
    let func_inputs = &func_decl.inputs;
    let func_output = &func_decl.output;
    let func_label = func_name.to_string();
    let group = group.unwrap_or_else(|| func_label.clone());

    let caller = quote! {
        // rebuild the function, the group guard flushes once the body is done.
        #(#func_attrs)*
        #func_vis fn #func_name #func_generics(#func_inputs) #func_output {
            let mut redirect_config = redirect::Config::default();
            _ = redirect_config
                .set_write_code(#write_code)
                .set_strict(#strict)
                .set_batch(#batch);
            if let Err(e) = redirect::init(redirect_config) {
                panic!(
                    "#[redirect::main] on {} cannot apply {:?}: {}",
                    #func_label, redirect_config, e
                );
            }
            let _redirect_group = redirect::group(#group);
            #func_block
        }
    };
    caller.into()
}
