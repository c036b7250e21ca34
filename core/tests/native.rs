#![cfg(all(target_os = "linux", target_arch = "x86_64"))]

use redirect_core::common::constants::{JumpKind, NEAR_JUMP_LEN};
use redirect_core::config::Config;
use redirect_core::descriptor::{CallableDescriptor, EntryPoint, Parameter, TypeDescriptor};
use redirect_core::patcher::jump::{Arch, JumpPatch};
use redirect_core::redirector::Redirector;
use region::Protection;
use std::hint::black_box;
use std::sync::Arc;

#[inline(never)]
extern "C" fn area(width: u64, height: u64) -> u64 {
    black_box(width).wrapping_mul(black_box(height))
}

#[inline(never)]
extern "C" fn patched_area(width: u64, height: u64) -> u64 {
    black_box(width).wrapping_add(black_box(height)).wrapping_add(1_000)
}

fn describe(owner: &str, entry: *const ()) -> CallableDescriptor {
    let u64_ty = Arc::new(TypeDescriptor::new("u64"));
    CallableDescriptor::function(Arc::new(TypeDescriptor::new(owner)), "area", u64_ty.clone())
        .with_parameter(Parameter::value(u64_ty.clone()))
        .with_parameter(Parameter::value(u64_ty))
        .with_entry(EntryPoint::from_ptr(entry))
}

#[test]
fn patch_live_function() -> std::io::Result<()> {
    let call: extern "C" fn(u64, u64) -> u64 = black_box(area);
    assert_eq!(12, call(3, 4));

    let source = area as *const ();
    let destination = patched_area as *const ();
    let expected = JumpPatch::encode(Arch::X86_64, source as usize, destination as usize)?;
    assert_eq!(JumpKind::Near, expected.kind());

    let redirector = Redirector::new(&Config::default());
    let patched = unsafe {
        redirector.patch(&describe("Geometry", source), &describe("GeometryPatch", destination))?
    };
    assert_eq!(NEAR_JUMP_LEN, patched.written());
    assert_eq!(None, patched.warning());

    let entry = unsafe { std::slice::from_raw_parts(source.cast::<u8>(), NEAR_JUMP_LEN) };
    assert_eq!(expected.bytes(), entry);
    assert_eq!(1_007, call(3, 4));
    Ok(())
}

#[test]
fn jit_entry_keeps_its_protection() -> std::io::Result<()> {
    let mut page = region::alloc(region::page::size(), Protection::READ_WRITE_EXECUTE)
        .map_err(std::io::Error::other)?;
    let entry = page.as_mut_ptr::<u8>();
    // ret
    unsafe { entry.write(0xC3) };

    let redirector = Redirector::new(&Config::default());
    let source = describe("Jitted", entry.cast_const().cast());
    let destination = describe("JittedPatch", patched_area as *const ());
    let patched = unsafe { redirector.patch(&source, &destination)? };
    assert!(patched.written() > 0);
    assert_eq!(
        Some("JittedPatch.area(u64, u64)".to_string()),
        redirector.try_get_redirection_target("Jitted.area(u64, u64)")
    );
    let after = region::query(entry.cast_const()).map_err(std::io::Error::other)?;
    assert_eq!(Protection::READ_WRITE_EXECUTE, after.protection());
    Ok(())
}
