use redirect::{CallableDescriptor, EntryPoint, Parameter, TypeDescriptor};
use std::hint::black_box;
use std::sync::Arc;

#[inline(never)]
extern "C" fn greeting(times: u32) -> u32 {
    println!("hello from the original");
    black_box(times)
}

#[inline(never)]
extern "C" fn patched_greeting(times: u32) -> u32 {
    println!("hello from the replacement");
    black_box(times) * 2
}

fn describe(owner: &str, entry: *const ()) -> CallableDescriptor {
    let u32_ty = Arc::new(TypeDescriptor::new("u32"));
    CallableDescriptor::function(Arc::new(TypeDescriptor::new(owner)), "greeting", u32_ty.clone())
        .with_parameter(Parameter::value(u32_ty))
        .with_entry(EntryPoint::from_ptr(entry))
}

#[redirect::main(group = "basic")]
fn main() -> std::io::Result<()> {
    let call: extern "C" fn(u32) -> u32 = black_box(greeting);
    println!("before: {}", call(21));
    let patched = unsafe {
        redirect::patch(
            &describe("App", greeting as *const ()),
            &describe("AppPatch", patched_greeting as *const ()),
        )?
    };
    println!("wrote {} bytes", patched.written());
    println!("after: {}", call(21));
    for record in redirect::redirections() {
        println!("{} -> {}", record.source(), record.destination());
    }
    Ok(())
}
