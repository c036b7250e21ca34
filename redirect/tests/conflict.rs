#[redirect::main(write_code = false)]
fn dry_pass() {}

#[test]
#[should_panic(expected = "redirect already initialized")]
fn main_refuses_an_engine_created_with_another_config() {
    // any earlier call creates the engine with the default config, which writes code
    assert!(redirect::instance().config().write_code());
    dry_pass();
}
