use std::env;

static NATIVE_LIB_NAME: &str = "ode";

fn main() {
    println!("cargo:rerun-if-env-changed=ODE_LIB_DIR");

    // Declarations only. Nothing is linked unless a caller asks for it.
    if env::var_os("CARGO_FEATURE_LINK").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("ODE_LIB_DIR") {
        println!("cargo:rustc-link-search={path}", path = dir.to_string_lossy());
    }
    println!("cargo:rustc-link-lib={name}", name = NATIVE_LIB_NAME);

    eprintln!("Linking against lib{}", NATIVE_LIB_NAME);
}
