//! Build script generating the C header for the FFI surface.

use std::env;
use std::fs;
use std::path::Path;

const HEADER: &str = "u_benford.h";

fn main() {
    println!("cargo:rerun-if-changed=src/ffi.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR must be set by Cargo");
    let config = cbindgen::Config::from_file("cbindgen.toml").unwrap_or_default();

    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => bindings,
        Err(e) => {
            println!("cargo:warning=skipping {HEADER}: {e}");
            return;
        }
    };

    // OUT_DIR copy keeps `cargo publish` working.
    bindings.write_to_file(Path::new(&out_dir).join(HEADER));

    let include_dir = Path::new(&crate_dir).join("include");
    if fs::create_dir_all(&include_dir).is_ok() {
        bindings.write_to_file(include_dir.join(HEADER));
    }
}
