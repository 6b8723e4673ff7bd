//! Build script for palimpsest-firmware
//!
//! Places memory.x on the linker search path. The layout reserves the
//! execution window sector and the GOT/PLT RAM, so it must agree with
//! `LoaderLayout::STM32F401`.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}
