//! palimpsest-pack - external flash image builder
//!
//! Usage: `palimpsest-pack <manifest.toml> <output.bin>`
//!
//! Reads the manifest and the module binaries it names, checksums every
//! function with the same word-wise CRC-32 the firmware verifies with, and
//! writes one flat image ready to program into the NOR device.

mod error;
mod image;
mod manifest;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::error::PackError;
use crate::image::{ImageBuilder, ModuleInput};
use crate::manifest::Manifest;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: palimpsest-pack <manifest.toml> <output.bin>");
        return ExitCode::from(2);
    }

    match run(Path::new(&args[1]), Path::new(&args[2])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(manifest_path: &Path, output: &Path) -> Result<(), PackError> {
    let text = fs::read_to_string(manifest_path).map_err(|e| PackError::io(manifest_path, e))?;
    let manifest = Manifest::parse(&text)?;
    let layout = manifest.layout()?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut builder = ImageBuilder::new(layout)?;
    for mut spec in manifest.modules {
        spec.resolve(base);
        let input = ModuleInput {
            id: spec.id,
            address: spec.address,
            declared_size: spec.size,
            image: read(&spec.image)?,
            got: spec.got.as_deref().map(read).transpose()?,
            plt: spec.plt.as_deref().map(read).transpose()?,
            functions: spec.functions,
        };
        builder.add_module(input)?;
    }

    for module in builder.catalog().modules() {
        println!(
            "module {} @ {:#010x}: {} functions",
            module.module_id,
            module.base_address,
            module.function_count()
        );
        for f in &module.functions {
            println!(
                "  {:<15} +{:#06x} {:>5} bytes crc {:#010x}",
                f.name, f.offset, f.size, f.checksum
            );
        }
    }

    let module_count = builder.len();
    let image = builder.finish()?;
    fs::write(output, &image).map_err(|e| PackError::io(output, e))?;
    println!(
        "wrote {} ({} bytes, {} modules)",
        output.display(),
        image.len(),
        module_count
    );

    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, PackError> {
    fs::read(path).map_err(|e| PackError::io(path, e))
}
