use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tiled_tsx::{load_tileset_file, save_tileset_file};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(input) = env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: roundtrip <tileset.tsx> [output.tsx]");
    };
    let output = env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension("roundtrip.tsx"));

    let tileset = load_tileset_file(&input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    println!(
        "{}: {}x{} tiles, {} columns, {} tile overrides",
        tileset.name,
        tileset.tile_width,
        tileset.tile_height,
        tileset.columns,
        tileset.tiles().len()
    );
    if let Some(image) = &tileset.image {
        println!("image={}", tileset.resource_path(&image.source).display());
    }

    save_tileset_file(&tileset, &output)
        .with_context(|| format!("failed to save {}", output.display()))?;
    let reloaded = load_tileset_file(&output)
        .with_context(|| format!("failed to reload {}", output.display()))?;
    if reloaded != tileset {
        bail!("{} does not load back into the same tileset", output.display());
    }
    println!("wrote {}", output.display());
    Ok(())
}
