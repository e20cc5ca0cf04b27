#![warn(missing_docs)]

//! Reader and writer for Tiled tileset documents (`.tsx`, plus `.tsj` input).
//!
//! ```no_run
//! # fn main() -> tiled_tsx::Result<()> {
//! let tileset = tiled_tsx::load_tileset_file("assets/base.tsx")?;
//! if let Some(door) = tileset.tile(116) {
//!     println!("tile {} is a {}", door.id, door.tile_type);
//! }
//! tiled_tsx::save_tileset_file(&tileset, "assets/base.copy.tsx")?;
//! # Ok(())
//! # }
//! ```

mod attrs;
mod color;
mod error;
mod gid;
mod image;
mod loader {
    pub mod json_loader;
    pub mod tsx_loader;
}
mod object;
mod properties;
mod resource;
mod saver;
mod tile;
mod tileset;
mod xml;

pub use color::{Color, ParseColorError};
pub use error::{Result, TsxError};
pub use gid::{Gid, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
pub use image::{Image, ImageData};
pub use loader::json_loader::load_tileset_from_json;
pub use loader::tsx_loader::{
    load_tile_from_reader, load_tileset_file, load_tileset_from_reader, Loader,
};
pub use object::{
    DrawOrder, HAlign, Object, ObjectGroup, ObjectShape, Point, Text, VAlign, Visibility,
};
pub use properties::{Properties, Property, PropertyValue};
pub use resource::{resolve as resolve_path, FilesystemReader, ResourceReader};
pub use saver::{save_tileset_file, save_tileset_to_writer};
pub use tile::{Frame, TileTerrain, TilesetTile};
pub use tileset::{Terrain, TileOffset, Tileset};
