use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::gid::{Gid, GID_MASK};
use crate::image::Image;
use crate::loader::tsx_loader::Loader;
use crate::properties::Properties;
use crate::resource;
use crate::tile::TilesetTile;

/// Rendering offset applied to every tile of a tileset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileOffset {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels (positive is down).
    pub y: i32,
}

/// A named terrain, referenced by index from [`TileTerrain`](crate::TileTerrain) corners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Terrain {
    /// Terrain name.
    pub name: String,
    /// Local ID of the tile representing this terrain, if any.
    pub tile: Option<u32>,
    /// Custom properties.
    pub properties: Properties,
}

/// A tileset: grid geometry, shared image and sparse per-tile overrides.
///
/// Equality ignores [`base_dir`](Tileset::base_dir) and the resolution state
/// (including where resolved content came from), which are not part of the
/// document.
#[derive(Debug, Clone, Default)]
pub struct Tileset {
    pub(crate) base_dir: PathBuf,
    pub(crate) source_loaded: bool,
    /// Directory of the document the content was read from, once a `source`
    /// chain has been followed.
    pub(crate) resource_dir: Option<PathBuf>,

    /// First global tile ID, meaningful when embedded in a map.
    pub first_gid: u32,
    /// Path of an external tileset document, empty for inline content.
    pub source: String,
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub class: String,
    /// Version of Tiled that wrote the document.
    pub tiled_version: String,
    /// Format version.
    pub version: String,

    #[allow(missing_docs)]
    pub tile_width: u32,
    #[allow(missing_docs)]
    pub tile_height: u32,
    /// Pixels between tiles in the image.
    pub spacing: u32,
    /// Pixels around the tiles in the image.
    pub margin: u32,
    #[allow(missing_docs)]
    pub tile_count: u32,
    #[allow(missing_docs)]
    pub columns: u32,

    /// Shared image of a grid tileset. Image collections use per-tile images instead.
    pub image: Option<Image>,
    /// Rendering offset; absent means (0, 0).
    pub tile_offset: Option<TileOffset>,
    /// Terrain definitions, in document order.
    pub terrain_types: Vec<Terrain>,
    /// Custom properties.
    pub properties: Properties,

    pub(crate) tiles: Vec<TilesetTile>,
    pub(crate) tile_index: HashMap<u32, usize>,
}

impl PartialEq for Tileset {
    fn eq(&self, other: &Self) -> bool {
        self.first_gid == other.first_gid
            && self.source == other.source
            && self.name == other.name
            && self.class == other.class
            && self.tiled_version == other.tiled_version
            && self.version == other.version
            && self.tile_width == other.tile_width
            && self.tile_height == other.tile_height
            && self.spacing == other.spacing
            && self.margin == other.margin
            && self.tile_count == other.tile_count
            && self.columns == other.columns
            && self.image == other.image
            && self.tile_offset == other.tile_offset
            && self.terrain_types == other.terrain_types
            && self.properties == other.properties
            && self.tiles == other.tiles
    }
}

impl Tileset {
    /// An empty inline tileset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_loaded: true,
            ..Default::default()
        }
    }

    /// A tileset whose content lives in `source`, relative to `base_dir`.
    /// Nothing is read until [`resolve_source`](Tileset::resolve_source).
    pub fn from_source(
        source: impl Into<String>,
        first_gid: u32,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            first_gid,
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Change the directory relative paths are resolved against.
    pub fn set_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        self.base_dir = base_dir.into();
    }

    /// Whether the content fields are authoritative: true for inline tilesets and
    /// for external ones whose document has been read.
    pub fn is_source_loaded(&self) -> bool {
        self.source_loaded
    }

    /// Read the external document named by `source` from the filesystem and
    /// copy its content into this record. `first_gid` and `source` are kept.
    pub fn resolve_source(&mut self) -> Result<()> {
        Loader::new().resolve_source(self)
    }

    /// Effective rendering offset.
    pub fn offset(&self) -> TileOffset {
        self.tile_offset.unwrap_or_default()
    }

    /// Path of a resource (typically an image `source`) named inside the
    /// document this tileset's content was read from. After a chain of
    /// `source` references that is the last document in the chain.
    pub fn resource_path(&self, relative: &str) -> PathBuf {
        if let Some(dir) = &self.resource_dir {
            return resource::resolve(dir, relative);
        }
        match Path::new(&self.source).parent() {
            Some(dir) if !self.source.is_empty() => {
                let doc_dir = resource::resolve(&self.base_dir, &dir.to_string_lossy());
                resource::resolve(&doc_dir, relative)
            }
            _ => resource::resolve(&self.base_dir, relative),
        }
    }

    /// Tiles with overrides, in document order.
    pub fn tiles(&self) -> &[TilesetTile] {
        &self.tiles
    }

    /// Overrides of the tile with local ID `id`.
    pub fn tile(&self, id: u32) -> Option<&TilesetTile> {
        self.tile_index.get(&id).map(|&pos| &self.tiles[pos])
    }

    /// Add a tile, or replace the one with the same ID in place. Returns the
    /// replaced tile.
    pub fn push_tile(&mut self, tile: TilesetTile) -> Option<TilesetTile> {
        match self.tile_index.get(&tile.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.tiles[pos], tile)),
            None => {
                self.tile_index.insert(tile.id, self.tiles.len());
                self.tiles.push(tile);
                None
            }
        }
    }

    /// Remove the overrides of tile `id`, keeping the order of the others.
    pub fn remove_tile(&mut self, id: u32) -> Option<TilesetTile> {
        let pos = *self.tile_index.get(&id)?;
        let tile = self.tiles.remove(pos);
        self.rebuild_index();
        Some(tile)
    }

    /// Replace every tile at once. Later duplicates of an ID replace earlier ones.
    pub fn set_tiles(&mut self, tiles: impl IntoIterator<Item = TilesetTile>) {
        self.tiles.clear();
        self.tile_index.clear();
        for tile in tiles {
            self.push_tile(tile);
        }
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.tile_index = self
            .tiles
            .iter()
            .enumerate()
            .map(|(pos, tile)| (tile.id, pos))
            .collect();
    }

    /// Local tile ID for a global one, if it falls inside this tileset.
    pub fn local_id(&self, gid: Gid) -> Option<u32> {
        let local = gid.clean().checked_sub(self.first_gid)?;
        (local < self.tile_count).then_some(local)
    }

    /// Global ID of local tile `id`, or `None` when it does not fit in the
    /// 29 bits left over by the flip flags.
    pub fn gid_of(&self, id: u32) -> Option<Gid> {
        self.first_gid
            .checked_add(id)
            .filter(|gid| *gid <= GID_MASK)
            .map(Gid)
    }

    /// Names of the terrains on each corner of `tile`, resolved through
    /// [`terrain_types`](Tileset::terrain_types). `None` when the tile has no
    /// terrain information; a corner is `None` when empty or out of range.
    pub fn terrain_corner_names(&self, tile: &TilesetTile) -> Option<[Option<&str>; 4]> {
        let terrain = tile.terrain?;
        Some(terrain.corners.map(|corner| {
            corner
                .and_then(|index| self.terrain_types.get(index as usize))
                .map(|t| t.name.as_str())
        }))
    }

    /// Copy the content of a loaded external document into this record.
    pub(crate) fn merge_external(&mut self, external: Tileset) {
        let Tileset {
            name,
            class,
            tiled_version,
            version,
            tile_width,
            tile_height,
            spacing,
            margin,
            tile_count,
            columns,
            image,
            tile_offset,
            terrain_types,
            properties,
            tiles,
            tile_index,
            base_dir,
            resource_dir,
            ..
        } = external;
        self.resource_dir = Some(resource_dir.unwrap_or(base_dir));
        self.name = name;
        self.class = class;
        self.tiled_version = tiled_version;
        self.version = version;
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        self.spacing = spacing;
        self.margin = margin;
        self.tile_count = tile_count;
        self.columns = columns;
        self.image = image;
        self.tile_offset = tile_offset;
        self.terrain_types = terrain_types;
        self.properties = properties;
        self.tiles = tiles;
        self.tile_index = tile_index;
        self.source_loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileTerrain;

    fn tile(id: u32, tile_type: &str) -> TilesetTile {
        TilesetTile {
            id,
            tile_type: tile_type.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn lookup_does_not_assume_position_equals_id() {
        let mut ts = Tileset::new("sparse");
        ts.push_tile(tile(116, "door"));
        ts.push_tile(tile(3, "wall"));
        assert_eq!(ts.tile(116).map(|t| t.tile_type.as_str()), Some("door"));
        assert_eq!(ts.tile(3).map(|t| t.tile_type.as_str()), Some("wall"));
        assert!(ts.tile(0).is_none());

        let old = ts.push_tile(tile(116, "gate"));
        assert_eq!(old.map(|t| t.tile_type), Some("door".to_owned()));
        let ids: Vec<_> = ts.tiles().iter().map(|t| t.id).collect();
        assert_eq!(ids, [116, 3]);

        ts.remove_tile(116);
        assert_eq!(ts.tile(3).map(|t| t.id), Some(3));
        assert!(ts.tile(116).is_none());
    }

    #[test]
    fn equality_ignores_base_dir() {
        let mut a = Tileset::new("a");
        let b = Tileset::new("a");
        a.set_base_dir("somewhere/else");
        assert_eq!(a, b);
    }

    #[test]
    fn gids_map_to_local_ids() {
        let ts = Tileset {
            first_gid: 5,
            tile_count: 10,
            ..Tileset::new("gids")
        };
        assert_eq!(ts.local_id(Gid(5)), Some(0));
        assert_eq!(ts.local_id(Gid(crate::gid::FLIP_V | 14)), Some(9));
        assert_eq!(ts.local_id(Gid(15)), None);
        assert_eq!(ts.local_id(Gid(4)), None);
        assert_eq!(ts.gid_of(2), Some(Gid(7)));
    }

    #[test]
    fn gid_of_refuses_ids_past_the_flag_bits() {
        let ts = Tileset {
            first_gid: GID_MASK - 1,
            ..Tileset::new("high")
        };
        assert_eq!(ts.gid_of(1), Some(Gid(GID_MASK)));
        assert_eq!(ts.gid_of(2), None);

        let ts = Tileset {
            first_gid: u32::MAX,
            ..Tileset::new("wrap")
        };
        assert_eq!(ts.gid_of(1), None);
    }

    #[test]
    fn terrain_corners_resolve_to_names() {
        let ts = Tileset {
            terrain_types: vec![
                Terrain {
                    name: "Grass".into(),
                    ..Default::default()
                },
                Terrain {
                    name: "Water".into(),
                    ..Default::default()
                },
            ],
            ..Tileset::new("terrain")
        };
        let t = TilesetTile {
            terrain: Some(TileTerrain {
                corners: [Some(0), Some(1), None, Some(7)],
            }),
            ..Default::default()
        };
        assert_eq!(
            ts.terrain_corner_names(&t),
            Some([Some("Grass"), Some("Water"), None, None])
        );
        assert_eq!(ts.terrain_corner_names(&TilesetTile::default()), None);
    }

    #[test]
    fn resources_resolve_next_to_the_declaring_document() {
        let inline = Tileset {
            base_dir: PathBuf::from("maps"),
            ..Tileset::new("inline")
        };
        assert_eq!(inline.resource_path("tiles.png"), PathBuf::from("maps/tiles.png"));

        let external = Tileset::from_source("../sets/base.tsx", 1, "maps");
        assert_eq!(
            external.resource_path("base.png"),
            PathBuf::from("sets/base.png")
        );
    }
}
