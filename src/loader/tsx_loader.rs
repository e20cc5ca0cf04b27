// src/loader/tsx_loader.rs
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::attrs::Attrs;
use crate::error::{Result, TsxError};
use crate::image::decode_image;
use crate::loader::json_loader;
use crate::properties::decode_properties;
use crate::resource::{self, FilesystemReader, ResourceReader};
use crate::tile::{decode_tile, TilesetTile};
use crate::tileset::{Terrain, TileOffset, Tileset};
use crate::xml::{self, XmlElement};

/// Loads tilesets, opening `source` references through a [`ResourceReader`].
#[derive(Debug, Clone, Default)]
pub struct Loader<R: ResourceReader = FilesystemReader> {
    reader: R,
}

impl Loader<FilesystemReader> {
    /// A loader reading external documents from the filesystem.
    pub fn new() -> Self {
        Self {
            reader: FilesystemReader,
        }
    }
}

impl<R: ResourceReader> Loader<R> {
    /// A loader opening external documents through `reader`.
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Decode a `.tsx` document. Relative `source` paths are resolved against
    /// `base_dir`.
    pub fn load_tileset_from_reader(
        &mut self,
        base_dir: impl AsRef<Path>,
        reader: impl Read,
    ) -> Result<Tileset> {
        let content = read_document(reader)?;
        self.load_document(base_dir.as_ref(), &content, &mut Vec::new())
    }

    /// Open `path` through this loader's reader and decode it. `.tsj` and
    /// `.json` files are read as JSON tilesets.
    pub fn load_tileset_file(&mut self, path: impl AsRef<Path>) -> Result<Tileset> {
        let path = path.as_ref();
        let stream = self.reader.read_from(path).map_err(TsxError::ReadFailure)?;
        let content = read_document(stream)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        if is_json(path) {
            return json_loader::decode_tileset_json(base_dir, &content);
        }
        let mut visited = vec![resource::resolve(Path::new(""), &path.to_string_lossy())];
        self.load_document(base_dir, &content, &mut visited)
    }

    /// Replace the content of `tileset` with that of the external document its
    /// `source` names, keeping `first_gid`, `source` and the base directory.
    /// Does nothing for inline tilesets.
    pub fn resolve_source(&mut self, tileset: &mut Tileset) -> Result<()> {
        if tileset.source.is_empty() {
            tileset.source_loaded = true;
            return Ok(());
        }
        self.follow_source(tileset, &mut Vec::new())
    }

    fn load_document(
        &mut self,
        base_dir: &Path,
        content: &str,
        visited: &mut Vec<PathBuf>,
    ) -> Result<Tileset> {
        let root = xml::parse(content)?;
        let mut tileset = decode_tileset(&root, base_dir)?;
        if !tileset.source.is_empty() {
            self.follow_source(&mut tileset, visited)?;
        }
        Ok(tileset)
    }

    fn follow_source(&mut self, draft: &mut Tileset, visited: &mut Vec<PathBuf>) -> Result<()> {
        let path = resource::resolve(&draft.base_dir, &draft.source);
        if visited.contains(&path) {
            return Err(TsxError::SourceCycle { path });
        }
        tracing::debug!(source = %draft.source, path = %path.display(), "resolving external tileset");

        let bytes = self
            .reader
            .read_from(&path)
            .and_then(read_bytes)
            .map_err(|source| TsxError::UnresolvableSource {
                path: path.clone(),
                source,
            })?;
        let content = document_text(bytes)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        visited.push(path.clone());
        let external = if is_json(&path) {
            json_loader::decode_tileset_json(&dir, &content)
        } else {
            self.load_document(&dir, &content, visited)
        };
        visited.pop();

        draft.merge_external(external?);
        Ok(())
    }
}

/// Decode a `.tsx` document from the filesystem-backed [`Loader`].
pub fn load_tileset_from_reader(base_dir: impl AsRef<Path>, reader: impl Read) -> Result<Tileset> {
    Loader::new().load_tileset_from_reader(base_dir, reader)
}

/// Read and decode the tileset file at `path`.
pub fn load_tileset_file(path: impl AsRef<Path>) -> Result<Tileset> {
    Loader::new().load_tileset_file(path)
}

/// Decode a document whose root element is a single `<tile>`.
pub fn load_tile_from_reader(reader: impl Read) -> Result<TilesetTile> {
    let content = read_document(reader)?;
    let root = xml::parse(&content)?;
    if root.name != "tile" {
        return Err(TsxError::malformed(format!(
            "expected <tile> root element, found <{}>",
            root.name
        )));
    }
    decode_tile(&root)
}

pub(crate) fn read_document(reader: impl Read) -> Result<String> {
    document_text(read_bytes(reader).map_err(TsxError::ReadFailure)?)
}

fn read_bytes(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn document_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| TsxError::malformed(format!("document is not UTF-8: {e}")))
}

fn is_json(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("tsj")
    )
}

fn decode_tileset(root: &XmlElement, base_dir: &Path) -> Result<Tileset> {
    if root.name != "tileset" {
        return Err(TsxError::malformed(format!(
            "expected <tileset> root element, found <{}>",
            root.name
        )));
    }
    let attrs = Attrs::of(root);
    let mut tileset = Tileset {
        first_gid: attrs.parse_or("firstgid", 0)?,
        source: attrs.string("source"),
        name: attrs.string("name"),
        class: attrs.string("class"),
        version: attrs.string("version"),
        tiled_version: attrs.string("tiledversion"),
        tile_width: attrs.parse_or("tilewidth", 0)?,
        tile_height: attrs.parse_or("tileheight", 0)?,
        spacing: attrs.parse_or("spacing", 0)?,
        margin: attrs.parse_or("margin", 0)?,
        tile_count: attrs.parse_or("tilecount", 0)?,
        columns: attrs.parse_or("columns", 0)?,
        ..Default::default()
    };
    tileset.set_base_dir(base_dir);

    // Inline children of a source reference are ignored.
    if !tileset.source.is_empty() {
        return Ok(tileset);
    }

    for child in &root.children {
        match child.name.as_str() {
            "image" => tileset.image = Some(decode_image(child)?),
            "tileoffset" => {
                let a = Attrs::of(child);
                tileset.tile_offset = Some(TileOffset {
                    x: a.parse_or("x", 0)?,
                    y: a.parse_or("y", 0)?,
                });
            }
            "terraintypes" => {
                for terrain in child.children_named("terrain") {
                    tileset.terrain_types.push(decode_terrain(terrain)?);
                }
            }
            "properties" => decode_properties(child, &mut tileset.properties)?,
            "tile" => {
                let tile = decode_tile(child)?;
                let id = tile.id;
                if tileset.push_tile(tile).is_some() {
                    tracing::warn!(tileset = %tileset.name, tile = id, "duplicate tile id, keeping the last one");
                }
            }
            other => tracing::debug!(element = other, "skipping unknown <tileset> child"),
        }
    }
    tileset.source_loaded = true;
    Ok(tileset)
}

fn decode_terrain(element: &XmlElement) -> Result<Terrain> {
    let attrs = Attrs::of(element);
    // Tiled writes -1 for a terrain without a representative tile.
    let tile = attrs
        .parse_opt::<i64>("tile")?
        .and_then(|t| u32::try_from(t).ok());
    let mut terrain = Terrain {
        name: attrs.string("name"),
        tile,
        ..Default::default()
    };
    for props in element.children_named("properties") {
        decode_properties(props, &mut terrain.properties)?;
    }
    Ok(terrain)
}
