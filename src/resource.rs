//! Access to documents referenced from a tileset.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;

/// Opens external documents (`source="other.tsx"`) for the loader.
///
/// Implemented for [`FilesystemReader`] and for any
/// `FnMut(&Path) -> io::Result<impl Read>`, which makes in-memory sources easy:
///
/// ```
/// use std::io::{self, Cursor};
/// use std::path::Path;
/// use tiled_tsx::Loader;
///
/// let mut loader = Loader::with_reader(|path: &Path| {
///     if path == Path::new("sets/other.tsx") {
///         Ok(Cursor::new(br#"<tileset name="other" tilewidth="8" tileheight="8"/>"#.to_vec()))
///     } else {
///         Err(io::Error::from(io::ErrorKind::NotFound))
///     }
/// });
/// let ts = loader
///     .load_tileset_from_reader("sets", &br#"<tileset firstgid="5" source="other.tsx"/>"#[..])
///     .unwrap();
/// assert_eq!(ts.name, "other");
/// assert_eq!(ts.first_gid, 5);
/// ```
pub trait ResourceReader {
    /// Byte stream of an opened document.
    type Resource: Read;

    /// Open the document at `path`.
    fn read_from(&mut self, path: &Path) -> io::Result<Self::Resource>;
}

/// Reads documents straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemReader;

impl ResourceReader for FilesystemReader {
    type Resource = BufReader<File>;

    fn read_from(&mut self, path: &Path) -> io::Result<Self::Resource> {
        Ok(BufReader::new(File::open(path)?))
    }
}

impl<F, R> ResourceReader for F
where
    F: FnMut(&Path) -> io::Result<R>,
    R: Read,
{
    type Resource = R;

    fn read_from(&mut self, path: &Path) -> io::Result<Self::Resource> {
        self(path)
    }
}

/// Join `relative` onto `base_dir` and fold away `.`/`..` components.
/// Backslashes written by Windows builds of Tiled are treated as separators.
pub fn resolve(base_dir: &Path, relative: &str) -> PathBuf {
    let relative = relative.replace('\\', "/");
    base_dir.join(relative).normalize()
}
