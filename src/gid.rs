//! Global tile IDs.

/// Horizontal flip flag.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Anti-diagonal flip flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Bits that carry the tile ID itself.
pub const GID_MASK: u32 = 0x1FFF_FFFF; // lower 29 bits

/// A global tile ID as stored in maps and tile objects: the owning tileset's
/// `first_gid` plus a local tile ID, with flip flags in the top bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gid(pub u32);

#[allow(missing_docs)]
impl Gid {
    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_stripped_from_the_id() {
        let gid = Gid(FLIP_H | FLIP_D | 42);
        assert_eq!(gid.clean(), 42);
        assert!(gid.flip_h());
        assert!(!gid.flip_v());
        assert!(gid.flip_d());
        assert_eq!(gid.raw(), 0xA000_002A);
    }
}
