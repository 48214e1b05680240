//! # Sector graph files
//!
//! ```text
//! "SGRF"           4-byte magic
//! version          u32 LE (currently 1)
//! payload length   u32 LE
//! payload          bincode 2, standard config: a `RawMap`
//! ```
//!
//! Decoding runs the same validation as `SectorGraphBuilder::build`, so a
//! graph read from disk is as trustworthy as one built in code.

mod raw;

use bincode::{
    config,
    error::{DecodeError, EncodeError},
};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::{fs, io, path::Path};
use thiserror::Error;

use crate::world::{GraphError, SectorGraph};

pub use raw::{RawMap, RawSector, RawVertex, RawWall};

pub const MAGIC: [u8; 4] = *b"SGRF";
pub const VERSION: u32 = 1;
const HEADER_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum MapFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file is not a sector graph")]
    BadMagic,

    #[error("unsupported map version {0} (expected {VERSION})")]
    Version(u32),

    #[error("truncated: need {expected} bytes, have {found}")]
    Truncated { expected: usize, found: usize },

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("payload decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("payload encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("sector {sector} has unknown flag bits {bits:#x}")]
    BadFlags { sector: u32, bits: u32 },

    #[error("invalid sector graph: {0}")]
    Graph(#[from] GraphError),
}

/// Serialise `graph` into the file format.
pub fn to_bytes(graph: &SectorGraph) -> Result<Vec<u8>, MapFileError> {
    let payload = bincode::encode_to_vec(RawMap::from(graph), config::standard())?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.write_u32::<LE>(VERSION)?;
    out.write_u32::<LE>(payload.len() as u32)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Parse and validate a sector graph from the file format.
pub fn from_bytes(bytes: &[u8]) -> Result<SectorGraph, MapFileError> {
    if bytes.len() < HEADER_LEN {
        return Err(MapFileError::Truncated {
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    }
    if bytes[..4] != MAGIC {
        return Err(MapFileError::BadMagic);
    }

    let mut cur = &bytes[4..HEADER_LEN];
    let version = cur.read_u32::<LE>()?;
    if version != VERSION {
        return Err(MapFileError::Version(version));
    }
    let len = cur.read_u32::<LE>()? as usize;

    let body = &bytes[HEADER_LEN..];
    if body.len() < len {
        return Err(MapFileError::Truncated {
            expected: HEADER_LEN + len,
            found: bytes.len(),
        });
    }
    if body.len() > len {
        return Err(MapFileError::TrailingBytes(body.len() - len));
    }

    let (raw, read) = bincode::decode_from_slice::<RawMap, _>(body, config::standard())?;
    if read != len {
        return Err(MapFileError::TrailingBytes(len - read));
    }
    raw.into_graph()
}

pub fn read_map<P: AsRef<Path>>(path: P) -> Result<SectorGraph, MapFileError> {
    from_bytes(&fs::read(path)?)
}

pub fn write_map<P: AsRef<Path>>(path: P, graph: &SectorGraph) -> Result<(), MapFileError> {
    fs::write(path, to_bytes(graph)?)?;
    Ok(())
}

// ==========================================================================
// Tests
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{SectorFlags, demo};

    fn assert_same(a: &SectorGraph, b: &SectorGraph) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.walls, b.walls);
        assert_eq!(a.sectors, b.sectors);
    }

    #[test]
    fn file_round_trip_keeps_every_field() {
        let g = demo::sky_court();
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        write_map(tmp.path(), &g).unwrap();
        let back = read_map(tmp.path()).unwrap();
        assert_same(&g, &back);
        assert!(back.sectors[1].flags.contains(SectorFlags::EXTERIOR));
    }

    #[test]
    fn header_layout() {
        let bytes = to_bytes(&demo::single_room()).unwrap();
        assert_eq!(&bytes[..4], b"SGRF");
        assert_eq!(bytes[4..8], 1u32.to_le_bytes());
        let len = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        assert_eq!(bytes.len(), HEADER_LEN + len);
    }

    #[test]
    fn rejects_garbage_file() {
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(tmp.path(), b"NOTAMAP_____").unwrap();
        let err = read_map(tmp.path()).unwrap_err();
        assert!(matches!(err, MapFileError::BadMagic));
    }

    #[test]
    fn rejects_future_version() {
        let mut bytes = to_bytes(&demo::single_room()).unwrap();
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(from_bytes(&bytes), Err(MapFileError::Version(7))));
    }

    #[test]
    fn detects_truncation_and_trailing_bytes() {
        let bytes = to_bytes(&demo::two_rooms()).unwrap();
        assert!(matches!(
            from_bytes(&bytes[..bytes.len() - 3]),
            Err(MapFileError::Truncated { .. })
        ));
        assert!(matches!(
            from_bytes(&bytes[..6]),
            Err(MapFileError::Truncated { expected: 12, found: 6 })
        ));
        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(
            from_bytes(&long),
            Err(MapFileError::TrailingBytes(1))
        ));
    }

    #[test]
    fn decoded_graph_is_validated() {
        let mut raw = RawMap::from(&demo::two_rooms());
        // break the mirror pairing of the shared wall
        raw.walls[1].mirror = 4;
        let payload = bincode::encode_to_vec(&raw, config::standard()).unwrap();
        let mut bytes = MAGIC.to_vec();
        bytes.extend(VERSION.to_le_bytes());
        bytes.extend((payload.len() as u32).to_le_bytes());
        bytes.extend(payload);
        assert!(matches!(
            from_bytes(&bytes),
            Err(MapFileError::Graph(GraphError::MirrorMismatch { .. }))
        ));
    }

    #[test]
    fn overflowing_sector_ranges_are_refused() {
        let mut raw = RawMap::from(&demo::two_rooms());
        raw.sectors[1].first_wall = u32::MAX;
        assert!(matches!(
            raw.into_graph(),
            Err(MapFileError::Graph(GraphError::SectorRangeOutOfBounds { sector: 1 }))
        ));

        let mut raw = RawMap::from(&demo::two_rooms());
        raw.sectors[0].first_vertex = u32::MAX - 1;
        assert!(matches!(
            raw.into_graph(),
            Err(MapFileError::Graph(GraphError::SectorRangeOutOfBounds { sector: 0 }))
        ));
    }

    #[test]
    fn unknown_flag_bits_are_refused() {
        let mut raw = RawMap::from(&demo::single_room());
        raw.sectors[0].flags = 0x100;
        assert!(matches!(
            raw.into_graph(),
            Err(MapFileError::BadFlags { sector: 0, bits: 0x100 })
        ));
    }
}
