//! Mesh file I/O.
//!
//! This module provides functions for loading and saving polygon meshes.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Geometry only |
//! | PLY | `.ply` | ✓ | ✓ | ASCII and binary in, ASCII out |
//!
//! Faces keep their arity in both formats; nothing is triangulated.
//!
//! # Usage
//!
//! ```no_run
//! use tessera::io::{load, save};
//! use tessera::mesh::PolyMesh;
//!
//! // Load with automatic format detection
//! let mesh: PolyMesh = load("model.obj").unwrap();
//!
//! // Save with automatic format detection
//! save(&mesh, "output.ply").unwrap();
//! ```
//!
//! Format-specific functions also accept any reader or writer:
//!
//! ```no_run
//! use tessera::io::obj;
//! use tessera::mesh::PolyMesh;
//!
//! let mesh: PolyMesh = obj::read(std::io::stdin().lock()).unwrap();
//! obj::write(&mesh, std::io::stdout().lock()).unwrap();
//! ```

pub mod obj;
pub mod ply;

use std::fmt;
use std::path::Path;

use log::info;

use crate::error::{MeshError, Result};
use crate::mesh::{MeshIndex, PolyMesh};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    fn require(path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Obj => write!(f, "OBJ"),
            Format::Ply => write!(f, "PLY"),
        }
    }
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
///
/// # Example
///
/// ```no_run
/// use tessera::io::load;
/// use tessera::mesh::PolyMesh;
///
/// let mesh: PolyMesh = load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let format = Format::require(path)?;

    let mesh = match format {
        Format::Obj => obj::load(path)?,
        Format::Ply => ply::load(path)?,
    };
    info!(
        "loaded {} mesh {} ({} vertices, {} faces)",
        format,
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Save a mesh to a file with automatic format detection.
///
/// The format is determined by the file extension. A mesh whose faces
/// reference missing vertices is refused before the file is created.
///
/// # Example
///
/// ```no_run
/// use tessera::io::save;
/// use tessera::mesh::{build_grid, PolyMesh};
///
/// let mesh: PolyMesh = build_grid(8, 8, 0.5).unwrap();
/// save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = Format::require(path)?;

    mesh.check_references().map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match format {
        Format::Obj => obj::save(mesh, path)?,
        Format::Ply => ply::save(mesh, path)?,
    }
    info!("saved {} mesh {}", format, path.display());
    Ok(())
}
