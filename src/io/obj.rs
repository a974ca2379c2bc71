//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` records become vertices and `f` records become
//! polygon faces. Texture coordinates, normals, groups and materials are
//! skipped. Face corners may use the `v`, `v/vt`, `v//vn` or `v/vt/vn` forms
//! and negative (relative) indices.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, trace};
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, MeshIndex, PolyMesh};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::obj;
/// use tessera::mesh::PolyMesh;
///
/// let mesh: PolyMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_from(BufReader::new(file), path)
}

/// Read an OBJ mesh from any buffered reader.
pub fn read<R: BufRead, I: MeshIndex>(reader: R) -> Result<PolyMesh<I>> {
    read_from(reader, Path::new("<stream>"))
}

fn read_from<R: BufRead, I: MeshIndex>(reader: R, path: &Path) -> Result<PolyMesh<I>> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in &mut coords {
                    *c = tokens
                        .next()
                        .and_then(|t| t.parse::<f64>().ok())
                        .ok_or_else(|| {
                            MeshError::load(path, format!("line {}: malformed vertex", line_no))
                        })?;
                }
                vertices.push(Point3::from(coords));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| parse_corner(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| {
                        MeshError::load(path, format!("line {}: malformed face", line_no))
                    })?;
                faces.push(face);
            }
            Some(tag) if !tag.starts_with('#') => {
                trace!("line {}: skipping `{}` record", line_no, tag);
                skipped += 1;
            }
            _ => {}
        }
    }

    debug!(
        "read {} vertices and {} faces from {} ({} other records skipped)",
        vertices.len(),
        faces.len(),
        path.display(),
        skipped
    );
    build_from_polygons(&vertices, &faces)
}

/// Zero-based vertex index of one face corner.
///
/// `count` is the number of vertices read so far, which negative indices
/// count back from.
fn parse_corner(token: &str, count: usize) -> Option<usize> {
    let index: i64 = token.split('/').next()?.parse().ok()?;
    match index {
        i if i > 0 => Some(i as usize - 1),
        i if i < 0 => count.checked_sub(i.unsigned_abs() as usize),
        _ => None,
    }
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::obj;
/// use tessera::mesh::{build_grid, PolyMesh};
///
/// let mesh: PolyMesh = build_grid(4, 4, 1.0).unwrap();
/// obj::save(&mesh, "grid.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write(mesh, BufWriter::new(file))
}

/// Write a mesh as OBJ to any writer.
pub fn write<W: Write, I: MeshIndex>(mesh: &PolyMesh<I>, mut writer: W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# Generated by tessera")?;
    writeln!(writer, "# {} vertices, {} faces", vertices.len(), faces.len())?;

    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        write!(writer, "f")?;
        for i in f {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}
