//! PLY (Stanford polygon) format support.
//!
//! This module loads and saves polygon meshes in the PLY format. Faces of any
//! arity are kept as they are. Saved files are ASCII with double-precision
//! coordinates, so positions survive a save/load cycle exactly.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, MeshIndex, PolyMesh};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::ply;
/// use tessera::mesh::PolyMesh;
///
/// let mesh: PolyMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_from(BufReader::new(file), path)
}

/// Read a PLY mesh from any reader.
pub fn read<R: Read, I: MeshIndex>(reader: R) -> Result<PolyMesh<I>> {
    read_from(reader, Path::new("<stream>"))
}

fn read_from<R: Read, I: MeshIndex>(mut reader: R, path: &Path) -> Result<PolyMesh<I>> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| MeshError::load(path, e))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| MeshError::load(path, "PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for (i, vertex) in vertex_element.iter().enumerate() {
        let coord = |name: &str| {
            get_float_property(vertex, name).ok_or_else(|| {
                MeshError::load(path, format!("vertex {} is missing its {} coordinate", i, name))
            })
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| MeshError::load(path, "PLY file has no face element"))?;

    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for (i, face) in face_element.iter().enumerate() {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| {
                MeshError::load(path, format!("face {} is missing vertex_indices", i))
            })?;
        faces.push(indices);
    }

    if faces.is_empty() {
        return Err(MeshError::load(path, "PLY file contains no faces"));
    }

    debug!(
        "read {} vertices and {} faces from {}",
        vertices.len(),
        faces.len(),
        path.display()
    );
    build_from_polygons(&vertices, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

/// Face index lists; negative entries are rejected rather than wrapped.
fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    fn convert<T: Copy + TryInto<usize>>(v: &[T]) -> Option<Vec<usize>> {
        v.iter().map(|&x| x.try_into().ok()).collect()
    }
    match element.get(name)? {
        Property::ListInt(v) => convert(v.as_slice()),
        Property::ListUInt(v) => convert(v.as_slice()),
        Property::ListShort(v) => convert(v.as_slice()),
        Property::ListUShort(v) => convert(v.as_slice()),
        Property::ListChar(v) => convert(v.as_slice()),
        Property::ListUChar(v) => convert(v.as_slice()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
///
/// # Example
///
/// ```no_run
/// use tessera::io::ply;
/// use tessera::mesh::{build_grid, PolyMesh};
///
/// let mesh: PolyMesh = build_grid(4, 4, 1.0).unwrap();
/// ply::save(&mesh, "grid.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write(mesh, BufWriter::new(file))
}

/// Write a mesh as ASCII PLY to any writer.
pub fn write<W: Write, I: MeshIndex>(mesh: &PolyMesh<I>, mut writer: W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by tessera")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        write!(writer, "{}", f.len())?;
        for i in f {
            write!(writer, " {}", i)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_grid, FaceId, VertexId};

    const PENTAGON: &str = "ply
format ascii 1.0
element vertex 5
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
2 0 0
2.5 1.5 0
1 2.5 0
-0.5 1.5 0
5 0 1 2 3 4
";

    #[test]
    fn test_read_keeps_polygon() {
        let mesh: PolyMesh = read(PENTAGON.as_bytes()).unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face_vertices(FaceId::new(0)).len(), 5);
        assert_eq!(*mesh.position(VertexId::new(2)), Point3::new(2.5, 1.5, 0.0));
    }

    #[test]
    fn test_write_then_read() {
        let mut mesh: PolyMesh = build_grid(2, 3, 0.1).unwrap();
        let v = VertexId::new(4);
        mesh.set_position(v, Point3::new(0.1 / 3.0, 0.7, -1e-9));

        let mut buffer = Vec::new();
        write(&mesh, &mut buffer).unwrap();
        let back: PolyMesh = read(buffer.as_slice()).unwrap();

        assert_eq!(back.positions(), mesh.positions());
        for f in mesh.face_ids() {
            assert_eq!(back.face_vertices(f), mesh.face_vertices(f));
        }
    }

    #[test]
    fn test_missing_faces_rejected() {
        let text = "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
end_header
0 0 0
";
        let result: Result<PolyMesh> = read(text.as_bytes());
        assert!(matches!(result, Err(MeshError::LoadError { .. })));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let text = PENTAGON.replace("5 0 1 2 3 4", "3 0 1 7");
        let result: Result<PolyMesh> = read(text.as_bytes());
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 7 })
        ));
    }
}
