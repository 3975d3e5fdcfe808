//! OBJ mesh parsing.
//!
//! The parser understands the subset of Wavefront OBJ the engine exports use:
//! `v`, `vt` and `vn` records followed by triangular `f a/ta/na b/tb/nb c/tc/nc`
//! faces. GPU vertex streams need exactly one texture coordinate and one
//! normal per position, so the attributes named by a face vertex are written
//! into the slot of its *position* index. A position referenced with
//! different texture coordinates or normals keeps whichever face came last;
//! vertices are not split.

use cgmath::{Vector2, Vector3};

use crate::{
    data_structures::model::RawMeshData,
    error::{RenderError, Result},
};

/// Parse OBJ text into flat, position-indexed vertex streams.
///
/// Attribute records are read up to the first face; every face record after
/// that contributes one triangle. Texture `v` coordinates are flipped
/// (`1 - v`) because textures are stored top row first.
pub fn parse_obj(source: &str) -> Result<RawMeshData> {
    let mut positions: Vec<Vector3<f32>> = Vec::new();
    let mut textures: Vec<Vector2<f32>> = Vec::new();
    let mut normals: Vec<Vector3<f32>> = Vec::new();

    let mut lines = source.lines().enumerate().map(|(i, line)| (i + 1, line));
    let mut first_face = None;
    for (number, line) in lines.by_ref() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => positions.push(parse_floats::<3>(number, fields)?.into()),
            Some("vt") => textures.push(parse_floats::<2>(number, fields)?.into()),
            Some("vn") => normals.push(parse_floats::<3>(number, fields)?.into()),
            Some("f") => {
                first_face = Some((number, line));
                break;
            }
            _ => (),
        }
    }
    let Some(first_face) = first_face else {
        return Err(RenderError::parse(
            source.lines().count().max(1),
            "mesh contains no faces",
        ));
    };

    let mut texture_array = vec![0.0f32; positions.len() * 2];
    let mut normal_array = vec![0.0f32; positions.len() * 3];
    let mut indices: Vec<u32> = Vec::new();

    let faces = std::iter::once(first_face).chain(lines.filter(|(_, line)| {
        line.split_whitespace().next() == Some("f")
    }));
    for (number, line) in faces {
        let vertices: Vec<&str> = line.split_whitespace().skip(1).collect();
        if vertices.len() != 3 {
            return Err(RenderError::parse(
                number,
                format!("expected a triangle, got {} vertices", vertices.len()),
            ));
        }
        for vertex in vertices {
            let [p, t, n] = parse_vertex(number, vertex)?;
            let position = resolve(number, "position", p, positions.len())?;
            let texture = textures[resolve(number, "texture coordinate", t, textures.len())?];
            let normal = normals[resolve(number, "normal", n, normals.len())?];

            indices.push(position as u32);
            texture_array[position * 2] = texture.x;
            texture_array[position * 2 + 1] = 1.0 - texture.y;
            normal_array[position * 3] = normal.x;
            normal_array[position * 3 + 1] = normal.y;
            normal_array[position * 3 + 2] = normal.z;
        }
    }

    let vertices_array = positions.iter().flat_map(|p| [p.x, p.y, p.z]).collect();

    log::debug!(
        "Parsed OBJ with {} positions and {} triangles",
        positions.len(),
        indices.len() / 3
    );
    Ok(RawMeshData::new(
        vertices_array,
        texture_array,
        normal_array,
        Some(indices),
    ))
}

fn parse_floats<'a, const N: usize>(
    line: usize,
    fields: impl Iterator<Item = &'a str>,
) -> Result<[f32; N]> {
    let values = fields
        .map(|field| {
            field
                .parse::<f32>()
                .map_err(|e| RenderError::parse(line, format!("invalid number {field:?}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    values.try_into().map_err(|values: Vec<f32>| {
        RenderError::parse(
            line,
            format!("expected {} components, got {}", N, values.len()),
        )
    })
}

/// Split `a/ta/na` into its three 1-based indices.
fn parse_vertex(line: usize, vertex: &str) -> Result<[usize; 3]> {
    let parts = vertex
        .split('/')
        .map(|part| {
            part.parse::<usize>().map_err(|e| {
                RenderError::parse(line, format!("invalid face index in {vertex:?}: {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    parts.try_into().map_err(|parts: Vec<usize>| {
        RenderError::parse(
            line,
            format!(
                "face vertex {vertex:?} needs position/texture/normal indices, got {}",
                parts.len()
            ),
        )
    })
}

/// Convert a 1-based OBJ index into a checked 0-based one.
fn resolve(line: usize, what: &str, index: usize, len: usize) -> Result<usize> {
    if index == 0 || index > len {
        return Err(RenderError::parse(
            line,
            format!("{what} index {index} is out of range (1..={len})"),
        ));
    }
    Ok(index - 1)
}
