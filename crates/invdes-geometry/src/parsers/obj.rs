//! Parser for Wavefront `.obj` mesh files.
//!
//! Only vertices (`v`) and faces (`f`) are read. Faces are fan-triangulated
//! and their winding is kept, so counter-clockwise faces (seen from outside)
//! give outward normals. Negative face indices count back from the most
//! recent vertex, as the format allows.

use super::ParseError;

/// A triangulated mesh read from an OBJ file.
#[derive(Debug, Clone)]
pub struct ObjMesh {
    pub vertices: Vec<[f64; 3]>,
    /// Triangles as 0-based indices into `vertices`.
    pub faces: Vec<[usize; 3]>,
}

fn format_error(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::FormatError {
        line,
        message: message.into(),
    }
}

fn parse_vertex<'a>(line: usize, mut tokens: impl Iterator<Item = &'a str>) -> Result<[f64; 3], ParseError> {
    let mut v = [0.0; 3];
    for (k, name) in ["x", "y", "z"].iter().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| format_error(line, format!("vertex is missing its {name} coordinate")))?;
        v[k] = token
            .parse()
            .map_err(|_| format_error(line, format!("invalid {name} coordinate: {token}")))?;
    }
    Ok(v)
}

/// Resolve one face token (`v`, `v/vt`, `v/vt/vn` or `v//vn`) to a 0-based index.
fn parse_face_index(line: usize, token: &str, n_vertices: usize) -> Result<usize, ParseError> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head
        .parse()
        .map_err(|_| format_error(line, format!("invalid face index: {token}")))?;
    let resolved = match raw {
        0 => return Err(format_error(line, "face index 0 is invalid (OBJ indices are 1-based)")),
        r if r > 0 => r as usize - 1,
        r => {
            let back = r.unsigned_abs() as usize;
            if back > n_vertices {
                return Err(format_error(line, format!("relative face index {r} precedes the first vertex")));
            }
            n_vertices - back
        }
    };
    Ok(resolved)
}

/// Parse OBJ text into vertices and triangles.
///
/// Lines other than `v` and `f` (`vt`, `vn`, `g`, `o`, `s`, `usemtl`, comments)
/// are ignored.
pub fn parse_obj(content: &str) -> Result<ObjMesh, ParseError> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("v") => vertices.push(parse_vertex(line, tokens)?),
            Some("f") => {
                let polygon = tokens
                    .map(|t| parse_face_index(line, t, vertices.len()))
                    .collect::<Result<Vec<_>, _>>()?;
                if polygon.len() < 3 {
                    return Err(format_error(
                        line,
                        format!("face needs at least 3 vertices, got {}", polygon.len()),
                    ));
                }
                faces.extend(polygon.windows(2).skip(1).map(|w| [polygon[0], w[0], w[1]]));
            }
            _ => {}
        }
    }

    if vertices.len() < 4 {
        return Err(format_error(
            0,
            format!("a closed mesh needs at least 4 vertices, got {}", vertices.len()),
        ));
    }
    if faces.is_empty() {
        return Err(format_error(0, "no faces found"));
    }
    let n = vertices.len();
    if let Some((fi, bad)) = faces
        .iter()
        .enumerate()
        .find_map(|(fi, f)| f.iter().find(|&&i| i >= n).map(|&i| (fi, i)))
    {
        return Err(format_error(
            0,
            format!("triangle {} references vertex {} but only {n} exist", fi + 1, bad + 1),
        ));
    }

    Ok(ObjMesh { vertices, faces })
}

impl ObjMesh {
    pub fn bounding_box(&self) -> ([f64; 3], [f64; 3]) {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        (min, max)
    }
}

/// Axis-aligned cube spanning ±`h`, with outward (counter-clockwise) faces.
#[cfg(test)]
pub(crate) fn cube_obj(h: f64) -> String {
    format!(
        "# cube\n\
         v -{h} -{h} -{h}\nv {h} -{h} -{h}\nv {h} {h} -{h}\nv -{h} {h} -{h}\n\
         v -{h} -{h} {h}\nv {h} -{h} {h}\nv {h} {h} {h}\nv -{h} {h} {h}\n\
         f 1 4 3 2\n\
         f 5 6 7 8\n\
         f 1 2 6 5\n\
         f 2 3 7 6\n\
         f 3 4 8 7\n\
         f 4 1 5 8\n"
    )
}
