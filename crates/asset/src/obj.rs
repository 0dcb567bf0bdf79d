//! OBJ parser producing flat per-corner buffers (positions, normals, texture
//! coordinates, optional tangent frames).

use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{IndexKind, ObjError},
    mesh::Mesh,
    tangent::compute_tangent_frames,
    tokenize,
};

/// Used for corners that leave out a normal while others in the mesh have one.
const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];
const DEFAULT_TEX_COORD: [f32; 2] = [0.0, 0.0];

/// Optional derived channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub calculate_tangents: bool,
    pub calculate_bitangents: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tangents(mut self, on: bool) -> Self {
        self.calculate_tangents = on;
        self
    }

    pub fn with_bitangents(mut self, on: bool) -> Self {
        self.calculate_bitangents = on;
        self
    }

    #[inline]
    fn wants_frames(&self) -> bool {
        self.calculate_tangents || self.calculate_bitangents
    }
}

/// Load an OBJ mesh from a file path.
pub fn load_obj(
    path: impl AsRef<Path>,
    calculate_tangents: bool,
    calculate_bitangents: bool,
) -> Result<Mesh, ObjError> {
    let options = LoadOptions {
        calculate_tangents,
        calculate_bitangents,
    };
    load_obj_with(path, &options)
}

/// Load an OBJ mesh from a file path with explicit [`LoadOptions`].
pub fn load_obj_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let contents = load_file(path)?;
    let mesh = parse_obj(&contents, options)?;
    log::info!(
        "Loaded OBJ {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from any [`Read`] implementation.
pub fn load_obj_from_reader<R: Read>(
    mut reader: R,
    options: &LoadOptions,
) -> Result<Mesh, ObjError> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(ObjError::Stream)?;
    parse_obj(&contents, options)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, options: &LoadOptions) -> Result<Mesh, ObjError> {
    parse_obj(contents, options)
}

/// Read the whole file into a string.
pub fn load_file(path: &Path) -> Result<String, ObjError> {
    let mut file = File::open(path).map_err(|source| ObjError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|source| ObjError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents)
}

/// Raw attribute tables in declaration order. Local to one parse.
#[derive(Default)]
struct AttributeTables {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
}

/// One resolved `p/t/n` face corner.
struct Corner {
    position: [f32; 3],
    tex_coord: Option<[f32; 2]>,
    normal: Option<[f32; 3]>,
}

/// Expanded output buffers. Optional channels stay `None` per corner until
/// [`MeshBuilder::finish`] decides whether the channel exists at all.
#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<[f32; 3]>,
    normals: Vec<Option<[f32; 3]>>,
    tex_coords: Vec<Option<[f32; 2]>>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn push_face(
        &mut self,
        groups: &[&str],
        tables: &AttributeTables,
        line_no: usize,
    ) -> Result<(), ObjError> {
        if groups.len() < 3 {
            log::warn!(
                "Skipping face with {} corner(s) on line {}",
                groups.len(),
                line_no
            );
            return Ok(());
        }

        let corners = groups
            .iter()
            .map(|group| resolve_corner(group, tables, line_no))
            .collect::<Result<Vec<_>, _>>()?;

        let base = u32::try_from(self.vertices.len())
            .ok()
            .filter(|b| b.checked_add(corners.len() as u32).is_some())
            .ok_or_else(|| {
                ObjError::parse(line_no, format!("too many vertices (>{})", u32::MAX))
            })?;

        for corner in corners {
            self.vertices.push(corner.position);
            self.tex_coords.push(corner.tex_coord);
            self.normals.push(corner.normal);
        }

        // Fan around corner 0: (0,1,2), (0,2,3), ...
        let count = groups.len() as u32;
        for k in 1..count - 1 {
            self.indices.extend_from_slice(&[base, base + k, base + k + 1]);
        }
        Ok(())
    }

    fn finish(self) -> Mesh {
        Mesh {
            vertices: self.vertices,
            normals: fill_channel("normal", self.normals, DEFAULT_NORMAL),
            tex_coords: fill_channel("texcoord", self.tex_coords, DEFAULT_TEX_COORD),
            indices: self.indices,
            tangents: None,
            bitangents: None,
        }
    }
}

/// Empty if no corner referenced the channel; otherwise one value per corner,
/// with `default` standing in for corners that left it out.
fn fill_channel<T: Copy>(name: &str, values: Vec<Option<T>>, default: T) -> Vec<T> {
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing == values.len() {
        return Vec::new();
    }
    if missing > 0 {
        log::warn!(
            "{} of {} face corners have no {} reference; using a default",
            missing,
            values.len(),
            name
        );
    }
    values.into_iter().map(|v| v.unwrap_or(default)).collect()
}

fn parse_obj(source: &str, options: &LoadOptions) -> Result<Mesh, ObjError> {
    let mut tables = AttributeTables::default();
    let mut builder = MeshBuilder::default();
    let mut ignored = 0usize;

    for (line_idx, line) in tokenize::lines(source).enumerate() {
        let line_no = line_idx + 1;
        let tokens = tokenize::tokens(line);
        let Some((&tag, rest)) = tokens.split_first() else {
            continue;
        };
        if tag.starts_with('#') {
            continue;
        }

        match tag {
            "v" => tables.positions.push(parse_floats(rest, tag, line_no)?),
            "vn" => tables.normals.push(parse_floats(rest, tag, line_no)?),
            "vt" => tables.tex_coords.push(parse_floats(rest, tag, line_no)?),
            "f" => builder.push_face(rest, &tables, line_no)?,
            _ => {
                // o/g/s/usemtl/mtllib/l/p etc.
                ignored += 1;
            }
        }
    }

    log::debug!(
        "OBJ tables: {} positions, {} normals, {} texcoords; {} ignored lines",
        tables.positions.len(),
        tables.normals.len(),
        tables.tex_coords.len(),
        ignored
    );

    let mut mesh = builder.finish();
    if options.wants_frames() {
        let frames = compute_tangent_frames(&mesh.vertices, &mesh.tex_coords, &mesh.indices);
        if options.calculate_tangents {
            mesh.tangents = Some(frames.tangents);
        }
        if options.calculate_bitangents {
            mesh.bitangents = Some(frames.bitangents);
        }
    }

    Ok(mesh)
}

/// First `N` tokens as floats. Trailing tokens (`w`, vertex colors) must be
/// numbers too but are dropped.
fn parse_floats<const N: usize>(
    tokens: &[&str],
    tag: &str,
    line_no: usize,
) -> Result<[f32; N], ObjError> {
    if tokens.len() < N {
        return Err(ObjError::parse(
            line_no,
            format!("'{}' expects {} components, found {}", tag, N, tokens.len()),
        ));
    }

    let mut out = [0.0f32; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = tokenize::parse_float(token).ok_or_else(|| {
            ObjError::parse(line_no, format!("invalid number '{}' in '{}'", token, tag))
        })?;
    }
    if let Some(bad) = tokens[N..].iter().find(|t| !tokenize::is_float(t)) {
        return Err(ObjError::parse(
            line_no,
            format!("invalid trailing number '{}' in '{}'", bad, tag),
        ));
    }
    Ok(out)
}

fn resolve_corner(
    group: &str,
    tables: &AttributeTables,
    line_no: usize,
) -> Result<Corner, ObjError> {
    // Keep empty parts: "1//3" means position 1, no texcoord, normal 3.
    let mut split = group.split('/');
    let position = match split.next() {
        Some(value) if !value.is_empty() => {
            lookup(&tables.positions, value, IndexKind::Position, line_no)?
        }
        _ => {
            return Err(ObjError::parse(
                line_no,
                format!("face element '{}' has no position index", group),
            ));
        }
    };

    let tex_coord = match split.next() {
        Some(value) if !value.is_empty() => Some(lookup(
            &tables.tex_coords,
            value,
            IndexKind::TexCoord,
            line_no,
        )?),
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => {
            Some(lookup(&tables.normals, value, IndexKind::Normal, line_no)?)
        }
        _ => None,
    };

    if split.next().is_some() {
        return Err(ObjError::parse(
            line_no,
            format!("malformed face element '{}'", group),
        ));
    }

    Ok(Corner {
        position,
        tex_coord,
        normal,
    })
}

/// Resolve a 1-based (or negative, end-relative) OBJ reference against `table`.
fn lookup<T: Copy>(
    table: &[T],
    token: &str,
    kind: IndexKind,
    line_no: usize,
) -> Result<T, ObjError> {
    let raw = tokenize::parse_int(token).ok_or_else(|| {
        ObjError::parse(line_no, format!("invalid {} index '{}'", kind, token))
    })?;

    let len = table.len();
    let idx = match raw {
        r if r > 0 => usize::try_from(r - 1).ok(),
        r if r < 0 => usize::try_from(r.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back)),
        _ => None,
    };

    idx.and_then(|i| table.get(i).copied())
        .ok_or(ObjError::IndexOutOfRange {
            line: line_no,
            kind,
            raw,
            len,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"
        v 0 0 0
        v 1 0 0
        v 0 1 0
        vt 0 0
        vt 1 0
        vt 0 1
        vn 0 0 1
        f 1/1/1 2/2/1 3/3/1
    "#;

    fn parse(src: &str) -> Result<Mesh, ObjError> {
        load_obj_from_str(src, &LoadOptions::default())
    }

    #[test]
    fn parse_simple_triangle() {
        let mesh = parse(TRIANGLE).expect("parse triangle");
        assert_eq!(
            mesh.vertices,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );
        assert_eq!(mesh.tex_coords, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!(mesh.tangents.is_none());
        assert!(mesh.bitangents.is_none());
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn quad_of_positions_is_fanned() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        // (1,2,3) and (1,3,4) in source numbering.
        let tri = |t: usize| -> Vec<[f32; 3]> {
            mesh.indices[t * 3..t * 3 + 3]
                .iter()
                .map(|&i| mesh.vertices[i as usize])
                .collect()
        };
        assert_eq!(tri(0), vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        assert_eq!(tri(1), vec![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(mesh.normals.is_empty());
        assert!(mesh.tex_coords.is_empty());
    }

    #[test]
    fn polygon_yields_k_minus_two_triangles() {
        let mut src = String::new();
        for k in 0..7 {
            let a = k as f32 * std::f32::consts::TAU / 7.0;
            src.push_str(&format!("v {} {} 0\n", a.cos(), a.sin()));
        }
        src.push_str("f 1 2 3 4 5 6 7\n");
        let mesh = parse(&src).unwrap();
        assert_eq!(mesh.triangle_count(), 5);
        assert!(mesh.indices.chunks(3).all(|t| t[0] == 0));
    }

    #[test]
    fn triangle_faces_keep_winding() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 3 1 2\nf 2 3 1\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices.len(), 3 * 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertices[0], [0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices[3], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn corners_are_not_deduplicated() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.vertices[1], mesh.vertices[3]);
    }

    #[test]
    fn values_pass_through_bit_identical() {
        let src = "v 0.1 -3.4028235e38 1e-45\nv 1.17549435e-38 2 3\nv 7 8 9\nf 1 2 3\n";
        let mesh = parse(src).unwrap();
        let expected: [f32; 3] = [
            "0.1".parse().unwrap(),
            "-3.4028235e38".parse().unwrap(),
            "1e-45".parse().unwrap(),
        ];
        for (got, want) in mesh.vertices[0].iter().zip(expected) {
            assert_eq!(got.to_bits(), want.to_bits());
        }
    }

    #[test]
    fn position_and_normal_only() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.normals.len(), 3);
        assert!(mesh.tex_coords.is_empty());
    }

    #[test]
    fn mixed_normal_usage_is_filled() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 1 0 0\nf 1//1 2 3\n";
        let mesh = parse(src).unwrap();
        assert_eq!(
            mesh.normals,
            vec![[1.0, 0.0, 0.0], DEFAULT_NORMAL, DEFAULT_NORMAL]
        );
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn negative_indices_are_relative() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertices[0], [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn unknown_tags_and_comments_are_ignored() {
        let src = "# cube\nmtllib cube.mtl\no Cube\ng side\nusemtl red\ns off\n\
                   v 0 0 0\nv 1 0 0\nv 0 1 0\nl 1 2\nf 1 2 3\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn extra_vertex_components_are_ignored() {
        let src = "v 0 0 0 1.0\nv 1 0 0 0.5 0.5 0.5\nv 0 1 0\nvt 0.5 0.5 0\nf 1/1 2/1 3/1\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertices[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.tex_coords, vec![[0.5, 0.5]; 3]);
    }

    #[test]
    fn non_numeric_trailing_tokens_are_parse_errors() {
        assert!(matches!(
            parse("v 0 0 0 garbage\n"),
            Err(ObjError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nvt 0 0 x\n"),
            Err(ObjError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse("vn 0 0 1 nan\n"),
            Err(ObjError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn short_faces_are_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\nf 1 2 3\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn no_faces_gives_empty_mesh() {
        let mesh = parse("v 0 0 0\n").unwrap();
        assert!(!mesh.is_valid());
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn position_index_past_end_is_out_of_range() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n";
        match parse(src) {
            Err(ObjError::IndexOutOfRange {
                line,
                kind,
                raw,
                len,
            }) => {
                assert_eq!((line, kind, raw, len), (4, IndexKind::Position, 4, 3));
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn reference_to_later_vertex_is_out_of_range() {
        // Only vertices declared so far count.
        let src = "v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n";
        assert!(matches!(
            parse(src),
            Err(ObjError::IndexOutOfRange { line: 3, .. })
        ));
    }

    #[test]
    fn zero_and_absent_table_indices_are_out_of_range() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        assert!(matches!(
            parse(src),
            Err(ObjError::IndexOutOfRange { raw: 0, .. })
        ));

        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1 2/1 3/1\n";
        assert!(matches!(
            parse(src),
            Err(ObjError::IndexOutOfRange {
                kind: IndexKind::TexCoord,
                len: 0,
                ..
            })
        ));

        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 -4\n";
        assert!(matches!(
            parse(src),
            Err(ObjError::IndexOutOfRange { raw: -4, .. })
        ));
    }

    #[test]
    fn malformed_numbers_are_parse_errors() {
        let err = parse("v 0 0 0\nv 1 zero 0\n").unwrap_err();
        assert!(matches!(err, ObjError::Parse { line: 2, .. }));
        assert_eq!(err.line(), Some(2));

        assert!(matches!(
            parse("vt 0.5\n"),
            Err(ObjError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 x\n"),
            Err(ObjError::Parse { line: 4, .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 /3\n"),
            Err(ObjError::Parse { .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1/1 2 3\n"),
            Err(ObjError::Parse { .. })
        ));
    }

    #[test]
    fn tangents_only_when_requested() {
        let options = LoadOptions::new().with_tangents(true);
        let mesh = load_obj_from_str(TRIANGLE, &options).unwrap();
        assert_eq!(mesh.tangents, Some(vec![[1.0, 0.0, 0.0]; 3]));
        assert!(mesh.bitangents.is_none());

        let options = LoadOptions::new().with_tangents(true).with_bitangents(true);
        let mesh = load_obj_from_str(TRIANGLE, &options).unwrap();
        assert_eq!(mesh.bitangents, Some(vec![[0.0, 1.0, 0.0]; 3]));
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn tangents_without_tex_coords_are_zero() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let options = LoadOptions::new().with_tangents(true).with_bitangents(true);
        let mesh = load_obj_from_str(src, &options).unwrap();
        let tangents = mesh.tangents.unwrap();
        assert_eq!(tangents.len(), 4);
        assert!(tangents.iter().flatten().all(|c| *c == 0.0));
    }

    #[test]
    fn reader_and_str_agree() {
        let options = LoadOptions::default();
        let a = load_obj_from_str(TRIANGLE, &options).unwrap();
        let b = load_obj_from_reader(TRIANGLE.as_bytes(), &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let path = std::env::temp_dir().join("objkit-definitely-missing.obj");
        match load_obj(&path, false, false) {
            Err(ObjError::FileNotFound { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn invalid_utf8_file_is_read_error() {
        let path = std::env::temp_dir().join(format!("objkit-binary-{}.obj", std::process::id()));
        std::fs::write(&path, b"v \xff 0 0\n").unwrap();
        let result = load_obj(&path, false, false);
        let _ = std::fs::remove_file(&path);
        match result {
            Err(ObjError::Read { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
            }
            other => panic!("expected Read, got {:?}", other),
        }
    }

    #[test]
    fn invalid_utf8_stream_is_stream_error() {
        let bytes: &[u8] = b"v \xff 0 0\n";
        assert!(matches!(
            load_obj_from_reader(bytes, &LoadOptions::default()),
            Err(ObjError::Stream(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("objkit-triangle-{}.obj", std::process::id()));
        std::fs::write(&path, TRIANGLE).unwrap();
        assert_eq!(load_file(&path).unwrap(), TRIANGLE);

        let mesh = load_obj(&path, true, true);
        let _ = std::fs::remove_file(&path);
        let mesh = mesh.unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!(mesh.tangents.is_some());
        assert!(mesh.bitangents.is_some());
    }
}
