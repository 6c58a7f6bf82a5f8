//! # Asset Parser — glTF 2.0 to Typed Geometry
//!
//! Turns a set of named byte blobs (one `.glb`, or one `.gltf` plus its
//! companion `.bin` and image files) into a [`SceneDescription`]: one
//! [`PrimitiveData`] per drawable primitive, with decoded attributes, a
//! resolved material, and the decoded image table.
//!
//! ## Pipeline
//!
//! ```text
//!  files ─► find_entry ─► split_glb / JSON ─► Document (serde)
//!                                   │
//!                       buffers (BIN chunk, data: URI, companion file)
//!                                   │
//!     per primitive: read_accessor ─► positions/normals/colors/uvs/indices
//!                    resolve_material
//!     per image:     load_images (failures become None)
//! ```
//!
//! Scene-graph transforms are not applied: every mesh is read in its own
//! local space, in document order.
//!
//! ## Comparison
//!
//! - **gltf crate**: full document model with defaults filled in. That hides
//!   whether `metallicFactor` was authored, which the material defaults here
//!   depend on.
//! - **three.js**: `GLTFLoader` builds a full scene graph.
//! - **Our approach**: a small serde schema with `Option` fields and a
//!   flat primitive list.

pub mod accessor;
pub mod container;
pub mod image;
pub mod material;
pub mod schema;

use crate::error::LoadError;

use accessor::{AccessorData, ElementShape, read_accessor};
use container::{ContainerKind, decode_data_uri, find_companion, find_entry, split_glb};
pub use self::image::DecodedImage;
pub use material::MaterialInfo;
use schema::{Document, Primitive};

/// One named byte blob supplied by the user (file picker, drag-and-drop or
/// command line).
#[derive(Clone)]
pub struct NamedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl NamedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it by its final path component.
    pub fn read(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

impl std::fmt::Debug for NamedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NamedFile({:?}, {} bytes)", self.name, self.bytes.len())
    }
}

/// Vertex colors as decoded from `COLOR_0`, already in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexColors {
    Rgb(Vec<[f32; 3]>),
    Rgba(Vec<[f32; 4]>),
}

impl VertexColors {
    pub fn rgba(&self, i: usize) -> [f32; 4] {
        match self {
            Self::Rgb(c) => [c[i][0], c[i][1], c[i][2], 1.0],
            Self::Rgba(c) => c[i],
        }
    }
}

/// One drawable unit. All per-vertex arrays have `positions.len()` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub colors: Option<VertexColors>,
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Triangle-list indices local to this primitive. Synthesised as
    /// `0..n` when the primitive has no index accessor.
    pub indices: Vec<u32>,
    pub material: MaterialInfo,
}

/// Parser output.
#[derive(Debug, Clone, Default)]
pub struct SceneDescription {
    /// Entry file name, for messages.
    pub name: String,
    pub primitives: Vec<PrimitiveData>,
    /// One slot per glTF image; `None` where resolution or decoding failed.
    pub images: Vec<Option<DecodedImage>>,
}

impl SceneDescription {
    pub fn image(&self, index: Option<usize>) -> Option<&DecodedImage> {
        index.and_then(|i| self.images.get(i)).and_then(Option::as_ref)
    }
}

/// Parse a named-blob set into a scene description.
pub fn parse(files: &[NamedFile]) -> Result<SceneDescription, LoadError> {
    let (entry, kind) = find_entry(files)?;
    let file = entry.name.as_str();
    log::info!("parsing {file} ({} bytes, {kind:?})", entry.bytes.len());

    let (json, bin) = match kind {
        ContainerKind::Glb => {
            let chunks = split_glb(&entry.bytes, file)?;
            (chunks.json, chunks.bin)
        }
        ContainerKind::Gltf => (entry.bytes.as_slice(), None),
    };

    let doc: Document = serde_json::from_slice(json)
        .map_err(|e| LoadError::format(file, format!("invalid glTF JSON: {e}")))?;
    log::debug!(
        "{file}: {} meshes, {} materials, {} textures, {} images",
        doc.meshes.len(),
        doc.materials.len(),
        doc.textures.len(),
        doc.images.len()
    );

    let buffers = load_buffers(&doc, bin, files, file)?;
    let primitives = extract_primitives(&doc, &buffers, file)?;
    let images = self::image::load_images(&doc, &buffers, files);
    log::info!(
        "{file}: {} primitives, {} of {} images decoded",
        primitives.len(),
        images.iter().flatten().count(),
        images.len()
    );

    Ok(SceneDescription {
        name: file.to_owned(),
        primitives,
        images,
    })
}

/// Resolve every declared buffer. Buffer 0 of a GLB without a URI is the
/// binary chunk. A URI-less buffer in a `.gltf` stays unloaded; only reading
/// through it fails.
fn load_buffers(
    doc: &Document,
    bin: Option<&[u8]>,
    files: &[NamedFile],
    file: &str,
) -> Result<Vec<Option<Vec<u8>>>, LoadError> {
    doc.buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| {
            let Some(uri) = buffer.uri.as_deref() else {
                return Ok(if i == 0 { bin.map(<[u8]>::to_vec) } else { None });
            };
            if let Some(data) = decode_data_uri(uri) {
                let data = data.map_err(|e| LoadError::format(file, format!("buffers[{i}]: {e}")))?;
                log::debug!("{file}: buffers[{i}] inline, {} bytes", data.bytes.len());
                return Ok(Some(data.bytes));
            }
            let companion = find_companion(files, uri)
                .ok_or_else(|| LoadError::missing(file, format!("buffer file '{uri}'")))?;
            log::debug!("{file}: buffers[{i}] from {}, {} bytes", companion.name, companion.bytes.len());
            Ok(Some(companion.bytes.clone()))
        })
        .collect()
}

fn chunked<const N: usize>(values: &[f32]) -> Vec<[f32; N]> {
    values
        .chunks_exact(N)
        .map(|c| std::array::from_fn(|i| c[i]))
        .collect()
}

/// Read an attribute, checking its element shape and that it covers every
/// vertex.
fn read_attribute(
    doc: &Document,
    buffers: &[Option<Vec<u8>>],
    primitive: &Primitive,
    semantic: &str,
    shapes: &[ElementShape],
    vertex_count: Option<usize>,
) -> Result<Option<(ElementShape, AccessorData)>, String> {
    let Some(index) = primitive.attribute(semantic) else {
        return Ok(None);
    };
    let accessor = schema::lookup(&doc.accessors, index, "accessors")?;
    if !shapes.contains(&accessor.shape) {
        return Err(format!(
            "{semantic} accessors[{index}] has shape {:?}, expected one of {shapes:?}",
            accessor.shape
        ));
    }
    if let Some(n) = vertex_count
        && accessor.count < n
    {
        return Err(format!(
            "{semantic} accessors[{index}] has {} elements for {n} vertices",
            accessor.count
        ));
    }
    Ok(Some((accessor.shape, read_accessor(doc, buffers, index)?)))
}

fn extract_primitive(
    doc: &Document,
    buffers: &[Option<Vec<u8>>],
    primitive: &Primitive,
) -> Result<Option<PrimitiveData>, String> {
    use ElementShape::{Vec2, Vec3, Vec4};

    let Some((_, positions)) = read_attribute(doc, buffers, primitive, "POSITION", &[Vec3], None)? else {
        return Ok(None);
    };
    let positions: Vec<[f32; 3]> = chunked(&positions.to_f32());
    let n = positions.len();

    let normals = read_attribute(doc, buffers, primitive, "NORMAL", &[Vec3], Some(n))?
        .map(|(_, data)| chunked::<3>(&data.to_f32()));

    let colors = read_attribute(doc, buffers, primitive, "COLOR_0", &[Vec3, Vec4], Some(n))?
        .map(|(shape, data)| {
            let values = data.to_unit_f32();
            match shape {
                Vec3 => VertexColors::Rgb(chunked(&values)),
                _ => VertexColors::Rgba(chunked(&values)),
            }
        });

    let uvs = read_attribute(doc, buffers, primitive, "TEXCOORD_0", &[Vec2], Some(n))?
        .map(|(_, data)| chunked::<2>(&data.to_unit_f32()));

    let indices = match primitive.indices {
        Some(index) => {
            let indices = read_accessor(doc, buffers, index)?.to_u32();
            if let Some(bad) = indices.iter().find(|&&i| i as usize >= n) {
                return Err(format!(
                    "indices accessors[{index}] references vertex {bad} of {n}"
                ));
            }
            indices
        }
        None => (0..n as u32).collect(),
    };

    let material = material::resolve_material(doc, primitive.material)?;

    Ok(Some(PrimitiveData {
        positions,
        normals,
        colors,
        uvs,
        indices,
        material,
    }))
}

fn extract_primitives(
    doc: &Document,
    buffers: &[Option<Vec<u8>>],
    file: &str,
) -> Result<Vec<PrimitiveData>, LoadError> {
    let mut out = Vec::new();
    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, primitive) in mesh.primitives.iter().enumerate() {
            let extracted = extract_primitive(doc, buffers, primitive)
                .map_err(|reason| LoadError::format(file, format!("meshes[{m}].primitives[{p}]: {reason}")))?;
            match extracted {
                Some(data) => {
                    log::debug!(
                        "{file}: mesh {m} {:?} primitive {p}: {} vertices, {} indices, attributes {:?}",
                        mesh.name,
                        data.positions.len(),
                        data.indices.len(),
                        primitive.attributes.keys().collect::<Vec<_>>()
                    );
                    out.push(data);
                }
                None => log::debug!("{file}: mesh {m} primitive {p} has no POSITION, skipped"),
            }
        }
    }
    if out.is_empty() {
        return Err(LoadError::format(file, "no primitive has a POSITION attribute"));
    }
    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn single_triangle_glb() {
        let scene = parse(&[triangle_glb()]).unwrap();
        assert_eq!(scene.name, "model.glb");
        assert_eq!(scene.primitives.len(), 1);
        let prim = &scene.primitives[0];
        assert_eq!(prim.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(prim.indices, vec![0, 1, 2], "indices synthesised");
        assert!(prim.normals.is_none());
        assert_eq!(prim.material, MaterialInfo::default());
    }

    #[test]
    fn explicit_indices_are_read() {
        let quad = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let scene = parse(&[glb_with(&quad, Some(&[0, 1, 2, 0, 2, 3]), None)]).unwrap();
        assert_eq!(scene.primitives[0].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn out_of_range_index_is_a_format_error() {
        let tri = [[0.0; 3]; 3];
        let err = parse(&[glb_with(&tri, Some(&[0, 1, 7]), None)]).unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
        assert!(err.to_string().contains("vertex 7"), "got {err}");
    }

    #[test]
    fn material_without_factors_gets_defaults() {
        let tri = [[0.0; 3]; 3];
        let scene = parse(&[glb_with(&tri, None, Some(r#"{ "pbrMetallicRoughness": {} }"#))]).unwrap();
        let m = &scene.primitives[0].material;
        assert_eq!((m.metallic_factor, m.roughness_factor), (0.0, 0.8));
    }

    #[test]
    fn gltf_with_external_buffer_and_u8_colors() {
        let mut bin = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        bin.extend([255, 0, 0, 255, 0, 255, 0, 128, 0, 0, 255, 0]);
        let json = format!(
            r#"{{ "buffers": [{{ "uri": "data/Tri.bin", "byteLength": {} }}],
                 "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}, {{ "buffer": 0, "byteOffset": 36, "byteLength": 12 }}],
                 "accessors": [
                    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }},
                    {{ "bufferView": 1, "componentType": 5121, "count": 3, "type": "VEC4" }}
                 ],
                 "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0, "COLOR_0": 1 }} }}] }}] }}"#,
            bin.len()
        );
        let files = [
            NamedFile::new("tri.gltf", json.into_bytes()),
            NamedFile::new("tri.BIN", bin),
        ];
        let scene = parse(&files).unwrap();
        let colors = scene.primitives[0].colors.as_ref().unwrap();
        assert_eq!(colors.rgba(0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(colors.rgba(2), [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_external_buffer_is_missing_resource() {
        let json = r#"{ "buffers": [{ "uri": "scene.bin", "byteLength": 4 }],
                        "meshes": [] }"#;
        let err = parse(&[NamedFile::new("scene.gltf", json.as_bytes().to_vec())]).unwrap_err();
        assert!(matches!(err, LoadError::MissingResource { .. }), "got {err:?}");
        assert!(err.to_string().contains("scene.bin"));
    }

    #[test]
    fn inline_base64_buffer() {
        let bin = f32_bytes(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        let json = format!(
            r#"{{ "buffers": [{{ "uri": "data:application/octet-stream;base64,{}", "byteLength": 36 }}],
                 "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
                 "accessors": [{{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }}],
                 "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}] }}"#,
            STANDARD.encode(&bin)
        );
        let scene = parse(&[NamedFile::new("inline.gltf", json.into_bytes())]).unwrap();
        assert_eq!(scene.primitives[0].positions[1], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn no_positions_is_a_format_error() {
        let json = r#"{ "meshes": [{ "primitives": [{ "attributes": { "NORMAL": 0 } }] }] }"#;
        let err = parse(&[NamedFile::new("x.gltf", json.as_bytes().to_vec())]).unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
        assert!(err.to_string().contains("POSITION"));
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        let err = parse(&[NamedFile::new("x.gltf", b"{ nope".to_vec())]).unwrap_err();
        assert!(err.to_string().starts_with("x.gltf: invalid glTF JSON"), "got {err}");
    }

    #[test]
    fn absurd_placeholder_count_is_a_format_error() {
        let json = r#"{
            "accessors": [{ "componentType": 5126, "count": 6148914691236517206, "type": "VEC3" }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }]
        }"#;
        let err = parse(&[NamedFile::new("a.gltf", json.as_bytes().to_vec())]).unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }), "got {err:?}");
        assert!(err.to_string().contains("accessors[0]"), "got {err}");
    }

    #[test]
    fn short_attribute_is_rejected() {
        let json = r#"{
            "accessors": [
                { "componentType": 5126, "count": 3, "type": "VEC3" },
                { "componentType": 5126, "count": 2, "type": "VEC3" }
            ],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 } }] }]
        }"#;
        let err = parse(&[NamedFile::new("x.gltf", json.as_bytes().to_vec())]).unwrap_err();
        assert!(err.to_string().contains("2 elements for 3 vertices"), "got {err}");
    }
}
