//! Typed subset of the glTF 2.0 JSON document.
//!
//! Only the properties the inspector reads are modelled. Every optional
//! property is an `Option`, so "absent" is never confused with "equal to the
//! format's default". Material defaults depend on that distinction (see
//! [`material`](super::material)).
//!
//! Unknown properties are ignored by serde, so extensions and scene-graph
//! data (nodes, skins, animations) pass through without error.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::accessor::{ComponentType, ElementShape};

/// Root glTF document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub textures: Vec<Texture>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub uri: Option<String>,
    pub byte_length: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: Option<usize>,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    /// Absent for placeholder accessors, which decode to zeros.
    pub buffer_view: Option<usize>,
    pub byte_offset: Option<usize>,
    pub component_type: ComponentType,
    pub count: usize,
    #[serde(rename = "type")]
    pub shape: ElementShape,
}

#[derive(Debug, Deserialize)]
pub struct Mesh {
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Deserialize)]
pub struct Primitive {
    /// Semantic name (`POSITION`, `NORMAL`, `COLOR_0`, ...) to accessor index.
    #[serde(default)]
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
}

impl Primitive {
    pub fn attribute(&self, semantic: &str) -> Option<usize> {
        self.attributes.get(semantic).copied()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    pub base_color_factor: Option<[f32; 4]>,
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: Option<f32>,
    pub roughness_factor: Option<f32>,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TextureInfo {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NormalTextureInfo {
    pub index: usize,
    pub scale: Option<f32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OcclusionTextureInfo {
    pub index: usize,
    pub strength: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct Texture {
    /// Image index. Absent when the texture relies on an extension source.
    pub source: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub buffer_view: Option<usize>,
}

/// Bounds-checked lookup into one of the document's top-level arrays.
///
/// The error string names the array and index (`accessors[7]`) so it can be
/// wrapped straight into a format error.
pub fn lookup<'a, T>(items: &'a [T], index: usize, array: &str) -> Result<&'a T, String> {
    items
        .get(index)
        .ok_or_else(|| format!("{array}[{index}] out of range ({} defined)", items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_factors_stay_absent() {
        let doc: Document = serde_json::from_str(
            r#"{
                "materials": [{ "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }],
                "asset": { "version": "2.0" },
                "nodes": [{ "mesh": 0 }]
            }"#,
        )
        .unwrap();
        let pbr = doc.materials[0].pbr_metallic_roughness.as_ref().unwrap();
        assert!(pbr.metallic_factor.is_none());
        assert!(pbr.roughness_factor.is_none());
        assert!(pbr.base_color_factor.is_none());
        assert_eq!(pbr.base_color_texture.unwrap().index, 0);
    }

    #[test]
    fn accessor_enums_parse_from_json() {
        let doc: Document = serde_json::from_str(
            r#"{ "accessors": [{ "componentType": 5123, "count": 3, "type": "SCALAR" }] }"#,
        )
        .unwrap();
        let accessor = &doc.accessors[0];
        assert_eq!(accessor.component_type, ComponentType::U16);
        assert_eq!(accessor.shape, ElementShape::Scalar);
        assert!(accessor.buffer_view.is_none());
    }

    #[test]
    fn unknown_component_type_is_rejected() {
        let result: Result<Document, _> = serde_json::from_str(
            r#"{ "accessors": [{ "componentType": 9999, "count": 1, "type": "VEC3" }] }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn lookup_names_the_array() {
        let items = [1, 2];
        assert_eq!(lookup(&items, 1, "accessors"), Ok(&2));
        let err = lookup(&items, 7, "accessors").unwrap_err();
        assert!(err.starts_with("accessors[7]"), "got {err}");
    }

    #[test]
    fn unlit_extension_is_kept() {
        let doc: Document = serde_json::from_str(
            r#"{ "materials": [{ "extensions": { "KHR_materials_unlit": {} } }] }"#,
        )
        .unwrap();
        assert!(doc.materials[0].extensions.contains_key("KHR_materials_unlit"));
    }
}
