//! Material extraction with the inspector's compatibility defaults.
//!
//! glTF says an absent `metallicFactor` and `roughnessFactor` both mean 1.0.
//! Many exporters that know nothing about PBR omit them, and rendering those
//! assets as rough bare metal looks broken. An absent metallic factor is
//! therefore 0.0 and an absent roughness 0.8. Explicit values are always
//! honoured.

use super::schema::{Document, TextureInfo, lookup};

pub const DEFAULT_METALLIC: f32 = 0.0;
pub const DEFAULT_ROUGHNESS: f32 = 0.8;
/// Base color of a primitive that references no material.
pub const UNASSIGNED_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

const UNLIT_EXTENSION: &str = "KHR_materials_unlit";

/// Resolved material. Texture fields hold image indices, not texture indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<usize>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    /// G = roughness, B = metallic.
    pub metallic_roughness_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub normal_scale: f32,
    /// R = occlusion.
    pub occlusion_texture: Option<usize>,
    pub occlusion_strength: f32,
    pub unlit: bool,
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: UNASSIGNED_BASE_COLOR,
            base_color_texture: None,
            metallic_factor: DEFAULT_METALLIC,
            roughness_factor: DEFAULT_ROUGHNESS,
            metallic_roughness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            unlit: false,
        }
    }
}

impl MaterialInfo {
    /// Non-fatal oddities worth a warning when inspecting an asset.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.roughness_factor < 0.3 {
            out.push(format!(
                "low roughness ({}) may look oily",
                self.roughness_factor
            ));
        }
        if self.metallic_factor > 0.5 && self.metallic_roughness_texture.is_none() {
            out.push(format!(
                "high metallic ({}) without a metallic-roughness texture",
                self.metallic_factor
            ));
        }
        out
    }
}

/// Map a texture reference to its image index. Dangling texture indices and
/// textures without a `source` resolve to no image.
fn image_of(doc: &Document, texture: usize) -> Option<usize> {
    doc.textures.get(texture).and_then(|t| t.source)
}

fn image_of_info(doc: &Document, info: Option<&TextureInfo>) -> Option<usize> {
    info.and_then(|info| image_of(doc, info.index))
}

/// Resolve the material a primitive references.
///
/// `None`, or a document with no materials at all, yields the mid-gray
/// [`MaterialInfo::default`]. An index past the end of a non-empty material
/// list is a format error.
pub fn resolve_material(doc: &Document, index: Option<usize>) -> Result<MaterialInfo, String> {
    let Some(index) = index.filter(|_| !doc.materials.is_empty()) else {
        log::debug!("primitive has no material, using defaults");
        return Ok(MaterialInfo::default());
    };
    let material = lookup(&doc.materials, index, "materials")?;
    let pbr = material.pbr_metallic_roughness.as_ref();

    let metallic = pbr.and_then(|p| p.metallic_factor);
    let roughness = pbr.and_then(|p| p.roughness_factor);

    let base_color_texture = image_of_info(doc, pbr.and_then(|p| p.base_color_texture.as_ref()))
        .or_else(|| image_of_info(doc, material.emissive_texture.as_ref()));

    let info = MaterialInfo {
        name: material.name.clone(),
        base_color_factor: pbr
            .and_then(|p| p.base_color_factor)
            .unwrap_or([1.0, 1.0, 1.0, 1.0]),
        base_color_texture,
        metallic_factor: metallic.unwrap_or(DEFAULT_METALLIC),
        roughness_factor: roughness.unwrap_or(DEFAULT_ROUGHNESS),
        metallic_roughness_texture: image_of_info(
            doc,
            pbr.and_then(|p| p.metallic_roughness_texture.as_ref()),
        ),
        normal_texture: material
            .normal_texture
            .and_then(|n| image_of(doc, n.index)),
        normal_scale: material
            .normal_texture
            .and_then(|n| n.scale)
            .unwrap_or(1.0),
        occlusion_texture: material
            .occlusion_texture
            .and_then(|o| image_of(doc, o.index)),
        occlusion_strength: material
            .occlusion_texture
            .and_then(|o| o.strength)
            .unwrap_or(1.0),
        unlit: material.extensions.contains_key(UNLIT_EXTENSION),
    };

    log::debug!(
        "material {index} {:?}: metallic {} ({}), roughness {} ({}), textures base={:?} mr={:?} normal={:?} ao={:?}, unlit={}",
        info.name,
        info.metallic_factor,
        if metallic.is_some() { "asset" } else { "default" },
        info.roughness_factor,
        if roughness.is_some() { "asset" } else { "default" },
        info.base_color_texture,
        info.metallic_roughness_texture,
        info.normal_texture,
        info.occlusion_texture,
        info.unlit,
    );
    for warning in info.warnings() {
        log::warn!("material {index}: {warning}");
    }

    Ok(info)
}
