//! # Mesh — Unified Renderable Geometry
//!
//! Folds every parsed primitive into one vertex list with three index views:
//!
//! - **triangles**: flat triangle-list indices for the shaded passes
//! - **edges**: each undirected edge exactly once, for the wireframe pass
//! - **normal segments**: generated on demand for the normal overlay
//!
//! ## Edge Deduplication
//!
//! Two triangles sharing an edge visit it in opposite directions (`a→b` and
//! `b→a`). Keying the set by `(min, max)` makes both visits land on the same
//! entry, so the wireframe draws each line once regardless of winding.
//!
//! ## Recentering
//!
//! After all primitives are merged, the bounding box center is subtracted
//! from every vertex. The model then pivots on its geometric center no matter
//! where the asset's authored origin was, and `center` is always the origin.
//!
//! ## Per-Primitive Color
//!
//! There is one vertex-color pipeline and one material uniform, but scenes
//! often have a material per primitive. When a primitive has no `COLOR_0`,
//! its material's base color factor is baked into its vertices instead.
//!
//! ## Comparison
//!
//! - **three.js**: `EdgesGeometry` / `WireframeGeometry` derive line segments
//!   from a `BufferGeometry`, keeping a geometry per material.
//! - **Bevy**: one `Mesh` per primitive, each with its own material handle.
//! - **Our approach**: a single merged mesh; only the first primitive's
//!   textures are bound.

use std::collections::BTreeSet;

use crate::asset::{DecodedImage, SceneDescription};
use crate::error::LoadError;
use crate::math::{Aabb, Vec3};
use crate::render::vertex::Vertex;

/// Normal used when a primitive has no `NORMAL` attribute.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Scalar material parameters bound for the whole mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub unlit: bool,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: crate::asset::material::DEFAULT_METALLIC,
            roughness_factor: crate::asset::material::DEFAULT_ROUGHNESS,
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            unlit: false,
        }
    }
}

/// Decoded texture maps bound for the whole mesh. Absent maps use the
/// renderer's neutral defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTextures {
    pub base_color: Option<DecodedImage>,
    pub metallic_roughness: Option<DecodedImage>,
    pub normal: Option<DecodedImage>,
    pub occlusion: Option<DecodedImage>,
}

/// Counts shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshStats {
    pub vertices: usize,
    pub edges: usize,
    pub triangles: usize,
}

/// The merged, recentered mesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Undirected edges, `first < second`, sorted.
    pub edges: Vec<[u32; 2]>,
    /// Triangle-list indices into `vertices`.
    pub triangles: Vec<u32>,
    /// Bounding box after recentering.
    pub bounds: Aabb,
    /// Always the origin once built.
    pub center: Vec3,
    /// Half the bounding box diagonal.
    pub radius: f32,
    pub has_normals: bool,
    pub has_uvs: bool,
    pub has_vertex_colors: bool,
    pub material: SurfaceMaterial,
    pub textures: MaterialTextures,
}

impl Mesh {
    /// Merge a parsed scene into one mesh.
    ///
    /// Fails with [`LoadError::EmptyGeometry`] if no primitive contributes a
    /// vertex.
    pub fn build(scene: SceneDescription) -> Result<Self, LoadError> {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        let mut edges = BTreeSet::new();
        let mut has_normals = false;
        let mut has_uvs = false;
        let mut has_vertex_colors = false;

        for primitive in &scene.primitives {
            let offset = vertices.len() as u32;
            let material_color = primitive.material.base_color_factor;

            for (i, &position) in primitive.positions.iter().enumerate() {
                vertices.push(Vertex {
                    position,
                    normal: primitive
                        .normals
                        .as_ref()
                        .map_or(DEFAULT_NORMAL, |n| n[i]),
                    color: primitive
                        .colors
                        .as_ref()
                        .map_or(material_color, |c| c.rgba(i)),
                    uv: primitive.uvs.as_ref().map_or([0.0, 0.0], |uv| uv[i]),
                });
            }
            has_normals |= primitive.normals.is_some();
            has_uvs |= primitive.uvs.is_some();
            has_vertex_colors |= primitive.colors.is_some();

            for tri in primitive.indices.chunks_exact(3) {
                let [a, b, c] = [tri[0] + offset, tri[1] + offset, tri[2] + offset];
                triangles.extend([a, b, c]);
                insert_edge(&mut edges, a, b);
                insert_edge(&mut edges, b, c);
                insert_edge(&mut edges, c, a);
            }
        }

        if vertices.is_empty() {
            return Err(LoadError::EmptyGeometry { file: scene.name });
        }

        let source_bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position)));
        let center = source_bounds.center();
        for v in &mut vertices {
            v.position = (Vec3::from(v.position) - center).to_array();
        }
        let bounds = source_bounds.translated(-center);

        let (material, textures) = first_material(scene);

        let mesh = Self {
            vertices,
            edges: edges.into_iter().map(|(a, b)| [a, b]).collect(),
            triangles,
            bounds,
            center: Vec3::ZERO,
            radius: source_bounds.bounding_radius(),
            has_normals,
            has_uvs,
            has_vertex_colors,
            material,
            textures,
        };
        log::info!(
            "mesh built: {} vertices, {} edges, {} triangles, radius {:.3}, normals={}, uvs={}",
            mesh.vertices.len(),
            mesh.edges.len(),
            mesh.triangles.len() / 3,
            mesh.radius,
            mesh.has_normals,
            mesh.has_uvs,
        );
        Ok(mesh)
    }

    pub fn stats(&self) -> MeshStats {
        MeshStats {
            vertices: self.vertices.len(),
            edges: self.edges.len(),
            triangles: self.triangles.len() / 3,
        }
    }

    /// Flattened edge list for a line-list index buffer.
    pub fn edge_indices(&self) -> Vec<u32> {
        self.edges.iter().flatten().copied().collect()
    }

    /// Two-point line segments from each vertex along its normal, `length`
    /// world units long. Empty when the asset supplied no normals.
    pub fn normal_segments(&self, length: f32) -> Vec<Vertex> {
        if !self.has_normals {
            return Vec::new();
        }
        self.vertices
            .iter()
            .flat_map(|v| {
                let tip = Vec3::from(v.position) + Vec3::from(v.normal) * length;
                let base = Vertex {
                    color: [1.0; 4],
                    uv: [0.0; 2],
                    ..*v
                };
                [
                    base,
                    Vertex {
                        position: tip.to_array(),
                        ..base
                    },
                ]
            })
            .collect()
    }
}

fn insert_edge(edges: &mut BTreeSet<(u32, u32)>, a: u32, b: u32) {
    edges.insert((a.min(b), a.max(b)));
}

/// Scalar factors and texture maps of the first primitive's material.
fn first_material(scene: SceneDescription) -> (SurfaceMaterial, MaterialTextures) {
    let SceneDescription {
        primitives, images, ..
    } = scene;
    let Some(first) = primitives.into_iter().next() else {
        return Default::default();
    };
    let m = first.material;
    // The same image may back several maps, so slots are cloned, not taken.
    let image_at = |index: Option<usize>| index.and_then(|i| images.get(i).cloned().flatten());

    let textures = MaterialTextures {
        base_color: image_at(m.base_color_texture),
        metallic_roughness: image_at(m.metallic_roughness_texture),
        normal: image_at(m.normal_texture),
        occlusion: image_at(m.occlusion_texture),
    };
    let material = SurfaceMaterial {
        base_color_factor: m.base_color_factor,
        metallic_factor: m.metallic_factor,
        roughness_factor: m.roughness_factor,
        normal_scale: m.normal_scale,
        occlusion_strength: m.occlusion_strength,
        unlit: m.unlit,
    };
    (material, textures)
}
