//! CPU-side model data produced by the resource loaders.
//!
//! Parsed assets stay GPU-free until the renderer first sees them, so the
//! loader, the scene graph and the animation binder can be exercised
//! without a device.

use std::sync::Arc;

use crate::data_structures::instance::Instance;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Base colour description of a mesh.
///
/// `base_color` is in linear space. The optional texture holds sRGB texels
/// and is multiplied with the factor in the fragment stage.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub base_color_texture: Option<Arc<image::RgbaImage>>,
}

impl Material {
    pub fn solid(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            base_color_texture: None,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::solid("default", [1.0, 1.0, 1.0, 1.0])
    }
}

/// One indexed triangle list.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Arc<Material>,
}

impl MeshData {
    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Fills in flat-ish normals by accumulating face normals per vertex.
    pub fn compute_normals(&mut self) {
        let mut acc = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let pa: cgmath::Vector3<f32> = self.vertices[a].position.into();
            let pb: cgmath::Vector3<f32> = self.vertices[b].position.into();
            let pc: cgmath::Vector3<f32> = self.vertices[c].position.into();
            let face = (pb - pa).cross(pc - pa);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        use cgmath::InnerSpace;
        for (vertex, n) in self.vertices.iter_mut().zip(acc) {
            if n.magnitude2() > 0.0 {
                vertex.normal = n.normalize().into();
            }
        }
    }
}

/// A parsed asset: the node hierarchy of its default scene.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub name: String,
    pub nodes: Vec<ModelNodeData>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelNodeData {
    pub name: String,
    pub transform: Instance,
    pub meshes: Vec<Arc<MeshData>>,
    pub children: Vec<ModelNodeData>,
}

impl ModelData {
    /// Number of nodes carrying at least one mesh.
    pub fn drawable_count(&self) -> usize {
        fn count(node: &ModelNodeData) -> usize {
            let own = usize::from(!node.meshes.is_empty());
            own + node.children.iter().map(count).sum::<usize>()
        }
        self.nodes.iter().map(count).sum()
    }
}
