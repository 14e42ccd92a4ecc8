use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    sync::Arc,
};

use anyhow::{Context as _, anyhow, bail};

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, MeshData, ModelData, ModelNodeData, ModelVertex},
    },
    loader::{ModelFuture, ModelSource},
    resources::io::{is_data_uri, load_binary, load_string, resolve},
};

/**
 * This module contains all logic for loading meshes, materials and node
 * hierarchies from external files into CPU-side [`ModelData`].
 */
pub mod io;

/// Loads models relative to an asset root, picking the parser by extension.
#[derive(Debug, Clone)]
pub struct FileModelSource {
    root: String,
}

impl FileModelSource {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
        }
    }
}

impl ModelSource for FileModelSource {
    fn load(&self, location: &str) -> ModelFuture {
        let root = self.root.clone();
        let location = location.to_string();
        Box::pin(async move {
            let path = location.split(['?', '#']).next().unwrap_or_default();
            if path.to_ascii_lowercase().ends_with(".obj") {
                load_model_obj(&root, &location).await
            } else {
                load_model_gltf(&root, &location).await
            }
        })
    }
}

fn model_name(location: &str) -> String {
    location
        .split(['?', '#'])
        .next()
        .and_then(|p| p.trim_end_matches('/').rsplit('/').next())
        .unwrap_or(location)
        .to_string()
}

pub async fn load_model_obj(root: &str, location: &str) -> anyhow::Result<ModelData> {
    let obj_text = load_string(root, location).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let root = root.to_string();
            let mtl = resolve(location, &p);
            async move {
                let Ok(mtl) = mtl else {
                    return Err(tobj::LoadError::OpenFileFailed);
                };
                match load_string(&root, &mtl).await {
                    Ok(text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(text))),
                    Err(e) => {
                        log::warn!("Material library {} could not be loaded: {:#}", mtl, e);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await
    .with_context(|| format!("Could not parse {location}"))?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("{} has no usable materials: {}", location, e);
        Vec::new()
    });
    let mut materials = Vec::with_capacity(obj_materials.len());
    for m in obj_materials {
        let diffuse = m.diffuse.unwrap_or([1.0; 3]);
        let alpha = m.dissolve.unwrap_or(1.0);
        let base_color_texture = match &m.diffuse_texture {
            Some(texture) => {
                let bytes = load_binary(root, &resolve(location, texture)?).await?;
                Some(Arc::new(decode_image(&bytes, texture)?))
            }
            None => None,
        };
        materials.push(Arc::new(Material {
            name: m.name,
            base_color: [diffuse[0], diffuse[1], diffuse[2], alpha],
            base_color_texture,
        }));
    }
    let default_material = Arc::new(Material::default());

    let children = models
        .into_iter()
        .map(|m| {
            let mut mesh = MeshData {
                name: m.name.clone(),
                vertices: (0..m.mesh.positions.len() / 3)
                    .map(|i| ModelVertex {
                        position: [
                            m.mesh.positions[i * 3],
                            m.mesh.positions[i * 3 + 1],
                            m.mesh.positions[i * 3 + 2],
                        ],
                        tex_coords: [
                            m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                            1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                        ],
                        normal: [
                            m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                            m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                            m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                        ],
                    })
                    .collect(),
                indices: m.mesh.indices.clone(),
                material: m
                    .mesh
                    .material_id
                    .and_then(|id| materials.get(id).cloned())
                    .unwrap_or_else(|| default_material.clone()),
            };
            if m.mesh.normals.is_empty() {
                mesh.compute_normals();
            }
            ModelNodeData {
                name: m.name,
                transform: Instance::new(),
                meshes: vec![Arc::new(mesh)],
                children: Vec::new(),
            }
        })
        .collect();

    let name = model_name(location);
    Ok(ModelData {
        nodes: vec![ModelNodeData {
            name: name.clone(),
            transform: Instance::new(),
            meshes: Vec::new(),
            children,
        }],
        name,
    })
}

pub async fn load_model_gltf(root: &str, location: &str) -> anyhow::Result<ModelData> {
    let bytes = load_binary(root, location).await?;
    let gltf =
        gltf::Gltf::from_slice(&bytes).with_context(|| format!("Could not parse {location}"))?;
    let name = model_name(location);

    let embedded = references(&gltf.document)
        .iter()
        .filter(|uri| is_data_uri(uri))
        .count();
    if embedded > 0 {
        if embedded != references(&gltf.document).len() {
            bail!("{location} mixes embedded data URIs with external files");
        }
        return model_from_slice(&name, &bytes);
    }

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("{location} references a missing binary chunk"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(root, &resolve(location, uri)?).await?);
            }
        }
    }

    // Load images
    let mut images = Vec::new();
    for image in gltf.images() {
        let decoded = match image.source() {
            gltf::image::Source::View { view, .. } => {
                let buffer = buffer_data
                    .get(view.buffer().index())
                    .ok_or_else(|| anyhow!("Image {} points at a missing buffer", image.index()))?;
                let bytes = buffer
                    .get(view.offset()..view.offset() + view.length())
                    .ok_or_else(|| anyhow!("Image {} view is out of bounds", image.index()))?;
                decode_image(bytes, location)?
            }
            gltf::image::Source::Uri { uri, .. } => {
                let bytes = load_binary(root, &resolve(location, uri)?).await?;
                decode_image(&bytes, uri)?
            }
        };
        images.push(Arc::new(decoded));
    }

    build_model(&name, &gltf.document, &buffer_data, &images)
}

/// Parses a self-contained glTF (GLB or data URIs only).
pub fn model_from_slice(name: &str, bytes: &[u8]) -> anyhow::Result<ModelData> {
    let (document, buffers, images) =
        gltf::import_slice(bytes).with_context(|| format!("Could not import {name}"))?;
    let buffers: Vec<Vec<u8>> = buffers.into_iter().map(|b| b.0).collect();
    let images: Vec<Arc<image::RgbaImage>> = images
        .into_iter()
        .map(|img| to_rgba(img).map(Arc::new))
        .collect::<anyhow::Result<_>>()?;
    build_model(name, &document, &buffers, &images)
}

fn references(document: &gltf::Document) -> Vec<String> {
    let buffers = document.buffers().filter_map(|b| match b.source() {
        gltf::buffer::Source::Uri(uri) => Some(uri.to_string()),
        gltf::buffer::Source::Bin => None,
    });
    let images = document.images().filter_map(|i| match i.source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => None,
    });
    buffers.chain(images).collect()
}

fn decode_image(bytes: &[u8], label: &str) -> anyhow::Result<image::RgbaImage> {
    Ok(image::load_from_memory(bytes)
        .with_context(|| format!("Could not decode image {label}"))?
        .to_rgba8())
}

fn to_rgba(data: gltf::image::Data) -> anyhow::Result<image::RgbaImage> {
    use gltf::image::Format;
    let pixels: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels,
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|p| [*p, *p, *p, 255]).collect(),
        other => bail!("Unsupported texture format {:?}", other),
    };
    image::RgbaImage::from_raw(data.width, data.height, pixels).ok_or_else(|| {
        anyhow!(
            "Texture data does not match its {}x{} size",
            data.width,
            data.height
        )
    })
}

fn build_model(
    name: &str,
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    images: &[Arc<image::RgbaImage>],
) -> anyhow::Result<ModelData> {
    // Load materials
    let materials: Vec<Arc<Material>> = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let base_color_texture = pbr
                .base_color_texture()
                .and_then(|info| images.get(info.texture().source().index()).cloned());
            Arc::new(Material {
                name: material.name().unwrap_or("material").to_string(),
                base_color: pbr.base_color_factor(),
                base_color_texture,
            })
        })
        .collect();
    let default_material = Arc::new(Material::default());

    let mut meshes: HashMap<usize, Vec<Arc<MeshData>>> = HashMap::new();
    for mesh in document.meshes() {
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping {:?} primitive of mesh {:?} in {}",
                    primitive.mode(),
                    mesh.name(),
                    name
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                log::warn!("Primitive of mesh {:?} in {} has no positions", mesh.name(), name);
                continue;
            };
            let mut vertices: Vec<ModelVertex> = positions
                .map(|position| ModelVertex {
                    position,
                    ..Default::default()
                })
                .collect();
            let has_normals = match reader.read_normals() {
                Some(normals) => {
                    vertices
                        .iter_mut()
                        .zip(normals)
                        .for_each(|(v, n)| v.normal = n);
                    true
                }
                None => false,
            };
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                vertices
                    .iter_mut()
                    .zip(tex_coords)
                    .for_each(|(v, t)| v.tex_coords = t);
            }
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            let mut data = MeshData {
                name: mesh.name().unwrap_or("mesh").to_string(),
                vertices,
                indices,
                material: primitive
                    .material()
                    .index()
                    .and_then(|idx| materials.get(idx).cloned())
                    .unwrap_or_else(|| default_material.clone()),
            };
            if !has_normals {
                data.compute_normals();
            }
            primitives.push(Arc::new(data));
        }
        meshes.insert(mesh.index(), primitives);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| anyhow!("{name} contains no scene"))?;
    Ok(ModelData {
        name: name.to_string(),
        nodes: scene.nodes().map(|node| to_node_data(node, &meshes)).collect(),
    })
}

fn to_node_data(node: gltf::Node, meshes: &HashMap<usize, Vec<Arc<MeshData>>>) -> ModelNodeData {
    ModelNodeData {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index())),
        transform: node.transform().into(),
        meshes: node
            .mesh()
            .and_then(|mesh| meshes.get(&mesh.index()).cloned())
            .unwrap_or_default(),
        children: node.children().map(|child| to_node_data(child, meshes)).collect(),
    }
}
