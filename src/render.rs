//! wgpu implementation of the frame renderer.
//!
//! [`GpuRenderer`] walks the attached part of the scene graph every frame,
//! uploads geometry and materials the first time it sees them and draws a
//! shadow pass from the sun followed by the lit scene pass.

use std::{collections::HashMap, iter, sync::Arc};

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{Material, MeshData},
        scene_graph::NodeId,
        texture::Texture,
    },
    frame::Renderer,
    scene::SceneContext,
    viewport::RenderSurface,
};

struct GpuMesh {
    // Keeps the source alive so its address cannot be reused as a key.
    _source: Arc<MeshData>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
    material: usize,
}

struct GpuMaterial {
    _source: Arc<Material>,
    _buffer: wgpu::Buffer,
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

struct DrawItem {
    node: NodeId,
    meshes: Vec<Arc<MeshData>>,
    raw: InstanceRaw,
    cast_shadow: bool,
}

pub struct GpuRenderer {
    ctx: Context,
    meshes: HashMap<usize, GpuMesh>,
    materials: HashMap<usize, GpuMaterial>,
    instances: HashMap<NodeId, wgpu::Buffer>,
    is_surface_configured: bool,
}

impl GpuRenderer {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            instances: HashMap::new(),
            is_surface_configured: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn upload(&mut self, item: &DrawItem) {
        for mesh in &item.meshes {
            let material = self.upload_material(&mesh.material);
            let key = Arc::as_ptr(mesh) as usize;
            if self.meshes.contains_key(&key) {
                continue;
            }
            let device = &self.ctx.device;
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            self.meshes.insert(
                key,
                GpuMesh {
                    _source: mesh.clone(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: mesh.num_elements(),
                    material,
                },
            );
        }

        let buffer = self.instances.entry(item.node).or_insert_with(|| {
            self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Instance Buffer"),
                size: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        self.ctx
            .queue
            .write_buffer(buffer, 0, bytemuck::cast_slice(&[item.raw]));
    }

    fn upload_material(&mut self, material: &Arc<Material>) -> usize {
        let key = Arc::as_ptr(material) as usize;
        if self.materials.contains_key(&key) {
            return key;
        }
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Buffer"),
            contents: bytemuck::cast_slice(&[material.base_color]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let texture = match &material.base_color_texture {
            Some(image) => Texture::from_image(device, queue, image, Some(&material.name)),
            None => Texture::create_solid(device, queue, [255, 255, 255, 255], "white"),
        };
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.ctx.stage.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(&material.name),
        });
        self.materials.insert(
            key,
            GpuMaterial {
                _source: material.clone(),
                _buffer: buffer,
                _texture: texture,
                bind_group,
            },
        );
        key
    }

    fn reconfigure(&mut self) {
        let (width, height) = (self.ctx.config.width, self.ctx.config.height);
        self.ctx.configure(width, height);
    }
}

impl Renderer for GpuRenderer {
    fn draw(&mut self, scene: &SceneContext) -> anyhow::Result<()> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let mut items = Vec::new();
        scene.graph.visit_attached(&mut |id, node, world| {
            if node.is_drawable() {
                items.push(DrawItem {
                    node: id,
                    meshes: node.meshes.clone(),
                    raw: world.to_raw(node.receive_shadow),
                    cast_shadow: node.cast_shadow,
                });
            }
        });
        for item in &items {
            self.upload(item);
        }

        let stage = &mut self.ctx.stage;
        stage
            .camera
            .uniform
            .update_view_proj(&scene.camera, &scene.projection);
        self.ctx.queue.write_buffer(
            &stage.camera.buffer,
            0,
            bytemuck::cast_slice(&[stage.camera.uniform]),
        );
        stage.lighting.update(&self.ctx.queue, &scene.environment);
        stage.shadow.update(&self.ctx.queue, &stage.lighting.uniform);

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let stage = &self.ctx.stage;
        let shadows = scene.environment.sun.cast_shadow;
        {
            // Always cleared so receivers sample a valid map when nothing casts.
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &stage.shadow.map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            if shadows {
                shadow_pass.set_pipeline(&stage.shadow.pipeline);
                shadow_pass.set_bind_group(0, &stage.shadow.bind_group, &[]);
                for item in items.iter().filter(|item| item.cast_shadow) {
                    let Some(instance) = self.instances.get(&item.node) else {
                        continue;
                    };
                    shadow_pass.set_vertex_buffer(1, instance.slice(..));
                    for mesh in &item.meshes {
                        let Some(gpu) = self.meshes.get(&(Arc::as_ptr(mesh) as usize)) else {
                            continue;
                        };
                        shadow_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                        shadow_pass.set_index_buffer(
                            gpu.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        shadow_pass.draw_indexed(0..gpu.num_elements, 0, 0..1);
                    }
                }
            }
        }

        {
            let [r, g, b] = scene.environment.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&stage.scene_pipeline);
            render_pass.set_bind_group(0, &stage.camera.bind_group, &[]);
            render_pass.set_bind_group(1, &stage.lighting.bind_group, &[]);
            for item in &items {
                let Some(instance) = self.instances.get(&item.node) else {
                    continue;
                };
                render_pass.set_vertex_buffer(1, instance.slice(..));
                for mesh in &item.meshes {
                    let Some(gpu) = self.meshes.get(&(Arc::as_ptr(mesh) as usize)) else {
                        continue;
                    };
                    let Some(material) = self.materials.get(&gpu.material) else {
                        continue;
                    };
                    render_pass.set_bind_group(2, &material.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..gpu.num_elements, 0, 0..1);
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl RenderSurface for GpuRenderer {
    #[allow(unused_variables)]
    fn resize_surface(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        // The platform owns the swapchain extent on native targets.
        #[cfg(not(target_arch = "wasm32"))]
        let (width, height) = {
            let size = self.ctx.window.inner_size();
            (size.width, size.height)
        };

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowExtWebSys;

            if let Some(canvas) = self.ctx.window.canvas() {
                canvas.set_width(width);
                canvas.set_height(height);
                let style = canvas.style();
                let css_width = (width as f64 / pixel_ratio).round();
                let css_height = (height as f64 / pixel_ratio).round();
                if style.set_property("width", &format!("{css_width}px")).is_err()
                    || style.set_property("height", &format!("{css_height}px")).is_err()
                {
                    log::warn!("Could not set the canvas style size");
                }
            }
        }

        if width == 0 || height == 0 {
            self.is_surface_configured = false;
            return;
        }
        self.ctx.configure(width, height);
        self.is_surface_configured = true;
    }
}
