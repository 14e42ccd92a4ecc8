use wgpu::util::DeviceExt;

use crate::{data_structures::texture::Texture, scene::Environment};

/// Sun, hemisphere, fog and tone mapping parameters as seen by the shaders.
///
/// Scalars ride in the `w` lanes so every field stays 16-byte aligned.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    light_view_proj: [[f32; 4]; 4],
    // xyz position, w intensity
    sun_position: [f32; 4],
    // rgb colour, w shadow normal bias
    sun_color: [f32; 4],
    // rgb sky colour, w hemisphere intensity
    sky_color: [f32; 4],
    // rgb ground colour, w exposure
    ground_color: [f32; 4],
    fog_color: [f32; 4],
    // near, far, shadows enabled, shadow map size
    fog_range: [f32; 4],
}

impl LightUniform {
    pub fn new(environment: &Environment) -> Self {
        let sun = &environment.sun;
        let hemi = &environment.hemisphere;
        let fog = &environment.fog;
        Self {
            light_view_proj: sun.view_proj().into(),
            sun_position: [sun.position.x, sun.position.y, sun.position.z, sun.intensity],
            sun_color: [sun.color[0], sun.color[1], sun.color[2], sun.shadow.normal_bias],
            sky_color: [hemi.sky[0], hemi.sky[1], hemi.sky[2], hemi.intensity],
            ground_color: [hemi.ground[0], hemi.ground[1], hemi.ground[2], environment.exposure],
            fog_color: [fog.color[0], fog.color[1], fog.color[2], 1.0],
            fog_range: [
                fog.near,
                fog.far,
                if sun.cast_shadow { 1.0 } else { 0.0 },
                sun.shadow.map_size.max(1) as f32,
            ],
        }
    }
}

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    /// The bind group carries the uniform and the shadow map it is sampled with.
    pub fn new(device: &wgpu::Device, uniform: LightUniform, shadow_map: &Texture) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, shadow_map);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, environment: &Environment) {
        let uniform = LightUniform::new(environment);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            uniform_entry(0),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

/// Layout used by the shadow pass, which only needs the light transform.
pub fn mk_shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0)],
        label: Some("shadow_bind_group_layout"),
    })
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    shadow_map: &Texture,
) -> wgpu::BindGroup {
    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::TextureView(&shadow_map.view),
        },
    ];
    if let Some(sampler) = &shadow_map.sampler {
        entries.push(wgpu::BindGroupEntry {
            binding: 2,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &entries,
        label: Some("light_bind_group"),
    })
}
