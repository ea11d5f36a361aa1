use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use wgpu::util::DeviceExt;

use super::common::{CameraParams, LightRig, MAX_DIRECTIONAL_LIGHTS};
use crate::obj::{Mesh, VERTEX_STRIDE};
use crate::showcase::ShowcaseFrame;

const SHADER: &str = include_str!("showcase.wgsl");
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Draws the showcase model over a transparent background, into either a
/// desktop window or a page canvas.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    scene: UniformSlot<SceneUniform>,
    model: UniformSlot<ModelUniform>,
    mesh: Option<GpuMesh>,
}

impl Renderer {
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(anyhow!("render target has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: backends(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance
            .create_surface(target)
            .context("failed to create render surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can draw to this surface")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("electras"),
                required_features: wgpu::Features::empty(),
                required_limits: limits(),
                experimental_features: Default::default(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: Default::default(),
            })
            .await
            .context("GPU device request was refused")?;

        let config = surface_config(&surface.get_capabilities(&adapter), size)?;
        surface.configure(&device, &config);

        let scene = UniformSlot::new(&device, "scene");
        let model = UniformSlot::new(&device, "model");
        let pipeline = build_pipeline(&device, config.format, &[&scene.layout, &model.layout]);

        log::info!(
            "renderer ready: {:?} {}x{} on {:?} ({:?})",
            config.format,
            config.width,
            config.height,
            adapter.get_info().backend,
            config.alpha_mode
        );
        Ok(Self {
            depth_view: depth_view(&device, size),
            surface,
            device,
            queue,
            config,
            pipeline,
            scene,
            model,
            mesh: None,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the surface; zero-area and unchanged sizes are ignored.
    pub fn resize(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 || size == self.size() {
            return;
        }
        (self.config.width, self.config.height) = size;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = depth_view(&self.device, size);
    }

    pub fn upload_mesh(&mut self, mesh: &Mesh) {
        self.mesh = Some(GpuMesh::upload(&self.device, mesh));
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn update_globals(&self, camera: &CameraParams, lights: &LightRig) {
        self.scene
            .write(&self.queue, &SceneUniform::new(camera, lights));
    }

    /// Clears to transparent, then draws the model if there is both a frame
    /// and an uploaded mesh.
    pub fn render(&mut self, frame: Option<&ShowcaseFrame>) -> Result<(), wgpu::SurfaceError> {
        let target = self.surface.get_current_texture()?;
        let color_view = target.texture.create_view(&Default::default());
        let drawable = frame.zip(self.mesh.as_ref());
        if let Some((frame, _)) = drawable {
            self.model.write(&self.queue, &ModelUniform::new(frame));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("showcase-frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("showcase"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some((_, mesh)) = drawable {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.scene.bind_group, &[]);
                pass.set_bind_group(1, &self.model.bind_group, &[]);
                mesh.draw(&mut pass);
            }
        }
        self.queue.submit([encoder.finish()]);
        target.present();
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.mesh = None;
        self.device.destroy();
    }
}

#[cfg(target_arch = "wasm32")]
fn backends() -> wgpu::Backends {
    wgpu::Backends::GL
}

#[cfg(not(target_arch = "wasm32"))]
fn backends() -> wgpu::Backends {
    wgpu::Backends::PRIMARY
}

#[cfg(target_arch = "wasm32")]
fn limits() -> wgpu::Limits {
    wgpu::Limits::downlevel_webgl2_defaults()
}

#[cfg(not(target_arch = "wasm32"))]
fn limits() -> wgpu::Limits {
    wgpu::Limits::downlevel_defaults()
}

/// sRGB format when offered; alpha is kept so page content shows through.
fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    (width, height): (u32, u32),
) -> Result<wgpu::SurfaceConfiguration> {
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
    let alpha_mode = [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ]
    .into_iter()
    .find(|mode| caps.alpha_modes.contains(mode))
    .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: wgpu::PresentMode::AutoVsync,
        desired_maximum_frame_latency: 2,
        alpha_mode,
        view_formats: Vec::new(),
    })
}

fn depth_view(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("showcase-depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&Default::default())
}

fn build_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("showcase.wgsl"),
        source: wgpu::ShaderSource::Wgsl(SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("showcase"),
        bind_group_layouts: layouts,
        push_constant_ranges: &[],
    });
    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: (VERTEX_STRIDE * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("showcase"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vertex_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout],
        },
        // OBJ winding is not reliable, so both faces are drawn.
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fragment_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

/// A uniform buffer with its own single-entry bind group.
struct UniformSlot<T> {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod> UniformSlot<T> {
    fn new(device: &wgpu::Device, name: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(name),
            contents: bytemuck::bytes_of(&T::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(name),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            buffer,
            layout,
            bind_group,
            _marker: std::marker::PhantomData,
        }
    }

    fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let init = |label, contents, usage| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        };
        Self {
            vertices: init(
                "showcase-vertices",
                bytemuck::cast_slice(&mesh.vertices),
                wgpu::BufferUsages::VERTEX,
            ),
            indices: init(
                "showcase-indices",
                bytemuck::cast_slice(&mesh.indices),
                wgpu::BufferUsages::INDEX,
            ),
            index_count: mesh.indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    ambient: [f32; 4],
    light_dirs: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    light_colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
}

impl SceneUniform {
    fn new(camera: &CameraParams, lights: &LightRig) -> Self {
        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            eye: camera.position.extend(1.0).to_array(),
            ambient: lights.ambient.extend(1.0).to_array(),
            light_dirs: lights
                .directional
                .map(|light| light.direction.extend(0.0).to_array()),
            light_colors: lights
                .directional
                .map(|light| (light.color * light.intensity).extend(light.intensity).to_array()),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ModelUniform {
    world: [[f32; 4]; 4],
    normal_world: [[f32; 4]; 4],
    tint: [f32; 4],
}

impl ModelUniform {
    fn new(frame: &ShowcaseFrame) -> Self {
        Self {
            world: frame.model.to_cols_array_2d(),
            normal_world: normal_matrix(frame.model).to_cols_array_2d(),
            tint: frame.color.extend(1.0).to_array(),
        }
    }
}

/// Inverse-transpose of the upper 3x3, widened back to a 4x4 for std140.
fn normal_matrix(world: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(world).inverse().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniform_sizes_match_the_shader() {
        assert_eq!(std::mem::size_of::<SceneUniform>(), 64 + 16 + 16 + 32 + 32);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 64 + 64 + 16);
        assert!(SHADER.contains(&format!("array<vec4<f32>, {MAX_DIRECTIONAL_LIGHTS}>")));
    }

    #[test]
    fn uniform_scaling_keeps_normals_pointing_out() {
        let world = Mat4::from_scale(Vec3::new(2.0, 0.5, 1.0));
        let n = normal_matrix(world).transform_vector3(Vec3::Y).normalize();
        assert!((n - Vec3::Y).length() < 1e-5);
        assert_eq!(normal_matrix(world).w_axis, glam::Vec4::W);
    }

    #[test]
    fn scene_uniform_packs_light_color_and_intensity() {
        let rig = LightRig::default();
        let camera = CameraParams {
            view_proj: Mat4::IDENTITY,
            position: Vec3::new(0.0, 0.0, 8.0),
        };
        let uniform = SceneUniform::new(&camera, &rig);
        assert_eq!(uniform.eye, [0.0, 0.0, 8.0, 1.0]);
        for (color, light) in uniform.light_colors.iter().zip(rig.directional) {
            assert_eq!(color[3], light.intensity);
        }
    }
}
