//! Space Intruders -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All simulation
//! runs inside `RedrawRequested` using a **fixed-timestep** model (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- consume fixed-dt slices: scene update + animation tick
//!   3. Rebuild the sprite mesh from the stage when any step ran
//!   4. Upload camera uniform, issue batched draw calls, composite egui overlay
//!
//! The scene lifecycle is driven in fixed order before the first frame:
//! `initialize` -> `load` (asset declarations) -> fetch declared textures ->
//! `build` (stage population). After that the scene only ever sees `update`,
//! once per fixed tick.

mod assets;
mod formation;
mod game;
mod layout;
mod scene;
#[cfg(test)]
mod scenario;
mod stage;

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{banded_strip_rgba, checkerboard_rgba, AssetManifest, SheetDecl};
use game::GameScene;
use scene::Scene;
use si_core::sheet::SheetGrid;
use si_core::time::TimeState;
use si_devtools::{DebugOverlay, OverlayStats};
use si_platform::window::PlatformConfig;
use si_render::{GpuContext, ScreenCamera, SpritePipeline, SpriteVertex, Texture};
use stage::Stage;

const FIXED_DT: f64 = 1.0 / 30.0;
const FIXED_DT_US: u64 = 33_333;
const PLACEHOLDER_IMAGE_SIZE: u32 = 64;
// Placeholder strips carry enough frames for every clip the scene declares.
const PLACEHOLDER_STRIP_FRAMES: u32 = 6;

/// A contiguous run of indices that share the same texture binding.
/// Draw calls are merged when consecutive quads use the same texture,
/// minimizing GPU bind-group switches during the render pass.
#[derive(Debug, Clone)]
struct DrawCall {
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
}

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
    /// Frame grid for sheet textures; `None` for plain images.
    sheet: Option<SheetGrid>,
}

/// All mutable engine state lives here. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface are
/// available.
///
/// Ownership is split into three conceptual groups:
///  - **Core systems** (time, camera) -- updated every frame
///  - **Content** (scene, stage, textures) -- fixed after startup; the stage
///    mutates under scene updates
///  - **GPU mesh state** (vertex/index/camera buffers, draw calls) -- rebuilt
///    whenever a fixed step ran
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    camera: ScreenCamera,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,

    scene: GameScene,
    stage: Stage,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,

    // The sprite mesh is rebuilt on the CPU after every simulated tick, then
    // streamed into these GPU buffers. Buffers grow (power-of-two) but never
    // shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    sprite_count: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, config: &PlatformConfig) -> Self {
        let gpu = GpuContext::new(window.clone());
        let time = TimeState::new(FIXED_DT);
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        // Layout math runs against the logical surface, not the physical
        // framebuffer, so hidpi scaling cannot move the grid.
        let camera = ScreenCamera::new(config.width, config.height);

        let mut scene = GameScene::new();
        scene.initialize();

        let mut manifest = AssetManifest::new();
        scene
            .load(&mut manifest)
            .unwrap_or_else(|err| panic!("Asset declaration failed: {err}"));
        let textures =
            fetch_declared_textures(&gpu.device, &gpu.queue, &sprite_pipeline, &manifest);

        let mut stage = Stage::new(config.width, config.height);
        scene
            .build(&mut stage)
            .unwrap_or_else(|err| panic!("Initial scene build failed: {err}"));
        log::info!(
            "Scene built: {} sprites, {} animated",
            stage.sprite_count(),
            stage.active_animation_count()
        );

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time,
            camera,
            sprite_pipeline,
            debug_overlay,
            scene,
            stage,
            textures,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
            sprite_count: 0,
        };

        state.ensure_mesh_capacity(4, 6);
        state.rebuild_scene_mesh();
        state
    }

    fn estimate_memory_mb(&self) -> f32 {
        let mut bytes: usize = 0;
        // Texture memory (width * height * 4 bytes per pixel)
        for tex in self.textures.values() {
            let (w, h) = tex.texture.size;
            bytes += (w as usize) * (h as usize) * 4;
        }
        // GPU buffer memory
        bytes += self.mesh_vertex_capacity * std::mem::size_of::<SpriteVertex>();
        bytes += self.mesh_index_capacity * std::mem::size_of::<u32>();
        bytes as f32 / (1024.0 * 1024.0)
    }

    fn rebuild_scene_mesh(&mut self) {
        let (vertices, indices, draw_calls) = self.build_mesh();
        self.ensure_mesh_capacity(vertices.len(), indices.len());
        self.sprite_count = vertices.len() / 4;
        self.draw_calls = draw_calls;

        if !vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        if !indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
        }
    }

    fn build_mesh(&self) -> (Vec<SpriteVertex>, Vec<u32>, Vec<DrawCall>) {
        const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

        let quad_estimate = self.stage.sprite_count() + 1;
        let mut vertices = Vec::with_capacity(quad_estimate * 4);
        let mut indices = Vec::with_capacity(quad_estimate * 6);
        let mut draw_calls = Vec::with_capacity(8);

        let (surface_w, surface_h) = self.stage.surface_size();
        let (surface_w, surface_h) = (surface_w as f32, surface_h as f32);

        // Background first so every sprite paints over it.
        if let Some(bg) = self.stage.background() {
            if let Some(entry) = self.textures.get(bg.texture.as_str()) {
                let (tex_w, tex_h) = entry.texture.size;
                // UVs beyond 1.0 wrap under the repeat sampler; each tile
                // covers tile_scale times its pixel size.
                let u1 = surface_w / (tex_w as f32 * bg.tile_scale);
                let v1 = surface_h / (tex_h as f32 * bg.tile_scale);
                let base_index = vertices.len() as u32;
                vertices.push(SpriteVertex {
                    position: [0.0, 0.0],
                    tex_coords: [0.0, 0.0],
                    color: WHITE,
                });
                vertices.push(SpriteVertex {
                    position: [surface_w, 0.0],
                    tex_coords: [u1, 0.0],
                    color: WHITE,
                });
                vertices.push(SpriteVertex {
                    position: [surface_w, surface_h],
                    tex_coords: [u1, v1],
                    color: WHITE,
                });
                vertices.push(SpriteVertex {
                    position: [0.0, surface_h],
                    tex_coords: [0.0, v1],
                    color: WHITE,
                });
                let draw_start = indices.len() as u32;
                indices.extend_from_slice(&[
                    base_index,
                    base_index + 1,
                    base_index + 2,
                    base_index,
                    base_index + 2,
                    base_index + 3,
                ]);
                push_draw_call(&mut draw_calls, Arc::from(bg.texture.as_str()), draw_start, 6);
            } else {
                log::warn!("Background references missing texture '{}'", bg.texture);
            }
        }

        // Sprites render in insertion order.
        for sprite in self.stage.sprites() {
            if !sprite.active {
                continue;
            }
            let Some(entry) = self.textures.get(sprite.texture.as_str()) else {
                log::warn!(
                    "Skipping sprite '{}' due to missing texture '{}'",
                    sprite.id,
                    sprite.texture
                );
                continue;
            };

            let (src_w, src_h, uv) = match &entry.sheet {
                Some(grid) => {
                    let Some(uv) = grid.frame_uv(sprite.sheet_frame) else {
                        log::warn!(
                            "Skipping sprite '{}': frame {} is outside sheet '{}'",
                            sprite.id,
                            sprite.sheet_frame,
                            sprite.texture
                        );
                        continue;
                    };
                    (grid.frame_width, grid.frame_height, uv)
                }
                None => (entry.texture.size.0, entry.texture.size.1, [0.0, 0.0, 1.0, 1.0]),
            };

            let half_w = src_w as f32 * sprite.scale * 0.5;
            let half_h = src_h as f32 * sprite.scale * 0.5;
            let [u0, v0, u1, v1] = uv;
            let base_index = vertices.len() as u32;

            // Center-origin quad in y-down screen space.
            vertices.push(SpriteVertex {
                position: [sprite.x - half_w, sprite.y - half_h],
                tex_coords: [u0, v0],
                color: WHITE,
            });
            vertices.push(SpriteVertex {
                position: [sprite.x + half_w, sprite.y - half_h],
                tex_coords: [u1, v0],
                color: WHITE,
            });
            vertices.push(SpriteVertex {
                position: [sprite.x + half_w, sprite.y + half_h],
                tex_coords: [u1, v1],
                color: WHITE,
            });
            vertices.push(SpriteVertex {
                position: [sprite.x - half_w, sprite.y + half_h],
                tex_coords: [u0, v1],
                color: WHITE,
            });

            let draw_start = indices.len() as u32;
            indices.extend_from_slice(&[
                base_index,
                base_index + 1,
                base_index + 2,
                base_index,
                base_index + 2,
                base_index + 3,
            ]);

            push_draw_call(
                &mut draw_calls,
                Arc::from(sprite.texture.as_str()),
                draw_start,
                6,
            );
        }

        (vertices, indices, draw_calls)
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = si_platform::window::create_window(event_loop, &self.config);
        self.state = Some(EngineState::new(window, &self.config));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    // The camera keeps the logical 800x600 projection; only
                    // the surface follows the physical size (hidpi changes).
                    state.gpu.resize(w, h);
                    log::info!("Surface resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if event.state == ElementState::Pressed && !event.repeat {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => {
                            log::info!("Escape pressed, exiting.");
                            event_loop.exit();
                        }
                        PhysicalKey::Code(KeyCode::F3) => {
                            state.debug_overlay.toggle();
                        }
                        _ => {}
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();
                while state.time.should_step() {
                    state.scene.update(&mut state.stage);
                    state.stage.step_animations(FIXED_DT_US);
                }
                state.time.end_frame();

                if state.time.steps_this_frame > 0 {
                    state.rebuild_scene_mesh();
                }

                // Render phase reads finalized simulation state from this frame.
                let camera_uniform = state.camera.build_uniform();
                state.gpu.queue.write_buffer(
                    &state.camera_buffer,
                    0,
                    bytemuck::cast_slice(&[camera_uniform]),
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let (egui_primitives, egui_textures_delta) = state.debug_overlay.prepare(
                    &state.window,
                    &state.time,
                    Some(OverlayStats {
                        draw_calls: state.draw_calls.len() as u32,
                        texture_binds: count_texture_binds(&state.draw_calls) as u32,
                        sprite_count: state.sprite_count as u32,
                        active_animations: state.stage.active_animation_count() as u32,
                        memory_estimate_mb: state.estimate_memory_mb(),
                        heading_label: state.scene.sweep.heading.label().to_string(),
                        descents: state.scene.sweep.descents,
                    }),
                );

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut last_bound_texture_key: Option<&Arc<str>> = None;
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                    render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(state.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    for draw in &state.draw_calls {
                        if let Some(texture) = state.textures.get(&draw.texture_key) {
                            let need_rebind = match last_bound_texture_key {
                                Some(last) => **last != *draw.texture_key,
                                None => true,
                            };
                            if need_rebind {
                                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                                last_bound_texture_key = Some(&draw.texture_key);
                            }
                            render_pass.draw_indexed(
                                draw.index_start..(draw.index_start + draw.index_count),
                                0,
                                0..1,
                            );
                        }
                    }
                }

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Stage Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Stage Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous. The stage emits sprites in insertion order, so
/// the 55 aliens sharing the strip texture collapse into one `draw_indexed`.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if *last.texture_key == *texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key,
        index_start,
        index_count,
    });
}

fn count_texture_binds(draw_calls: &[DrawCall]) -> usize {
    let mut binds = 0usize;
    let mut current: Option<&str> = None;
    for draw in draw_calls {
        let key: &str = &draw.texture_key;
        if current != Some(key) {
            current = Some(key);
            binds += 1;
        }
    }
    binds
}

fn fetch_declared_textures(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    manifest: &AssetManifest,
) -> HashMap<Arc<str>, GpuSpriteTexture> {
    let mut textures = HashMap::new();
    for decl in manifest.images() {
        let texture = load_image_texture(device, queue, &decl.path);
        let bind_group = pipeline.create_texture_bind_group(device, &texture);
        textures.insert(
            Arc::from(decl.key.as_str()),
            GpuSpriteTexture {
                texture,
                bind_group,
                sheet: None,
            },
        );
    }
    for decl in manifest.sheets() {
        let texture = load_sheet_texture(device, queue, decl);
        let (tex_w, tex_h) = texture.size;
        let grid = SheetGrid::new(tex_w, tex_h, decl.frame_width, decl.frame_height)
            .unwrap_or_else(|err| panic!("Sheet '{}' failed validation: {err}", decl.key));
        let bind_group = pipeline.create_texture_bind_group(device, &texture);
        textures.insert(
            Arc::from(decl.key.as_str()),
            GpuSpriteTexture {
                texture,
                bind_group,
                sheet: Some(grid),
            },
        );
    }
    textures
}

fn load_image_texture(device: &wgpu::Device, queue: &wgpu::Queue, path: &str) -> Texture {
    match std::fs::read(path) {
        Ok(bytes) => match Texture::from_bytes(device, queue, &bytes, path) {
            Ok(texture) => return texture,
            Err(err) => log::warn!("{}. Substituting checkerboard placeholder.", err),
        },
        Err(err) => log::warn!(
            "Failed to read texture '{}': {}. Substituting checkerboard placeholder.",
            path,
            err
        ),
    }
    let pixels = checkerboard_rgba(PLACEHOLDER_IMAGE_SIZE, PLACEHOLDER_IMAGE_SIZE);
    Texture::from_rgba8(
        device,
        queue,
        &pixels,
        PLACEHOLDER_IMAGE_SIZE,
        PLACEHOLDER_IMAGE_SIZE,
        path,
    )
}

fn load_sheet_texture(device: &wgpu::Device, queue: &wgpu::Queue, decl: &SheetDecl) -> Texture {
    match std::fs::read(&decl.path) {
        Ok(bytes) => match Texture::from_bytes(device, queue, &bytes, &decl.path) {
            Ok(texture) => return texture,
            Err(err) => log::warn!("{}. Substituting banded placeholder strip.", err),
        },
        Err(err) => log::warn!(
            "Failed to read sheet '{}': {}. Substituting banded placeholder strip.",
            decl.path,
            err
        ),
    }
    let pixels = banded_strip_rgba(decl.frame_width, decl.frame_height, PLACEHOLDER_STRIP_FRAMES);
    Texture::from_rgba8(
        device,
        queue,
        &pixels,
        decl.frame_width * PLACEHOLDER_STRIP_FRAMES,
        decl.frame_height,
        &decl.path,
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Space Intruders starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
