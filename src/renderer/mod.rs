//! Rendering System
//!
//! This module handles all GPU rendering operations using a layered architecture:
//!
//! - **[`core`]**: wgpu context wrapper (Device, Queue, Surface, ResourceManager)
//! - **[`rg`]** / **[`render_core`]**: the render graph core (record-then-compile
//!   DAG, barrier synthesis, transient aliasing) and the Scene Render
//!   Orchestrator/Shadow-Map Allocator facade driving it
//! - **[`pipeline`]**: Shader compilation and pipeline caching (L1/L2 cache strategy)
//!
//! # Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                   RenderCore                    │
//! │   Orchestrator → RenderGraphBuilder → Compiler  │
//! ├───────────────────────────────────────────────┤
//! │   PipelineCache    │    ResourceManager        │
//! │  (Shader/PSO cache) │  (GPU resource lifecycle) │
//! ├───────────────────────────────────────────────┤
//! │                   WgpuContext                   │
//! │            (Device, Queue, Surface)             │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Rendering Pipeline
//!
//! Each frame goes through these phases:
//!
//! 1. **Extract**: Scene data is extracted into GPU-friendly format
//! 2. **Record**: The Orchestrator drives registered systems, which record
//!    nodes into the frame's `RenderGraphBuilder`
//! 3. **Compile**: The recorded graph is scheduled, barrier-annotated, and
//!    given transient aliasing
//! 4. **Submit**: The compiled graph's node closures run against a real
//!    `wgpu::CommandEncoder` and are submitted to the GPU queue
//!
//! # Example
//!
//! ```rust,ignore
//! renderer.render_frame(scene, &camera, &assets, time);
//! ```

pub mod config;
pub mod core;
pub mod frame_ctx;
pub mod graph;
pub mod jobs;
pub mod orchestrator;
pub mod pipeline;
pub mod render_core;
pub mod rg;
pub mod settings;
pub mod shadow;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::renderer::core::binding::GlobalBindGroupCache;
use crate::assets::AssetServer;
use crate::errors::{NyxError, Result};
use crate::renderer::frame_ctx::FrameContext;
use crate::renderer::graph::context::FrameResources;
use crate::renderer::orchestrator::system::RenderSystem;
use crate::renderer::orchestrator::view::{RenderStage as FrameStage, StageMask, View};
use crate::renderer::render_core::{FinalOutputView, RenderCore, RenderCoreConfig, RenderCoreSettings};
use crate::renderer::rg::{Layout, RenderGraphBuilder, RenderTarget};
use crate::scene::Scene;
use crate::scene::camera::RenderCamera;

use self::core::view::RenderView;
use self::core::{ResourceManager, WgpuContext};
use self::graph::RenderFrame;
use self::pipeline::PipelineCache;
use self::settings::RenderSettings;

/// The current frame's real swapchain target, bound into the main view's
/// blackboard so [`ClearSurfaceSystem`] can draw into it (§4.D step 5).
struct SurfaceTarget {
    view: wgpu::TextureView,
    clear_color: wgpu::Color,
    size: (u32, u32),
}

/// Clears the frame's surface target to the configured clear color and
/// publishes it as the view's final output.
///
/// This is the system [`Renderer`] registers by default. It stands in for
/// this codebase's full forward/post-process pipeline (`graph::passes`,
/// kept as in-tree reference) until those passes are ported onto the
/// render graph core; the point of this system is that it is real GPU
/// work recorded against, scheduled by, and submitted through
/// [`RenderCore`] rather than a second render graph running alongside it.
struct ClearSurfaceSystem;

impl RenderSystem for ClearSurfaceSystem {
    fn name(&self) -> &'static str {
        "clear_surface"
    }

    fn interested_stages(&self) -> &'static [FrameStage] {
        &[FrameStage::HDRResolve]
    }

    fn render_per_frame(
        &mut self,
        _stage: FrameStage,
        view: &mut View,
        _frame: &FrameContext,
        graph: &mut RenderGraphBuilder<'_>,
    ) -> Result<()> {
        let Some(target) = view.blackboard.remove::<SurfaceTarget>() else {
            return Err(NyxError::MissingBinding(
                "no surface target bound for this view".into(),
            ));
        };

        let handle = graph.acquire_external_view(Layout::ColorTarget)?;
        let clear_color = target.clear_color;
        let surface_view = target.view;
        graph.add_render_pass(
            "clear_surface",
            target.size,
            &[RenderTarget {
                view: handle,
                clear: Some(clear_color),
            }],
            None,
            1,
            Box::new(move |encoder| {
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("clear_surface"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &surface_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            }),
        );

        view.blackboard.insert(FinalOutputView(handle));
        Ok(())
    }
}

/// The main renderer responsible for GPU rendering operations.
///
/// The renderer manages the complete rendering pipeline including:
/// - GPU context (device, queue, surface)
/// - Resource management (buffers, textures, bind groups)
/// - Pipeline caching (shader compilation, PSO creation)
/// - Frame rendering (scene extraction, command submission)
///
/// # Lifecycle
///
/// 1. Create with [`Renderer::new`] (no GPU resources allocated)
/// 2. Initialize GPU with [`Renderer::init`]
/// 3. Render frames with [`Renderer::render_frame`]
/// 4. Clean up with [`Renderer::maybe_prune`]
pub struct Renderer {
    settings: RenderSettings,
    context: Option<RendererState>,
    size: (u32, u32),
}

/// Internal renderer state
struct RendererState {
    wgpu_ctx: WgpuContext,
    resource_manager: ResourceManager,
    #[allow(dead_code)]
    pipeline_cache: PipelineCache,
    render_frame: RenderFrame,
    frame_resources: FrameResources,
    #[allow(dead_code)]
    global_bind_group_cache: GlobalBindGroupCache,
    /// The single render-graph core (§1) driving every live frame.
    render_core: RenderCore,
    next_view_id: u64,
}

impl Renderer {
    /// Phase 1: Create configuration (no GPU resources yet).
    ///
    /// This only stores the render settings. GPU resources are
    /// allocated when [`init`](Self::init) is called.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            context: None,
            size: (0, 0),
        }
    }

    /// Phase 2: Initialize GPU context with window handle.
    ///
    /// This method:
    /// 1. Creates the wgpu instance and adapter
    /// 2. Requests a device with required features/limits
    /// 3. Configures the surface for presentation
    /// 4. Initializes resource manager and pipeline cache
    pub async fn init<W>(&mut self, window: W, width: u32, height: u32) -> Result<()>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        if self.context.is_some() {
            return Ok(());
        }

        self.size = (width, height);

        // 1. Create WGPU context
        let wgpu_ctx = WgpuContext::new(window, &self.settings, width, height).await?;

        // 2. Initialize resource manager
        let resource_manager =
            ResourceManager::new(wgpu_ctx.device.clone(), wgpu_ctx.queue.clone());

        // 3. Create render frame manager
        let render_frame = RenderFrame::new(wgpu_ctx.device.clone());

        // 4. Create frame resources
        let frame_resources = FrameResources::new(
            &wgpu_ctx.device,
            &self.settings,
            (width, height),
        );

        // 5. Create global bind group cache
        let global_bind_group_cache = GlobalBindGroupCache::new();

        // 6. Assemble the render graph core and register the default systems
        let mut render_core = RenderCore::new(RenderCoreConfig::default())?;
        render_core.register_system(Box::new(ClearSurfaceSystem));
        render_core.bind_gpu(wgpu_ctx.device.clone(), wgpu_ctx.queue.clone());

        // 7. Assemble state
        self.context = Some(RendererState {
            wgpu_ctx,
            resource_manager,
            pipeline_cache: PipelineCache::new(),
            render_frame,
            frame_resources,
            global_bind_group_cache,
            render_core,
            next_view_id: 0,
        });

        log::info!("Renderer Initialized");
        Ok(())
    }

    /// Returns the current surface/window size in pixels as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn resize(&mut self, width: u32, height: u32, _scale_factor: f32) {
        self.size = (width, height);
        if let Some(state) = &mut self.context {
            state.wgpu_ctx.resize(width, height);
            state.frame_resources.resize(&state.wgpu_ctx.device,  &self.settings, (width, height));
        }
    }

    /// Renders and presents one frame for `scene`/`camera`.
    ///
    /// Drives the frame entirely through [`RenderCore`] (§1's single render
    /// graph core): the Scene Render Orchestrator collects the main view and
    /// dispatches registered systems, which record into the frame's
    /// `RenderGraphBuilder`; the recorded graph is compiled (scheduling,
    /// barrier synthesis, transient aliasing) and its node closures submit
    /// real GPU commands.
    ///
    /// # Returns
    ///
    /// `true` if a frame was recorded, compiled, and submitted; `false` if
    /// rendering was skipped (window size is 0, no GPU context yet, or the
    /// current frame's surface texture could not be acquired).
    pub fn render_frame(
        &mut self,
        scene: &mut Scene,
        camera: &RenderCamera,
        assets: &AssetServer,
        time: f32,
    ) -> bool {
        if self.size.0 == 0 || self.size.1 == 0 {
            return false;
        }

        let Some(state) = self.context.as_mut() else {
            return false;
        };

        // Scene extraction / GPU upload still goes through the existing
        // extraction pipeline; only the drawing authority moved to RenderCore.
        state
            .render_frame
            .extract_and_prepare(&mut state.resource_manager, scene, camera, assets, time);

        let output = match state.wgpu_ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) => return false,
            Err(err) => {
                log::error!("render error acquiring surface texture: {err:?}");
                return false;
            }
        };
        let surface_view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let view_id = state.next_view_id;
        state.next_view_id = state.next_view_id.wrapping_add(1);

        let mut view = View::new(
            view_id,
            RenderView::new_main_camera(camera.view_projection_matrix, camera.frustum, self.size),
            StageMask::main_camera(),
        );
        view.blackboard.insert(SurfaceTarget {
            view: surface_view,
            clear_color: state.wgpu_ctx.clear_color,
            size: self.size,
        });

        let settings = RenderCoreSettings::default();
        if let Err(err) = state.render_core.render(&*scene, view, &settings) {
            log::error!("render_core failed to produce a frame: {err}");
            return false;
        }

        output.present();
        true
    }

    /// Performs periodic resource cleanup.
    ///
    /// Should be called after each frame to release unused GPU resources.
    /// Uses internal heuristics to avoid expensive cleanup every frame.
    pub fn maybe_prune(&mut self) {
        if let Some(state) = &mut self.context {
            state.render_frame.maybe_prune(&mut state.resource_manager);
        }
    }

    // === Public Methods: For External Plugins (e.g., UI Pass) ===

    /// Returns a reference to the wgpu Device.
    ///
    /// Useful for external plugins to initialize GPU resources.
    pub fn device(&self) -> Option<&wgpu::Device> {
        self.context.as_ref().map(|s| &s.wgpu_ctx.device)
    }

    /// Returns a reference to the wgpu Queue.
    ///
    /// Useful for external plugins to submit commands.
    pub fn queue(&self) -> Option<&wgpu::Queue> {
        self.context.as_ref().map(|s| &s.wgpu_ctx.queue)
    }

    /// Returns the surface texture format.
    ///
    /// Useful for external plugins to configure render pipelines.
    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.context.as_ref().map(|s| s.wgpu_ctx.config.format)
    }

    /// Returns a reference to the WgpuContext.
    ///
    /// For external plugins that need access to low-level GPU resources.
    /// Only available after renderer initialization.
    pub fn wgpu_ctx(&self) -> Option<&WgpuContext> {
        self.context.as_ref().map(|s| &s.wgpu_ctx)
    }
}
