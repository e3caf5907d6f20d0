// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The temporal feedback compositor.

Every frame the compositor decays the previous accumulation into a fresh one, stamps
the current gaze point into it, and composites the result onto the main surface.  All
pipeline changes go through one [`PipelineStateTransaction`], so the caller's bindings
are back in place when [`FeedbackCompositor::render`] returns.

```
use gaze_trail::{Context, Device, SwapChain};
use gaze_trail::images::{CompositorConfig, FeedbackCompositor, LogReporter, Point};

let device = Device::new();
let mut context = Context::new(&device);
let swap_chain = SwapChain::new(&device, 64, 32).unwrap();
let mut compositor =
    FeedbackCompositor::new(&device, &swap_chain, CompositorConfig::default(), LogReporter).unwrap();
compositor.push_gaze_point(true, Point::new(32.0, 16.0));
compositor.render(&mut context).unwrap();
assert_eq!(compositor.stats().swaps, 1);
```
*/

use crate::bindings::category::Stage;
use crate::bindings::dirty_tracking::DirtyFlag;
use crate::bindings::handle::ResourceHandle;
use crate::bindings::state::{PrimitiveTopology, Rect, VertexBufferBinding, Viewport};
use crate::images::accumulation::AccumulationBufferPair;
use crate::images::config::{CompositorConfig, ConfigError};
use crate::images::constants::{FULLSCREEN_QUAD, PixelConstants, QuadVertex};
use crate::images::gaze::{GazeQueue, GazeSmoother, Point};
use crate::images::reporter::{Report, Reporter};
use crate::images::settings::{RenderSettings, ShapeMode};
use crate::images::shape::{ShapeCache, ShapeError, ShapeResource};
use crate::imp::resources::{
    BlendMode, BlendState, Buffer, BufferDesc, BufferKind, BufferUsage, Filter, InputElement,
    InputLayout, RasterizerDesc, RasterizerState, RenderTargetView, SamplerDesc, SamplerState,
    Shader, ShaderCode, AddressMode,
};
use crate::imp::{self, Context, Device, SwapChain};
use crate::pipeline::PipelineStateTransaction;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("creating compositor resources failed: {0}")]
    Resource(#[from] imp::Error),
    #[error("loading the initial shape strip failed: {0}")]
    Shape(#[from] ShapeError),
}

/// Why a frame was abandoned.  The previous frame stays on screen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("no render targets; resize to rebuild them")]
    NoRenderTargets,
    #[error("uploading pixel constants failed: {0}")]
    Upload(#[source] imp::Error),
    #[error("draw failed: {0}")]
    Draw(#[source] imp::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    #[error("resizing the swap chain failed: {0}")]
    SwapChain(#[source] imp::Error),
    #[error("recreating render targets failed: {0}")]
    Targets(#[source] imp::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("setting {0} is not a finite number")]
    NonFinite(&'static str),
    #[error("reloading the shape strip failed: {0}")]
    Shape(#[from] ShapeError),
}

/// Counters describing what the compositor has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositorStats {
    /// Frames drawn to completion.
    pub frames: u64,
    pub degraded_frames: u64,
    /// Accumulation ping-pong swaps.
    pub swaps: u64,
    pub shape_reloads: u64,
    /// Times both accumulation surfaces were cleared together.
    pub accumulation_clears: u64,
    pub background_clears: u64,
}

#[derive(Debug)]
struct PixelPrograms {
    accumulate_solid: ResourceHandle<Shader>,
    accumulate_bubble: ResourceHandle<Shader>,
    accumulate_heatmap: ResourceHandle<Shader>,
    composite_normal: ResourceHandle<Shader>,
    composite_heatmap: ResourceHandle<Shader>,
}

impl PixelPrograms {
    fn new(device: &Device) -> Result<Self, imp::Error> {
        let pixel = |code| device.create_shader(Stage::Pixel, code);
        Ok(PixelPrograms {
            accumulate_solid: pixel(ShaderCode::AccumulateSolid)?,
            accumulate_bubble: pixel(ShaderCode::AccumulateBubble)?,
            accumulate_heatmap: pixel(ShaderCode::AccumulateHeatmap)?,
            composite_normal: pixel(ShaderCode::CompositeNormal)?,
            composite_heatmap: pixel(ShaderCode::CompositeHeatmap)?,
        })
    }

    fn accumulate(&self, mode: ShapeMode, stamping: bool) -> &ResourceHandle<Shader> {
        match (stamping, mode) {
            (false, _) => &self.accumulate_solid,
            (true, ShapeMode::Heatmap) => &self.accumulate_heatmap,
            (true, ShapeMode::Bubble | ShapeMode::Solid) => &self.accumulate_bubble,
        }
    }

    fn composite(&self, mode: ShapeMode) -> &ResourceHandle<Shader> {
        match mode {
            ShapeMode::Heatmap => &self.composite_heatmap,
            ShapeMode::Bubble | ShapeMode::Solid => &self.composite_normal,
        }
    }
}

fn pixel_constants(settings: &RenderSettings, gaze_uv: [f32; 2], aspect_ratio: f32) -> PixelConstants {
    PixelConstants {
        color: settings.effective_color().to_array(),
        background_color: settings.effective_background().to_array(),
        gaze_point: gaze_uv,
        aspect_ratio,
        size_squared: settings.size_squared(),
        trail: settings.trail,
        decay: settings.effective_decay(),
        padding: [0.0; 2],
    }
}

/// Everything whose size follows the swap chain.
#[derive(Debug)]
struct RenderTargets {
    main: ResourceHandle<RenderTargetView>,
    accumulation: AccumulationBufferPair,
}

impl RenderTargets {
    fn new(device: &Device, swap_chain: &SwapChain, config: &CompositorConfig) -> Result<Self, imp::Error> {
        let main = device.create_render_target_view(&swap_chain.back_buffer())?;
        let accumulation = AccumulationBufferPair::new(
            device,
            swap_chain.width(),
            swap_chain.height(),
            config.downsample_factor,
            config.accumulation_format,
        )?;
        Ok(RenderTargets { main, accumulation })
    }
}

/// Draws the gaze trail.
///
/// A compositor exists only in its ready state; [`dispose`](Self::dispose) (or drop)
/// releases everything it owns.
pub struct FeedbackCompositor {
    device: Device,
    config: CompositorConfig,
    reporter: Box<dyn Reporter>,

    settings: RenderSettings,
    settings_dirty: DirtyFlag,
    background_dirty: DirtyFlag,
    smoother: GazeSmoother,
    pending_point: Option<Point>,
    /// Normalized gaze point last written to the constant block.
    gaze_uv: [f32; 2],
    last_aspect_ratio: Option<f32>,
    width: u32,
    height: u32,

    vertex_buffer: ResourceHandle<Buffer>,
    input_layout: ResourceHandle<InputLayout>,
    vertex_shader: ResourceHandle<Shader>,
    pixel_programs: PixelPrograms,
    constant_buffer: ResourceHandle<Buffer>,
    sampler: ResourceHandle<SamplerState>,
    rasterizer: ResourceHandle<RasterizerState>,
    blend: ResourceHandle<BlendState>,

    targets: Option<RenderTargets>,
    shapes: ShapeCache,
    stats: CompositorStats,
}

impl std::fmt::Debug for FeedbackCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackCompositor")
            .field("settings", &self.settings)
            .field("size", &(self.width, self.height))
            .field("has_render_targets", &self.targets.is_some())
            .field("queued_points", &self.smoother.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl FeedbackCompositor {
    /// Creates every resource the compositor draws with, sized for `swap_chain`.
    ///
    /// On failure nothing is retained.
    pub fn new(
        device: &Device,
        swap_chain: &SwapChain,
        config: CompositorConfig,
        reporter: impl Reporter + 'static,
    ) -> Result<Self, InitError> {
        config.validate()?;
        let vertex_buffer = device.create_buffer(
            BufferDesc::new(BufferKind::Vertex, std::mem::size_of_val(&FULLSCREEN_QUAD))
                .with_usage(BufferUsage::Immutable),
            Some(bytemuck::cast_slice(&FULLSCREEN_QUAD)),
        )?;
        let input_layout = device.create_input_layout(vec![
            InputElement {
                semantic: "POSITION",
                offset: 0,
                components: 2,
            },
            InputElement {
                semantic: "TEXCOORD",
                offset: 8,
                components: 2,
            },
        ])?;
        let vertex_shader = device.create_shader(Stage::Vertex, ShaderCode::FullscreenQuad)?;
        let pixel_programs = PixelPrograms::new(device)?;
        let constant_buffer = device.create_buffer(
            BufferDesc::new(BufferKind::Constant, PixelConstants::BYTE_SIZE)
                .with_usage(BufferUsage::Dynamic),
            None,
        )?;
        let sampler = device.create_sampler_state(SamplerDesc {
            filter: Filter::Linear,
            address: AddressMode::Clamp,
        })?;
        let rasterizer = device.create_rasterizer_state(RasterizerDesc {
            scissor_enable: true,
        })?;
        let blend = device.create_blend_state(BlendMode::Opaque)?;
        let targets = RenderTargets::new(device, swap_chain, &config)?;

        let settings = RenderSettings::default();
        let mut shapes = ShapeCache::new(device, config.shape_source.clone());
        shapes.load(settings.shape_mode)?;

        logwise::info_sync!(
            "compositor ready at {width}x{height}",
            width = swap_chain.width(),
            height = swap_chain.height()
        );
        Ok(FeedbackCompositor {
            device: device.clone(),
            config,
            reporter: Box::new(reporter),
            settings,
            settings_dirty: DirtyFlag::new(true),
            background_dirty: DirtyFlag::new(true),
            smoother: GazeSmoother::new(),
            pending_point: None,
            gaze_uv: [0.0; 2],
            last_aspect_ratio: None,
            width: swap_chain.width(),
            height: swap_chain.height(),
            vertex_buffer,
            input_layout,
            vertex_shader,
            pixel_programs,
            constant_buffer,
            sampler,
            rasterizer,
            blend,
            targets: Some(targets),
            shapes,
            stats: CompositorStats::default(),
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn stats(&self) -> CompositorStats {
        self.stats
    }

    pub fn gaze_queue(&self) -> &GazeQueue {
        self.smoother.queue()
    }

    /// Main surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_render_targets(&self) -> bool {
        self.targets.is_some()
    }

    pub fn accumulation(&self) -> Option<&AccumulationBufferPair> {
        self.targets.as_ref().map(|t| &t.accumulation)
    }

    pub fn main_render_target(&self) -> Option<&ResourceHandle<RenderTargetView>> {
        self.targets.as_ref().map(|t| &t.main)
    }

    pub fn shape(&self) -> Option<&ShapeResource> {
        self.shapes.current()
    }

    /// Applies new settings.
    ///
    /// Changing the shape mode reloads the shape strip and clears both accumulation
    /// surfaces.  If the reload fails the settings still apply and the trail composites
    /// without a strip.
    pub fn update_settings(
        &mut self,
        context: &mut Context,
        settings: RenderSettings,
    ) -> Result<(), SettingsError> {
        for (name, value) in [
            ("size", settings.size),
            ("trail", settings.trail),
            ("decay", settings.decay),
            ("responsiveness", settings.responsiveness),
        ] {
            if !value.is_finite() {
                return Err(SettingsError::NonFinite(name));
            }
        }
        let previous = std::mem::replace(&mut self.settings, settings);
        self.settings_dirty.mark_dirty();
        if previous.background_changes(&settings) {
            self.background_dirty.mark_dirty();
        }
        if previous.shape_mode == settings.shape_mode {
            return Ok(());
        }

        if let Some(targets) = &self.targets {
            targets.accumulation.clear_both(context);
            self.stats.accumulation_clears += 1;
        }
        self.stats.shape_reloads += 1;
        self.shapes.load(settings.shape_mode)?;
        self.reporter.report(&Report::ShapeReloaded(settings.shape_mode));
        Ok(())
    }

    /// Feeds this tick's pointer sample.  The point it yields is drawn by the next
    /// [`render`](Self::render).
    pub fn push_gaze_point(&mut self, is_active: bool, point: Point) {
        self.pending_point = self.smoother.push(
            is_active,
            self.settings.enable,
            self.settings.responsiveness,
            point,
        );
    }

    /// Draws one frame into the main surface.
    ///
    /// A failed frame is also passed to the reporter.
    pub fn render(&mut self, context: &mut Context) -> Result<(), FrameError> {
        let result = self.render_frame(context);
        match &result {
            Ok(()) => self.stats.frames += 1,
            Err(e) => {
                self.stats.degraded_frames += 1;
                logwise::warn_sync!("frame abandoned: {err}", err = logwise::privacy::LogIt(e));
                self.reporter.report(&Report::FrameDegraded(e.clone()));
            }
        }
        result
    }

    fn render_frame(&mut self, context: &mut Context) -> Result<(), FrameError> {
        let gaze = self.pending_point.take();
        let stamping = !self.smoother.is_empty();
        let Some(targets) = self.targets.as_mut() else {
            return Err(FrameError::NoRenderTargets);
        };

        let aspect_ratio = self.width as f32 / self.height as f32;
        if self.last_aspect_ratio != Some(aspect_ratio) {
            self.last_aspect_ratio = Some(aspect_ratio);
            self.reporter.report(&Report::AspectRatioChanged { aspect_ratio });
        }

        let mut tx = PipelineStateTransaction::new(context);
        tx.set_input_layout(Some(&self.input_layout));
        tx.set_vertex_buffers(
            0,
            &[VertexBufferBinding {
                buffer: Some(self.vertex_buffer.acquire()),
                stride: QuadVertex::STRIDE,
                offset: 0,
            }],
        );
        tx.set_primitive_topology(PrimitiveTopology::TriangleList);
        tx.set_shader(Stage::Vertex, Some(&self.vertex_shader), &[]);
        tx.set_rasterizer_state(Some(&self.rasterizer));
        tx.set_blend_state(Some(&self.blend), [1.0; 4], u32::MAX);
        tx.set_constant_buffers(Stage::Pixel, 0, &[Some(self.constant_buffer.acquire())]);
        tx.set_samplers(Stage::Pixel, 0, &[Some(self.sampler.acquire())]);

        if self.background_dirty.take() {
            let background = if self.settings.enable {
                self.settings.background_color.premultiplied()
            } else {
                [0.0; 4]
            };
            tx.context_mut().clear_render_target_view(&targets.main, background);
            self.stats.background_clears += 1;
        }
        if !self.settings.enable {
            return Ok(());
        }

        if let Some(point) = gaze {
            self.gaze_uv = [point.x / self.width as f32, point.y / self.height as f32];
        }
        if self.settings_dirty.is_dirty() || gaze.is_some() {
            let constants = pixel_constants(&self.settings, self.gaze_uv, aspect_ratio);
            let mut mapped = tx
                .context_mut()
                .map_write_discard(&self.constant_buffer)
                .map_err(FrameError::Upload)?;
            mapped[..PixelConstants::BYTE_SIZE].copy_from_slice(constants.as_bytes());
            drop(mapped);
            self.settings_dirty.take();
        }

        // accumulate at reduced resolution
        let accumulation = &mut targets.accumulation;
        let (acc_width, acc_height) = (accumulation.width(), accumulation.height());
        tx.set_render_targets(&[Some(accumulation.back().render_target().acquire())], None);
        tx.set_viewports(&[Viewport::sized(acc_width as f32, acc_height as f32)]);
        tx.set_scissor_rects(&[Rect::sized(acc_width, acc_height)]);
        tx.set_shader(
            Stage::Pixel,
            Some(self.pixel_programs.accumulate(self.settings.shape_mode, stamping)),
            &[],
        );
        tx.set_shader_resources(
            Stage::Pixel,
            0,
            &[Some(accumulation.front().shader_resource().acquire()), None],
        );
        tx.context_mut().draw(FULLSCREEN_QUAD.len() as u32, 0).map_err(FrameError::Draw)?;
        accumulation.swap();
        self.stats.swaps += 1;

        // composite at full resolution
        tx.set_render_targets(&[Some(targets.main.acquire())], None);
        tx.set_viewports(&[Viewport::sized(self.width as f32, self.height as f32)]);
        tx.set_scissor_rects(&[Rect::sized(self.width, self.height)]);
        tx.set_shader(
            Stage::Pixel,
            Some(self.pixel_programs.composite(self.settings.shape_mode)),
            &[],
        );
        tx.set_shader_resources(
            Stage::Pixel,
            0,
            &[
                Some(targets.accumulation.front().shader_resource().acquire()),
                self.shapes.current().map(|s| s.view().acquire()),
            ],
        );
        tx.context_mut().draw(FULLSCREEN_QUAD.len() as u32, 0).map_err(FrameError::Draw)?;
        Ok(())
    }

    /// Resizes the swap chain and rebuilds every size-dependent resource.
    ///
    /// Does nothing if the size is unchanged and render targets exist.  On failure the
    /// compositor is left without render targets until a later resize succeeds.
    pub fn resize(&mut self, swap_chain: &mut SwapChain, width: u32, height: u32) -> Result<(), ResizeError> {
        if self.targets.is_some() && (width, height) == (self.width, self.height) {
            return Ok(());
        }
        self.smoother.clear();
        self.pending_point = None;
        self.targets = None;

        if let Err(e) = swap_chain.resize_buffers(width, height) {
            logwise::error_sync!("swap chain resize failed: {err}", err = logwise::privacy::LogIt(&e));
            return Err(ResizeError::SwapChain(e));
        }
        let targets = RenderTargets::new(&self.device, swap_chain, &self.config).map_err(|e| {
            logwise::error_sync!(
                "recreating render targets failed: {err}",
                err = logwise::privacy::LogIt(&e)
            );
            ResizeError::Targets(e)
        })?;
        self.targets = Some(targets);
        self.width = width;
        self.height = height;
        self.settings_dirty.mark_dirty();
        self.background_dirty.mark_dirty();
        logwise::info_sync!("compositor resized to {width}x{height}", width = width, height = height);
        Ok(())
    }

    /// Releases the render targets and shape strip.  The remaining resources go with `self`.
    pub fn dispose(mut self) {
        self.targets = None;
        self.shapes.release();
        logwise::info_sync!("compositor disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::reporter::RecordingReporter;
    use crate::images::settings::OverlayColor;
    use crate::imp::resources::ObjectKind;
    use crate::pipeline::StatefulContext;

    fn setup(width: u32, height: u32) -> (Device, Context, SwapChain, FeedbackCompositor, RecordingReporter) {
        let device = Device::new();
        let context = Context::new(&device);
        let swap_chain = SwapChain::new(&device, width, height).expect("swap chain");
        let reporter = RecordingReporter::new();
        let compositor =
            FeedbackCompositor::new(&device, &swap_chain, CompositorConfig::default(), reporter.clone())
                .expect("compositor");
        (device, context, swap_chain, compositor, reporter)
    }

    #[test]
    fn failed_init_retains_nothing() {
        let device = Device::new();
        let swap_chain = SwapChain::new(&device, 16, 16).expect("swap chain");
        let baseline = device.live_objects();
        device.fail_next_creation(ObjectKind::RenderTargetView);
        let result = FeedbackCompositor::new(&device, &swap_chain, CompositorConfig::default(), RecordingReporter::new());
        assert!(matches!(result, Err(InitError::Resource(_))));
        assert_eq!(device.live_objects(), baseline);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let device = Device::new();
        let swap_chain = SwapChain::new(&device, 16, 16).expect("swap chain");
        let config = CompositorConfig {
            downsample_factor: 0,
            ..Default::default()
        };
        assert!(matches!(
            FeedbackCompositor::new(&device, &swap_chain, config, RecordingReporter::new()),
            Err(InitError::Config(ConfigError::ZeroDownsample))
        ));
    }

    #[test]
    fn render_leaves_caller_state_alone() {
        let (_device, mut context, _chain, mut compositor, _) = setup(32, 16);
        context.set_viewports(&[Viewport::sized(5.0, 5.0)]);
        compositor.push_gaze_point(true, Point::new(16.0, 8.0));
        compositor.render(&mut context).expect("render");
        assert_eq!(context.viewports(), vec![Viewport::sized(5.0, 5.0)]);
        assert!(context.input_layout().is_none());
        assert!(context.render_targets().render_targets.iter().all(Option::is_none));
        assert_eq!(context.draw_count(), 2);
    }

    #[test]
    fn aspect_ratio_reported_once_per_change() {
        let (_device, mut context, mut chain, mut compositor, reporter) = setup(40, 20);
        compositor.render(&mut context).expect("render");
        compositor.render(&mut context).expect("render");
        compositor.resize(&mut chain, 20, 20).expect("resize");
        compositor.render(&mut context).expect("render");
        let ratios: Vec<Report> = reporter
            .reports()
            .into_iter()
            .filter(|r| matches!(r, Report::AspectRatioChanged { .. }))
            .collect();
        assert_eq!(
            ratios,
            vec![
                Report::AspectRatioChanged { aspect_ratio: 2.0 },
                Report::AspectRatioChanged { aspect_ratio: 1.0 },
            ]
        );
    }

    #[test]
    fn shape_toggle_reloads_and_clears_once() {
        let (_device, mut context, _chain, mut compositor, _) = setup(32, 32);
        let heatmap = RenderSettings {
            shape_mode: ShapeMode::Heatmap,
            ..Default::default()
        };
        compositor.update_settings(&mut context, heatmap).expect("settings");
        assert_eq!(compositor.stats().shape_reloads, 1);
        assert_eq!(compositor.stats().accumulation_clears, 1);
        assert_eq!(compositor.shape().map(|s| s.mode()), Some(ShapeMode::Heatmap));

        let tweaked = RenderSettings {
            trail: 0.1,
            size: 0.9,
            color: OverlayColor::new(1.0, 0.0, 0.0, 1.0),
            ..heatmap
        };
        compositor.update_settings(&mut context, tweaked).expect("settings");
        assert_eq!(compositor.stats().shape_reloads, 1);
        assert_eq!(compositor.stats().accumulation_clears, 1);
    }

    #[test]
    fn disabled_overlay_clears_once_and_skips_drawing() {
        let (_device, mut context, _chain, mut compositor, _) = setup(16, 16);
        let disabled = RenderSettings {
            enable: false,
            ..Default::default()
        };
        compositor.update_settings(&mut context, disabled).expect("settings");
        compositor.push_gaze_point(true, Point::new(1.0, 1.0));
        assert!(compositor.gaze_queue().is_empty());
        compositor.render(&mut context).expect("render");
        compositor.render(&mut context).expect("render");
        assert_eq!(context.draw_count(), 0);
        assert_eq!(compositor.stats().background_clears, 1);
        assert_eq!(compositor.stats().swaps, 0);
    }

    fn accumulated_at_center(compositor: &FeedbackCompositor) -> f32 {
        let accumulation = compositor.accumulation().expect("accumulation");
        accumulation
            .front()
            .texture()
            .read_texel(accumulation.width() / 2, accumulation.height() / 2)
            .r
    }

    #[test]
    fn draining_the_last_point_only_decays() {
        let (_device, mut context, _chain, mut compositor, _) = setup(1200, 600);
        compositor.push_gaze_point(true, Point::new(600.0, 300.0));
        compositor.render(&mut context).expect("render");
        compositor.push_gaze_point(false, Point::new(0.0, 0.0));
        compositor.render(&mut context).expect("render");
        let stamped = accumulated_at_center(&compositor);
        assert!(stamped > 0.9, "{stamped}");

        compositor.push_gaze_point(false, Point::new(0.0, 0.0));
        assert!(compositor.gaze_queue().is_empty());
        compositor.render(&mut context).expect("render");
        let decayed = accumulated_at_center(&compositor);
        assert!((decayed - stamped * 0.95).abs() < 1e-4, "{decayed} vs {stamped}");
    }

    #[test]
    fn queued_points_stamp_without_a_push() {
        let (_device, mut context, _chain, mut compositor, _) = setup(1200, 600);
        compositor.push_gaze_point(true, Point::new(600.0, 300.0));
        compositor.render(&mut context).expect("render");
        let first = accumulated_at_center(&compositor);

        assert_eq!(compositor.gaze_queue().len(), 2);
        compositor.render(&mut context).expect("render");
        let second = accumulated_at_center(&compositor);
        // decay alone would leave less than the first frame did
        assert!(second > first, "{second} vs {first}");
    }

    #[test]
    fn nothing_queued_nothing_stamped() {
        let (_device, mut context, _chain, mut compositor, _) = setup(1200, 600);
        compositor.render(&mut context).expect("render");
        assert_eq!(accumulated_at_center(&compositor), 0.0);
    }

    #[test]
    fn heatmap_clears_to_the_chosen_background() {
        let (_device, mut context, chain, mut compositor, _) = setup(16, 16);
        let heatmap = RenderSettings {
            shape_mode: ShapeMode::Heatmap,
            background_color: OverlayColor::new(1.0, 1.0, 1.0, 0.3),
            ..Default::default()
        };
        compositor.update_settings(&mut context, heatmap).expect("settings");
        // abort after the clear so the composite does not cover it
        context.fail_next_map();
        assert!(compositor.render(&mut context).is_err());
        let texel = chain.back_buffer().read_texel(0, 0);
        assert!((texel.r - 0.3).abs() < 0.01, "{texel:?}");
        assert!((texel.a - 0.3).abs() < 0.01, "{texel:?}");
    }

    #[test]
    fn upload_failure_degrades_frame() {
        let (_device, mut context, _chain, mut compositor, reporter) = setup(16, 16);
        context.fail_next_map();
        let err = compositor.render(&mut context).expect_err("upload fails");
        assert!(matches!(err, FrameError::Upload(imp::Error::MapFailed)));
        assert!(reporter.reports().contains(&Report::FrameDegraded(err)));
        // constants are still pending and the next frame succeeds
        compositor.render(&mut context).expect("render");
        assert_eq!(compositor.stats().degraded_frames, 1);
        assert_eq!(compositor.stats().frames, 1);
    }

    #[test]
    fn resize_to_same_size_is_noop() {
        let (device, mut context, mut chain, mut compositor, _) = setup(24, 12);
        compositor.push_gaze_point(true, Point::new(3.0, 3.0));
        compositor.render(&mut context).expect("render");
        let created = device.created_count(ObjectKind::Texture2D);
        let queued = compositor.gaze_queue().len();
        compositor.resize(&mut chain, 24, 12).expect("resize");
        assert_eq!(device.created_count(ObjectKind::Texture2D), created);
        assert_eq!(compositor.gaze_queue().len(), queued);
    }

    #[test]
    fn failed_resize_recovers_later() {
        let (device, mut context, mut chain, mut compositor, _) = setup(24, 12);
        compositor.push_gaze_point(true, Point::new(3.0, 3.0));
        device.fail_next_creation(ObjectKind::RenderTargetView);
        assert!(matches!(
            compositor.resize(&mut chain, 48, 24),
            Err(ResizeError::Targets(_))
        ));
        assert!(!compositor.has_render_targets());
        assert!(compositor.gaze_queue().is_empty());
        assert_eq!(compositor.render(&mut context), Err(FrameError::NoRenderTargets));
        compositor.resize(&mut chain, 48, 24).expect("resize");
        assert_eq!(compositor.accumulation().map(|a| (a.width(), a.height())), Some((12, 6)));
        compositor.render(&mut context).expect("render");
    }

    #[test]
    fn dispose_releases_everything() {
        let (device, context, chain, compositor, _) = setup(8, 8);
        compositor.dispose();
        drop(context);
        drop(chain);
        assert_eq!(device.live_objects(), 0);
    }
}
