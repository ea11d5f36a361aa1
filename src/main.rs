use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use electras_site::{
    camera_from_scene, light_rig_from_scene, AssetError, EdgeTrigger, IntroSequencer,
    ProgressSource, Renderer, Scene, ScrollMapping, SequenceStage, ShowcaseModel,
    ShowcasePresenter, SmoothingTask, Smoother, TimeProgress, Viewport,
};

const DEFAULT_SCRUB_SECONDS: f32 = 8.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let scene = Scene::showcase().context("failed to parse bundled scene")?;
    let target_size = scene.model().map_or(4.0, |model| model.size);

    let text = fs::read_to_string(&options.path).map_err(|source| AssetError::Io {
        path: options.path.clone(),
        source,
    })?;
    let model = ShowcaseModel::from_obj(&options.path, &text, target_size, scene.clips.clone())?;
    print_summary(&options.path, &model, target_size);

    if options.summary_only {
        return Ok(());
    }
    match run_interactive(scene, model, options.scrub_seconds) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn print_summary(path: &str, model: &ShowcaseModel, target_size: f32) {
    println!(
        "Loaded {path}: {} vertices, {} triangles",
        model.mesh.vertex_count(),
        model.mesh.triangle_count()
    );
    let (min, max) = (model.bounds.min, model.bounds.max);
    println!(
        "Bounds min=({:.2}, {:.2}, {:.2}) max=({:.2}, {:.2}, {:.2})",
        min.x, min.y, min.z, max.x, max.y, max.z
    );
    println!(
        "Normalized to {target_size:.1} units: scale={:.4}",
        model.normalization.scale
    );

    println!("Intro schedule:");
    for entry in IntroSequencer::default().schedule().entries() {
        println!(" - {}ms {}", entry.at_ms, entry.stage);
    }

    let mapping = ScrollMapping::default();
    println!("Scroll phases:");
    for step in 0..=10 {
        let phase = mapping.phase(step as f32 / 10.0, 0.0);
        println!(
            " - p={:.2} rotation={:.3} mask={:.3} text={}",
            phase.progress,
            phase.rotation_angle,
            phase.mask_scale,
            phase.color_mode.css_color()
        );
    }
}

fn run_interactive(scene: Scene, model: ShowcaseModel, scrub_seconds: f32) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::<()>::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("ELECTRAS preview")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let size = window.inner_size();
    let renderer = block_on(Renderer::new(Arc::clone(&window), (size.width, size.height)))?;
    let presenter = ShowcasePresenter::from_scene(&scene)
        .ok_or_else(|| anyhow!("bundled scene has no model entry"))?;

    let mut app = Preview {
        window,
        renderer,
        viewport: Viewport::new(size.width, size.height),
        scene,
        presenter,
        pending_model: Some(model),
        sequencer: IntroSequencer::default(),
        progress: TimeProgress::new(scrub_seconds).looping(),
        smoothing: SmoothingTask::new(Smoother::default()),
        mapping: ScrollMapping::default(),
        reveal: EdgeTrigger::new(ScrollMapping::default().reveal_after),
        started: Instant::now(),
        last_frame: Instant::now(),
        paused: false,
        exit: false,
        last_error: None,
    };

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            if let Err(err) = app.process_event(event) {
                app.last_error = Some(err);
                elwt.exit();
            }
            if app.exit {
                elwt.exit();
            }
        })
        .context("event loop failed")?;

    app.shutdown();
    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Desktop stand-in for the landing page: the intro plays on wall-clock
/// time and a looping timer takes the place of the scrollbar.
struct Preview {
    window: Arc<Window>,
    renderer: Renderer,
    viewport: Viewport,
    scene: Scene,
    presenter: ShowcasePresenter,
    pending_model: Option<ShowcaseModel>,
    sequencer: IntroSequencer,
    progress: TimeProgress,
    smoothing: SmoothingTask,
    mapping: ScrollMapping,
    reveal: EdgeTrigger,
    started: Instant,
    last_frame: Instant,
    paused: bool,
    exit: bool,
    last_error: Option<anyhow::Error>,
}

impl Preview {
    fn process_event(&mut self, event: Event<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if window_id == self.window.id() => {
                match event {
                    WindowEvent::CloseRequested => self.exit = true,
                    WindowEvent::Resized(size) => {
                        self.renderer.resize((size.width, size.height));
                        self.viewport.update(size.width, size.height);
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
                    WindowEvent::RedrawRequested => self.draw_frame()?,
                    _ => {}
                }
            }
            Event::AboutToWait => self.window.request_redraw(),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key {
            Key::Named(NamedKey::Escape) => self.exit = true,
            Key::Named(NamedKey::Space) => {
                self.paused = !self.paused;
                println!("Scrub {}", if self.paused { "paused" } else { "resumed" });
            }
            _ => {}
        }
    }

    fn draw_frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let elapsed_ms = now.duration_since(self.started).as_millis();
        for stage in self
            .sequencer
            .advance_to(u32::try_from(elapsed_ms).unwrap_or(u32::MAX))
        {
            println!("Intro stage: {stage}");
            if self.presenter.on_stage(stage).is_some() {
                if let Some(model) = self.pending_model.take() {
                    self.presenter.finish_load(Ok(model));
                }
            }
        }

        if self.sequencer.stage() >= SequenceStage::ModelVisible && !self.paused {
            self.progress.advance(delta);
            if let Some(progress) = self.progress.progress() {
                self.smoothing.set_target(progress);
            }
        }
        if let Some(smoothed) = self.smoothing.tick() {
            let phase = self.mapping.phase(smoothed, 0.0);
            self.presenter.set_rotation(phase.rotation_angle);
            if self.reveal.observe(phase.progress) {
                println!("Next section revealed at p={:.2}", phase.progress);
            }
        }

        let frame = self.presenter.advance(delta);
        if let Some(model) = self.presenter.model() {
            if !self.renderer.has_mesh() {
                self.renderer.upload_mesh(&model.mesh);
            }
        }
        let camera = camera_from_scene(&self.scene, &self.viewport);
        self.renderer
            .update_globals(&camera, &light_rig_from_scene(&self.scene));
        match self.renderer.render(frame.as_ref()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.window.inner_size();
                self.renderer.resize((size.width, size.height));
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(anyhow!("GPU is out of memory")),
            Err(err) => log::info!("surface error ({err}); retrying next frame"),
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.sequencer.cancel();
        self.smoothing.cancel();
        println!(
            "Final rotation {:.3} after stage {}",
            self.presenter.rotation(),
            self.sequencer.stage()
        );
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    path: String,
    summary_only: bool,
    scrub_seconds: f32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: electras-site <model.obj> [--summary-only] [--scrub-seconds N]"
            ));
        };
        let mut summary_only = false;
        let mut scrub_seconds = DEFAULT_SCRUB_SECONDS;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--scrub-seconds" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--scrub-seconds needs a value"))?;
                    scrub_seconds = value
                        .parse::<f32>()
                        .ok()
                        .filter(|seconds| *seconds > 0.0)
                        .ok_or_else(|| anyhow!("invalid --scrub-seconds value: {value}"))?;
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --summary-only or --scrub-seconds"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            summary_only,
            scrub_seconds,
        })
    }
}
