use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use kurbo::Vec2;

use kinema::{
    Animation, Canvas, Fps, FrameIndex, RateFunction, Rgba, Scene, SceneConfig, SceneObject,
    encode::{
        FfmpegSink, FfmpegSinkOpts, FrameSink, PngSequenceSink, SinkConfig, ThreadedSink,
        flatten_premul_over_bg_to_opaque_rgba8,
    },
    render::{BackendKind, Frame, RenderBackend, create_backend},
    shapes,
};

#[derive(Parser, Debug)]
#[command(name = "kinema", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame of a built-in demo scene as a PNG.
    Frame(FrameArgs),
    /// Render a built-in demo scene to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a built-in demo scene to a numbered PNG sequence.
    Frames(FramesArgs),
    /// Print a demo scene's initial object tree as JSON.
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Demo scene name.
    #[arg(long, value_enum, default_value_t = Demo::Morph)]
    scene: Demo,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output directory for the PNG sequence.
    #[arg(long)]
    out_dir: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = "frame")]
    prefix: String,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Demo scene name.
    #[arg(long, value_enum, default_value_t = Demo::Morph)]
    scene: Demo,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    /// Square morphing into a circle, then holding.
    Morph,
    /// Draw-on reveal of a circle.
    Reveal,
    /// A dot orbiting a square via a per-frame updater.
    Orbit,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Dump(args) => cmd_dump(args),
    }
}

fn make_backend(choice: BackendChoice) -> anyhow::Result<Box<dyn RenderBackend>> {
    let kind = match choice {
        BackendChoice::Cpu => BackendKind::Cpu,
        #[cfg(feature = "gpu")]
        BackendChoice::Gpu => BackendKind::Gpu,
    };
    Ok(create_backend(kind)?)
}

fn scene_config(common: &CommonArgs) -> anyhow::Result<SceneConfig> {
    let fps = Fps::new(common.fps, 1)?;
    Ok(SceneConfig::new(
        fps,
        Canvas {
            width: common.width,
            height: common.height,
        },
    ))
}

fn run_demo(demo: Demo, scene: &mut Scene) -> anyhow::Result<()> {
    match demo {
        Demo::Morph => {
            let start = demo_square();
            let end = demo_circle();
            let id = scene.add(start);
            scene.play(vec![
                Animation::transform_to(id, end, 1.5).with_rate(RateFunction::Smooth),
            ])?;
            scene.wait(0.5)?;
        }
        Demo::Reveal => {
            let id = scene.add(demo_circle());
            scene.play(vec![Animation::reveal(id, 1.2)])?;
            scene.wait(0.8)?;
        }
        Demo::Orbit => {
            let square = scene.add(demo_square());
            let mut dot = SceneObject::from_curve(shapes::circle(0.15))
                .with_fill(Rgba::new(1.0, 0.8, 0.2, 1.0));
            dot.shift(Vec2::new(2.5, 0.0));
            let dot_id = scene.add(dot);
            scene.attach_updater(dot_id, |obj, t| {
                let angle = t * std::f64::consts::TAU / 4.0;
                let target = kurbo::Point::new(2.5 * angle.cos(), 2.5 * angle.sin());
                let delta = target - obj.center();
                obj.shift(delta);
            });
            scene.play(vec![
                Animation::shift(square, Vec2::new(0.0, 0.5), 1.0)
                    .with_rate(RateFunction::ThereAndBack),
            ])?;
            scene.wait(3.0)?;
        }
    }
    Ok(())
}

fn demo_square() -> SceneObject {
    SceneObject::from_curve(shapes::square(2.5))
        .with_fill(Rgba::new(0.18, 0.38, 0.82, 1.0))
        .with_stroke(Rgba::WHITE, 0.04)
}

fn demo_circle() -> SceneObject {
    SceneObject::from_curve(shapes::circle(1.5))
        .with_fill(Rgba::new(0.85, 0.25, 0.2, 1.0))
        .with_stroke(Rgba::WHITE, 0.04)
}

/// Demo tree as it exists before any animation runs (for `dump`).
fn demo_tree(demo: Demo) -> SceneObject {
    let mut root = SceneObject::new();
    match demo {
        Demo::Morph | Demo::Reveal => {
            root.add_child(if matches!(demo, Demo::Morph) {
                demo_square()
            } else {
                demo_circle()
            });
        }
        Demo::Orbit => {
            root.add_child(demo_square());
            let mut dot = SceneObject::from_curve(shapes::circle(0.15))
                .with_fill(Rgba::new(1.0, 0.8, 0.2, 1.0));
            dot.shift(Vec2::new(2.5, 0.0));
            root.add_child(dot);
        }
    }
    root
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let backend = make_backend(args.common.backend)?;
    let sink = SingleFramePng::new(args.frame, args.out.clone());
    let mut scene = Scene::new(scene_config(&args.common)?, backend, Box::new(sink))?;
    run_demo(args.common.scene, &mut scene)?;
    scene.finish()?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let backend = make_backend(args.common.backend)?;
    let sink = ThreadedSink::new(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(&args.out))));
    let mut scene = Scene::new(scene_config(&args.common)?, backend, Box::new(sink))?;
    run_demo(args.common.scene, &mut scene)?;
    scene.finish()?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let backend = make_backend(args.common.backend)?;
    let sink = ThreadedSink::new(Box::new(PngSequenceSink::new(
        &args.out_dir,
        args.prefix.clone(),
    )));
    let mut scene = Scene::new(scene_config(&args.common)?, backend, Box::new(sink))?;
    run_demo(args.common.scene, &mut scene)?;
    scene.finish()?;
    eprintln!("wrote PNG sequence to {}", args.out_dir.display());
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let tree = demo_tree(args.scene);
    let json = serde_json::to_string_pretty(&tree).context("serialize scene tree")?;
    println!("{json}");
    Ok(())
}

/// Sink that writes exactly one frame of the stream to a PNG.
struct SingleFramePng {
    target: u64,
    out: PathBuf,
    saved: bool,
    last_seen: Option<u64>,
}

impl SingleFramePng {
    fn new(target: u64, out: PathBuf) -> Self {
        Self {
            target,
            out,
            saved: false,
            last_seen: None,
        }
    }
}

impl FrameSink for SingleFramePng {
    fn begin(&mut self, _cfg: SinkConfig) -> kinema::KinemaResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> kinema::KinemaResult<()> {
        self.last_seen = Some(frame.index.0);
        if frame.index != FrameIndex(self.target) {
            return Ok(());
        }
        let mut flat = vec![0u8; frame.data.len()];
        flatten_premul_over_bg_to_opaque_rgba8(&mut flat, &frame.data, [0, 0, 0, 255])?;
        let img = image::RgbaImage::from_raw(frame.width, frame.height, flat)
            .ok_or_else(|| kinema::KinemaError::encode("frame buffer did not match dimensions"))?;
        img.save(&self.out).map_err(|e| {
            kinema::KinemaError::encode(format!("failed to write '{}': {e}", self.out.display()))
        })?;
        self.saved = true;
        Ok(())
    }

    fn end(&mut self) -> kinema::KinemaResult<()> {
        if !self.saved {
            return Err(kinema::KinemaError::encode(format!(
                "frame {} out of range (scene produced {} frames)",
                self.target,
                self.last_seen.map(|i| i + 1).unwrap_or(0)
            )));
        }
        Ok(())
    }
}
