//! Spins a few lit shapes in the terminal.
//!
//! cargo run --release -- --shading phong

use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, event, queue};
use std::process::ExitCode;
use std::thread::sleep;
use std::time::{Duration, Instant};
use teng3d::lighting::{Attenuation, Light};
use teng3d::math::Vec3;
use teng3d::scene::camera::Camera;
use teng3d::scene::mesh::Material;
use teng3d::scene::node::SceneNode;
use teng3d::scene::{NodeId, SceneGraph, shapes};
use teng3d::util::FixedUpdateRunner;
use teng3d::{CustomBufWriter, RenderConfig, Renderer, ShadingMode};

/// Rate at which the animation advances, independent of the frame rate.
const ANIMATION_RATE: f64 = 120.0;

#[derive(Parser, Debug)]
#[command(version, about = "Spinning lit shapes, rendered in the terminal")]
struct Args {
    /// Output width in characters, defaults to the terminal width.
    #[arg(long)]
    columns: Option<usize>,
    /// Output height in characters, defaults to the terminal height.
    #[arg(long)]
    rows: Option<usize>,
    /// wireframe, flat or phong.
    #[arg(short, long, default_value_t = ShadingMode::Flat)]
    shading: ShadingMode,
    /// Frame rate limit.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
    /// Draw triangles facing away from the camera too.
    #[arg(long)]
    no_culling: bool,
}

/// Nodes the animation moves.
struct Animated {
    cube: NodeId,
    pivot: NodeId,
}

impl Animated {
    fn step(&self, scene: &mut SceneGraph, dt: f64) {
        if let Some(cube) = scene.node_mut(self.cube) {
            cube.rotate_by(Vec3::new(0.4, 0.7, 0.0) * dt);
        }
        if let Some(pivot) = scene.node_mut(self.pivot) {
            pivot.rotate_by(Vec3::new(0.0, 0.5, 0.0) * dt);
        }
    }
}

fn build_scene() -> teng3d::Result<(SceneGraph, Animated)> {
    let mut scene = SceneGraph::new();
    let root = scene.root();

    scene.spawn(
        root,
        SceneNode::new("floor")
            .with_mesh(shapes::plane(8.0, 8.0, [90, 90, 100]))
            .with_position(Vec3::new(0.0, -1.2, 0.0)),
    )?;
    let cube = scene.spawn(
        root,
        SceneNode::new("cube").with_mesh(shapes::cube(1.3, [220, 90, 60])),
    )?;

    // the moon and its lamp orbit the cube together
    let pivot = scene.spawn(root, SceneNode::new("pivot"))?;
    let moon = shapes::uv_sphere(0.45, 20, 14, [80, 140, 230]).with_material(Material {
        color: [80, 140, 230],
        specular: 0.8,
        shininess: 48.0,
        shading: None,
    });
    scene.spawn(
        pivot,
        SceneNode::new("moon")
            .with_mesh(moon)
            .with_position(Vec3::new(2.2, 0.0, 0.0)),
    )?;
    scene.spawn(
        pivot,
        SceneNode::new("lamp")
            .with_light(
                Light::point(Vec3::ZERO, [255, 200, 140], 1.5).with_attenuation(Attenuation::new(1.0, 0.2, 0.05)?),
            )
            .with_position(Vec3::new(1.6, 1.0, 0.8)),
    )?;

    scene.spawn(
        root,
        SceneNode::new("sun").with_light(Light::directional(
            Vec3::new(-0.4, -1.0, -0.3),
            [255, 255, 240],
            0.6,
        )),
    )?;
    scene.spawn(
        root,
        SceneNode::new("spot").with_light(Light::spot(
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            [120, 255, 160],
            1.2,
            12.0,
            25.0,
        )?),
    )?;

    Ok((scene, Animated { cube, pivot }))
}

fn next_shading(mode: ShadingMode) -> ShadingMode {
    match mode {
        ShadingMode::Wireframe => ShadingMode::Flat,
        ShadingMode::Flat => ShadingMode::Phong,
        ShadingMode::Phong => ShadingMode::Wireframe,
    }
}

fn run(args: &Args, renderer: &mut Renderer, scene: &mut SceneGraph, animated: &Animated) -> teng3d::Result<()> {
    let camera = Camera::looking_at(Vec3::new(0.0, 1.8, 5.5), Vec3::new(0.0, -0.2, 0.0), Vec3::Y)?;
    let mut sink = CustomBufWriter::new();
    let frame_time = Duration::from_secs_f64(1.0 / args.fps.max(1.0));
    let mut animation = FixedUpdateRunner::new_from_rate_per_second(ANIMATION_RATE);
    let mut paused = false;
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                    KeyCode::Char('s') => {
                        let mode = next_shading(renderer.config().shading);
                        log::info!("switching to {mode} shading");
                        renderer.set_shading(mode);
                    }
                    KeyCode::Char(' ') => paused = !paused,
                    _ => {}
                },
                Event::Resize(columns, rows) => {
                    let columns = args.columns.unwrap_or(columns as usize);
                    let rows = args.rows.unwrap_or(rows as usize);
                    renderer.resize(columns, rows)?;
                }
                _ => {}
            }
        }

        let dt = last_frame.elapsed().as_secs_f64();
        last_frame = Instant::now();
        if !paused {
            animation.fuel(dt);
        }
        while animation.has_gas() {
            animation.consume();
            animated.step(scene, animation.fixed_dt());
        }

        queue!(sink, cursor::MoveTo(0, 0))?;
        renderer.render_to(scene, &camera, &mut sink)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            sleep(frame_time - elapsed);
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let (columns, rows) = match crossterm::terminal::size() {
        Ok((columns, rows)) => (columns as usize, rows as usize),
        Err(err) => {
            log::warn!("could not query terminal size: {err}");
            (80, 24)
        }
    };
    let config = RenderConfig {
        columns: args.columns.unwrap_or(columns),
        rows: args.rows.unwrap_or(rows),
        shading: args.shading,
        backface_culling: !args.no_culling,
        ..RenderConfig::default()
    };

    let setup = Renderer::new(config).and_then(|renderer| Ok((renderer, build_scene()?)));
    let (mut renderer, (mut scene, animated)) = match setup {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = teng3d::terminal_setup() {
        // setup may have stopped halfway, e.g. after entering the alternate screen
        let _ = teng3d::terminal_cleanup();
        eprintln!("error: could not set up the terminal: {err}");
        return ExitCode::FAILURE;
    }
    teng3d::install_panic_handler();

    let result = run(&args, &mut renderer, &mut scene, &animated);

    if let Err(err) = teng3d::terminal_cleanup() {
        eprintln!("error: could not restore the terminal: {err}");
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
