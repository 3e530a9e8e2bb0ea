use clap::{Parser, ValueEnum};
use glam::Vec3;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::time::{Duration, Instant};

use yaportal_rs::{
    engine::{DrawFlags, Engine, RenderConfig},
    renderer::{BlendMode, Software},
    world::{Camera, Level, TextureBank, fixtures},
};

const MOVE_SPEED: f32 = 0.08;
const TURN_SPEED: f32 = 0.04;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Map {
    /// Cubes stacked along one axis
    Row,
    /// Four cubes joined in a loop
    Ring,
    /// Hexagonal hall with side corridors
    Hall,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Blend {
    Replace,
    And,
    Or,
    Xor,
    Flat,
}

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about = "Software portal renderer viewer")]
struct Opts {
    #[arg(long, value_enum, default_value = "row")]
    map: Map,

    /// Number of cubes for `--map row`
    #[arg(long, default_value_t = 6)]
    cubes: usize,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 90.0)]
    fov: f32,

    /// Maximum portal recursion depth
    #[arg(long, default_value_t = yaportal_rs::engine::MAX_PORTAL_DEPTH)]
    max_depth: u32,

    #[arg(long, value_enum, default_value = "replace")]
    blend: Blend,

    /// Do not draw cell edges
    #[arg(long)]
    no_edges: bool,

    /// Outline every visible portal
    #[arg(long)]
    outlines: bool,
}

impl Opts {
    fn config(&self) -> RenderConfig {
        let mut draw = DrawFlags::WALLS;
        draw.set(DrawFlags::EDGES, !self.no_edges);
        draw.set(DrawFlags::PORTAL_OUTLINES, self.outlines);
        RenderConfig {
            width: self.width,
            height: self.height,
            fov: self.fov.to_radians(),
            max_depth: self.max_depth,
            blend: match self.blend {
                Blend::Replace => BlendMode::Replace,
                Blend::And => BlendMode::And,
                Blend::Or => BlendMode::Or,
                Blend::Xor => BlendMode::Xor,
                Blend::Flat => BlendMode::Colour(0xFF_6080A0),
            },
            draw,
            ..RenderConfig::default()
        }
    }

    fn level(&self, bank: &TextureBank) -> anyhow::Result<(Level, Vec3)> {
        let textures: Vec<_> = bank.ids().collect();
        Ok(match self.map {
            Map::Row => (
                fixtures::cube_row(self.cubes.max(1), 2.0, &textures)?,
                Vec3::new(0.0, 0.0, 0.5),
            ),
            Map::Ring => (
                fixtures::cube_ring(2.0, &textures)?,
                Vec3::new(1.0, 0.0, 1.0),
            ),
            Map::Hall => (
                fixtures::polygon_hall(6, 4.0, &textures)?,
                Vec3::ZERO,
            ),
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();
    let config = opts.config();

    let bank = TextureBank::procedural()?;
    let (level, start) = opts.level(&bank)?;
    let cell = level
        .locate(0, start)
        .ok_or_else(|| anyhow::anyhow!("start position {start} is outside `{}`", level.name))?;
    log::info!("level `{}`: {} cells", level.name, level.len());

    let camera = Camera::new(start, 0.0, cell);
    let (w, h) = (config.width, config.height);
    let mut engine = Engine::new(Software::default(), level, camera, bank, config);

    let mut win = Window::new("Portal Software Render", w, h, WindowOptions::default())?;
    win.set_target_fps(60);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* movement --------------------------------------------------------- */
        let mut forward = 0.0;
        let mut side = 0.0;
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            forward += MOVE_SPEED;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            forward -= MOVE_SPEED;
        }
        if win.is_key_down(Key::A) {
            side -= MOVE_SPEED;
        }
        if win.is_key_down(Key::D) {
            side += MOVE_SPEED;
        }
        if forward != 0.0 || side != 0.0 {
            engine.step_camera(forward, side);
        }

        if win.is_key_down(Key::Left) {
            engine.camera.turn(TURN_SPEED);
        }
        if win.is_key_down(Key::Right) {
            engine.camera.turn(-TURN_SPEED);
        }
        if win.is_key_down(Key::PageUp) {
            engine.camera.look(TURN_SPEED);
        }
        if win.is_key_down(Key::PageDown) {
            engine.camera.look(-TURN_SPEED);
        }

        /* toggles ---------------------------------------------------------- */
        if win.is_key_pressed(Key::E, KeyRepeat::No) {
            engine.config.draw.toggle(DrawFlags::EDGES);
        }
        if win.is_key_pressed(Key::O, KeyRepeat::No) {
            engine.config.draw.toggle(DrawFlags::PORTAL_OUTLINES);
        }

        /* draw */
        let mut present = Ok(());
        let stats = engine.render_frame(|fb, w, h| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            present = win.update_with_buffer(fb, w, h);
        });
        present?;

        if stats.arena_overflows > 0 {
            log::warn!("{} branches dropped: span arena too small", stats.arena_overflows);
        }

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            let fps = 1000.0 / avg_ms;
            log::info!("avg render: {avg_ms:.2} ms ({fps:.1} FPS) | {stats}");
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
