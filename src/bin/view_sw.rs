use minifb::{Key, Window, WindowOptions};
use std::{
    f32::consts::FRAC_PI_2,
    path::Path,
    time::{Duration, Instant},
};

use anyhow::Context;
use glam::Vec3;
use log::info;
use simplelog::TermLogger;

use portalvis::{
    engine::{FrameContext, FrameStats, Screen},
    mapfile,
    renderer::{RendererExt, software::Software},
    world::{Camera, SectorGraph, demo},
};

const W: usize = 960;
const H: usize = 600;
const EYE_HEIGHT: f32 = 4.0;
const MOVE_SPEED: f32 = 0.15;
const TURN_SPEED: f32 = 0.04;

/// `arg` is a map file if one exists at that path, otherwise a demo name.
fn load(arg: &str) -> anyhow::Result<SectorGraph> {
    if Path::new(arg).is_file() {
        return mapfile::read_map(arg).with_context(|| format!("reading {arg}"));
    }
    demo::by_name(arg).with_context(|| {
        format!("`{arg}` is neither a map file nor a demo ({:?})", demo::NAMES)
    })
}

fn main() -> anyhow::Result<()> {
    TermLogger::init(
        log::LevelFilter::Info,
        simplelog::ConfigBuilder::default().build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let arg = std::env::args().nth(1).unwrap_or_else(|| "sky".into());
    let graph = load(&arg)?;
    info!(
        "map `{}`: {} sectors, {} walls, {} portals",
        graph.name,
        graph.sectors.len(),
        graph.walls.len(),
        graph.portal_count()
    );

    // demo maps all contain (5, 5) in sector 0; files start at the first
    // sector's first vertex nudged inwards
    let start = graph
        .locate_sector(glam::vec2(5.0, 5.0), None)
        .map(|_| glam::vec2(5.0, 5.0))
        .or_else(|| {
            let sec = graph.sectors.first()?;
            let pts: Vec<_> = sec
                .vertex_range()
                .map(|v| graph.vertices[v as usize].pos)
                .collect();
            Some(pts.iter().copied().sum::<glam::Vec2>() / pts.len().max(1) as f32)
        })
        .context("map has no sectors")?;

    let mut camera = Camera::new(start.extend(EYE_HEIGHT), 0.0, FRAC_PI_2);
    let mut ctx = FrameContext::default();
    let mut renderer = Software::default();
    let screen = Screen::new(W, H);
    let mut root = None;

    let mut win = Window::new("portalvis software view", W, H, WindowOptions::default())?;
    win.set_target_fps(60);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO; // cumulated visibility + render time
    let mut acc_frames = 0usize; // frames in the current window
    let mut last_print = Instant::now(); // when we printed last
    let mut last_stats = FrameStats::default();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now(); // ┌─ frame timer start

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
        if win.is_key_down(Key::Left) {
            camera.turn(TURN_SPEED);
        }
        if win.is_key_down(Key::Right) {
            camera.turn(-TURN_SPEED);
        }

        // refuse steps that leave the map
        let before = camera;
        camera.step(forward, side);
        if graph.locate_sector(camera.pos().truncate(), root).is_none() {
            camera = before;
        }

        /* visibility + draw ------------------------------------------------ */
        let frame = ctx.run_located(&graph, &camera, root, &screen);
        root = frame.root;
        last_stats = frame.stats;

        renderer.draw_visible(W, H, frame, |fb, w, h| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            if let Err(e) = win.update_with_buffer(fb, w, h) {
                log::error!("window update failed: {e}");
            }
        });

        // ─────────── report every ~3 s ────────────────────────────────────
        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            info!(
                "avg frame: {:.2} ms ({:.1} FPS)  sectors {}  walls {}  portals {}  max depth {}{}",
                avg_ms,
                1000.0 / avg_ms.max(1e-3),
                last_stats.sectors,
                last_stats.entries,
                last_stats.pushes,
                last_stats.max_depth,
                if last_stats.truncated { "  (truncated)" } else { "" }
            );
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
