//! vis_tool - inspect portal visibility of a sector map from the command line.
//!
//! USAGE:
//! ```bash
//! cargo run --bin vis_tool -- demo two_rooms -o two_rooms.sgr
//! cargo run --bin vis_tool -- trace two_rooms.sgr --x 5 --y 5 --yaw 0
//! cargo run --bin vis_tool -- trace --demo loop --max-depth 8 -vv
//! ```

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use glam::Vec3;
use log::info;
use simplelog::TermLogger;

use portalvis::{
    config::VisConfig,
    engine::{FrameContext, FrameOutput, Screen, SurfaceKind},
    mapfile,
    world::{Camera, SectorGraph, demo},
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Write one of the built-in demo maps to a file
    Demo {
        /// Demo name (room, two_rooms, closed_step, loop, occluder, sky)
        name: String,

        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Run one visibility frame and print what it found
    Trace(TraceArgs),
}

#[derive(Args, Debug)]
struct TraceArgs {
    /// Map file written by `demo` or `mapfile::write_map`
    #[arg(value_name = "FILE", required_unless_present = "demo")]
    map: Option<PathBuf>,

    /// Use a built-in demo map instead of a file
    #[arg(long, conflicts_with = "map")]
    demo: Option<String>,

    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    x: f32,
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    y: f32,
    /// Eye height above the floor of the camera's sector
    #[arg(long, default_value_t = 4.0)]
    z: f32,
    /// Heading in degrees, 0 = +x, counter-clockwise
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    yaw: f32,
    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 90.0)]
    fov: f32,

    #[arg(long, default_value_t = 320)]
    width: usize,
    #[arg(long, default_value_t = 200)]
    height: usize,

    #[command(flatten)]
    caps: CapArgs,
}

/// Overrides for the per-frame caps; unset flags keep the defaults.
#[derive(Args, Debug, Default)]
struct CapArgs {
    #[arg(long)]
    max_depth: Option<u16>,
    #[arg(long)]
    max_stack: Option<usize>,
    #[arg(long)]
    max_sectors: Option<usize>,
    #[arg(long)]
    max_wall_segments: Option<usize>,
    #[arg(long)]
    max_portal_traversals: Option<usize>,
    #[arg(long)]
    max_entries: Option<usize>,
    #[arg(long)]
    max_segments: Option<usize>,
    #[arg(long)]
    max_visit_ranges: Option<usize>,
    #[arg(long)]
    max_window_columns: Option<usize>,
    #[arg(long)]
    sky_pit_margin: Option<f32>,
}

impl CapArgs {
    fn apply(&self, mut cfg: VisConfig) -> VisConfig {
        macro_rules! set {
            ($($f:ident),*) => { $( if let Some(v) = self.$f { cfg.$f = v; } )* };
        }
        set!(
            max_depth,
            max_stack,
            max_sectors,
            max_wall_segments,
            max_portal_traversals,
            max_entries,
            max_segments,
            max_visit_ranges,
            max_window_columns,
            sky_pit_margin
        );
        cfg
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let level = match opts.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    match opts.cmd {
        Cmd::Demo { name, out } => {
            let Some(graph) = demo::by_name(&name) else {
                bail!("unknown demo `{name}`, try one of {:?}", demo::NAMES);
            };
            mapfile::write_map(&out, &graph)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(
                "wrote `{}` ({} sectors, {} walls) to {}",
                graph.name,
                graph.sectors.len(),
                graph.walls.len(),
                out.display()
            );
        }
        Cmd::Trace(args) => trace(&args)?,
    }
    Ok(())
}

fn load(args: &TraceArgs) -> anyhow::Result<SectorGraph> {
    if let Some(name) = &args.demo {
        return demo::by_name(name).with_context(|| format!("unknown demo `{name}`"));
    }
    let Some(path) = &args.map else {
        bail!("no map file given");
    };
    mapfile::read_map(path).with_context(|| format!("reading {}", path.display()))
}

fn trace(args: &TraceArgs) -> anyhow::Result<()> {
    let graph = load(args)?;
    let config = args.caps.apply(VisConfig::default());
    let mut ctx = FrameContext::new(config)?;

    let cam = Camera::new(
        Vec3::new(args.x, args.y, args.z),
        args.yaw.to_radians(),
        args.fov.to_radians(),
    );
    let screen = Screen::new(args.width, args.height);

    let out = ctx.run_located(&graph, &cam, None, &screen);
    if out.root.is_none() {
        bail!("camera ({}, {}) is outside every sector of `{}`", args.x, args.y, graph.name);
    }
    print_frame(out);
    Ok(())
}

fn print_frame(out: &FrameOutput) {
    println!("walls (front-to-back per pass):");
    for w in &out.walls {
        let kind = match w.kind {
            SurfaceKind::Solid => "solid".to_string(),
            SurfaceKind::Portal {
                next, steps, child, ..
            } => match child {
                Some(win) => format!("portal -> {next} (window {win}, steps {steps})"),
                None => format!("portal -> {next} (not entered, steps {steps})"),
            },
        };
        println!(
            "  depth {:>2}  sector {:>3}  wall {:>4}  cols {:?}  {kind}",
            w.depth, w.sector, w.wall, w.columns
        );
    }

    println!("portal traversals:");
    for p in &out.portals {
        println!(
            "  depth {:>2}  wall {:>4}  {} -> {}  cols {:?}  window {} in {}",
            p.depth, p.portal, p.from, p.to, p.range, p.window, p.parent_window
        );
    }

    println!("stats: {:#?}", out.stats);
}
