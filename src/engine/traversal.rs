//! Portal traversal: walks the sector graph front-to-back from the camera's
//! sector, one segment-buffer pass per sector, pushing the sectors behind
//! open portals with a narrowed window.
//!
//! The walk is an explicit state machine over an explicit stack, so every
//! limit is a plain counter check. Hitting a limit truncates the view; the
//! frame itself always completes.

use log::{debug, trace, warn};

use crate::{
    config::{ConfigError, VisConfig},
    engine::{
        frame::{FrameOutput, PortalTraversal, RowSpan, SurfaceKind, VisibleWall},
        projection::project_wall,
        sbuffer::{InsertOutcome, SegmentBuffer},
        segment::{Aperture, Segment, SegmentKind},
        types::{ColumnRange, Screen, Viewer},
        visited::PortalVisits,
        window::{ColumnClip, Narrowed, WindowId, WindowPool},
    },
    world::{Camera, SectorFlags, SectorGraph, SectorId, WallId},
};

/// One pending sector pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalFrame {
    pub sector: SectorId,
    pub parent: Option<SectorId>,
    /// Portal the sector is seen through (`None` for the root).
    pub portal: Option<WallId>,
    pub window: WindowId,
    pub depth: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Init,
    ProcessSector,
    ProcessWalls(TraversalFrame),
    ResolvePortals(TraversalFrame),
    Done,
}

/// Frame-constant inputs of one run.
struct Pass<'a> {
    graph: &'a SectorGraph,
    cam: &'a Camera,
    screen: Screen,
    view: Viewer,
    root: SectorId,
}

/// Owns every per-frame scratch structure. Reuse one context across frames:
/// storage is reset, not reallocated.
pub struct FrameContext {
    config: VisConfig,
    buffer: SegmentBuffer,
    visits: PortalVisits,
    stack: Vec<TraversalFrame>,
    children: Vec<TraversalFrame>,
    resolved: Vec<(ColumnRange, Segment)>,
    /// The sector/wall work budget already cut this frame short.
    work_cut: bool,
    output: FrameOutput,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::with_config(VisConfig::default())
    }
}

impl FrameContext {
    pub fn new(config: VisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: VisConfig) -> Self {
        let output = FrameOutput {
            windows: WindowPool::new(config.max_window_columns),
            ..FrameOutput::default()
        };
        Self {
            buffer: SegmentBuffer::new(config.max_entries, config.max_segments),
            visits: PortalVisits::new(config.max_visit_ranges),
            stack: Vec::with_capacity(config.max_stack),
            children: Vec::new(),
            resolved: Vec::new(),
            work_cut: false,
            output,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &VisConfig {
        &self.config
    }

    /// Result of the last run.
    #[inline]
    pub fn output(&self) -> &FrameOutput {
        &self.output
    }

    /// Place the camera with [`SectorGraph::locate_sector`] (trying `hint`
    /// first) and run a frame from there. A camera outside every sector
    /// yields an empty frame.
    pub fn run_located(
        &mut self,
        graph: &SectorGraph,
        cam: &Camera,
        hint: Option<SectorId>,
        screen: &Screen,
    ) -> &FrameOutput {
        match graph.locate_sector(cam.pos().truncate(), hint) {
            Some(root) => self.run(graph, cam, root, screen),
            None => {
                warn!("camera at {:?} is outside every sector", cam.pos());
                self.empty_frame()
            }
        }
    }

    /// Compute visibility for one frame with the camera standing in `root`.
    pub fn run(
        &mut self,
        graph: &SectorGraph,
        cam: &Camera,
        root: SectorId,
        screen: &Screen,
    ) -> &FrameOutput {
        let Some(root_sec) = graph.sector(root) else {
            warn!(
                "root sector {root} out of range ({} sectors)",
                graph.sectors.len()
            );
            return self.empty_frame();
        };
        let pass = Pass {
            graph,
            cam,
            screen: *screen,
            view: Viewer::new(cam, screen, root_sec.floor_h),
            root,
        };

        let mut phase = Phase::Init;
        loop {
            phase = match phase {
                Phase::Init => self.init(&pass),
                Phase::ProcessSector => self.next_sector(),
                Phase::ProcessWalls(f) => self.process_walls(&pass, f),
                Phase::ResolvePortals(f) => self.resolve_portals(&pass, f),
                Phase::Done => break,
            };
        }

        self.finish();
        &self.output
    }

    fn empty_frame(&mut self) -> &FrameOutput {
        self.visits.begin_frame(0);
        self.output.clear();
        self.output.stats.frame = self.visits.frame();
        &self.output
    }

    /*──────────────────────────── phases ───────────────────────────*/

    fn init(&mut self, pass: &Pass) -> Phase {
        self.output.clear();
        self.visits.begin_frame(pass.graph.walls.len());
        self.stack.clear();
        self.work_cut = false;

        let out = &mut self.output;
        out.root = Some(pass.root);
        out.stats.frame = self.visits.frame();
        let window = out.windows.root(&pass.screen);
        self.stack.push(TraversalFrame {
            sector: pass.root,
            parent: None,
            portal: None,
            window,
            depth: 0,
        });
        out.stats.pushes = 1;
        Phase::ProcessSector
    }

    fn next_sector(&mut self) -> Phase {
        let cfg = &self.config;
        let stats = &mut self.output.stats;
        if stats.sectors >= cfg.max_sectors || stats.segments_projected >= cfg.max_wall_segments {
            if !self.stack.is_empty() && !self.work_cut {
                self.work_cut = true;
                stats.budget_truncations += 1;
                stats.truncated = true;
                debug!(
                    "frame {}: work budget spent, {} sector passes left unprocessed",
                    stats.frame,
                    self.stack.len()
                );
            }
            return Phase::Done;
        }

        match self.stack.pop() {
            None => Phase::Done,
            Some(f) => {
                stats.pops += 1;
                stats.sectors += 1;
                stats.max_depth = stats.max_depth.max(f.depth);
                Phase::ProcessWalls(f)
            }
        }
    }

    fn process_walls(&mut self, pass: &Pass, f: TraversalFrame) -> Phase {
        let Some(sector) = pass.graph.sector(f.sector) else {
            return Phase::ProcessSector;
        };
        let domain = self.output.windows.range(f.window);
        self.buffer.reset(domain);
        trace!(
            "sector {} depth {} via {:?} window {:?}",
            f.sector, f.depth, f.portal, domain
        );

        let stats = &mut self.output.stats;
        for (wall_id, _) in pass.graph.walls_of(sector) {
            if stats.segments_projected >= self.config.max_wall_segments {
                self.work_cut = true;
                stats.budget_truncations += 1;
                stats.truncated = true;
                debug!("frame {}: wall segment budget spent", stats.frame);
                break;
            }
            let Some(seg) = project_wall(
                pass.graph,
                wall_id,
                pass.cam,
                &pass.screen,
                &pass.view,
                self.config.sky_pit_margin,
            ) else {
                stats.walls_culled += 1;
                continue;
            };

            stats.segments_projected += 1;
            match self.buffer.insert(seg) {
                InsertOutcome::Inserted => stats.segments_inserted += 1,
                InsertOutcome::Occluded => stats.segments_occluded += 1,
                InsertOutcome::Rejected => stats.walls_culled += 1,
                InsertOutcome::Dropped => {
                    stats.segments_dropped += 1;
                    stats.truncated = true;
                    debug!(
                        "frame {}: segment buffer full in sector {}, wall {wall_id} dropped",
                        stats.frame, f.sector
                    );
                }
            }
        }

        self.buffer.merge_adjacent();
        Phase::ResolvePortals(f)
    }

    fn resolve_portals(&mut self, pass: &Pass, f: TraversalFrame) -> Phase {
        let Some(sector) = pass.graph.sector(f.sector) else {
            return Phase::ProcessSector;
        };

        let mut resolved = std::mem::take(&mut self.resolved);
        resolved.clear();
        resolved.extend(
            self.buffer
                .entries()
                .filter_map(|e| e.segment.map(|s| (e.range, *s))),
        );

        self.children.clear();
        for &(range, seg) in &resolved {
            let view = &pass.view;
            let first = range.x0 as f32 + 0.5;
            let last = range.x1 as f32 - 0.5;
            let inv_z = (seg.inv_z_at(first), seg.inv_z_at(last));
            let rows = |h: f32| RowSpan {
                l: view.row(h, inv_z.0),
                r: view.row(h, inv_z.1),
            };

            let kind = match seg.kind {
                SegmentKind::Solid => SurfaceKind::Solid,
                SegmentKind::Portal { next, aperture } => {
                    let child = self.try_enter(pass, &f, &seg, range, next, aperture);
                    let steps = pass
                        .graph
                        .sector(next)
                        .is_some_and(|s| !s.flags.contains(SectorFlags::NO_WALL_DRAW));
                    SurfaceKind::Portal {
                        next,
                        open_top: rows(aperture.top),
                        open_bottom: rows(aperture.bottom),
                        steps,
                        child,
                    }
                }
            };

            self.output.walls.push(VisibleWall {
                sector: f.sector,
                wall: seg.wall,
                depth: f.depth,
                window: f.window,
                columns: range,
                p_l: seg.point_at(range.x0 as f32),
                p_r: seg.point_at(range.x1 as f32),
                inv_z,
                u_over_z: (seg.u_over_z_at(first), seg.u_over_z_at(last)),
                ceiling: rows(sector.ceil_h),
                floor: rows(sector.floor_h),
                light: sector.light,
                kind,
            });
        }
        self.resolved = resolved;

        // leftmost child is processed first
        self.stack.extend(self.children.drain(..).rev());
        Phase::ProcessSector
    }

    /// Decide whether the sector behind one portal entry is entered and, if
    /// so, queue it. Returns the child's window.
    fn try_enter(
        &mut self,
        pass: &Pass,
        f: &TraversalFrame,
        seg: &Segment,
        range: ColumnRange,
        next: SectorId,
        aperture: Aperture,
    ) -> Option<WindowId> {
        let cfg = &self.config;
        let stats = &mut self.output.stats;
        let depth = f.depth + 1;
        if depth > cfg.max_depth {
            stats.depth_truncations += 1;
            stats.truncated = true;
            trace!("portal {} {range:?}: depth cap", seg.wall);
            return None;
        }
        if self.visits.is_visited(seg.wall, range) {
            stats.portals_revisited += 1;
            trace!("portal {} {range:?}: already traversed", seg.wall);
            return None;
        }

        let view = pass.view;
        let window = match self.output.windows.narrow(f.window, range, |x| {
            opening_clip(&view, seg, aperture, x)
        }) {
            Narrowed::Open(id) => id,
            Narrowed::Closed => {
                self.output.stats.portals_closed += 1;
                trace!("portal {} {range:?}: closed", seg.wall);
                return None;
            }
            Narrowed::Exhausted => {
                self.visits.mark_visited(seg.wall, range);
                let stats = &mut self.output.stats;
                stats.windows_dropped += 1;
                stats.truncated = true;
                debug!("frame {}: window pool full at portal {}", stats.frame, seg.wall);
                return None;
            }
        };
        self.visits.mark_visited(seg.wall, range);

        let stats = &mut self.output.stats;
        if self.output.portals.len() >= cfg.max_portal_traversals {
            stats.budget_truncations += 1;
            stats.truncated = true;
            debug!("frame {}: portal traversal budget spent", stats.frame);
            return None;
        }
        if self.stack.len() + self.children.len() >= cfg.max_stack {
            stats.stack_truncations += 1;
            stats.truncated = true;
            debug!("frame {}: traversal stack full", stats.frame);
            return None;
        }

        trace!(
            "portal {} {range:?}: enter sector {next} at depth {depth}",
            seg.wall
        );
        self.children.push(TraversalFrame {
            sector: next,
            parent: Some(f.sector),
            portal: Some(seg.wall),
            window,
            depth,
        });
        self.output.portals.push(PortalTraversal {
            portal: seg.wall,
            from: f.sector,
            to: next,
            range,
            parent_window: f.window,
            window,
            depth,
        });
        stats.pushes += 1;
        Some(window)
    }

    fn finish(&mut self) {
        let stats = &mut self.output.stats;
        stats.entries = self.output.walls.len();
        debug!(
            "frame {}: {} sectors, {} walls, {} portals, {} pushed / {} popped, depth {}{}",
            stats.frame,
            stats.sectors,
            stats.entries,
            self.output.portals.len(),
            stats.pushes,
            stats.pops,
            stats.max_depth,
            if stats.truncated { " (truncated)" } else { "" }
        );
    }
}

/// Rows of a portal's opening under column `x`.
pub fn opening_clip(view: &Viewer, seg: &Segment, aperture: Aperture, x: i32) -> ColumnClip {
    let inv_z = seg.inv_z_at(x as f32 + 0.5);
    ColumnClip::from_rows(view.row(aperture.top, inv_z), view.row(aperture.bottom, inv_z))
}
