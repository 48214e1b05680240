mod frame;
mod projection;
mod sbuffer;
mod segment;
mod traversal;
mod types;
mod visited;
mod window;

pub use frame::{FrameOutput, FrameStats, PortalTraversal, RowSpan, SurfaceKind, VisibleWall};
pub use projection::{portal_aperture, project_wall};
pub use sbuffer::{BufferEntry, BufferStats, InsertOutcome, SegmentBuffer};
pub use segment::{Aperture, SIDE_EPSILON, Segment, SegmentKind, crossing_column, in_front};
pub use traversal::{FrameContext, TraversalFrame, opening_clip};
pub use types::{ColumnRange, Screen, Viewer};
pub use visited::PortalVisits;
pub use window::{ColumnClip, Narrowed, WindowId, WindowPool};
