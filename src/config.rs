//! Per-frame work limits of the visibility pass.
//!
//! Every cap degrades gracefully: hitting one truncates the view (far
//! geometry goes missing) and is counted in `FrameStats`, it never fails the
//! frame.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct VisConfig {
    /// Deepest portal nesting that is still traversed (root = 0).
    pub max_depth: u16,
    /// Pending traversal frames held on the explicit stack.
    pub max_stack: usize,
    /// Sector passes per frame.
    pub max_sectors: usize,
    /// Wall segments inserted into the segment buffer per frame.
    pub max_wall_segments: usize,
    /// Child frames pushed per frame.
    pub max_portal_traversals: usize,
    /// Live entries in the segment buffer.
    pub max_entries: usize,
    /// Segments stored by the segment buffer during one sector pass.
    pub max_segments: usize,
    /// Disjoint column ranges remembered per portal per frame.
    pub max_visit_ranges: usize,
    /// Total window columns allocated per frame.
    pub max_window_columns: usize,
    /// Extra opening (map units) above shared sky / below shared pits.
    pub sky_pit_margin: f32,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_stack: 256,
            max_sectors: 1024,
            max_wall_segments: 8192,
            max_portal_traversals: 1024,
            max_entries: 1024,
            max_segments: 512,
            max_visit_ranges: 4,
            max_window_columns: 1 << 20,
            sky_pit_margin: 100.0,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),

    #[error("`sky_pit_margin` must be finite and non-negative, got {0}")]
    BadMargin(f32),

    #[error("`max_entries` ({0}) must allow at least 3 entries to split one")]
    TooFewEntries(usize),
}

impl VisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let caps: [(&'static str, usize); 9] = [
            ("max_depth", self.max_depth as usize),
            ("max_stack", self.max_stack),
            ("max_sectors", self.max_sectors),
            ("max_wall_segments", self.max_wall_segments),
            ("max_portal_traversals", self.max_portal_traversals),
            ("max_entries", self.max_entries),
            ("max_segments", self.max_segments),
            ("max_visit_ranges", self.max_visit_ranges),
            ("max_window_columns", self.max_window_columns),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero(name));
        }
        if self.max_entries < 3 {
            return Err(ConfigError::TooFewEntries(self.max_entries));
        }
        if !self.sky_pit_margin.is_finite() || self.sky_pit_margin < 0.0 {
            return Err(ConfigError::BadMargin(self.sky_pit_margin));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(VisConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_cap_is_named() {
        let cfg = VisConfig {
            max_stack: 0,
            ..VisConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Zero("max_stack")));
    }

    #[test]
    fn margin_must_be_finite() {
        let cfg = VisConfig {
            sky_pit_margin: f32::NAN,
            ..VisConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::BadMargin(_))));
    }
}
