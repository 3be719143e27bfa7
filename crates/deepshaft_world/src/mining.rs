//! # Mining Progress
//!
//! Partially mined tiles show cracks. The world only stores the visual
//! stage; the timing of a dig belongs to the caller.

use std::collections::HashMap;

use crate::chunk::TilePos;

/// Crack stage of a partially mined tile, `0..=3`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MiningStage(u8);

impl MiningStage {
    /// Untouched.
    pub const NONE: Self = Self(0);
    /// Last visible stage before the tile breaks.
    pub const MAX: Self = Self(3);

    /// Creates a stage, clamping to [`MiningStage::MAX`].
    #[inline]
    #[must_use]
    pub const fn new(stage: u8) -> Self {
        if stage > Self::MAX.0 {
            Self::MAX
        } else {
            Self(stage)
        }
    }

    /// Stage for a dig that is `progress` (0.0 to 1.0) complete.
    #[must_use]
    pub fn from_progress(progress: f32) -> Self {
        let stage = (progress.max(0.0) * 3.0).floor().min(3.0);
        Self::new(stage as u8)
    }

    /// Raw stage.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Stage as a fraction of a full dig.
    #[inline]
    #[must_use]
    pub fn progress(self) -> f32 {
        f32::from(self.0) / 3.0
    }
}

/// Sparse stage storage. Absent tiles are at [`MiningStage::NONE`].
#[derive(Clone, Debug, Default)]
pub struct BlockStateTracker {
    stages: HashMap<u64, MiningStage>,
}

impl BlockStateTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage at `pos`.
    #[must_use]
    pub fn get(&self, pos: TilePos) -> MiningStage {
        self.stages.get(&pos.pack()).copied().unwrap_or_default()
    }

    /// Sets the stage at `pos`. Setting [`MiningStage::NONE`] forgets the tile.
    pub fn set(&mut self, pos: TilePos, stage: MiningStage) {
        if stage == MiningStage::NONE {
            self.stages.remove(&pos.pack());
        } else {
            self.stages.insert(pos.pack(), stage);
        }
    }

    /// Forgets `pos`.
    pub fn clear(&mut self, pos: TilePos) {
        self.stages.remove(&pos.pack());
    }

    /// Keeps only tiles for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(TilePos) -> bool) {
        self.stages.retain(|&key, _| keep(TilePos::unpack(key)));
    }

    /// Number of tiles with a non-zero stage.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True when no tile is cracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_progress() {
        assert_eq!(MiningStage::from_progress(0.0), MiningStage::NONE);
        assert_eq!(MiningStage::from_progress(0.32).value(), 0);
        assert_eq!(MiningStage::from_progress(0.34).value(), 1);
        assert_eq!(MiningStage::from_progress(0.5).value(), 1);
        assert_eq!(MiningStage::from_progress(0.7).value(), 2);
        assert_eq!(MiningStage::from_progress(1.0), MiningStage::MAX);
        assert_eq!(MiningStage::from_progress(7.5), MiningStage::MAX);
        assert_eq!(MiningStage::from_progress(-1.0), MiningStage::NONE);
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(MiningStage::new(9), MiningStage::MAX);
        assert_eq!(MiningStage::new(2).value(), 2);
    }

    #[test]
    fn test_progress() {
        assert!((MiningStage::new(0).progress()).abs() < f32::EPSILON);
        assert!((MiningStage::new(3).progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tracker_defaults_to_zero() {
        let mut tracker = BlockStateTracker::new();
        let pos = TilePos::new(3, 4);
        assert_eq!(tracker.get(pos), MiningStage::NONE);

        tracker.set(pos, MiningStage::new(2));
        assert_eq!(tracker.get(pos).value(), 2);
        assert_eq!(tracker.len(), 1);

        tracker.clear(pos);
        assert_eq!(tracker.get(pos), MiningStage::NONE);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_setting_zero_forgets_tile() {
        let mut tracker = BlockStateTracker::new();
        tracker.set(TilePos::new(1, 1), MiningStage::new(1));
        tracker.set(TilePos::new(1, 1), MiningStage::NONE);
        assert!(tracker.is_empty());
    }
}
