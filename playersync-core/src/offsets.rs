//! Pairwise playback offsets between synced players
//!
//! `offset(a, b) = position(a) - position(b)` captured when a play event
//! anchors the synced group. A seek on `a` to absolute position `p` moves
//! `b` to `p - offset(a, b)`.

use std::collections::HashMap;

use crate::player::PlayerId;

/// Offsets keyed by ordered player pair, in microseconds
#[derive(Debug, Default)]
pub struct OffsetTable {
    offsets: HashMap<(PlayerId, PlayerId), i64>,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the offset between two players from positions sampled at the
    /// same instant. Writes both directions.
    pub fn capture(&mut self, a: &PlayerId, position_a: i64, b: &PlayerId, position_b: i64) {
        if a == b {
            return;
        }
        let Some((offset, inverse)) = position_a
            .checked_sub(position_b)
            .and_then(|offset| Some((offset, offset.checked_neg()?)))
        else {
            // Unusable positions: leave the pair unanchored
            tracing::warn!(
                "Offset {} -> {} out of range: {}us vs {}us",
                a,
                b,
                position_a,
                position_b
            );
            self.offsets.remove(&(a.clone(), b.clone()));
            self.offsets.remove(&(b.clone(), a.clone()));
            return;
        };
        self.offsets.insert((a.clone(), b.clone()), offset);
        self.offsets.insert((b.clone(), a.clone()), inverse);

        tracing::debug!("Offset {} -> {}: {}us", a, b, offset);
    }

    pub fn get(&self, from: &PlayerId, to: &PlayerId) -> Option<i64> {
        self.offsets.get(&(from.clone(), to.clone())).copied()
    }

    /// Drop every offset that mentions `player`
    pub fn purge(&mut self, player: &PlayerId) {
        self.offsets.retain(|(a, b), _| a != player && b != player);
    }

    /// Clear all state (playback stopped moving)
    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PlayerId {
        PlayerId::new(format!("org.mpris.MediaPlayer2.{}", name))
    }

    #[test]
    fn test_capture_is_antisymmetric() {
        let mut table = OffsetTable::new();
        table.capture(&id("a"), 10_000_000, &id("b"), 4_000_000);

        assert_eq!(table.get(&id("a"), &id("b")), Some(6_000_000));
        assert_eq!(table.get(&id("b"), &id("a")), Some(-6_000_000));
        assert_eq!(table.get(&id("a"), &id("c")), None);
    }

    #[test]
    fn test_out_of_range_positions_drop_the_pair() {
        let mut table = OffsetTable::new();
        table.capture(&id("a"), 10, &id("b"), 4);
        table.capture(&id("a"), i64::MIN, &id("b"), 1);

        assert_eq!(table.get(&id("a"), &id("b")), None);
        assert_eq!(table.get(&id("b"), &id("a")), None);

        // Difference fits but its inverse does not
        table.capture(&id("a"), i64::MIN, &id("b"), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_recapture_overwrites() {
        let mut table = OffsetTable::new();
        table.capture(&id("a"), 10, &id("b"), 4);
        table.capture(&id("b"), 100, &id("a"), 50);

        assert_eq!(table.get(&id("a"), &id("b")), Some(-50));
        assert_eq!(table.get(&id("b"), &id("a")), Some(50));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_self_offset_ignored() {
        let mut table = OffsetTable::new();
        table.capture(&id("a"), 10, &id("a"), 4);
        assert!(table.is_empty());
    }

    #[test]
    fn test_purge_removes_both_directions() {
        let mut table = OffsetTable::new();
        table.capture(&id("a"), 10, &id("b"), 4);
        table.capture(&id("a"), 10, &id("c"), 1);
        table.capture(&id("b"), 4, &id("c"), 1);

        table.purge(&id("a"));

        assert_eq!(table.get(&id("a"), &id("b")), None);
        assert_eq!(table.get(&id("c"), &id("a")), None);
        assert_eq!(table.get(&id("b"), &id("c")), Some(3));
        assert_eq!(table.len(), 2);
    }
}
