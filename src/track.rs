//! Lane colour palettes and the captured track topology.
//!
//! Each supported lane count has a fixed colour order, matching the lane
//! markings used on club tracks.  Lane colours double as hostname suffixes
//! so every logger on a track gets a distinct, human-readable name.

use crate::error::SessionError;

/// Smallest lane count with a palette.
pub const MIN_PALETTE_LANES: u8 = 4;
/// Largest lane count the capture accepts (and the largest palette).
pub const MAX_LANES: u8 = 8;

const PALETTE_4: &[&str] = &["red", "white", "blue", "black"];
const PALETTE_5: &[&str] = &["red", "blue", "white", "yellow", "black"];
const PALETTE_6: &[&str] = &["red", "white", "green", "blue", "yellow", "black"];
const PALETTE_7: &[&str] = &["red", "white", "green", "orange", "blue", "yellow", "black"];
const PALETTE_8: &[&str] = &[
    "red", "white", "green", "orange", "blue", "yellow", "purple", "black",
];

/// Colour palette for `lane_count` lanes, or `None` when no palette exists.
pub fn palette(lane_count: u8) -> Option<&'static [&'static str]> {
    match lane_count {
        4 => Some(PALETTE_4),
        5 => Some(PALETTE_5),
        6 => Some(PALETTE_6),
        7 => Some(PALETTE_7),
        8 => Some(PALETTE_8),
        _ => None,
    }
}

/// Lane layout captured from the operator at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTopology {
    lane_count: u8,
    my_lane: u8,
    colour: &'static str,
}

impl TrackTopology {
    /// Resolve the lane colour from the palette table.
    ///
    /// `my_lane` is 1-based and must lie in `1..=lane_count`; the capture
    /// bounds guarantee this, so an out-of-range lane is reported with the
    /// same error as an unsupported lane count.
    pub fn from_capture(lane_count: u8, my_lane: u8) -> Result<Self, SessionError> {
        let palette = palette(lane_count).ok_or(SessionError::UnsupportedLaneCount(lane_count))?;
        if my_lane == 0 || my_lane > lane_count {
            return Err(SessionError::UnsupportedLaneCount(lane_count));
        }
        Ok(Self {
            lane_count,
            my_lane,
            colour: palette[(my_lane - 1) as usize],
        })
    }

    pub fn lane_count(&self) -> u8 {
        self.lane_count
    }

    pub fn my_lane(&self) -> u8 {
        self.my_lane
    }

    pub fn colour(&self) -> &'static str {
        self.colour
    }

    /// The full palette this topology was resolved from.
    pub fn palette(&self) -> &'static [&'static str] {
        palette(self.lane_count).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_length_matches_lane_count() {
        for lanes in MIN_PALETTE_LANES..=MAX_LANES {
            assert_eq!(palette(lanes).map(<[_]>::len), Some(lanes as usize));
        }
    }

    #[test]
    fn small_tracks_have_no_palette() {
        for lanes in 0..MIN_PALETTE_LANES {
            assert!(palette(lanes).is_none());
        }
        assert!(palette(9).is_none());
    }

    #[test]
    fn palette_colours_are_unique() {
        for lanes in MIN_PALETTE_LANES..=MAX_LANES {
            let p = palette(lanes).unwrap();
            for (i, a) in p.iter().enumerate() {
                assert!(!p[i + 1..].contains(a), "{a} repeated in {lanes}-lane palette");
            }
        }
    }

    #[test]
    fn lane_three_of_six_is_green() {
        let t = TrackTopology::from_capture(6, 3).unwrap();
        assert_eq!(t.colour(), "green");
        assert_eq!(t.lane_count(), 6);
        assert_eq!(t.my_lane(), 3);
    }

    #[test]
    fn lane_count_without_palette_is_rejected() {
        assert_eq!(
            TrackTopology::from_capture(3, 1),
            Err(SessionError::UnsupportedLaneCount(3))
        );
    }

    #[test]
    fn lane_outside_track_is_rejected() {
        assert!(TrackTopology::from_capture(4, 5).is_err());
        assert!(TrackTopology::from_capture(4, 0).is_err());
    }
}
