//! Hazard classification: label to hazard type, box to lane and distance band
//!
//! Everything here is a pure function of its arguments and safe to call from
//! any thread.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CENTER_BAND: f32 = 0.34;
pub const DEFAULT_NEAR_RATIO: f32 = 0.12;
pub const DEFAULT_MID_RATIO: f32 = 0.04;

/// Danger category announced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Vehicle,
    Bike,
    Dog,
    Pole,
    Bench,
    Cone,
    Wall,
    Person,
    StairLike,
    DropoffLike,
    Unknown,
}

impl HazardType {
    pub const ALL: [HazardType; 11] = [
        HazardType::Vehicle,
        HazardType::Bike,
        HazardType::Dog,
        HazardType::Pole,
        HazardType::Bench,
        HazardType::Cone,
        HazardType::Wall,
        HazardType::Person,
        HazardType::StairLike,
        HazardType::DropoffLike,
        HazardType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::Vehicle => "vehicle",
            HazardType::Bike => "bike",
            HazardType::Dog => "dog",
            HazardType::Pole => "pole",
            HazardType::Bench => "bench",
            HazardType::Cone => "cone",
            HazardType::Wall => "wall",
            HazardType::Person => "person",
            HazardType::StairLike => "stair_like",
            HazardType::DropoffLike => "dropoff_like",
            HazardType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal zone relative to the direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Left,
    Center,
    Right,
}

/// Coarse range estimate from the box-area ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    Near,
    Mid,
    Far,
}

// Detector vocabulary (COCO plus common open-vocabulary street labels)
const HAZARD_TABLE: &[(&str, HazardType)] = &[
    ("car", HazardType::Vehicle),
    ("truck", HazardType::Vehicle),
    ("bus", HazardType::Vehicle),
    ("motorcycle", HazardType::Vehicle),
    ("train", HazardType::Vehicle),
    ("bicycle", HazardType::Bike),
    ("bike", HazardType::Bike),
    ("dog", HazardType::Dog),
    ("traffic light", HazardType::Pole),
    ("stop sign", HazardType::Pole),
    ("parking meter", HazardType::Pole),
    ("fire hydrant", HazardType::Pole),
    ("pole", HazardType::Pole),
    ("bench", HazardType::Bench),
    ("traffic cone", HazardType::Cone),
    ("cone", HazardType::Cone),
    ("wall", HazardType::Wall),
    ("person", HazardType::Person),
    ("stairs", HazardType::StairLike),
    ("stair", HazardType::StairLike),
    ("staircase", HazardType::StairLike),
    ("escalator", HazardType::StairLike),
    ("curb", HazardType::DropoffLike),
    ("pothole", HazardType::DropoffLike),
    ("hole", HazardType::DropoffLike),
    ("ledge", HazardType::DropoffLike),
];

/// Map a detector label to a hazard type. Case-insensitive; anything outside
/// the vocabulary is `Unknown`.
pub fn coco_to_hazard(label: &str) -> HazardType {
    let label = label.trim();
    HAZARD_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, hazard)| *hazard)
        .unwrap_or(HazardType::Unknown)
}

/// Lane of a box whose horizontal center is `x_center` in a frame `width`
/// pixels wide. `band` is the center lane width as a fraction of the frame.
///
/// A center exactly on a lane edge is `Center`.
pub fn lane_of(x_center: f32, width: f32, band: f32) -> Lane {
    let nx = x_center / width;
    let left_edge = 0.5 - band / 2.0;
    let right_edge = 0.5 + band / 2.0;

    if nx < left_edge {
        Lane::Left
    } else if nx > right_edge {
        Lane::Right
    } else {
        Lane::Center
    }
}

/// Distance band from box area relative to frame area. A ratio exactly on a
/// cutoff takes the closer band.
pub fn distance_of(area: f32, frame_area: f32, near: f32, mid: f32) -> Distance {
    let ratio = area / frame_area;

    if ratio >= near {
        Distance::Near
    } else if ratio >= mid {
        Distance::Mid
    } else {
        Distance::Far
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_to_hazard_table() {
        assert_eq!(coco_to_hazard("car"), HazardType::Vehicle);
        assert_eq!(coco_to_hazard("truck"), HazardType::Vehicle);
        assert_eq!(coco_to_hazard("bicycle"), HazardType::Bike);
        assert_eq!(coco_to_hazard("dog"), HazardType::Dog);
        assert_eq!(coco_to_hazard("traffic light"), HazardType::Pole);
        assert_eq!(coco_to_hazard("bench"), HazardType::Bench);
        assert_eq!(coco_to_hazard("person"), HazardType::Person);
        assert_eq!(coco_to_hazard("stairs"), HazardType::StairLike);
        assert_eq!(coco_to_hazard("curb"), HazardType::DropoffLike);
    }

    #[test]
    fn test_coco_to_hazard_case_insensitive() {
        assert_eq!(coco_to_hazard("CAR"), HazardType::Vehicle);
        assert_eq!(coco_to_hazard("Traffic Light"), HazardType::Pole);
        assert_eq!(coco_to_hazard("  dog "), HazardType::Dog);
    }

    #[test]
    fn test_coco_to_hazard_unknown() {
        assert_eq!(coco_to_hazard("giraffe"), HazardType::Unknown);
        assert_eq!(coco_to_hazard(""), HazardType::Unknown);
        assert_eq!(coco_to_hazard("carpet"), HazardType::Unknown);
    }

    #[test]
    fn test_lane_of_edges() {
        let width = 640.0;
        assert_eq!(lane_of(width / 2.0, width, DEFAULT_CENTER_BAND), Lane::Center);
        assert_eq!(lane_of(0.0, width, DEFAULT_CENTER_BAND), Lane::Left);
        assert_eq!(lane_of(width, width, DEFAULT_CENTER_BAND), Lane::Right);
    }

    #[test]
    fn test_lane_of_exactly_on_edge_is_center() {
        // band 0.5 puts the edges at 0.25 and 0.75, both exact in f32
        assert_eq!(lane_of(25.0, 100.0, 0.5), Lane::Center);
        assert_eq!(lane_of(75.0, 100.0, 0.5), Lane::Center);
        assert_eq!(lane_of(24.9, 100.0, 0.5), Lane::Left);
        assert_eq!(lane_of(75.1, 100.0, 0.5), Lane::Right);
    }

    #[test]
    fn test_distance_bands() {
        let frame_area = 1000.0;
        assert_eq!(distance_of(200.0, frame_area, 0.12, 0.04), Distance::Near);
        assert_eq!(distance_of(100.0, frame_area, 0.12, 0.04), Distance::Mid);
        assert_eq!(distance_of(10.0, frame_area, 0.12, 0.04), Distance::Far);
    }

    #[test]
    fn test_distance_boundary_favors_closer_band() {
        assert_eq!(distance_of(25.0, 100.0, 0.25, 0.125), Distance::Near);
        assert_eq!(distance_of(12.5, 100.0, 0.25, 0.125), Distance::Mid);
    }

    #[test]
    fn test_hazard_type_display_matches_serde() {
        for hazard in HazardType::ALL {
            let json = serde_json::to_string(&hazard).unwrap();
            assert_eq!(json, format!("\"{}\"", hazard));
        }
    }
}
