use serde::Serialize;
use utoipa::ToSchema;

use crate::models::pattern::{PatternKind, Signal};

/// Display metadata and drawable roles for one pattern kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PatternDescriptor {
    pub kind: PatternKind,
    pub name: &'static str,
    pub signal: Signal,
    pub description: &'static str,
    /// Point roles in drawing order
    #[schema(value_type = Vec<String>)]
    pub points: &'static [&'static str],
    /// Level roles in drawing order
    #[schema(value_type = Vec<String>)]
    pub lines: &'static [&'static str],
}

const HEAD_SHOULDERS: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::HeadShoulders,
    name: "Head & Shoulders",
    signal: Signal::Bearish,
    description: "Three peaks with a higher middle head; a close below the neckline signals a reversal lower.",
    points: &["left_shoulder", "head", "right_shoulder"],
    lines: &["neckline", "target_price"],
};

const INVERSE_HEAD_SHOULDERS: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::InverseHeadShoulders,
    name: "Inverse Head & Shoulders",
    signal: Signal::Bullish,
    description: "Three troughs with a deeper middle head; a close above the neckline signals a reversal higher.",
    points: &["left_shoulder", "head", "right_shoulder"],
    lines: &["neckline", "target_price"],
};

const DOUBLE_TOP: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::DoubleTop,
    name: "Double Top",
    signal: Signal::Bearish,
    description: "Two similar peaks separated by a trough; breaking the neckline confirms the reversal.",
    points: &["first_peak", "second_peak", "trough"],
    lines: &["neckline", "target_price"],
};

const DOUBLE_BOTTOM: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::DoubleBottom,
    name: "Double Bottom",
    signal: Signal::Bullish,
    description: "Two similar troughs separated by a peak; clearing the neckline confirms the reversal.",
    points: &["first_trough", "second_trough", "peak"],
    lines: &["neckline", "target_price"],
};

const TRIPLE_TOP: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::TripleTop,
    name: "Triple Top",
    signal: Signal::Bearish,
    description: "Three peaks at a similar level that fail to break resistance.",
    points: &["first_peak", "second_peak", "third_peak"],
    lines: &["neckline", "target_price"],
};

const TRIPLE_BOTTOM: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::TripleBottom,
    name: "Triple Bottom",
    signal: Signal::Bullish,
    description: "Three troughs at a similar level that hold support.",
    points: &["first_trough", "second_trough", "third_trough"],
    lines: &["neckline", "target_price"],
};

const ASCENDING_TRIANGLE: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::AscendingTriangle,
    name: "Ascending Triangle",
    signal: Signal::Bullish,
    description: "Flat resistance with rising support; usually resolves upward.",
    points: &[],
    lines: &["target_price", "resistance", "support_current"],
};

const DESCENDING_TRIANGLE: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::DescendingTriangle,
    name: "Descending Triangle",
    signal: Signal::Bearish,
    description: "Flat support with falling resistance; usually resolves downward.",
    points: &[],
    lines: &["target_price", "support", "resistance_current"],
};

const CUP_AND_HANDLE: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::CupAndHandle,
    name: "Cup and Handle",
    signal: Signal::Bullish,
    description: "A rounded U-shaped base followed by a shallow consolidation below the rim.",
    points: &["cup_bottom"],
    lines: &["target_price", "resistance"],
};

const BULLISH_FLAG: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::BullishFlag,
    name: "Bullish Flag",
    signal: Signal::Bullish,
    description: "A sharp advance (the pole) followed by a tight, slightly falling channel.",
    points: &[],
    lines: &["target_price", "pole_high", "flag_high", "flag_low"],
};

const FALLING_WEDGE: PatternDescriptor = PatternDescriptor {
    kind: PatternKind::FallingWedge,
    name: "Falling Wedge",
    signal: Signal::Bullish,
    description: "Converging falling trendlines; a break above resistance signals a reversal higher.",
    points: &[],
    lines: &[
        "target_price",
        "resistance_current",
        "support_current",
        "breakout_level",
    ],
};

impl PatternKind {
    pub fn descriptor(self) -> &'static PatternDescriptor {
        match self {
            PatternKind::HeadShoulders => &HEAD_SHOULDERS,
            PatternKind::InverseHeadShoulders => &INVERSE_HEAD_SHOULDERS,
            PatternKind::DoubleTop => &DOUBLE_TOP,
            PatternKind::DoubleBottom => &DOUBLE_BOTTOM,
            PatternKind::TripleTop => &TRIPLE_TOP,
            PatternKind::TripleBottom => &TRIPLE_BOTTOM,
            PatternKind::AscendingTriangle => &ASCENDING_TRIANGLE,
            PatternKind::DescendingTriangle => &DESCENDING_TRIANGLE,
            PatternKind::CupAndHandle => &CUP_AND_HANDLE,
            PatternKind::BullishFlag => &BULLISH_FLAG,
            PatternKind::FallingWedge => &FALLING_WEDGE,
        }
    }
}

/// Looks up a descriptor by its wire name. Unknown names yield `None`.
pub fn descriptor_for(kind: &str) -> Option<&'static PatternDescriptor> {
    kind.parse::<PatternKind>().ok().map(PatternKind::descriptor)
}

pub fn all_descriptors() -> Vec<&'static PatternDescriptor> {
    PatternKind::ALL.into_iter().map(PatternKind::descriptor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_its_own_descriptor() {
        for kind in PatternKind::ALL {
            assert_eq!(kind.descriptor().kind, kind);
        }
    }

    #[test]
    fn descriptor_for_known_kind() {
        let descriptor = descriptor_for("head_shoulders").unwrap();
        assert_eq!(descriptor.name, "Head & Shoulders");
        assert_eq!(descriptor.signal, Signal::Bearish);
        assert_eq!(descriptor.points, &["left_shoulder", "head", "right_shoulder"]);
    }

    #[test]
    fn descriptor_for_unknown_kind_is_none() {
        assert!(descriptor_for("rounding_bottom").is_none());
        assert!(descriptor_for("").is_none());
    }

    #[test]
    fn all_descriptors_follow_request_order() {
        let kinds: Vec<PatternKind> = all_descriptors().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, PatternKind::ALL.to_vec());
    }

    #[test]
    fn signal_split_matches_detector_catalog() {
        let bearish = all_descriptors()
            .iter()
            .filter(|d| d.signal == Signal::Bearish)
            .count();
        assert_eq!(bearish, 4);
    }
}
