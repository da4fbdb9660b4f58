use crate::business_logic::registry::PatternDescriptor;
use crate::models::annotation::{
    ChartAnnotation, DashStyle, Dot, LegendEntry, LegendKind, Line, PatternView,
};
use crate::models::pattern::{PatternKind, PatternRecord, Signal};

const BULLISH_STRONG: &str = "#16a34a";
const BULLISH_SOFT: &str = "#4ade80";
const BEARISH_STRONG: &str = "#dc2626";
const BEARISH_SOFT: &str = "#f87171";
/// Signal-independent palette for structural roles (shoulders, necklines, support/resistance)
const STRUCTURE: &str = "#64748b";
const HIGHLIGHT: &str = "#f59e0b";
const DOT_STROKE: &str = "#ffffff";

/// Color intent of a drawn element, resolved against the pattern's signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Signal,
    SignalSoft,
    Structure,
    Highlight,
}

impl Tone {
    fn color(self, signal: Signal) -> &'static str {
        match (self, signal) {
            (Tone::Signal, Signal::Bullish) => BULLISH_STRONG,
            (Tone::Signal, Signal::Bearish) => BEARISH_STRONG,
            (Tone::SignalSoft, Signal::Bullish) => BULLISH_SOFT,
            (Tone::SignalSoft, Signal::Bearish) => BEARISH_SOFT,
            (Tone::Structure, _) => STRUCTURE,
            (Tone::Highlight, _) => HIGHLIGHT,
        }
    }
}

#[derive(Debug)]
struct DotRule {
    role: &'static str,
    radius: u8,
    tone: Tone,
    legend: &'static str,
}

#[derive(Debug)]
struct LineRule {
    role: &'static str,
    title: &'static str,
    tone: Tone,
    dash: DashStyle,
    legend: &'static str,
}

const fn dot(role: &'static str, radius: u8, tone: Tone, legend: &'static str) -> DotRule {
    DotRule {
        role,
        radius,
        tone,
        legend,
    }
}

const fn line(
    role: &'static str,
    title: &'static str,
    tone: Tone,
    dash: DashStyle,
    legend: &'static str,
) -> LineRule {
    LineRule {
        role,
        title,
        tone,
        dash,
        legend,
    }
}

const SHOULDERS_AND_HEAD: &[DotRule] = &[
    dot("left_shoulder", 5, Tone::Structure, "Shoulders"),
    dot("head", 7, Tone::Signal, "Head"),
    dot("right_shoulder", 5, Tone::Structure, "Shoulders"),
];

const DOUBLE_TOP_DOTS: &[DotRule] = &[
    dot("first_peak", 6, Tone::Signal, "Peaks"),
    dot("second_peak", 6, Tone::Signal, "Peaks"),
    dot("trough", 5, Tone::Structure, "Trough"),
];

const DOUBLE_BOTTOM_DOTS: &[DotRule] = &[
    dot("first_trough", 6, Tone::Signal, "Troughs"),
    dot("second_trough", 6, Tone::Signal, "Troughs"),
    dot("peak", 5, Tone::Structure, "Peak"),
];

const TRIPLE_TOP_DOTS: &[DotRule] = &[
    dot("first_peak", 6, Tone::Signal, "Peaks"),
    dot("second_peak", 6, Tone::Signal, "Peaks"),
    dot("third_peak", 6, Tone::Signal, "Peaks"),
];

const TRIPLE_BOTTOM_DOTS: &[DotRule] = &[
    dot("first_trough", 6, Tone::Signal, "Troughs"),
    dot("second_trough", 6, Tone::Signal, "Troughs"),
    dot("third_trough", 6, Tone::Signal, "Troughs"),
];

const CUP_DOTS: &[DotRule] = &[dot("cup_bottom", 6, Tone::Signal, "Cup bottom")];

/// Levels shared by every kind that declares them; always drawn first.
const GENERIC_LINES: &[LineRule] = &[
    line(
        "neckline",
        "Neckline",
        Tone::Structure,
        DashStyle::Dashed,
        "Neckline",
    ),
    line(
        "target_price",
        "Target",
        Tone::Signal,
        DashStyle::Dashed,
        "Target",
    ),
];

const ASCENDING_TRIANGLE_LINES: &[LineRule] = &[
    line(
        "resistance",
        "Resistance",
        Tone::Structure,
        DashStyle::Dashed,
        "Resistance",
    ),
    line(
        "support_current",
        "Support",
        Tone::SignalSoft,
        DashStyle::Solid,
        "Support",
    ),
];

const DESCENDING_TRIANGLE_LINES: &[LineRule] = &[
    line(
        "support",
        "Support",
        Tone::Structure,
        DashStyle::Dashed,
        "Support",
    ),
    line(
        "resistance_current",
        "Resistance",
        Tone::SignalSoft,
        DashStyle::Solid,
        "Resistance",
    ),
];

const CUP_LINES: &[LineRule] = &[line(
    "resistance",
    "Rim",
    Tone::Structure,
    DashStyle::Dashed,
    "Resistance",
)];

const FLAG_LINES: &[LineRule] = &[
    line(
        "pole_high",
        "Pole High",
        Tone::Structure,
        DashStyle::Dashed,
        "Pole high",
    ),
    line(
        "flag_high",
        "Flag High",
        Tone::Highlight,
        DashStyle::Solid,
        "Flag channel",
    ),
    line(
        "flag_low",
        "Flag Low",
        Tone::Highlight,
        DashStyle::Solid,
        "Flag channel",
    ),
];

const WEDGE_LINES: &[LineRule] = &[
    line(
        "resistance_current",
        "Resistance",
        Tone::Structure,
        DashStyle::Solid,
        "Resistance",
    ),
    line(
        "support_current",
        "Support",
        Tone::Structure,
        DashStyle::Solid,
        "Support",
    ),
    line(
        "breakout_level",
        "Breakout",
        Tone::Highlight,
        DashStyle::Solid,
        "Breakout",
    ),
];

fn dot_rules(kind: PatternKind) -> &'static [DotRule] {
    match kind {
        PatternKind::HeadShoulders | PatternKind::InverseHeadShoulders => SHOULDERS_AND_HEAD,
        PatternKind::DoubleTop => DOUBLE_TOP_DOTS,
        PatternKind::DoubleBottom => DOUBLE_BOTTOM_DOTS,
        PatternKind::TripleTop => TRIPLE_TOP_DOTS,
        PatternKind::TripleBottom => TRIPLE_BOTTOM_DOTS,
        PatternKind::CupAndHandle => CUP_DOTS,
        PatternKind::AscendingTriangle
        | PatternKind::DescendingTriangle
        | PatternKind::BullishFlag
        | PatternKind::FallingWedge => &[],
    }
}

fn specific_line_rules(kind: PatternKind) -> &'static [LineRule] {
    match kind {
        PatternKind::AscendingTriangle => ASCENDING_TRIANGLE_LINES,
        PatternKind::DescendingTriangle => DESCENDING_TRIANGLE_LINES,
        PatternKind::CupAndHandle => CUP_LINES,
        PatternKind::BullishFlag => FLAG_LINES,
        PatternKind::FallingWedge => WEDGE_LINES,
        PatternKind::HeadShoulders
        | PatternKind::InverseHeadShoulders
        | PatternKind::DoubleTop
        | PatternKind::DoubleBottom
        | PatternKind::TripleTop
        | PatternKind::TripleBottom => &[],
    }
}

/// Generic levels for every kind, then the kind's own levels.
fn line_rules(kind: PatternKind) -> impl Iterator<Item = &'static LineRule> {
    GENERIC_LINES.iter().chain(specific_line_rules(kind))
}

/// Only detected records of a known kind are drawn.
fn drawable(record: &PatternRecord) -> Option<&'static PatternDescriptor> {
    if !record.detected {
        return None;
    }
    record.kind().map(PatternKind::descriptor)
}

fn drawn_dots(record: &PatternRecord) -> Vec<(&'static DotRule, Dot)> {
    let Some(descriptor) = drawable(record) else {
        return Vec::new();
    };

    dot_rules(descriptor.kind)
        .iter()
        .filter_map(|rule| {
            let point = record.role(rule.role)?;
            let x = point.position?;
            let dot = Dot {
                role: rule.role,
                x,
                y: point.value,
                radius: rule.radius,
                fill: rule.tone.color(descriptor.signal),
                stroke: DOT_STROKE,
            };
            Some((rule, dot))
        })
        .collect()
}

fn drawn_lines(record: &PatternRecord) -> Vec<(&'static LineRule, Line)> {
    let Some(descriptor) = drawable(record) else {
        return Vec::new();
    };

    line_rules(descriptor.kind)
        .filter_map(|rule| {
            let point = record.role(rule.role)?;
            let line = Line {
                role: rule.role,
                y: point.value,
                color: rule.tone.color(descriptor.signal),
                dash: rule.dash,
                label: format!("{}: ${:.2}", rule.title, point.value),
            };
            Some((rule, line))
        })
        .collect()
}

pub fn dots_for(record: &PatternRecord) -> Vec<Dot> {
    drawn_dots(record).into_iter().map(|(_, dot)| dot).collect()
}

pub fn lines_for(record: &PatternRecord) -> Vec<Line> {
    drawn_lines(record).into_iter().map(|(_, line)| line).collect()
}

/// One entry per distinct element kind actually drawn, in drawing order.
pub fn legend_for(record: &PatternRecord) -> Vec<LegendEntry> {
    let dot_entries = drawn_dots(record).into_iter().map(|(rule, dot)| LegendEntry {
        kind: LegendKind::Dot,
        color: dot.fill,
        dashed: false,
        label: rule.legend,
    });
    let line_entries = drawn_lines(record)
        .into_iter()
        .map(|(rule, line)| LegendEntry {
            kind: LegendKind::Line,
            color: line.color,
            dashed: line.dash.is_dashed(),
            label: rule.legend,
        });

    let mut legend: Vec<LegendEntry> = Vec::new();
    for entry in dot_entries.chain(line_entries) {
        let seen = legend
            .iter()
            .any(|existing| existing.kind == entry.kind && existing.label == entry.label);
        if !seen {
            legend.push(entry);
        }
    }
    legend
}

pub fn annotations_for(record: &PatternRecord) -> Vec<ChartAnnotation> {
    dots_for(record)
        .into_iter()
        .map(ChartAnnotation::Dot)
        .chain(lines_for(record).into_iter().map(ChartAnnotation::Line))
        .collect()
}

pub fn view_for(record: PatternRecord) -> PatternView {
    let annotations = annotations_for(&record);
    let legend = legend_for(&record);
    PatternView {
        record,
        annotations,
        legend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(payload: serde_json::Value) -> PatternRecord {
        serde_json::from_value(payload).unwrap()
    }

    fn head_shoulders() -> PatternRecord {
        record(json!({
            "ticker": "AAPL",
            "pattern_type": "head_shoulders",
            "detected": true,
            "confidence": 72,
            "left_shoulder": { "date": "2024-01-10", "price": 180.0 },
            "head": { "date": "2024-02-01", "price": 195.0 },
            "right_shoulder": { "date": "2024-02-20", "price": 181.0 },
            "neckline": 170.0,
            "target_price": 145.0,
            "current_price": 172.0
        }))
    }

    #[test]
    fn rule_tables_cover_exactly_the_declared_roles() {
        for kind in PatternKind::ALL {
            let descriptor = kind.descriptor();

            let dot_roles: Vec<&str> = dot_rules(kind).iter().map(|r| r.role).collect();
            assert_eq!(dot_roles, descriptor.points.to_vec(), "points for {kind}");

            let generic: Vec<&str> = GENERIC_LINES.iter().map(|r| r.role).collect();
            let mut specific: Vec<&str> = specific_line_rules(kind).iter().map(|r| r.role).collect();
            let mut declared: Vec<&str> = descriptor
                .lines
                .iter()
                .copied()
                .filter(|role| !generic.contains(role))
                .collect();
            specific.sort_unstable();
            declared.sort_unstable();
            assert_eq!(specific, declared, "lines for {kind}");

            let drawn: Vec<&str> = line_rules(kind).map(|r| r.role).collect();
            assert_eq!(&drawn[..generic.len()], &generic[..], "generic lines for {kind}");
        }
    }

    #[test]
    fn head_shoulders_draws_points_in_role_order() {
        let dots = dots_for(&head_shoulders());
        let roles: Vec<&str> = dots.iter().map(|d| d.role).collect();
        assert_eq!(roles, vec!["left_shoulder", "head", "right_shoulder"]);
        assert_eq!(dots[1].x, "2024-02-01");
        assert_eq!(dots[1].y, 195.0);
        assert_eq!(dots[1].radius, 7);
        assert_eq!(dots[1].fill, BEARISH_STRONG);
        assert_eq!(dots[0].fill, STRUCTURE);
    }

    #[test]
    fn neckline_and_target_come_first() {
        let lines = lines_for(&head_shoulders());
        let roles: Vec<&str> = lines.iter().map(|l| l.role).collect();
        assert_eq!(roles, vec!["neckline", "target_price"]);
        assert_eq!(lines[0].label, "Neckline: $170.00");
        assert!(lines.iter().all(|l| l.dash == DashStyle::Dashed));
    }

    #[test]
    fn neckline_is_drawn_for_any_kind_that_reports_one() {
        let cup = record(json!({
            "ticker": "SBUX",
            "pattern_type": "cup_and_handle",
            "detected": true,
            "neckline": 100.0,
            "target_price": 120.0,
            "resistance": 104.5
        }));
        let roles: Vec<&str> = lines_for(&cup).iter().map(|l| l.role).collect();
        assert_eq!(roles, vec!["neckline", "target_price", "resistance"]);
    }

    #[test]
    fn signal_colors_follow_the_descriptor() {
        let mut inverse = head_shoulders();
        inverse.pattern_type = "inverse_head_shoulders".to_string();
        let dots = dots_for(&inverse);
        assert_eq!(dots[1].fill, BULLISH_STRONG);
        // structural roles keep the neutral palette
        assert_eq!(dots[0].fill, STRUCTURE);
    }

    #[test]
    fn absent_roles_are_skipped() {
        let mut partial = head_shoulders();
        partial.roles.remove("right_shoulder");
        partial.roles.remove("neckline");

        let roles: Vec<&str> = dots_for(&partial).iter().map(|d| d.role).collect();
        assert_eq!(roles, vec!["left_shoulder", "head"]);
        let lines: Vec<&str> = lines_for(&partial).iter().map(|l| l.role).collect();
        assert_eq!(lines, vec!["target_price"]);
    }

    #[test]
    fn points_without_position_are_not_dotted() {
        let cup = record(json!({
            "pattern_type": "cup_and_handle",
            "detected": true,
            "cup_bottom": 120.0,
            "resistance": 150.0
        }));
        assert!(dots_for(&cup).is_empty());
        assert_eq!(lines_for(&cup).len(), 1);
    }

    #[test]
    fn undetected_records_draw_nothing() {
        let mut record = head_shoulders();
        record.detected = false;
        assert!(dots_for(&record).is_empty());
        assert!(lines_for(&record).is_empty());
        assert!(legend_for(&record).is_empty());
    }

    #[test]
    fn unknown_kinds_draw_nothing() {
        let mut record = head_shoulders();
        record.pattern_type = "rounding_bottom".to_string();
        assert!(dots_for(&record).is_empty());
        assert!(lines_for(&record).is_empty());
        assert!(legend_for(&record).is_empty());
        assert!(annotations_for(&record).is_empty());
    }

    #[test]
    fn legend_collapses_repeated_element_kinds() {
        let legend = legend_for(&head_shoulders());
        let labels: Vec<&str> = legend.iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Shoulders", "Head", "Neckline", "Target"]);
        assert_eq!(legend[0].kind, LegendKind::Dot);
        assert!(legend[2].dashed);
    }

    #[test]
    fn legend_only_lists_drawn_elements() {
        let mut partial = head_shoulders();
        partial.roles.remove("head");
        partial.target_price = None;
        let labels: Vec<&str> = legend_for(&partial).iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Shoulders", "Neckline"]);
    }

    #[test]
    fn flag_channel_is_solid_and_pole_is_dashed() {
        let flag = record(json!({
            "pattern_type": "bullish_flag",
            "detected": true,
            "pole_low": 90.0,
            "pole_high": 120.0,
            "flag_high": 118.0,
            "flag_low": 112.0,
            "target_price": 148.0
        }));
        let lines = lines_for(&flag);
        let roles: Vec<&str> = lines.iter().map(|l| l.role).collect();
        assert_eq!(roles, vec!["target_price", "pole_high", "flag_high", "flag_low"]);
        assert_eq!(lines[1].dash, DashStyle::Dashed);
        assert_eq!(lines[2].dash, DashStyle::Solid);

        let labels: Vec<&str> = legend_for(&flag).iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Target", "Pole high", "Flag channel"]);
    }

    #[test]
    fn wedge_breakout_uses_highlight_palette() {
        let wedge = record(json!({
            "pattern_type": "falling_wedge",
            "detected": true,
            "resistance_current": 101.0,
            "support_current": 95.0,
            "breakout_level": 102.0
        }));
        let lines = lines_for(&wedge);
        let breakout = lines.iter().find(|l| l.role == "breakout_level").unwrap();
        assert_eq!(breakout.color, HIGHLIGHT);
        assert_eq!(breakout.dash, DashStyle::Solid);
    }

    #[test]
    fn view_orders_dots_before_lines() {
        let view = view_for(head_shoulders());
        assert_eq!(view.annotations.len(), 5);
        assert!(matches!(view.annotations[0], ChartAnnotation::Dot(_)));
        assert!(matches!(view.annotations[4], ChartAnnotation::Line(_)));
        assert_eq!(view.record.ticker, "AAPL");
    }
}
