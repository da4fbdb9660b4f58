use serde::Serialize;
use utoipa::ToSchema;

use crate::models::pattern::PatternRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DashStyle {
    Solid,
    Dashed,
}

impl DashStyle {
    pub fn is_dashed(self) -> bool {
        matches!(self, DashStyle::Dashed)
    }
}

/// A marker on a detected pattern point.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dot {
    pub role: &'static str,
    /// Chart x position (date)
    pub x: String,
    /// Price at the point
    pub y: f64,
    pub radius: u8,
    pub fill: &'static str,
    pub stroke: &'static str,
}

/// A horizontal reference level.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Line {
    pub role: &'static str,
    pub y: f64,
    pub color: &'static str,
    pub dash: DashStyle,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartAnnotation {
    Dot(Dot),
    Line(Line),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LegendKind {
    Dot,
    Line,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LegendEntry {
    pub kind: LegendKind,
    pub color: &'static str,
    pub dashed: bool,
    pub label: &'static str,
}

/// A record together with everything a chart needs to draw it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatternView {
    #[schema(value_type = Object)]
    pub record: PatternRecord,
    pub annotations: Vec<ChartAnnotation>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SymbolPatterns {
    pub as_of_ms: u64,
    pub symbol: String,
    pub count: usize,
    /// Highest confidence first
    pub patterns: Vec<PatternView>,
}
