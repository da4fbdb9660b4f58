use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// The eleven chart-pattern kinds the upstream detector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    HeadShoulders,
    InverseHeadShoulders,
    DoubleTop,
    DoubleBottom,
    TripleTop,
    TripleBottom,
    AscendingTriangle,
    DescendingTriangle,
    CupAndHandle,
    BullishFlag,
    FallingWedge,
}

impl PatternKind {
    /// Fixed request order. Aggregation ties fall back to this order.
    pub const ALL: [PatternKind; 11] = [
        PatternKind::HeadShoulders,
        PatternKind::InverseHeadShoulders,
        PatternKind::DoubleTop,
        PatternKind::DoubleBottom,
        PatternKind::TripleTop,
        PatternKind::TripleBottom,
        PatternKind::AscendingTriangle,
        PatternKind::DescendingTriangle,
        PatternKind::CupAndHandle,
        PatternKind::BullishFlag,
        PatternKind::FallingWedge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::HeadShoulders => "head_shoulders",
            PatternKind::InverseHeadShoulders => "inverse_head_shoulders",
            PatternKind::DoubleTop => "double_top",
            PatternKind::DoubleBottom => "double_bottom",
            PatternKind::TripleTop => "triple_top",
            PatternKind::TripleBottom => "triple_bottom",
            PatternKind::AscendingTriangle => "ascending_triangle",
            PatternKind::DescendingTriangle => "descending_triangle",
            PatternKind::CupAndHandle => "cup_and_handle",
            PatternKind::BullishFlag => "bullish_flag",
            PatternKind::FallingWedge => "falling_wedge",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPatternKind(pub String);

impl fmt::Display for UnknownPatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pattern type: {}", self.0)
    }
}

impl std::error::Error for UnknownPatternKind {}

impl FromStr for PatternKind {
    type Err = UnknownPatternKind;

    /// Accepts `double-top` as well as `double_top`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('-', "_");
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownPatternKind(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Bullish,
    Bearish,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Bullish => "bullish",
            Signal::Bearish => "bearish",
        }
    }
}

/// A located value for a named role (`head`, `neckline`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RolePoint {
    /// Chart x position (a date). Levels usually have none.
    pub position: Option<String>,
    pub value: f64,
}

/// One detection result for one symbol and one pattern kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternRecord {
    #[serde(default)]
    pub ticker: String,
    /// Raw kind string as supplied upstream; may name a kind this build doesn't know.
    #[serde(default)]
    pub pattern_type: String,
    #[serde(default)]
    pub detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price_fmt: Option<String>,
    /// Pattern-specific payload: role points, levels and detector extras.
    #[serde(flatten)]
    pub roles: BTreeMap<String, Value>,
}

impl PatternRecord {
    /// Confidence with an absent score treated as zero.
    pub fn score(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn kind(&self) -> Option<PatternKind> {
        self.pattern_type.parse().ok()
    }

    /// Reads a role in any of the shapes the detector emits: `{date, price}`,
    /// `{position, value}`, or a bare level (optionally dated by `<role>_date`).
    pub fn role(&self, name: &str) -> Option<RolePoint> {
        if name == "target_price" {
            return self.target_price.map(|value| RolePoint {
                position: None,
                value,
            });
        }

        match self.roles.get(name)? {
            Value::Object(fields) => {
                let value = fields
                    .get("price")
                    .or_else(|| fields.get("value"))
                    .and_then(Value::as_f64)?;
                let position = fields
                    .get("date")
                    .or_else(|| fields.get("position"))
                    .and_then(position_text);
                Some(RolePoint { position, value })
            }
            Value::Number(number) => {
                let value = number.as_f64()?;
                let position = self
                    .roles
                    .get(&format!("{name}_date"))
                    .and_then(position_text);
                Some(RolePoint { position, value })
            }
            _ => None,
        }
    }
}

fn position_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(payload: Value) -> PatternRecord {
        serde_json::from_value(payload).unwrap()
    }

    #[test]
    fn kind_parses_snake_and_kebab_case() {
        assert_eq!("double_top".parse::<PatternKind>(), Ok(PatternKind::DoubleTop));
        assert_eq!("cup-and-handle".parse::<PatternKind>(), Ok(PatternKind::CupAndHandle));
        assert!("rounding_bottom".parse::<PatternKind>().is_err());
    }

    #[test]
    fn all_kinds_round_trip_through_as_str() {
        for kind in PatternKind::ALL {
            assert_eq!(kind.as_str().parse::<PatternKind>(), Ok(kind));
        }
    }

    #[test]
    fn missing_detected_and_confidence_default() {
        let parsed = record(json!({ "ticker": "AAPL", "pattern_type": "double_top" }));
        assert!(!parsed.detected);
        assert_eq!(parsed.score(), 0.0);
    }

    #[test]
    fn role_reads_date_price_objects() {
        let parsed = record(json!({
            "pattern_type": "head_shoulders",
            "detected": true,
            "head": { "date": "2024-03-01", "price": 182.5 }
        }));
        assert_eq!(
            parsed.role("head"),
            Some(RolePoint {
                position: Some("2024-03-01".to_string()),
                value: 182.5
            })
        );
    }

    #[test]
    fn role_reads_position_value_objects() {
        let parsed = record(json!({ "peak": { "position": 14, "value": 99.0 } }));
        let point = parsed.role("peak").unwrap();
        assert_eq!(point.position.as_deref(), Some("14"));
        assert_eq!(point.value, 99.0);
    }

    #[test]
    fn role_reads_levels_and_sibling_dates() {
        let parsed = record(json!({
            "neckline": 150.25,
            "cup_bottom": 120.0,
            "cup_bottom_date": "2024-01-15",
            "target_price": 130.0
        }));
        assert_eq!(parsed.role("neckline").unwrap().position, None);
        assert_eq!(
            parsed.role("cup_bottom").unwrap().position.as_deref(),
            Some("2024-01-15")
        );
        assert_eq!(parsed.role("target_price").unwrap().value, 130.0);
        assert!(!parsed.roles.contains_key("target_price"));
    }

    #[test]
    fn role_ignores_unusable_payloads() {
        let parsed = record(json!({ "head": { "date": "2024-03-01" }, "neckline": "n/a" }));
        assert!(parsed.role("head").is_none());
        assert!(parsed.role("neckline").is_none());
        assert!(parsed.role("absent").is_none());
    }
}
