// src/work_order.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type OrderId = u64;

// --- Classification Constants ---

// Work type keywords, in detection priority order.
pub const WORK_TYPE_PREVENTIVO: &str = "PREVENTIVO";
pub const WORK_TYPE_CORRECTIVO: &str = "CORRECTIVO";
pub const WORK_TYPE_MEJORA: &str = "MEJORA";

pub const CATEGORY_OPEX: &str = "OPEX";
pub const CATEGORY_API: &str = "API";

pub const DEFAULT_OWNER: &str = "GENERAL";

// Sentinel buckets the aggregation engine folds missing keys into.
pub const BUCKET_NO_CATEGORY: &str = "OTROS";
pub const BUCKET_NO_TYPE: &str = "SIN CLASIFICAR";
pub const BUCKET_NO_OWNER: &str = "SIN ASIGNAR";

// --- Shifts ---

/// One of the three fixed daily work periods, in schedule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    T1,
    T2,
    T3,
}

impl Shift {
    /// The fixed T1 < T2 < T3 day layout.
    pub const ORDER: [Shift; 3] = [Shift::T1, Shift::T2, Shift::T3];

    /// Position within [`Shift::ORDER`].
    pub fn index(self) -> usize {
        match self {
            Shift::T1 => 0,
            Shift::T2 => 1,
            Shift::T3 => 2,
        }
    }

    /// Case-insensitive token match. Anything unrecognized, including the
    /// empty string, falls back to T1.
    pub fn parse_token(token: &str) -> Shift {
        match token.trim().to_ascii_uppercase().as_str() {
            "T1" => Shift::T1,
            "T2" => Shift::T2,
            "T3" => Shift::T3,
            _ => Shift::T1,
        }
    }
}

// --- Work Orders ---

/// One maintenance task: what it is, what it costs, who answers for it and
/// which shifts it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: OrderId,
    pub activity: String,
    pub amount: Decimal,
    pub category: String,
    pub owner: String,
    /// Empty when the source text matched no known keyword.
    pub work_type: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Occupied shifts per calendar day, covering the contiguous range from
    /// start to end when both dates are present. Empty otherwise.
    #[serde(default)]
    pub schedule: BTreeMap<NaiveDate, Vec<Shift>>,
}

// --- Field Normalization Policies ---

/// First keyword found wins, checked in the order preventive, corrective,
/// improvement. Returns the empty string when nothing matches, which the
/// aggregation engine later folds into its own bucket.
pub fn detect_work_type(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    for keyword in [WORK_TYPE_PREVENTIVO, WORK_TYPE_CORRECTIVO, WORK_TYPE_MEJORA] {
        if upper.contains(keyword) {
            return keyword.to_string();
        }
    }
    String::new()
}

/// Trim + uppercase, falling back to the given default when empty.
pub(crate) fn upper_or(raw: &str, default: &str) -> String {
    let value = raw.trim().to_uppercase();
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Category policy: uppercased, OPEX when absent.
pub fn normalize_category(raw: &str) -> String {
    upper_or(raw, CATEGORY_OPEX)
}

/// Owner policy for the bulk paths: uppercased, GENERAL when absent.
pub fn normalize_owner(raw: &str) -> String {
    upper_or(raw, DEFAULT_OWNER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_work_type_priority_and_case() {
        assert_eq!(detect_work_type("preventivo"), WORK_TYPE_PREVENTIVO);
        assert_eq!(detect_work_type("Mtto CORRECTIVO urgente"), WORK_TYPE_CORRECTIVO);
        assert_eq!(detect_work_type("mejora de linea"), WORK_TYPE_MEJORA);
        // Preventive outranks corrective when both appear.
        assert_eq!(
            detect_work_type("correctivo tras preventivo"),
            WORK_TYPE_PREVENTIVO
        );
    }

    #[test]
    fn test_detect_work_type_unmatched_is_empty() {
        assert_eq!(detect_work_type("inspeccion"), "");
        assert_eq!(detect_work_type(""), "");
        assert_eq!(detect_work_type("   "), "");
    }

    #[test]
    fn test_category_and_owner_defaults() {
        assert_eq!(normalize_category("opex"), "OPEX");
        assert_eq!(normalize_category("  api "), "API");
        assert_eq!(normalize_category(""), CATEGORY_OPEX);
        assert_eq!(normalize_owner("mecanico"), "MECANICO");
        assert_eq!(normalize_owner("   "), DEFAULT_OWNER);
    }

    #[test]
    fn test_normalization_keeps_accented_text() {
        assert_eq!(normalize_owner("instrumentación"), "INSTRUMENTACIÓN");
    }

    #[test]
    fn test_shift_token_parsing() {
        assert_eq!(Shift::parse_token("T2"), Shift::T2);
        assert_eq!(Shift::parse_token("t3"), Shift::T3);
        assert_eq!(Shift::parse_token(" t1 "), Shift::T1);
        assert_eq!(Shift::parse_token("turno"), Shift::T1);
        assert_eq!(Shift::parse_token(""), Shift::T1);
    }

    #[test]
    fn test_shift_order_is_contiguous() {
        for (i, shift) in Shift::ORDER.iter().enumerate() {
            assert_eq!(shift.index(), i);
        }
    }
}
