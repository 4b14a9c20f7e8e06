// src/parser.rs
//
// Tolerant row parsing for pasted text and spreadsheet-like grids. Rows come
// from humans copying out of whatever tool they had open, so every field has
// a recovery policy and the only hard requirement is a non-empty activity.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::work_order::{
    detect_work_type, normalize_category, normalize_owner, upper_or, Shift, CATEGORY_API,
    CATEGORY_OPEX,
};

/// Structured fields recovered from one raw row, before an id or an expanded
/// schedule is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub activity: String,
    pub amount: Decimal,
    pub category: String,
    pub owner: String,
    pub work_type: String,
    pub start_date: Option<NaiveDate>,
    pub start_shift: Shift,
    pub end_date: Option<NaiveDate>,
    pub end_shift: Shift,
}

// --- Line Formats ---

// Hyphen rows are right-anchored: the trailing field block has a fixed width
// and everything before it is the activity, hyphens included.
const SCHEDULED_TAIL: usize = 8; // amount .. end shift
const LEGACY_TAIL: usize = 4; // amount .. work type

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowFormat {
    /// Tab-separated, positional columns.
    Tabbed,
    /// Hyphen-separated with the date/shift block.
    HyphenScheduled,
    /// Hyphen-separated five-field form.
    HyphenLegacy,
    /// Hyphen-separated stub of two to four fields, read positionally.
    HyphenShort,
}

/// Candidate formats in match order. Tabs win outright; hyphen splitting is
/// the fallback and picks its variant by column count.
fn match_format(line: &str) -> Option<(RowFormat, Vec<&str>)> {
    let tab_cols: Vec<&str> = line.split('\t').collect();
    if tab_cols.len() >= 2 {
        return Some((RowFormat::Tabbed, tab_cols));
    }
    let hyphen_cols: Vec<&str> = line.split('-').collect();
    match hyphen_cols.len() {
        n if n >= 1 + SCHEDULED_TAIL => Some((RowFormat::HyphenScheduled, hyphen_cols)),
        n if n >= 1 + LEGACY_TAIL => Some((RowFormat::HyphenLegacy, hyphen_cols)),
        2..=4 => Some((RowFormat::HyphenShort, hyphen_cols)),
        _ => None,
    }
}

/// Column values in canonical order, before normalization. Trailing columns
/// a short row never had stay `None` and take the field defaults.
#[derive(Debug, Default)]
struct RawFields<'a> {
    activity: String,
    amount: Option<&'a str>,
    category: Option<&'a str>,
    owner: Option<&'a str>,
    work_type: Option<&'a str>,
    start_date: Option<&'a str>,
    start_shift: Option<&'a str>,
    end_date: Option<&'a str>,
    end_shift: Option<&'a str>,
}

fn positional_fields<'a>(cols: &[&'a str]) -> RawFields<'a> {
    RawFields {
        activity: cols.first().copied().unwrap_or_default().to_string(),
        amount: cols.get(1).copied(),
        category: cols.get(2).copied(),
        owner: cols.get(3).copied(),
        work_type: cols.get(4).copied(),
        start_date: cols.get(5).copied(),
        start_shift: cols.get(6).copied(),
        end_date: cols.get(7).copied(),
        end_shift: cols.get(8).copied(),
    }
}

/// Rejoin everything left of the fixed-width tail as the activity. This is
/// what lets activity text keep its own hyphens.
fn anchored_fields<'a>(cols: &[&'a str], tail: usize) -> RawFields<'a> {
    let split_at = cols.len() - tail;
    let tail_cols = &cols[split_at..];
    RawFields {
        activity: cols[..split_at].join("-"),
        amount: tail_cols.first().copied(),
        category: tail_cols.get(1).copied(),
        owner: tail_cols.get(2).copied(),
        work_type: tail_cols.get(3).copied(),
        start_date: tail_cols.get(4).copied(),
        start_shift: tail_cols.get(5).copied(),
        end_date: tail_cols.get(6).copied(),
        end_shift: tail_cols.get(7).copied(),
    }
}

/// Parse one raw text line. `None` means the row is skipped: no candidate
/// format matched, or the activity came out empty.
pub fn parse_line(line: &str) -> Option<ParsedRecord> {
    let (format, cols) = match_format(line)?;
    let fields = match format {
        RowFormat::Tabbed | RowFormat::HyphenShort => positional_fields(&cols),
        RowFormat::HyphenScheduled => anchored_fields(&cols, SCHEDULED_TAIL),
        RowFormat::HyphenLegacy => anchored_fields(&cols, LEGACY_TAIL),
    };
    build_record(fields)
}

fn build_record(fields: RawFields<'_>) -> Option<ParsedRecord> {
    let activity = fields.activity.trim().to_string();
    if activity.is_empty() {
        return None;
    }
    Some(ParsedRecord {
        activity,
        amount: parse_amount(fields.amount.unwrap_or_default()),
        category: normalize_category(fields.category.unwrap_or_default()),
        owner: normalize_owner(fields.owner.unwrap_or_default()),
        work_type: detect_work_type(fields.work_type.unwrap_or_default()),
        start_date: parse_flexible_date(fields.start_date.unwrap_or_default()),
        start_shift: Shift::parse_token(fields.start_shift.unwrap_or_default()),
        end_date: parse_flexible_date(fields.end_date.unwrap_or_default()),
        end_shift: Shift::parse_token(fields.end_shift.unwrap_or_default()),
    })
}

// --- Field Policies ---

/// Amount policy: strip currency symbols, thousands separators and any other
/// noise, keeping digits, dots and minus signs. Unparseable input becomes 0.
pub fn parse_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

static DATE_DMY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("day-first date pattern")
});
static DATE_ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("ISO date pattern")
});

/// Date policy: day-first DD/MM/YYYY or ISO YYYY-MM-DD. Anything else,
/// including calendar-invalid dates, is treated as absent.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if DATE_DMY.is_match(text) {
        return NaiveDate::parse_from_str(text, "%d/%m/%Y").ok();
    }
    if DATE_ISO.is_match(text) {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d").ok();
    }
    None
}

// --- Grid Rows ---

/// Header label marking a non-data row in spreadsheet imports.
pub const HEADER_ACTIVITY_LABEL: &str = "ACTIVIDAD";

/// Which of the two fixed record slots of a spreadsheet row to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSlot {
    /// Columns 1-5.
    Left,
    /// Columns 9-13.
    Right,
}

impl GridSlot {
    fn base(self) -> usize {
        match self {
            GridSlot::Left => 1,
            GridSlot::Right => 9,
        }
    }

    /// The sheet leaves the category column blank for its own headline
    /// groups, so each slot carries one.
    fn default_category(self) -> &'static str {
        match self {
            GridSlot::Left => CATEGORY_OPEX,
            GridSlot::Right => CATEGORY_API,
        }
    }
}

/// Parse one record slot out of a grid row. Header rows, blank slots and
/// negative amounts are skipped; the paste path is the only one that accepts
/// negative corrections.
pub fn parse_grid_slot(cells: &[String], slot: GridSlot) -> Option<ParsedRecord> {
    let base = slot.base();
    let cell = |offset: usize| -> String {
        cells
            .get(base + offset)
            .map(|value| value.trim().replace('"', ""))
            .unwrap_or_default()
    };

    let activity = cell(0);
    if activity.is_empty() || activity == HEADER_ACTIVITY_LABEL {
        return None;
    }
    let amount = parse_amount(&cell(1));
    if amount < Decimal::ZERO {
        return None;
    }
    Some(ParsedRecord {
        activity,
        amount,
        category: upper_or(&cell(2), slot.default_category()),
        owner: normalize_owner(&cell(3)),
        work_type: detect_work_type(&cell(4)),
        start_date: None,
        start_shift: Shift::T1,
        end_date: None,
        end_shift: Shift::T1,
    })
}
