// src/ingest.rs
//
// Bulk ingestion pipelines. Each one turns a raw payload into a candidate
// batch of composed work orders; merging the batch into the collection is the
// caller's decision.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::parser::{parse_grid_slot, parse_line, GridSlot, ParsedRecord};
use crate::schedule::expand_schedule;
use crate::store::IdSequence;
use crate::work_order::{OrderId, WorkOrder};

/// Result of one bulk ingestion run. An empty `accepted` from a non-empty
/// payload is the "nothing imported" signal the HTTP layer surfaces as its
/// own error.
#[derive(Debug)]
pub struct IngestOutcome {
    pub accepted: Vec<WorkOrder>,
    pub skipped: usize,
}

impl IngestOutcome {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

/// Attach an id and the expanded schedule to a parsed record. Orders missing
/// either date carry an empty schedule.
pub fn compose_order(record: ParsedRecord, id: OrderId) -> WorkOrder {
    let schedule = match (record.start_date, record.end_date) {
        (Some(start), Some(end)) => {
            expand_schedule(start, record.start_shift, end, record.end_shift)
        }
        _ => BTreeMap::new(),
    };
    WorkOrder {
        id,
        activity: record.activity,
        amount: record.amount,
        category: record.category,
        owner: record.owner,
        work_type: record.work_type,
        start_date: record.start_date,
        end_date: record.end_date,
        schedule,
    }
}

/// Parse a multi-line paste payload into a candidate batch. Rows that match
/// no format are counted and logged, never fatal.
pub fn ingest_text(payload: &str, ids: &IdSequence) -> IngestOutcome {
    let mut accepted = Vec::new();
    let mut skipped = 0usize;
    for line in payload.lines() {
        match parse_line(line) {
            Some(record) => accepted.push(compose_order(record, ids.next())),
            None => {
                debug!("Skipped row without usable format: {:?}", line);
                skipped += 1;
            }
        }
    }
    info!(
        "Text ingestion finished: {} accepted, {} skipped",
        accepted.len(),
        skipped
    );
    IngestOutcome { accepted, skipped }
}

/// Parse a decoded spreadsheet grid. Every row carries two independent record
/// slots; a row counts as skipped only when neither slot yields a record.
pub fn ingest_grid(rows: &[Vec<String>], ids: &IdSequence) -> IngestOutcome {
    let mut accepted = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        if row.len() < 2 {
            skipped += 1;
            continue;
        }
        let mut produced = false;
        for slot in [GridSlot::Left, GridSlot::Right] {
            if let Some(record) = parse_grid_slot(row, slot) {
                accepted.push(compose_order(record, ids.next()));
                produced = true;
            }
        }
        if !produced {
            skipped += 1;
        }
    }
    info!(
        "Grid ingestion finished: {} accepted, {} skipped",
        accepted.len(),
        skipped
    );
    IngestOutcome { accepted, skipped }
}

/// Decode a comma-separated export into the grid shape and run it through
/// the grid pipeline. This covers plain-text exports that never went through
/// a spreadsheet decoder.
pub fn ingest_csv_text(payload: &str, ids: &IdSequence) -> Result<IngestOutcome, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(payload.as_bytes());
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(ingest_grid(&rows, ids))
}

/// Render one grid cell as text. Spreadsheet decoders hand over numbers and
/// blanks as typed JSON values, so the grid pipeline flattens them first.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
