// src/aggregate.rs
//
// Derived spend metrics. Pure functions over a snapshot, recomputed in full
// on every read so the numbers always match the collection. The collections
// involved stay small enough that linear passes beat any cleverness.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::work_order::{
    WorkOrder, BUCKET_NO_CATEGORY, BUCKET_NO_OWNER, BUCKET_NO_TYPE, WORK_TYPE_PREVENTIVO,
};

/// Fixed palette for owner color assignment, darkest first.
pub const OWNER_PALETTE: [&str; 5] = ["#1e40af", "#3b82f6", "#60a5fa", "#93c5fd", "#bfdbfe"];

/// One rung of the owner spend ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSpend {
    pub owner: String,
    pub amount: Decimal,
}

/// Everything the dashboard header needs from one recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendSummary {
    pub total_amount: Decimal,
    pub sum_by_category: BTreeMap<String, Decimal>,
    pub sum_by_type: BTreeMap<String, Decimal>,
    pub sum_by_owner: BTreeMap<String, Decimal>,
    /// Owners by spend, highest first. Ties keep first-appearance order.
    pub owner_ranking: Vec<OwnerSpend>,
    /// Preventive spend as a percentage of the total, one decimal place.
    pub preventive_share: Decimal,
    pub owner_colors: BTreeMap<String, String>,
}

fn bucket(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn filtered<'a>(
    orders: &'a [WorkOrder],
    owner_filter: Option<&'a str>,
) -> impl Iterator<Item = &'a WorkOrder> {
    orders
        .iter()
        .filter(move |order| owner_filter.map_or(true, |wanted| order.owner == wanted))
}

/// Recompute the spend summary for the given snapshot, optionally restricted
/// to one owner. Missing classification keys fold into sentinel buckets so
/// every row stays visible in the totals.
pub fn aggregate(orders: &[WorkOrder], owner_filter: Option<&str>) -> SpendSummary {
    let mut total = Decimal::ZERO;
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_type: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_owner: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut ranking: Vec<OwnerSpend> = Vec::new();
    let mut preventive = Decimal::ZERO;

    for order in filtered(orders, owner_filter) {
        total += order.amount;
        *by_category
            .entry(bucket(&order.category, BUCKET_NO_CATEGORY))
            .or_default() += order.amount;
        *by_type
            .entry(bucket(&order.work_type, BUCKET_NO_TYPE))
            .or_default() += order.amount;
        let owner_key = bucket(&order.owner, BUCKET_NO_OWNER);
        *by_owner.entry(owner_key.clone()).or_default() += order.amount;
        match ranking.iter_mut().find(|entry| entry.owner == owner_key) {
            Some(entry) => entry.amount += order.amount,
            None => ranking.push(OwnerSpend {
                owner: owner_key,
                amount: order.amount,
            }),
        }
        if order.work_type == WORK_TYPE_PREVENTIVO {
            preventive += order.amount;
        }
    }

    ranking.sort_by(|a, b| b.amount.cmp(&a.amount));

    let preventive_share = if total.is_zero() {
        Decimal::ZERO
    } else {
        (preventive * dec!(100) / total).round_dp(1)
    };

    SpendSummary {
        total_amount: total,
        sum_by_category: by_category,
        sum_by_type: by_type,
        sum_by_owner: by_owner,
        owner_ranking: ranking,
        preventive_share,
        owner_colors: owner_colors(orders),
    }
}

/// Deterministic palette assignment over the sorted distinct owner list,
/// wrapping around when owners outnumber colors. Derived on demand so owners
/// keep their color across unrelated mutations.
pub fn owner_colors(orders: &[WorkOrder]) -> BTreeMap<String, String> {
    let mut owners: Vec<String> = orders
        .iter()
        .map(|order| bucket(&order.owner, BUCKET_NO_OWNER))
        .collect();
    owners.sort();
    owners.dedup();
    owners
        .into_iter()
        .enumerate()
        .map(|(index, owner)| {
            (
                owner,
                OWNER_PALETTE[index % OWNER_PALETTE.len()].to_string(),
            )
        })
        .collect()
}

/// Work orders in one category, highest spend first. Ties keep collection
/// order.
pub fn ranked_by_category(orders: &[WorkOrder], category: &str) -> Vec<WorkOrder> {
    let mut ranked: Vec<WorkOrder> = orders
        .iter()
        .filter(|order| order.category == category)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount));
    ranked
}

/// Owner-sorted projection for the planning board, optionally restricted to
/// one owner. Ties keep collection order.
pub fn planning_view(orders: &[WorkOrder], owner_filter: Option<&str>) -> Vec<WorkOrder> {
    let mut view: Vec<WorkOrder> = filtered(orders, owner_filter).cloned().collect();
    view.sort_by(|a, b| a.owner.cmp(&b.owner));
    view
}
