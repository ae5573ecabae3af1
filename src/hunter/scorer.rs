//! Degen scorer - maps a pair snapshot to a 0-100 pump potential score.
//!
//! The score is the sum of six independently capped factors. Every breakpoint
//! table is evaluated top-down and the first strict match wins; no match gives
//! zero points for that factor. Scoring is pure and total: missing feed fields
//! have already been defaulted by the data source.

use crate::hunter::pump_detector::is_pumping;
use crate::hunter::types::{Factor, FactorScores, ScoreResult};
use crate::types::TokenSnapshot;

/// Upper bound of the degen score.
pub const MAX_SCORE: u8 = 100;

const LIQUIDITY_TABLE: [(f64, u8); 4] = [(100_000.0, 20), (50_000.0, 15), (10_000.0, 10), (5_000.0, 5)];
const VOLUME_RATIO_TABLE: [(f64, u8); 4] = [(10.0, 20), (5.0, 15), (2.0, 10), (1.0, 5)];
const AGE_TABLE: [(f64, u8); 4] = [(1.0, 15), (6.0, 12), (24.0, 8), (48.0, 4)];
const HOLDERS_TABLE: [(u64, u8); 4] = [(1000, 15), (500, 12), (100, 8), (50, 4)];
const MOMENTUM_TABLE: [(f64, u8); 4] = [(100.0, 15), (50.0, 12), (20.0, 8), (10.0, 4)];
const ACTIVITY_TABLE: [(u64, u8); 3] = [(50, 15), (20, 10), (10, 5)];

/// First row whose threshold the value strictly exceeds.
fn above<T: PartialOrd + Copy>(value: T, table: &[(T, u8)]) -> u8 {
    table
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|&(_, points)| points)
        .unwrap_or(0)
}

/// First row whose threshold the value is strictly below.
fn below(value: f64, table: &[(f64, u8)]) -> u8 {
    table
        .iter()
        .find(|(threshold, _)| value < *threshold)
        .map(|&(_, points)| points)
        .unwrap_or(0)
}

/// 24h volume over liquidity, zero when there is no liquidity.
pub fn volume_liquidity_ratio(snapshot: &TokenSnapshot) -> f64 {
    if snapshot.liquidity_usd > 0.0 {
        snapshot.volume_24h / snapshot.liquidity_usd
    } else {
        0.0
    }
}

/// Points for a single factor.
pub fn factor_points(snapshot: &TokenSnapshot, factor: Factor) -> u8 {
    match factor {
        Factor::Liquidity => above(snapshot.liquidity_usd, &LIQUIDITY_TABLE),
        Factor::VolumeRatio => above(volume_liquidity_ratio(snapshot), &VOLUME_RATIO_TABLE),
        Factor::Age => below(snapshot.age_hours, &AGE_TABLE),
        Factor::Holders => above(snapshot.holders, &HOLDERS_TABLE),
        Factor::Momentum => above(snapshot.price_change_1h, &MOMENTUM_TABLE),
        Factor::Activity => above(snapshot.txns_5m, &ACTIVITY_TABLE),
    }
}

/// Points per factor.
pub fn breakdown(snapshot: &TokenSnapshot) -> FactorScores {
    let mut scores = FactorScores::new();
    for factor in Factor::all() {
        scores.set(factor, factor_points(snapshot, factor));
    }
    scores
}

/// Degen score in [0, 100].
pub fn score(snapshot: &TokenSnapshot) -> u8 {
    breakdown(snapshot).total().min(MAX_SCORE as u32) as u8
}

/// Score and pump flag together.
pub fn evaluate(snapshot: &TokenSnapshot) -> ScoreResult {
    let breakdown = breakdown(snapshot);
    ScoreResult {
        score: breakdown.total().min(MAX_SCORE as u32) as u8,
        is_pumping: is_pumping(snapshot),
        breakdown,
    }
}

/// Launch-scan policy: alert when the score reaches the minimum or the pair is pumping.
pub fn should_alert(result: &ScoreResult, min_score: u8) -> bool {
    result.score >= min_score || result.is_pumping
}
