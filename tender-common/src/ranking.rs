//! Bid ranking and comparison analysis
//!
//! Given a tender's estimated cost and the submitted bids, computes each
//! bid's percentage above/below the estimate, ranks bids ascending by
//! amount (lowest quote = rank 1) and flags abnormally low quotes for
//! manual scrutiny. Ranks are always recomputed from the stored bids, so
//! re-running the computation on unchanged data is a no-op.

use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Default threshold below the estimate (percent) at which a bid is
/// flagged abnormally low
pub const DEFAULT_ABNORMAL_THRESHOLD_PCT: f64 = 20.0;

/// Tie-break policy when two bids quote the same amount.
///
/// The departmental convention is earliest submission first, but the rule
/// is not written down anywhere authoritative, so it stays configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earlier `submitted_at` wins; bids without a timestamp sort last
    EarliestSubmission,
    /// Alphabetical bidder name wins
    BidderName,
}

impl Default for TieBreak {
    fn default() -> Self {
        TieBreak::EarliestSubmission
    }
}

impl TieBreak {
    /// Parse a settings-table value; unknown strings fall back to default
    pub fn from_setting(value: &str) -> Self {
        match value {
            "bidder_name" => TieBreak::BidderName,
            _ => TieBreak::EarliestSubmission,
        }
    }

    pub fn as_setting(&self) -> &'static str {
        match self {
            TieBreak::EarliestSubmission => "earliest_submission",
            TieBreak::BidderName => "bidder_name",
        }
    }
}

/// A bid as submitted, before ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidQuote {
    pub bidder_name: String,
    /// Quoted percentage above (+) or below (−) the estimate
    pub percentage: f64,
    /// Quoted amount; derived from the percentage when absent
    pub amount: Option<f64>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
}

/// A bid after ranking, with derived fields filled in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBid {
    pub bidder_name: String,
    pub amount: f64,
    /// (amount − estimate) / estimate × 100
    pub percent_diff: f64,
    /// Statutory display form: "5.00 ABOVE", "2.50 BELOW", "AT ESTIMATE"
    pub percent_display: String,
    /// Dense rank 1..N, 1 = lowest amount
    pub rank: u32,
    pub is_lowest: bool,
    /// More than the configured threshold below the estimate
    pub abnormally_low: bool,
    pub contact: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
}

/// Aggregate analysis over the ranked bids of one tender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidAnalysis {
    pub total_bidders: usize,
    pub lowest_bid: f64,
    pub highest_bid: f64,
    pub average_bid: f64,
    pub bid_range: f64,
    pub lowest_bidder_name: String,
    /// Positive when the lowest bid undercuts the estimate
    pub is_saving: bool,
    /// Absolute difference between estimate and lowest bid
    pub delta_amount: f64,
    /// Same difference as a percentage of the estimate
    pub delta_percentage: f64,
    pub above_estimate: usize,
    pub below_estimate: usize,
    pub at_estimate: usize,
    /// "High" (3+ bidders), "Moderate" (2), "Low" (1)
    pub competition_level: String,
    /// Bid range as a percentage of the average bid
    pub price_spread_percentage: f64,
    pub spread_classification: String,
    pub abnormal_count: usize,
}

/// Ranked bids plus their aggregate analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub bids: Vec<RankedBid>,
    pub analysis: BidAnalysis,
}

/// Statutory percentage display: positive is ABOVE, negative BELOW
pub fn percent_display(pct: f64) -> String {
    if pct > 0.0 {
        format!("{:.2} ABOVE", pct)
    } else if pct < 0.0 {
        format!("{:.2} BELOW", pct.abs())
    } else {
        "AT ESTIMATE".to_string()
    }
}

/// Rank bids for a tender.
///
/// Fails with [`Error::InvalidEstimate`] when the estimate is zero or
/// negative (percent computations would be undefined) and with
/// [`Error::InvalidInput`] when no bids are supplied.
pub fn rank_bids(
    estimated_cost: f64,
    quotes: &[BidQuote],
    tie_break: TieBreak,
    abnormal_threshold_pct: f64,
) -> Result<Vec<RankedBid>> {
    if estimated_cost <= 0.0 {
        return Err(Error::InvalidEstimate(format!(
            "estimated cost must be positive, got {}",
            estimated_cost
        )));
    }
    if quotes.is_empty() {
        return Err(Error::InvalidInput("at least one bid is required".to_string()));
    }

    let mut bids: Vec<RankedBid> = quotes
        .iter()
        .map(|quote| {
            let amount = match quote.amount {
                Some(a) => a,
                // Derive from percentage, rounded to paise
                None => (estimated_cost * (1.0 + quote.percentage / 100.0) * 100.0).round() / 100.0,
            };
            let percent_diff = (amount - estimated_cost) / estimated_cost * 100.0;
            RankedBid {
                bidder_name: quote.bidder_name.trim().to_string(),
                amount,
                percent_diff,
                percent_display: percent_display(percent_diff),
                rank: 0,
                is_lowest: false,
                abnormally_low: percent_diff < -abnormal_threshold_pct,
                contact: quote.contact.clone(),
                submitted_at: quote.submitted_at,
            }
        })
        .collect();

    bids.sort_by(|a, b| {
        a.amount
            .partial_cmp(&b.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| match tie_break {
                TieBreak::EarliestSubmission => match (a.submitted_at, b.submitted_at) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.bidder_name.cmp(&b.bidder_name),
                },
                TieBreak::BidderName => a.bidder_name.cmp(&b.bidder_name),
            })
    });

    for (i, bid) in bids.iter_mut().enumerate() {
        bid.rank = i as u32 + 1;
        bid.is_lowest = i == 0;
    }

    Ok(bids)
}

/// Analyze ranked bids against the estimate.
///
/// Expects the output of [`rank_bids`] (sorted, non-empty).
pub fn analyze(bids: &[RankedBid], estimated_cost: f64) -> Result<BidAnalysis> {
    if estimated_cost <= 0.0 {
        return Err(Error::InvalidEstimate(format!(
            "estimated cost must be positive, got {}",
            estimated_cost
        )));
    }
    let lowest = bids
        .first()
        .ok_or_else(|| Error::InvalidInput("no bids to analyze".to_string()))?;

    let amounts: Vec<f64> = bids.iter().map(|b| b.amount).collect();
    let lowest_bid = amounts.iter().cloned().fold(f64::INFINITY, f64::min);
    let highest_bid = amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let average_bid = amounts.iter().sum::<f64>() / amounts.len() as f64;
    let bid_range = highest_bid - lowest_bid;

    let delta = estimated_cost - lowest_bid;

    let price_spread_percentage = if average_bid > 0.0 {
        bid_range / average_bid * 100.0
    } else {
        0.0
    };

    Ok(BidAnalysis {
        total_bidders: bids.len(),
        lowest_bid,
        highest_bid,
        average_bid,
        bid_range,
        lowest_bidder_name: lowest.bidder_name.clone(),
        is_saving: delta > 0.0,
        delta_amount: delta.abs(),
        delta_percentage: delta.abs() / estimated_cost * 100.0,
        above_estimate: bids.iter().filter(|b| b.percent_diff > 0.0).count(),
        below_estimate: bids.iter().filter(|b| b.percent_diff < 0.0).count(),
        at_estimate: bids.iter().filter(|b| b.percent_diff == 0.0).count(),
        competition_level: match bids.len() {
            0 | 1 => "Low",
            2 => "Moderate",
            _ => "High",
        }
        .to_string(),
        price_spread_percentage,
        spread_classification: if price_spread_percentage > 20.0 {
            "High variation in bids"
        } else if price_spread_percentage > 10.0 {
            "Moderate variation in bids"
        } else {
            "Low variation in bids"
        }
        .to_string(),
        abnormal_count: bids.iter().filter(|b| b.abnormally_low).count(),
    })
}

/// Rank and analyze in one step
pub fn rank_and_analyze(
    estimated_cost: f64,
    quotes: &[BidQuote],
    tie_break: TieBreak,
    abnormal_threshold_pct: f64,
) -> Result<RankingOutcome> {
    let bids = rank_bids(estimated_cost, quotes, tie_break, abnormal_threshold_pct)?;
    let analysis = analyze(&bids, estimated_cost)?;
    Ok(RankingOutcome { bids, analysis })
}

/// Human-readable award recommendation for the comparison sheet
pub fn recommendation(analysis: &BidAnalysis) -> String {
    let mut parts = vec![format!(
        "Lowest bidder: {} with bid amount ₹{}",
        analysis.lowest_bidder_name,
        crate::currency::format_inr(analysis.lowest_bid)
    )];

    if analysis.is_saving {
        parts.push(format!(
            "Project will save ₹{} ({:.2}% below estimate)",
            crate::currency::format_inr(analysis.delta_amount),
            analysis.delta_percentage
        ));
    } else {
        parts.push(format!(
            "Project will cost ₹{} extra ({:.2}% above estimate)",
            crate::currency::format_inr(analysis.delta_amount),
            analysis.delta_percentage
        ));
    }

    parts.push(format!(
        "Competition level: {} ({} bidders)",
        analysis.competition_level, analysis.total_bidders
    ));
    parts.push(format!("Price analysis: {}", analysis.spread_classification));

    if analysis.abnormal_count > 0 {
        parts.push(format!(
            "{} bid(s) abnormally low - manual review required",
            analysis.abnormal_count
        ));
    }

    format!("{}.", parts.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn quote(name: &str, amount: f64) -> BidQuote {
        BidQuote {
            bidder_name: name.to_string(),
            percentage: 0.0,
            amount: Some(amount),
            contact: None,
            submitted_at: None,
        }
    }

    fn quote_at(name: &str, amount: f64, day: u32) -> BidQuote {
        BidQuote {
            submitted_at: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(10, 0, 0),
            ..quote(name, amount)
        }
    }

    #[test]
    fn reference_example() {
        // estimate 100000, bids [105000, 95000, 110000]:
        // ranks [2, 1, 3], percent diffs [+5, -5, +10], nothing abnormal
        let quotes = vec![
            quote("Alpha Builders", 105000.0),
            quote("Beta Constructions", 95000.0),
            quote("Gamma Infra", 110000.0),
        ];
        let bids =
            rank_bids(100000.0, &quotes, TieBreak::default(), DEFAULT_ABNORMAL_THRESHOLD_PCT)
                .unwrap();

        assert_eq!(bids[0].bidder_name, "Beta Constructions");
        assert_eq!(bids[0].rank, 1);
        assert!(bids[0].is_lowest);
        assert!((bids[0].percent_diff - -5.0).abs() < 1e-9);

        assert_eq!(bids[1].bidder_name, "Alpha Builders");
        assert_eq!(bids[1].rank, 2);
        assert!((bids[1].percent_diff - 5.0).abs() < 1e-9);

        assert_eq!(bids[2].bidder_name, "Gamma Infra");
        assert_eq!(bids[2].rank, 3);
        assert!((bids[2].percent_diff - 10.0).abs() < 1e-9);

        assert!(bids.iter().all(|b| !b.abnormally_low));
    }

    #[test]
    fn ranks_are_dense_permutation() {
        let quotes: Vec<BidQuote> = (0..10)
            .map(|i| quote(&format!("Bidder {}", i), 100000.0 + (i * 37 % 10) as f64 * 1000.0))
            .collect();
        let bids =
            rank_bids(100000.0, &quotes, TieBreak::default(), DEFAULT_ABNORMAL_THRESHOLD_PCT)
                .unwrap();

        let mut ranks: Vec<u32> = bids.iter().map(|b| b.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=10).collect::<Vec<u32>>());

        // Lowest amount holds rank 1
        let min = bids.iter().map(|b| b.amount).fold(f64::INFINITY, f64::min);
        assert_eq!(bids.iter().find(|b| b.rank == 1).unwrap().amount, min);
    }

    #[test]
    fn ranking_is_idempotent() {
        let quotes = vec![
            quote("A", 105000.0),
            quote("B", 95000.0),
            quote("C", 110000.0),
        ];
        let first =
            rank_bids(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();
        let second =
            rank_bids(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.rank, b.rank);
            assert_eq!(a.amount, b.amount);
            assert_eq!(a.percent_diff, b.percent_diff);
        }
    }

    #[test]
    fn tie_break_earliest_submission() {
        let quotes = vec![
            quote_at("Later Bidder", 95000.0, 15),
            quote_at("Earlier Bidder", 95000.0, 10),
        ];
        let bids =
            rank_bids(100000.0, &quotes, TieBreak::EarliestSubmission, 20.0).unwrap();
        assert_eq!(bids[0].bidder_name, "Earlier Bidder");
        assert_eq!(bids[0].rank, 1);
        assert_eq!(bids[1].rank, 2);
    }

    #[test]
    fn tie_break_bidder_name_policy() {
        let quotes = vec![
            quote_at("Zulu Works", 95000.0, 10),
            quote_at("Alpha Works", 95000.0, 15),
        ];
        let bids = rank_bids(100000.0, &quotes, TieBreak::BidderName, 20.0).unwrap();
        assert_eq!(bids[0].bidder_name, "Alpha Works");
    }

    #[test]
    fn zero_estimate_is_guarded() {
        let quotes = vec![quote("A", 95000.0)];
        let err = rank_bids(0.0, &quotes, TieBreak::default(), 20.0).unwrap_err();
        assert!(matches!(err, Error::InvalidEstimate(_)));
    }

    #[test]
    fn empty_bid_set_rejected() {
        let err = rank_bids(100000.0, &[], TieBreak::default(), 20.0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn abnormally_low_flagging() {
        let quotes = vec![
            quote("Normal", 95000.0),
            quote("Suspicious", 70000.0), // 30% below
        ];
        let bids = rank_bids(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();
        assert!(!bids.iter().find(|b| b.bidder_name == "Normal").unwrap().abnormally_low);
        assert!(bids.iter().find(|b| b.bidder_name == "Suspicious").unwrap().abnormally_low);
    }

    #[test]
    fn amount_derived_from_percentage() {
        let quotes = vec![BidQuote {
            bidder_name: "Percent Only".to_string(),
            percentage: 5.0,
            amount: None,
            contact: None,
            submitted_at: None,
        }];
        let bids = rank_bids(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();
        assert_eq!(bids[0].amount, 105000.0);
    }

    #[test]
    fn analysis_savings_and_distribution() {
        let quotes = vec![
            quote("A", 105000.0),
            quote("B", 95000.0),
            quote("C", 110000.0),
        ];
        let outcome =
            rank_and_analyze(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();
        let analysis = &outcome.analysis;

        assert_eq!(analysis.total_bidders, 3);
        assert_eq!(analysis.lowest_bid, 95000.0);
        assert_eq!(analysis.highest_bid, 110000.0);
        assert!(analysis.is_saving);
        assert_eq!(analysis.delta_amount, 5000.0);
        assert_eq!(analysis.above_estimate, 2);
        assert_eq!(analysis.below_estimate, 1);
        assert_eq!(analysis.competition_level, "High");
    }

    #[test]
    fn outcome_survives_json_round_trip() {
        let quotes = vec![quote("A", 105000.0), quote("B", 95000.0)];
        let outcome =
            rank_and_analyze(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();

        let json = serde_json::to_string(&outcome).unwrap();
        let back: RankingOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back.analysis.competition_level, "Moderate");
        assert_eq!(back.bids[0].rank, 1);
    }

    #[test]
    fn percent_display_forms() {
        assert_eq!(percent_display(5.0), "5.00 ABOVE");
        assert_eq!(percent_display(-2.5), "2.50 BELOW");
        assert_eq!(percent_display(0.0), "AT ESTIMATE");
    }

    #[test]
    fn recommendation_mentions_lowest_bidder() {
        let quotes = vec![quote("Sharma Constructions", 95000.0)];
        let outcome =
            rank_and_analyze(100000.0, &quotes, TieBreak::default(), 20.0).unwrap();
        let text = recommendation(&outcome.analysis);
        assert!(text.contains("Sharma Constructions"));
        assert!(text.contains("save"));
    }
}
