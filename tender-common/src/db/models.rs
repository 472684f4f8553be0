//! Database models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tender lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    Draft,
    Open,
    Closed,
    Awarded,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Draft => "draft",
            TenderStatus::Open => "open",
            TenderStatus::Closed => "closed",
            TenderStatus::Awarded => "awarded",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "draft" => Ok(TenderStatus::Draft),
            "open" => Ok(TenderStatus::Open),
            "closed" => Ok(TenderStatus::Closed),
            "awarded" => Ok(TenderStatus::Awarded),
            other => Err(Error::InvalidInput(format!("unknown status: {}", other))),
        }
    }

    /// Legal forward transitions: draft → open → closed → awarded.
    /// Re-asserting the current status is a no-op, not an error.
    pub fn can_transition_to(&self, next: TenderStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (TenderStatus::Draft, TenderStatus::Open)
                | (TenderStatus::Open, TenderStatus::Closed)
                | (TenderStatus::Closed, TenderStatus::Awarded)
        )
    }
}

/// A tender (work) row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tender {
    pub id: i64,
    pub nit_number: String,
    pub work_name: String,
    pub estimated_cost: f64,
    pub schedule_amount: Option<f64>,
    pub earnest_money: Option<f64>,
    pub time_of_completion_months: Option<i64>,
    pub ee_name: Option<String>,
    /// ISO date (normalized at the validation boundary)
    pub tender_date: Option<String>,
    pub submission_deadline: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Tender {
    pub fn status(&self) -> Result<TenderStatus> {
        TenderStatus::parse(&self.status)
    }
}

/// Fields supplied when creating or updating a tender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTender {
    pub nit_number: String,
    pub work_name: String,
    pub estimated_cost: f64,
    #[serde(default)]
    pub schedule_amount: Option<f64>,
    #[serde(default)]
    pub earnest_money: Option<f64>,
    #[serde(default)]
    pub time_of_completion_months: Option<i64>,
    #[serde(default)]
    pub ee_name: Option<String>,
    #[serde(default)]
    pub tender_date: Option<String>,
    #[serde(default)]
    pub submission_deadline: Option<String>,
}

/// Tender list entry with its bid count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TenderSummary {
    pub id: i64,
    pub nit_number: String,
    pub work_name: String,
    pub estimated_cost: f64,
    pub status: String,
    pub created_at: String,
    pub bid_count: i64,
}

/// Bidder directory entry, with usage tracking for auto-suggestion
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidderProfile {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub registration_number: Option<String>,
    /// Historical rating 1-5
    pub rating: Option<i64>,
    pub last_used: Option<String>,
    pub usage_count: i64,
}

/// A persisted bid row for one tender
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidRow {
    pub id: i64,
    pub tender_id: i64,
    pub bidder_name: String,
    pub percentage: f64,
    pub amount: f64,
    pub contact: Option<String>,
    pub submitted_at: Option<String>,
    pub is_lowest: bool,
    pub created_at: String,
}

/// Aggregate bidder statistics for the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidderStats {
    pub total_unique_bidders: i64,
    pub frequent_bidders: Vec<FrequentBidder>,
    pub recent_bids_30_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FrequentBidder {
    pub name: String,
    pub usage_count: i64,
}
