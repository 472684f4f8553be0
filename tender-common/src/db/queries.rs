//! CRUD queries for tenders, bidders and bids
//!
//! Ranks and percent differences are recomputed from stored bids on read;
//! only the `is_lowest` convenience flag is materialized, maintained by
//! [`replace_bids`].

use crate::db::models::*;
use crate::ranking::RankedBid;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Tenders
// ---------------------------------------------------------------------------

pub async fn create_tender(pool: &SqlitePool, tender: &NewTender) -> Result<i64> {
    let now = now_iso();
    let result = sqlx::query(
        r#"
        INSERT INTO tenders (
            nit_number, work_name, estimated_cost, schedule_amount,
            earnest_money, time_of_completion_months, ee_name, tender_date,
            submission_deadline, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'draft', ?, ?)
        "#,
    )
    .bind(&tender.nit_number)
    .bind(&tender.work_name)
    .bind(tender.estimated_cost)
    .bind(tender.schedule_amount)
    .bind(tender.earnest_money)
    .bind(tender.time_of_completion_months)
    .bind(&tender.ee_name)
    .bind(&tender.tender_date)
    .bind(&tender.submission_deadline)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    info!("Created tender {} ({})", id, tender.nit_number);
    Ok(id)
}

pub async fn get_tender(pool: &SqlitePool, id: i64) -> Result<Tender> {
    sqlx::query_as::<_, Tender>("SELECT * FROM tenders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tender {}", id)))
}

/// Latest tender for a NIT number, if any
pub async fn get_tender_by_nit(pool: &SqlitePool, nit_number: &str) -> Result<Option<Tender>> {
    let tender = sqlx::query_as::<_, Tender>(
        "SELECT * FROM tenders WHERE nit_number = ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(nit_number)
    .fetch_optional(pool)
    .await?;
    Ok(tender)
}

pub async fn list_tenders(pool: &SqlitePool, limit: i64) -> Result<Vec<TenderSummary>> {
    let tenders = sqlx::query_as::<_, TenderSummary>(
        r#"
        SELECT t.id, t.nit_number, t.work_name, t.estimated_cost, t.status,
               t.created_at, COUNT(b.id) AS bid_count
        FROM tenders t
        LEFT JOIN bids b ON t.id = b.tender_id
        GROUP BY t.id
        ORDER BY t.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(tenders)
}

pub async fn update_tender(pool: &SqlitePool, id: i64, tender: &NewTender) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tenders SET
            nit_number = ?, work_name = ?, estimated_cost = ?,
            schedule_amount = ?, earnest_money = ?, time_of_completion_months = ?,
            ee_name = ?, tender_date = ?, submission_deadline = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&tender.nit_number)
    .bind(&tender.work_name)
    .bind(tender.estimated_cost)
    .bind(tender.schedule_amount)
    .bind(tender.earnest_money)
    .bind(tender.time_of_completion_months)
    .bind(&tender.ee_name)
    .bind(&tender.tender_date)
    .bind(&tender.submission_deadline)
    .bind(now_iso())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("tender {}", id)));
    }
    Ok(())
}

/// Apply a status transition, enforcing the legal chain
/// draft → open → closed → awarded.
pub async fn update_tender_status(
    pool: &SqlitePool,
    id: i64,
    next: TenderStatus,
) -> Result<Tender> {
    let tender = get_tender(pool, id).await?;
    let current = tender.status()?;

    if !current.can_transition_to(next) {
        return Err(Error::InvalidInput(format!(
            "illegal status transition {} -> {}",
            current.as_str(),
            next.as_str()
        )));
    }

    sqlx::query("UPDATE tenders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(next.as_str())
        .bind(now_iso())
        .bind(id)
        .execute(pool)
        .await?;

    info!("Tender {} status {} -> {}", id, current.as_str(), next.as_str());
    get_tender(pool, id).await
}

/// Delete a tender and its bids
pub async fn delete_tender(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM bids WHERE tender_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM tenders WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("tender {}", id)));
    }

    tx.commit().await?;
    info!("Deleted tender {}", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Bids
// ---------------------------------------------------------------------------

/// Replace the bid set for a tender with freshly ranked bids.
///
/// Runs in one transaction; bidder profiles are upserted as a side effect
/// so the suggestion list stays current.
pub async fn replace_bids(pool: &SqlitePool, tender_id: i64, bids: &[RankedBid]) -> Result<()> {
    let now = now_iso();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM bids WHERE tender_id = ?")
        .bind(tender_id)
        .execute(&mut *tx)
        .await?;

    for bid in bids {
        sqlx::query(
            r#"
            INSERT INTO bids (
                tender_id, bidder_name, percentage, amount, contact,
                submitted_at, is_lowest, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tender_id)
        .bind(&bid.bidder_name)
        .bind(bid.percent_diff)
        .bind(bid.amount)
        .bind(&bid.contact)
        .bind(bid.submitted_at.map(|t| t.to_string()))
        .bind(bid.is_lowest)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        // Bidder profile upsert with usage bump
        sqlx::query(
            r#"
            INSERT INTO bidders (name, contact, last_used, usage_count)
            VALUES (?, ?, ?, 1)
            ON CONFLICT(name) DO UPDATE SET
                contact = COALESCE(excluded.contact, contact),
                last_used = excluded.last_used,
                usage_count = usage_count + 1
            "#,
        )
        .bind(&bid.bidder_name)
        .bind(&bid.contact)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!("Stored {} bids for tender {}", bids.len(), tender_id);
    Ok(())
}

/// Bids for a tender, lowest amount first
pub async fn list_bids(pool: &SqlitePool, tender_id: i64) -> Result<Vec<BidRow>> {
    let bids = sqlx::query_as::<_, BidRow>(
        "SELECT * FROM bids WHERE tender_id = ? ORDER BY amount ASC, bidder_name ASC",
    )
    .bind(tender_id)
    .fetch_all(pool)
    .await?;
    Ok(bids)
}

// ---------------------------------------------------------------------------
// Bidders
// ---------------------------------------------------------------------------

pub async fn create_bidder(pool: &SqlitePool, profile: &BidderProfile) -> Result<i64> {
    if let Some(rating) = profile.rating {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidInput(format!(
                "rating must be 1-5, got {}",
                rating
            )));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO bidders (name, contact, address, registration_number, rating, last_used, usage_count)
        VALUES (?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(&profile.name)
    .bind(&profile.contact)
    .bind(&profile.address)
    .bind(&profile.registration_number)
    .bind(profile.rating)
    .bind(now_iso())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_bidder(pool: &SqlitePool, id: i64) -> Result<BidderProfile> {
    sqlx::query_as::<_, BidderProfile>("SELECT * FROM bidders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("bidder {}", id)))
}

/// Most-used bidders first, for entry auto-suggestion
pub async fn list_recent_bidders(pool: &SqlitePool, limit: i64) -> Result<Vec<BidderProfile>> {
    let bidders = sqlx::query_as::<_, BidderProfile>(
        "SELECT * FROM bidders ORDER BY usage_count DESC, last_used DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(bidders)
}

pub async fn delete_bidder(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM bidders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("bidder {}", id)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

pub async fn bidder_statistics(pool: &SqlitePool) -> Result<BidderStats> {
    let total_unique_bidders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bidders")
        .fetch_one(pool)
        .await?;

    let frequent_bidders = sqlx::query_as::<_, FrequentBidder>(
        "SELECT name, usage_count FROM bidders ORDER BY usage_count DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    let recent_bids_30_days: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bids WHERE created_at >= datetime('now', '-30 days')")
            .fetch_one(pool)
            .await?;

    Ok(BidderStats {
        total_unique_bidders,
        frequent_bidders,
        recent_bids_30_days,
    })
}
