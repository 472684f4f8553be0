//! HTTP API handlers for tender-server

pub mod bidders;
pub mod bids;
pub mod error;
pub mod health;
pub mod reports;
pub mod stats;
pub mod tenders;
pub mod upload;

pub use bidders::{create_bidder, delete_bidder, list_bidders, recent_bidders};
pub use bids::{get_comparison, replace_bids};
pub use error::ApiError;
pub use health::health_check;
pub use reports::generate_report;
pub use stats::get_stats;
pub use tenders::{create_tender, delete_tender, get_tender, list_tenders, update_status, update_tender};
pub use upload::upload_file;
