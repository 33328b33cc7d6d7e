pub mod evaluation;
pub mod narrative;
pub mod price_feed;
pub mod reconciliation;
