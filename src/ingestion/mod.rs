pub mod pipeline;

pub use pipeline::{
    process_indicator_update, process_market_snapshot, process_news_event,
    process_onchain_update, process_sentiment_update, process_whale_transaction,
    IndicatorUpdate, OnchainUpdate, SentimentUpdate, WhaleTxEvent,
};
