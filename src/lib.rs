// Expose the modules
pub mod config;
pub mod depth;
pub mod events;
pub mod matching_engine;
pub mod orderbook;
pub mod types;

// Re-export key types for easier usage
pub use config::Config;
pub use depth::{DEFAULT_DEPTH, DepthLevel, DepthSnapshot};
pub use events::{
    AckMessage, EngineDispatcher, FeedMessage, InboundEvent, MarketFeed, OrderAck,
    OutboundPublisher, TradeBurst, TradeExecution,
};
pub use matching_engine::MatchingEngine;
pub use orderbook::{Fill, OrderBook, PriceLevel};
pub use types::{Order, PRICE_SCALE, Side, Trade, TypeError, normalize_price};
