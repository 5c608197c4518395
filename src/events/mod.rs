pub mod dispatcher;
pub mod fanout;
pub mod types;

pub use dispatcher::{EngineDispatcher, OutboundPublisher};
pub use fanout::MarketFeed;
pub use types::{AckMessage, FeedMessage, InboundEvent, OrderAck, TradeBurst, TradeExecution};
