use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rabbit_bus::BusError;
use serde_json::Value;

use lob_engine::{EngineDispatcher, MarketFeed, OutboundPublisher};

/// Captures everything the dispatcher publishes to the bus so tests can
/// assert on the exact outbound JSON.
#[derive(Default)]
pub struct CapturingPublisher {
    sent: Mutex<Vec<Value>>,
}

impl CapturingPublisher {
    pub fn messages(&self) -> Vec<Value> {
        self.sent.lock().clone()
    }

    /// Trade bursts only, in publication order.
    pub fn trade_bursts(&self) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|m| m.get("trades").is_some())
            .collect()
    }
}

#[async_trait]
impl OutboundPublisher for CapturingPublisher {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), BusError> {
        let value = serde_json::from_slice(&payload).expect("outbound payload is JSON");
        self.sent.lock().push(value);
        Ok(())
    }
}

pub fn dispatcher() -> (EngineDispatcher, Arc<CapturingPublisher>) {
    let publisher = Arc::new(CapturingPublisher::default());
    let dispatcher = EngineDispatcher::new(publisher.clone(), MarketFeed::default());
    (dispatcher, publisher)
}

pub async fn send(dispatcher: &EngineDispatcher, raw: &str) {
    dispatcher.handle_raw(raw.as_bytes()).await;
}
