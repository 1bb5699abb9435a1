use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::responder::ReplySource;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MetricsData {
    pub source_usage: HashMap<String, u64>,
    pub topic_usage: HashMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn record_reply(&self, source: ReplySource) {
        let mut data = self.inner.write().await;
        *data.source_usage.entry(source.as_str().to_string()).or_insert(0) += 1;
        if let ReplySource::Fallback(topic) = source {
            *data.topic_usage.entry(topic.as_str().to_string()).or_insert(0) += 1;
        }
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Topic;

    #[tokio::test]
    async fn counts_sources_and_topics() {
        let metrics = MetricsManager::new();
        metrics.record_reply(ReplySource::Live).await;
        metrics.record_reply(ReplySource::Fallback(Topic::Goa)).await;
        metrics.record_reply(ReplySource::Fallback(Topic::Goa)).await;

        let data = metrics.get_metrics().await;
        assert_eq!(data.source_usage.get("live"), Some(&1));
        assert_eq!(data.source_usage.get("fallback"), Some(&2));
        assert_eq!(data.topic_usage.get("goa"), Some(&2));
        assert_eq!(data.topic_usage.len(), 1);
    }
}
