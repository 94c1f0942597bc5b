//! Bounded in-memory log of active deliveries per webhook.

use std::collections::{HashMap, VecDeque};

use super::types::WebhookDelivery;
use crate::config::{DeliveryId, WebhookId};

#[derive(Debug)]
pub(crate) struct DeliveryLog {
    limit: usize,
    by_id: HashMap<DeliveryId, WebhookDelivery>,
    /// Delivery ids per webhook, oldest first.
    by_webhook: HashMap<WebhookId, VecDeque<DeliveryId>>,
}

impl DeliveryLog {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            by_id: HashMap::new(),
            by_webhook: HashMap::new(),
        }
    }

    pub(crate) fn insert_webhook(&mut self, webhook_id: WebhookId) {
        self.by_webhook.entry(webhook_id).or_default();
    }

    pub(crate) fn remove_webhook(&mut self, webhook_id: WebhookId) {
        if let Some(ids) = self.by_webhook.remove(&webhook_id) {
            for id in ids {
                self.by_id.remove(&id);
            }
        }
    }

    /// Stores or replaces a delivery. Deliveries for unknown webhooks are ignored.
    pub(crate) fn upsert(&mut self, delivery: &WebhookDelivery) {
        if let Some(existing) = self.by_id.get_mut(&delivery.id) {
            *existing = delivery.clone();
            return;
        }
        let Some(ids) = self.by_webhook.get_mut(&delivery.webhook_id) else {
            return;
        };
        ids.push_back(delivery.id);
        if ids.len() > self.limit {
            if let Some(oldest) = ids.pop_front() {
                self.by_id.remove(&oldest);
            }
        }
        self.by_id.insert(delivery.id, delivery.clone());
    }

    pub(crate) fn remove(&mut self, delivery_id: DeliveryId) -> Option<WebhookDelivery> {
        let delivery = self.by_id.remove(&delivery_id)?;
        if let Some(ids) = self.by_webhook.get_mut(&delivery.webhook_id) {
            ids.retain(|id| *id != delivery_id);
        }
        Some(delivery)
    }

    pub(crate) fn get(&self, delivery_id: DeliveryId) -> Option<WebhookDelivery> {
        self.by_id.get(&delivery_id).cloned()
    }

    /// Most recent first.
    pub(crate) fn recent(&self, webhook_id: WebhookId, limit: usize) -> Vec<WebhookDelivery> {
        self.by_webhook
            .get(&webhook_id)
            .map(|ids| {
                ids.iter()
                    .rev()
                    .filter_map(|id| self.by_id.get(id).cloned())
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::{DeliveryStatus, WebhookEvent};
    use serde_json::json;

    fn delivery(webhook_id: WebhookId) -> WebhookDelivery {
        WebhookDelivery::new(webhook_id, WebhookEvent::new("x", json!({})))
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut log = DeliveryLog::new(10);
        let webhook = WebhookId::generate();
        log.insert_webhook(webhook);

        let mut entry = delivery(webhook);
        log.upsert(&entry);
        entry.status = DeliveryStatus::Success;
        log.upsert(&entry);

        assert_eq!(log.get(entry.id).unwrap().status, DeliveryStatus::Success);
        assert_eq!(log.recent(webhook, 10).len(), 1);
    }

    #[test]
    fn test_unknown_webhook_is_ignored() {
        let mut log = DeliveryLog::new(10);
        let entry = delivery(WebhookId::generate());
        log.upsert(&entry);
        assert!(log.get(entry.id).is_none());
    }

    #[test]
    fn test_limit_evicts_oldest_and_recent_is_newest_first() {
        let mut log = DeliveryLog::new(2);
        let webhook = WebhookId::generate();
        log.insert_webhook(webhook);

        let entries: Vec<_> = (0..3).map(|_| delivery(webhook)).collect();
        for entry in &entries {
            log.upsert(entry);
        }

        assert!(log.get(entries[0].id).is_none());
        let ids: Vec<_> = log.recent(webhook, 10).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![entries[2].id, entries[1].id]);
        assert_eq!(log.recent(webhook, 1).len(), 1);
    }

    #[test]
    fn test_remove_and_remove_webhook() {
        let mut log = DeliveryLog::new(10);
        let webhook = WebhookId::generate();
        log.insert_webhook(webhook);
        let a = delivery(webhook);
        let b = delivery(webhook);
        log.upsert(&a);
        log.upsert(&b);

        assert!(log.remove(a.id).is_some());
        assert_eq!(log.recent(webhook, 10).len(), 1);

        log.remove_webhook(webhook);
        assert!(log.get(b.id).is_none());
        assert!(log.recent(webhook, 10).is_empty());
    }
}
