//! Dead letter queue for deliveries that exhausted their retries.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::types::WebhookDelivery;
use crate::config::{DeliveryId, WebhookId};

/// Bounded FIFO of failed deliveries.
///
/// When full, pushing evicts the oldest entry.
#[derive(Debug)]
pub struct DeadLetterQueue {
    entries: Mutex<VecDeque<WebhookDelivery>>,
    capacity: usize,
}

impl DeadLetterQueue {
    /// Creates a queue holding at most `capacity` deliveries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds a delivery, returning the entry evicted to make room, if any.
    pub fn push(&self, delivery: WebhookDelivery) -> Option<WebhookDelivery> {
        let mut entries = self.entries.lock();
        let evicted = if entries.len() >= self.capacity {
            entries.pop_front()
        } else {
            None
        };
        entries.push_back(delivery);
        evicted
    }

    /// Removes and returns the entry with the given delivery id.
    pub fn take(&self, delivery_id: DeliveryId) -> Option<WebhookDelivery> {
        let mut entries = self.entries.lock();
        let pos = entries.iter().position(|d| d.id == delivery_id)?;
        entries.remove(pos)
    }

    /// Returns a copy of the entry with the given delivery id.
    #[must_use]
    pub fn get(&self, delivery_id: DeliveryId) -> Option<WebhookDelivery> {
        self.entries
            .lock()
            .iter()
            .find(|d| d.id == delivery_id)
            .cloned()
    }

    /// Removes and returns every entry, oldest first.
    pub fn drain(&self) -> Vec<WebhookDelivery> {
        self.entries.lock().drain(..).collect()
    }

    /// Lists entries oldest first, optionally only those for one webhook.
    #[must_use]
    pub fn list(&self, webhook_id: Option<WebhookId>) -> Vec<WebhookDelivery> {
        self.entries
            .lock()
            .iter()
            .filter(|d| webhook_id.map_or(true, |id| d.webhook_id == id))
            .cloned()
            .collect()
    }

    /// Drops every entry for a webhook, returning how many were removed.
    pub fn remove_webhook(&self, webhook_id: WebhookId) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|d| d.webhook_id != webhook_id);
        before - entries.len()
    }

    /// Get the queue size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clear the queue.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::WebhookEvent;
    use serde_json::json;

    fn delivery(webhook_id: WebhookId) -> WebhookDelivery {
        WebhookDelivery::new(webhook_id, WebhookEvent::new("order.created", json!({})))
    }

    #[test]
    fn test_push_evicts_oldest_at_capacity() {
        let queue = DeadLetterQueue::new(2);
        let webhook = WebhookId::generate();
        let first = delivery(webhook);
        let second = delivery(webhook);
        let third = delivery(webhook);
        let first_id = first.id;

        assert!(queue.push(first).is_none());
        assert!(queue.push(second.clone()).is_none());
        let evicted = queue.push(third.clone()).unwrap();

        assert_eq!(evicted.id, first_id);
        assert_eq!(queue.len(), 2);
        let ids: Vec<_> = queue.list(None).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![second.id, third.id]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let queue = DeadLetterQueue::new(5);
        let webhook = WebhookId::generate();
        for _ in 0..50 {
            queue.push(delivery(webhook));
            assert!(queue.len() <= 5);
        }
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn test_take_removes_entry() {
        let queue = DeadLetterQueue::new(10);
        let entry = delivery(WebhookId::generate());
        let id = entry.id;
        queue.push(entry);

        assert!(queue.get(id).is_some());
        assert_eq!(queue.take(id).map(|d| d.id), Some(id));
        assert!(queue.take(id).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_list_filters_by_webhook_and_remove_webhook() {
        let queue = DeadLetterQueue::new(10);
        let a = WebhookId::generate();
        let b = WebhookId::generate();
        queue.push(delivery(a));
        queue.push(delivery(b));
        queue.push(delivery(a));

        assert_eq!(queue.list(Some(a)).len(), 2);
        assert_eq!(queue.list(Some(b)).len(), 1);
        assert_eq!(queue.list(None).len(), 3);

        assert_eq!(queue.remove_webhook(a), 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_and_clear() {
        let queue = DeadLetterQueue::new(10);
        let webhook = WebhookId::generate();
        queue.push(delivery(webhook));
        queue.push(delivery(webhook));

        assert_eq!(queue.drain().len(), 2);
        assert!(queue.is_empty());

        queue.push(delivery(webhook));
        queue.clear();
        assert!(queue.is_empty());
    }
}
