use std::collections::HashSet;

use crate::models::Notification;

/// Locally held notifications, newest first, with monotonic read flags.
///
/// Ids that were marked read locally are remembered so a reload from the
/// event store cannot flip them back to unread.
#[derive(Debug, Default)]
pub struct NotificationInbox {
    items: Vec<Notification>,
    read_ids: HashSet<String>,
    /// Single-item writes that exhausted their retries
    pending: HashSet<String>,
    /// A mark-all write that exhausted its retries
    pending_all: bool,
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.read_ids.clear();
        self.pending.clear();
        self.pending_all = false;
    }

    // ===== Getters =====

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read_ids.contains(id) || self.get(id).map(|n| n.is_read).unwrap_or(false)
    }

    pub fn unread_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect()
    }

    pub fn unread_len(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pending.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_pending_all(&self) -> bool {
        self.pending_all
    }

    pub fn has_pending(&self) -> bool {
        self.pending_all || !self.pending.is_empty()
    }

    // ===== Mutations =====

    /// Replace the held records with a fresh fetch.
    ///
    /// Records known to be read locally stay read; duplicates are dropped.
    pub fn replace_all(&mut self, fetched: Vec<Notification>) {
        self.items.clear();
        for item in fetched {
            self.add_item(item);
        }
    }

    pub fn add_item(&mut self, mut item: Notification) {
        if self.read_ids.contains(&item.id) {
            item.is_read = true;
        }

        // Deduplicate by id
        if !self.items.iter().any(|i| i.id == item.id) {
            // Insert sorted by created_at (most recent first)
            let pos = self
                .items
                .partition_point(|i| i.created_at >= item.created_at);
            self.items.insert(pos, item);
        }
    }

    /// Returns false if the record was already read.
    pub fn mark_read(&mut self, id: &str) -> bool {
        let changed = match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) if !item.is_read => {
                item.is_read = true;
                true
            }
            _ => false,
        };
        self.read_ids.insert(id.to_string());
        changed
    }

    /// Marks every held record read and returns the ids that changed.
    pub fn mark_all_read(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for item in self.items.iter_mut().filter(|i| !i.is_read) {
            item.is_read = true;
            changed.push(item.id.clone());
        }
        self.read_ids.extend(changed.iter().cloned());
        changed
    }

    /// Undo an optimistic mark the event store never acknowledged.
    pub fn revert(&mut self, ids: &[String]) {
        for id in ids {
            self.read_ids.remove(id);
            if let Some(item) = self.items.iter_mut().find(|i| &i.id == id) {
                item.is_read = false;
            }
        }
    }

    pub fn park(&mut self, id: &str) {
        self.pending.insert(id.to_string());
    }

    pub fn park_all(&mut self) {
        self.pending_all = true;
    }

    pub fn settle(&mut self, id: &str) {
        self.pending.remove(id);
    }

    /// A confirmed mark-all covers every parked single write too.
    pub fn settle_all(&mut self) {
        self.pending.clear();
        self.pending_all = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, make_notification};

    fn inbox_with(items: Vec<Notification>) -> NotificationInbox {
        let mut inbox = NotificationInbox::new();
        inbox.replace_all(items);
        inbox
    }

    #[test]
    fn test_sorted_newest_first_and_deduplicated() {
        let inbox = inbox_with(vec![
            make_notification("b", at(2026, 10, 14, 8, 0), false),
            make_notification("a", at(2026, 10, 16, 8, 0), false),
            make_notification("a", at(2026, 10, 16, 8, 0), true),
            make_notification("c", at(2026, 10, 10, 8, 0), false),
        ]);
        let ids: Vec<&str> = inbox.items().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mark_read_reports_change_once() {
        let mut inbox = inbox_with(vec![make_notification("a", at(2026, 10, 16, 8, 0), false)]);
        assert!(inbox.mark_read("a"));
        assert!(!inbox.mark_read("a"));
        assert!(inbox.is_read("a"));
        assert_eq!(inbox.unread_len(), 0);
    }

    #[test]
    fn test_reload_keeps_local_read_flags() {
        let mut inbox = inbox_with(vec![
            make_notification("a", at(2026, 10, 16, 8, 0), false),
            make_notification("b", at(2026, 10, 15, 8, 0), false),
        ]);
        inbox.mark_read("a");

        // Server has not caught up yet
        inbox.replace_all(vec![
            make_notification("a", at(2026, 10, 16, 8, 0), false),
            make_notification("b", at(2026, 10, 15, 8, 0), false),
        ]);
        assert!(inbox.get("a").unwrap().is_read);
        assert_eq!(inbox.unread_ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_mark_all_read_returns_changed_ids() {
        let mut inbox = inbox_with(vec![
            make_notification("a", at(2026, 10, 16, 8, 0), false),
            make_notification("b", at(2026, 10, 15, 8, 0), true),
            make_notification("c", at(2026, 10, 14, 8, 0), false),
        ]);
        assert_eq!(inbox.mark_all_read(), vec!["a".to_string(), "c".to_string()]);
        assert!(inbox.mark_all_read().is_empty());
    }

    #[test]
    fn test_revert_clears_local_flag() {
        let mut inbox = inbox_with(vec![make_notification("a", at(2026, 10, 16, 8, 0), false)]);
        inbox.mark_read("a");
        inbox.revert(&["a".to_string()]);
        assert!(!inbox.is_read("a"));

        inbox.replace_all(vec![make_notification("a", at(2026, 10, 16, 8, 0), false)]);
        assert!(!inbox.get("a").unwrap().is_read);
    }

    #[test]
    fn test_pending_bookkeeping() {
        let mut inbox = NotificationInbox::new();
        assert!(!inbox.has_pending());
        inbox.park("b");
        inbox.park("a");
        assert_eq!(inbox.pending_ids(), vec!["a".to_string(), "b".to_string()]);
        inbox.settle("a");
        inbox.park_all();
        assert!(inbox.has_pending_all());
        inbox.settle_all();
        assert!(!inbox.has_pending());
    }
}
