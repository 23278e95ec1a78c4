//! Older-page requests and their staleness check.

use super::{FeedId, MessageId};

/// A pending "load older than `before`" request.
///
/// Carries the feed and selection epoch it was issued under; a result that
/// comes back after the feed changed no longer matches and is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub feed: FeedId,
    pub before: MessageId,
    pub epoch: u64,
}

/// Paging state for the selected feed.
#[derive(Debug, Default)]
pub(super) struct History {
    in_flight: Option<PageRequest>,
    exhausted: bool,
}

impl History {
    /// Issue a request unless one is already out or history ran dry.
    pub(super) fn request(&mut self, feed: &FeedId, before: &MessageId, epoch: u64) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.exhausted {
            return None;
        }
        let request = PageRequest {
            feed: feed.clone(),
            before: before.clone(),
            epoch,
        };
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Match a result against the request in flight. Returns `false` for stale results.
    pub(super) fn resolve(&mut self, request: &PageRequest, page_len: usize) -> bool {
        if self.in_flight.as_ref() != Some(request) {
            return false;
        }
        self.in_flight = None;
        if page_len == 0 {
            self.exhausted = true;
        }
        true
    }

    pub(super) const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub(super) const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (FeedId, MessageId) {
        (FeedId::from("general"), MessageId::from("m10"))
    }

    #[test]
    fn test_only_one_request_in_flight() {
        let (feed, before) = ids();
        let mut history = History::default();
        let request = history.request(&feed, &before, 1).unwrap();
        assert!(history.is_loading());
        assert!(history.request(&feed, &before, 1).is_none());
        assert!(history.resolve(&request, 3));
        assert!(history.request(&feed, &before, 1).is_some());
    }

    #[test]
    fn test_foreign_request_is_stale() {
        let (feed, before) = ids();
        let mut history = History::default();
        history.request(&feed, &before, 2);
        let stale = PageRequest {
            feed,
            before,
            epoch: 1,
        };
        assert!(!history.resolve(&stale, 3));
        assert!(history.is_loading());
    }

    #[test]
    fn test_empty_page_exhausts_history() {
        let (feed, before) = ids();
        let mut history = History::default();
        let request = history.request(&feed, &before, 0).unwrap();
        assert!(history.resolve(&request, 0));
        assert!(history.is_exhausted());
        assert!(history.request(&feed, &before, 0).is_none());
    }
}
