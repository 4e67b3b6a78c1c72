//! Page ownership registry.
//!
//! At most one agent may drive a given page. Whoever constructs agents holds
//! a [`PageRegistry`] and every agent keeps the [`PageLease`] it was granted
//! until disposal.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use chaant_protocols::{AgentError, PageId};

#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    claimed: Arc<Mutex<HashSet<PageId>>>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `page` exclusively. Fails with `PageAlreadyAttached` when
    /// another lease on it is still alive.
    pub fn claim(&self, page: &PageId) -> Result<PageLease, AgentError> {
        let mut claimed = self.claimed.lock();
        if !claimed.insert(page.clone()) {
            return Err(AgentError::PageAlreadyAttached(page.to_string()));
        }
        debug!("Page {} claimed", page);
        Ok(PageLease {
            page: page.clone(),
            claimed: self.claimed.clone(),
            released: false,
        })
    }

    pub fn is_claimed(&self, page: &PageId) -> bool {
        self.claimed.lock().contains(page)
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.lock().is_empty()
    }
}

/// An exclusive claim on a page. Released on [`release`](Self::release) or drop.
#[derive(Debug)]
pub struct PageLease {
    page: PageId,
    claimed: Arc<Mutex<HashSet<PageId>>>,
    released: bool,
}

impl PageLease {
    pub fn page_id(&self) -> &PageId {
        &self.page
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.claimed.lock().remove(&self.page);
            debug!("Page {} released", self.page);
        }
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        self.release_inner();
    }
}
