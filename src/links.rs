//! Ordered, bounded list of complaint links
//!
//! Always holds at least one (possibly empty) entry. No URL validation
//! happens here; blank entries are filtered when a batch is submitted.

use tracing::debug;

pub const MAX_LINKS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkList {
    links: Vec<String>,
}

impl Default for LinkList {
    fn default() -> Self {
        Self {
            links: vec![String::new()],
        }
    }
}

impl LinkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from external input. Returns the list and how many
    /// links were dropped for exceeding [`MAX_LINKS`].
    pub fn from_links<I, S>(links: I) -> (Self, usize)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut links: Vec<String> = links.into_iter().map(Into::into).collect();
        let dropped = links.len().saturating_sub(MAX_LINKS);
        links.truncate(MAX_LINKS);

        if links.is_empty() {
            return (Self::default(), 0);
        }
        (Self { links }, dropped)
    }

    /// Appends an empty entry unless the list is full.
    pub fn add(&mut self) -> bool {
        if self.is_full() {
            debug!("Link list full ({} entries), add ignored", MAX_LINKS);
            return false;
        }
        self.links.push(String::new());
        true
    }

    /// Removes the entry at `index`. Removing the last entry leaves a single empty one.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.links.len() {
            return None;
        }
        let removed = self.links.remove(index);
        if self.links.is_empty() {
            self.links.push(String::new());
        }
        Some(removed)
    }

    pub fn update(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.links.get_mut(index) {
            Some(link) => {
                *link = value.into();
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.links.len() >= MAX_LINKS
    }

    pub fn first_is_blank(&self) -> bool {
        self.links
            .first()
            .map(|link| link.trim().is_empty())
            .unwrap_or(true)
    }
}
