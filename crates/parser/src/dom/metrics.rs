use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters collected while building one DOM.
/// Uses atomic operations so the tree sink can share it through an `Arc`.
#[derive(Debug, Default)]
pub struct DomMetrics {
    // Total elements created by the tree builder
    pub elements_created: AtomicUsize,
    // Total size of text content
    pub total_text_size: AtomicUsize,
    // Comments and processing instructions dropped before reaching the tree
    pub comments_discarded: AtomicUsize,
    // Recoverable parse errors reported by html5ever
    pub parse_errors: AtomicUsize,
}

impl DomMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_elements_created(&self) {
        self.elements_created.fetch_add(1, Ordering::Relaxed);
    }

    // Add size to text content metric
    pub fn add_text_content(&self, size: usize) {
        self.total_text_size.fetch_add(size, Ordering::Relaxed);
    }

    pub fn increment_comments_discarded(&self) {
        self.comments_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_elements_created(&self) -> usize {
        self.elements_created.load(Ordering::Relaxed)
    }

    pub fn get_total_text_size(&self) -> usize {
        self.total_text_size.load(Ordering::Relaxed)
    }

    pub fn get_comments_discarded(&self) -> usize {
        self.comments_discarded.load(Ordering::Relaxed)
    }

    pub fn get_parse_errors(&self) -> usize {
        self.parse_errors.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = DomMetrics::new();
        metrics.increment_elements_created();
        metrics.increment_elements_created();
        metrics.add_text_content(5);
        metrics.increment_comments_discarded();

        assert_eq!(metrics.get_elements_created(), 2);
        assert_eq!(metrics.get_total_text_size(), 5);
        assert_eq!(metrics.get_comments_discarded(), 1);
        assert_eq!(metrics.get_parse_errors(), 0);
    }
}
