//! Thumbnail link cache.
//!
//! Links observed during discovery are remembered per file id so a later
//! thumbnail request can skip the metadata lookup. Entries never expire and
//! the map is never trimmed; Drive's signed links do go stale, and the
//! resolver tolerates that by falling back to a full download.

use dashmap::DashMap;

use crate::model::ImageRecord;

/// Process-wide map from file id to the most recently seen thumbnail link.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    links: DashMap<String, String>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached link for `file_id`.
    pub fn get(&self, file_id: &str) -> Option<String> {
        self.links.get(file_id).map(|link| link.value().clone())
    }

    /// Remember `link` for `file_id`, replacing any earlier entry.
    pub fn put(&self, file_id: impl Into<String>, link: impl Into<String>) {
        self.links.insert(file_id.into(), link.into());
    }

    /// Remember the link of every record that has one. Returns how many were stored.
    pub fn record_images(&self, images: &[ImageRecord]) -> usize {
        let mut stored = 0;
        for image in images {
            if let Some(link) = image.thumbnail_link.as_deref().filter(|l| !l.is_empty()) {
                self.put(image.id.clone(), link);
                stored += 1;
            }
        }
        stored
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, link: Option<&str>) -> ImageRecord {
        ImageRecord {
            id: id.into(),
            name: format!("{id}.jpg"),
            thumbnail_link: link.map(str::to_string),
            lat: 0.0,
            lon: 0.0,
            altitude: None,
        }
    }

    #[test]
    fn test_put_then_get() {
        let cache = ThumbnailCache::new();
        assert!(cache.get("F1").is_none());

        cache.put("F1", "https://thumbs.test/1");
        assert_eq!(cache.get("F1").as_deref(), Some("https://thumbs.test/1"));
    }

    #[test]
    fn test_later_put_overwrites() {
        let cache = ThumbnailCache::new();
        cache.put("F1", "https://thumbs.test/old");
        cache.put("F1", "https://thumbs.test/new");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("F1").as_deref(), Some("https://thumbs.test/new"));
    }

    #[test]
    fn test_record_images_skips_missing_links() {
        let cache = ThumbnailCache::new();
        let stored = cache.record_images(&[
            record("A", Some("https://thumbs.test/a")),
            record("B", None),
            record("C", Some("")),
        ]);

        assert_eq!(stored, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("B").is_none());
        assert!(cache.get("C").is_none());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = std::sync::Arc::new(ThumbnailCache::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.put(format!("{t}-{i}"), format!("https://thumbs.test/{t}/{i}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
