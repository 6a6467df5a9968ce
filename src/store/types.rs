//! Shared shapes for the video cache.
//!
//! Three isomorphic record shapes exist: the wire shape
//! ([`NetworkVideo`](crate::remote::NetworkVideo)), the persisted shape
//! ([`StoredVideo`]), and the display shape ([`Video`]). Conversions are
//! pure field passthrough.

use serde::{Deserialize, Serialize};

use crate::remote::NetworkVideo;

/// One cached video row. `url` is the primary key; a row is always replaced
/// wholesale, never patched field-by-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVideo {
    /// Video URL; unique cache key.
    pub url: String,
    /// Last-updated timestamp, stored verbatim.
    pub updated: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Thumbnail image URL.
    pub thumbnail: String,
}

/// The shape handed to display consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Video URL.
    pub url: String,
    /// Last-updated timestamp.
    pub updated: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Thumbnail image URL.
    pub thumbnail: String,
}

impl From<NetworkVideo> for StoredVideo {
    fn from(v: NetworkVideo) -> Self {
        Self {
            url: v.url,
            updated: v.updated,
            title: v.title,
            description: v.description,
            thumbnail: v.thumbnail,
        }
    }
}

impl From<StoredVideo> for Video {
    fn from(v: StoredVideo) -> Self {
        Self {
            url: v.url,
            updated: v.updated,
            title: v.title,
            description: v.description,
            thumbnail: v.thumbnail,
        }
    }
}

/// Convert a stored snapshot into the display shape.
pub fn as_display(records: &[StoredVideo]) -> Vec<Video> {
    records.iter().cloned().map(Video::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_network() -> NetworkVideo {
        NetworkVideo {
            url: "https://videos.test/1".to_owned(),
            updated: "2021-01-01T00:00:00Z".to_owned(),
            title: "Intro".to_owned(),
            description: "First episode".to_owned(),
            thumbnail: "https://videos.test/1.png".to_owned(),
        }
    }

    #[test]
    fn network_to_stored_to_display_passes_fields_through() {
        let network = sample_network();
        let stored = StoredVideo::from(network.clone());
        let display = Video::from(stored.clone());

        assert_eq!(stored.url, network.url);
        assert_eq!(stored.updated, network.updated);
        assert_eq!(display.title, network.title);
        assert_eq!(display.description, network.description);
        assert_eq!(display.thumbnail, network.thumbnail);
    }

    #[test]
    fn as_display_preserves_order() {
        let mut a = StoredVideo::from(sample_network());
        a.url = "a".to_owned();
        let mut b = a.clone();
        b.url = "b".to_owned();

        let display = as_display(&[a, b]);
        assert_eq!(display.len(), 2);
        assert_eq!(display[0].url, "a");
        assert_eq!(display[1].url, "b");
    }
}
