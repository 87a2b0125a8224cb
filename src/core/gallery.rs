use std::sync::Mutex;

use serde::Serialize;

use crate::error::Error;

/// A (0-based index, image reference) pair from a gallery snapshot.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct GalleryItem {
    pub index: usize,
    pub image_ref: String,
}

/// The ordered, index-addressable list of prize image references.
///
/// Image references are opaque transport handles (Telegram file ids).
/// The gallery is independent of the round lifecycle: it accumulates
/// across rounds unless the controller clears it at draw time.
pub struct GalleryStore {
    items: Mutex<Vec<String>>,
}

impl GalleryStore {
    pub fn new() -> GalleryStore {
        GalleryStore {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Append an image reference, returning its 0-based index.
    pub fn append(&self, image_ref: &str) -> usize {
        let mut items = self.items.lock().expect("gallery lock poisoned");
        items.push(image_ref.to_owned());
        items.len() - 1
    }

    /// Remove the image at `index`, shifting later indices down by one.
    /// Out-of-range indices are rejected without mutation.
    pub fn remove_at(&self, index: usize) -> Result<String, Error> {
        let mut items = self.items.lock().expect("gallery lock poisoned");

        if index >= items.len() {
            return Err(Error::OutOfRange {
                index,
                len: items.len(),
            });
        }

        Ok(items.remove(index))
    }

    /// Take a consistent snapshot of the gallery in insertion order.
    pub fn list(&self) -> Vec<GalleryItem> {
        self.items
            .lock()
            .expect("gallery lock poisoned")
            .iter()
            .enumerate()
            .map(|(index, image_ref)| GalleryItem {
                index,
                image_ref: image_ref.clone(),
            })
            .collect()
    }

    pub fn clear(&self) {
        self.items.lock().expect("gallery lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("gallery lock poisoned").len()
    }
}

/// Split gallery items into the two balanced display rows used for chat
/// rendering: the first `(n + 1) / 2` items on row one, the rest on row
/// two.
pub fn display_rows(items: &[GalleryItem]) -> (&[GalleryItem], &[GalleryItem]) {
    items.split_at((items.len() + 1) / 2)
}

#[cfg(test)]
mod tests {
    use super::{display_rows, GalleryStore};
    use crate::error::Error;

    #[test]
    fn test_append_returns_index() {
        let gallery = GalleryStore::new();

        assert_eq!(gallery.append("img-a"), 0);
        assert_eq!(gallery.append("img-b"), 1);
        assert_eq!(gallery.append("img-c"), 2);
    }

    #[test]
    fn test_remove_shifts_down() {
        let gallery = GalleryStore::new();
        gallery.append("img-a");
        gallery.append("img-b");
        gallery.append("img-c");

        assert_eq!(gallery.remove_at(1).unwrap(), "img-b");

        let items = gallery.list();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].image_ref, "img-c");
    }

    #[test]
    fn test_out_of_range_without_mutation() {
        let gallery = GalleryStore::new();
        gallery.append("img-a");
        gallery.append("img-b");

        assert!(matches!(
            gallery.remove_at(2),
            Err(Error::OutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            gallery.remove_at(7),
            Err(Error::OutOfRange { index: 7, len: 2 })
        ));
        assert_eq!(gallery.len(), 2);
    }

    #[test]
    fn test_display_rows_split() {
        let gallery = GalleryStore::new();
        for i in 0..5 {
            gallery.append(&format!("img-{}", i));
        }

        let items = gallery.list();
        let (first, second) = display_rows(&items);
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].image_ref, "img-0");
        assert_eq!(second[0].image_ref, "img-3");

        let empty = Vec::new();
        let (first, second) = display_rows(&empty);
        assert!(first.is_empty() && second.is_empty());

        let one = gallery.list()[..1].to_vec();
        let (first, second) = display_rows(&one);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
