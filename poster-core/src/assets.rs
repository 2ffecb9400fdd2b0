//! Ordered binding of event media to image slots.
//!
//! Position 0 of the selection binds the `cover` slot and positions 1–5 bind
//! `img2..img6`. Removing an id shifts every later id down one slot.

use serde::{Deserialize, Serialize};

use crate::element::ElementKey;
use crate::{CoreError, CoreResult};

/// Identifier of an event media asset.
pub type MediaId = i64;

/// Maximum number of bound media (one per image slot).
pub const MAX_SLOTS: usize = ElementKey::IMAGE_SLOTS.len();

/// One media-to-slot binding as sent to layout persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBinding {
    /// Bound media.
    pub media_id: MediaId,
    /// Zero-based slot number (0 = cover).
    pub slot_number: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSelection {
    #[serde(default)]
    selected_media_ids: Vec<MediaId>,
}

impl From<RawSelection> for AssetSelection {
    fn from(raw: RawSelection) -> Self {
        Self::from_ids(raw.selected_media_ids)
    }
}

/// Ordered list of selected media ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSelection")]
pub struct AssetSelection {
    selected_media_ids: Vec<MediaId>,
}

impl AssetSelection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, dropping duplicates and anything past [`MAX_SLOTS`].
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = MediaId>) -> Self {
        let mut selection = Self::new();
        for id in ids {
            if selection.selected_media_ids.len() == MAX_SLOTS {
                break;
            }
            if !selection.contains(id) {
                selection.selected_media_ids.push(id);
            }
        }
        selection
    }

    /// Selected ids in slot order.
    #[must_use]
    pub fn ids(&self) -> &[MediaId] {
        &self.selected_media_ids
    }

    /// Number of bound slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected_media_ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected_media_ids.is_empty()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: MediaId) -> bool {
        self.selected_media_ids.contains(&id)
    }

    /// Slot index currently bound to `id`.
    #[must_use]
    pub fn slot_of(&self, id: MediaId) -> Option<usize> {
        self.selected_media_ids.iter().position(|m| *m == id)
    }

    /// Media bound to an image element, if any.
    #[must_use]
    pub fn media_for(&self, key: ElementKey) -> Option<MediaId> {
        key.slot_index()
            .and_then(|slot| self.selected_media_ids.get(slot).copied())
    }

    /// Append `id` to the next free slot and return its slot index.
    ///
    /// Selecting an id that is already bound returns its current slot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlotsFull`] when all six slots are bound.
    pub fn select(&mut self, id: MediaId) -> CoreResult<usize> {
        if let Some(slot) = self.slot_of(id) {
            return Ok(slot);
        }
        if self.selected_media_ids.len() >= MAX_SLOTS {
            return Err(CoreError::SlotsFull(MAX_SLOTS));
        }
        self.selected_media_ids.push(id);
        Ok(self.selected_media_ids.len() - 1)
    }

    /// Unbind `id`, shifting later ids down one slot.
    ///
    /// Returns the slot it occupied.
    pub fn remove(&mut self, id: MediaId) -> Option<usize> {
        let slot = self.slot_of(id)?;
        self.selected_media_ids.remove(slot);
        Some(slot)
    }

    /// Select `id` if unbound, otherwise remove it.
    ///
    /// Returns whether `id` is selected afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlotsFull`] when selecting into a full list.
    pub fn toggle(&mut self, id: MediaId) -> CoreResult<bool> {
        if self.remove(id).is_some() {
            Ok(false)
        } else {
            self.select(id).map(|_| true)
        }
    }

    /// Bindings in slot order.
    #[must_use]
    pub fn slot_bindings(&self) -> Vec<SlotBinding> {
        self.selected_media_ids
            .iter()
            .enumerate()
            .map(|(slot_number, media_id)| SlotBinding {
                media_id: *media_id,
                slot_number,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_selection_binds_cover() {
        let mut assets = AssetSelection::new();
        assert_eq!(assets.select(7).expect("select"), 0);
        assert_eq!(assets.media_for(ElementKey::Cover), Some(7));
    }

    #[test]
    fn second_selection_binds_img2() {
        let mut assets = AssetSelection::new();
        assets.select(7).expect("select");
        assert_eq!(assets.select(8).expect("select"), 1);
        assert_eq!(assets.media_for(ElementKey::Img2), Some(8));
    }

    #[test]
    fn removing_first_shifts_down() {
        let mut assets = AssetSelection::from_ids([7, 8, 9]);
        assert_eq!(assets.remove(7), Some(0));
        assert_eq!(assets.ids(), &[8, 9]);
        assert_eq!(assets.media_for(ElementKey::Cover), Some(8));
        assert_eq!(assets.media_for(ElementKey::Img2), Some(9));
        assert_eq!(assets.media_for(ElementKey::Img3), None);
    }

    #[test]
    fn duplicate_select_is_idempotent() {
        let mut assets = AssetSelection::new();
        assets.select(3).expect("select");
        assets.select(4).expect("select");
        assert_eq!(assets.select(3).expect("select"), 0);
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn seventh_selection_is_refused() {
        let mut assets = AssetSelection::from_ids(1..=6);
        assert!(matches!(assets.select(99), Err(CoreError::SlotsFull(6))));
        assert_eq!(assets.len(), 6);
    }

    #[test]
    fn toggle_round_trip() {
        let mut assets = AssetSelection::new();
        assert!(assets.toggle(5).expect("toggle"));
        assert!(!assets.toggle(5).expect("toggle"));
        assert!(assets.is_empty());
    }

    #[test]
    fn deserialize_sanitizes() {
        let assets: AssetSelection =
            serde_json::from_str(r#"{"selectedMediaIds":[1,1,2,3,4,5,6,7]}"#).expect("parse");
        assert_eq!(assets.ids(), &[1, 2, 3, 4, 5, 6]);
        let json = serde_json::to_string(&assets).expect("serialize");
        assert_eq!(json, r#"{"selectedMediaIds":[1,2,3,4,5,6]}"#);
    }

    #[test]
    fn bindings_are_zero_based() {
        let assets = AssetSelection::from_ids([5, 9]);
        let bindings = assets.slot_bindings();
        assert_eq!(
            bindings,
            vec![
                SlotBinding {
                    media_id: 5,
                    slot_number: 0
                },
                SlotBinding {
                    media_id: 9,
                    slot_number: 1
                },
            ]
        );
    }
}
