//! Two-slot look-ahead buffer.
//!
//! The pipeline's only mutable shared state: `current` (playing or about to
//! play) and `next` (prefetched, not yet playing). Only the pipeline
//! controller writes the slots; the synthesis and playback layers just
//! report results back to it.

use crate::synth::AudioClip;

/// A synthesized paragraph parked in a buffer slot.
#[derive(Debug, Clone)]
pub struct PreparedParagraph {
    /// Position in document order.
    pub index: usize,

    /// The paragraph's synthesized audio.
    pub clip: AudioClip,
}

/// Holds at most two prepared paragraphs.
///
/// Invariant: `next` is only ever populated while `current` is occupied.
/// When the current paragraph finishes, `next` (if present) is promoted into
/// `current` and its slot cleared. Clearing a slot drops the clip, releasing
/// its byte buffer — on every exit path, including stop and error.
#[derive(Debug, Default)]
pub struct PlaybackBuffer {
    current: Option<PreparedParagraph>,
    next: Option<PreparedParagraph>,
}

impl PlaybackBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the `current` slot (paragraph 0, or an awaited next paragraph).
    pub fn set_current(&mut self, prepared: PreparedParagraph) {
        debug_assert!(self.current.is_none(), "current slot already occupied");
        self.current = Some(prepared);
    }

    /// Park a prefetched paragraph. Only legal while `current` is occupied.
    pub fn set_next(&mut self, prepared: PreparedParagraph) {
        debug_assert!(
            self.current.is_some(),
            "next slot filled while current is empty"
        );
        self.next = Some(prepared);
    }

    #[must_use]
    pub fn current(&self) -> Option<&PreparedParagraph> {
        self.current.as_ref()
    }

    /// Drop the played paragraph's clip.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Move `next` into the empty `current` slot. Returns whether a
    /// promotion happened.
    pub fn promote(&mut self) -> bool {
        debug_assert!(
            self.current.is_none(),
            "promoting over an occupied current slot"
        );
        match self.next.take() {
            Some(prepared) => {
                self.current = Some(prepared);
                true
            }
            None => false,
        }
    }

    /// Drop both slots (stop/teardown path).
    pub fn clear(&mut self) {
        self.current = None;
        self.next = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.next.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(index: usize) -> PreparedParagraph {
        PreparedParagraph {
            index,
            clip: AudioClip::new(vec![index as u8]),
        }
    }

    #[test]
    fn starts_empty() {
        let buffer = PlaybackBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.current().is_none());
    }

    #[test]
    fn promote_transfers_ownership() {
        let mut buffer = PlaybackBuffer::new();
        buffer.set_current(prepared(0));
        buffer.set_next(prepared(1));

        buffer.clear_current();
        assert!(buffer.promote());

        let current = buffer.current().expect("promoted paragraph");
        assert_eq!(current.index, 1);
        // The next slot was vacated by the promotion
        buffer.clear_current();
        assert!(!buffer.promote());
        assert!(buffer.is_empty());
    }

    #[test]
    fn promote_without_prefetch_reports_false() {
        let mut buffer = PlaybackBuffer::new();
        buffer.set_current(prepared(0));
        buffer.clear_current();
        assert!(!buffer.promote());
    }

    #[test]
    fn clear_drops_both_slots() {
        let mut buffer = PlaybackBuffer::new();
        buffer.set_current(prepared(0));
        buffer.set_next(prepared(1));

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
