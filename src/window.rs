//! Inbound flow-control window accounting.
//!
//! One manager guards the connection-level receive budget and one guards
//! each stream's. Replenishment is batched: consumed bytes accumulate
//! until they exceed half the window, at which point a single increment
//! is released for the caller to turn into a WINDOW_UPDATE. The batching
//! bounds worst-case peer stall to half a window without emitting an
//! update per received byte.

use crate::error::FlowControlError;

#[derive(Debug, Clone)]
pub struct WindowManager {
    max_window_size: u32,
    current_window_size: u32,
    bytes_processed: u64,
}

impl WindowManager {
    pub fn new(max_window_size: u32) -> Self {
        Self {
            max_window_size,
            current_window_size: max_window_size,
            bytes_processed: 0,
        }
    }

    /// Remaining receive budget.
    pub fn current_window_size(&self) -> u32 {
        self.current_window_size
    }

    pub fn max_window_size(&self) -> u32 {
        self.max_window_size
    }

    /// Bytes acknowledged by the caller but not yet released as an increment.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Charge `size` received bytes against the window.
    pub fn reduce(&mut self, size: u32) -> Result<(), FlowControlError> {
        self.current_window_size = self
            .current_window_size
            .checked_sub(size)
            .ok_or(FlowControlError::WindowUnderflow)?;
        Ok(())
    }

    /// Record that the caller consumed `size` bytes and decide whether a
    /// WINDOW_UPDATE is due.
    ///
    /// Fires once accumulated bytes exceed half the maximum window. The
    /// released increment is capped so the window never grows past its
    /// maximum; the accumulator resets on every firing, capped or not.
    /// Returns `None` while below the threshold or when the cap leaves
    /// nothing to release.
    pub fn process_bytes(&mut self, size: u32) -> Option<u32> {
        self.bytes_processed += size as u64;
        self.maybe_window_increment()
    }

    fn maybe_window_increment(&mut self) -> Option<u32> {
        if self.bytes_processed == 0 {
            return None;
        }
        if self.bytes_processed <= (self.max_window_size / 2) as u64 {
            return None;
        }
        // saturating: a lowered max can leave the window above the new
        // ceiling until it drains
        let headroom = self.max_window_size.saturating_sub(self.current_window_size) as u64;
        let increment = self.bytes_processed.min(headroom) as u32;
        self.bytes_processed = 0;
        self.current_window_size += increment;
        if increment == 0 {
            None
        } else {
            Some(increment)
        }
    }

    /// Retarget the replenishment ceiling, e.g. after a settings change.
    pub fn change_max_window(&mut self, max_window_size: u32) {
        self.max_window_size = max_window_size;
    }
}
