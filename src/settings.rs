//! The six negotiable connection parameters and their defaults.
//!
//! Every connection holds two registries: local (what we advertise) and
//! remote (what the peer advertised). Updates arrive key-by-key from
//! SETTINGS frames; identifiers outside the recognized six are dropped
//! on the floor, as the protocol requires.

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2)
#[allow(dead_code)]
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const ENABLE_PUSH: u16 = 0x2;
    pub const MAX_CONCURRENT_STREAMS: u16 = 0x3;
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
    pub const MAX_FRAME_SIZE: u16 = 0x5;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

use settings_id::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    header_table_size: u32,
    enable_push: u32,
    max_concurrent_streams: u32,
    initial_window_size: u32,
    max_frame_size: u32,
    max_header_list_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_table_size: 4096,
            enable_push: 0,
            max_concurrent_streams: 100,
            initial_window_size: 65535,
            max_frame_size: 16384,
            max_header_list_size: 65535,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with a set of overrides applied; unrecognized identifiers
    /// are ignored.
    pub fn with_overrides(overrides: &[(u16, u32)]) -> Self {
        let mut settings = Self::default();
        for &(id, value) in overrides {
            settings.update(id, value);
        }
        settings
    }

    /// Apply one identifier/value pair. Returns `false` when the
    /// identifier is not one of the recognized six (and nothing changes).
    pub fn update(&mut self, id: u16, value: u32) -> bool {
        match id {
            HEADER_TABLE_SIZE => self.header_table_size = value,
            ENABLE_PUSH => self.enable_push = value,
            MAX_CONCURRENT_STREAMS => self.max_concurrent_streams = value,
            INITIAL_WINDOW_SIZE => self.initial_window_size = value,
            MAX_FRAME_SIZE => self.max_frame_size = value,
            MAX_HEADER_LIST_SIZE => self.max_header_list_size = value,
            _ => return false,
        }
        true
    }

    pub fn get(&self, id: u16) -> Option<u32> {
        match id {
            HEADER_TABLE_SIZE => Some(self.header_table_size),
            ENABLE_PUSH => Some(self.enable_push),
            MAX_CONCURRENT_STREAMS => Some(self.max_concurrent_streams),
            INITIAL_WINDOW_SIZE => Some(self.initial_window_size),
            MAX_FRAME_SIZE => Some(self.max_frame_size),
            MAX_HEADER_LIST_SIZE => Some(self.max_header_list_size),
            _ => None,
        }
    }

    /// All six pairs in identifier order, ready for a SETTINGS payload.
    pub fn items(&self) -> [(u16, u32); 6] {
        [
            (HEADER_TABLE_SIZE, self.header_table_size),
            (ENABLE_PUSH, self.enable_push),
            (MAX_CONCURRENT_STREAMS, self.max_concurrent_streams),
            (INITIAL_WINDOW_SIZE, self.initial_window_size),
            (MAX_FRAME_SIZE, self.max_frame_size),
            (MAX_HEADER_LIST_SIZE, self.max_header_list_size),
        ]
    }

    pub fn header_table_size(&self) -> u32 {
        self.header_table_size
    }

    pub fn enable_push(&self) -> u32 {
        self.enable_push
    }

    pub fn max_concurrent_streams(&self) -> u32 {
        self.max_concurrent_streams
    }

    pub fn initial_window_size(&self) -> u32 {
        self.initial_window_size
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    pub fn max_header_list_size(&self) -> u32 {
        self.max_header_list_size
    }

    /// The initial window size doubles as the hard ceiling the window
    /// managers replenish toward.
    pub fn max_window_size(&self) -> u32 {
        self.initial_window_size
    }
}
