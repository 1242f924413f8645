//! Frame codec integration tests.

mod frame_header;
mod round_trip;
