//! HPACK wrapper integration tests.

mod encoding;
