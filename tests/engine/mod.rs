//! End-to-end engine tests: drive a `Connection` with raw bytes on the
//! receive side and check the exact bytes it queues on the send side.


mod data_flow;
