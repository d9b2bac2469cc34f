//! Graph Capture: a frame's compiled graph snapshot handed to an inspector
//! tool (the `rdg_inspector` feature) at most once per request (§4.C step 8).

use std::sync::atomic::{AtomicBool, Ordering};

/// One accessed view as recorded for a captured node.
#[derive(Debug, Clone)]
pub struct CapturedAccess {
    pub view_debug: String,
    pub kind_debug: String,
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub name: String,
    pub kind: &'static str,
    pub accesses: Vec<CapturedAccess>,
    pub barrier_count: usize,
}

/// A snapshot of one compiled frame, independent of the graph's own node
/// storage so an inspector can hold it past the frame's lifetime.
#[derive(Debug, Clone)]
pub struct GraphCapture {
    pub frame_index: u64,
    pub nodes: Vec<CapturedNode>,
    pub total_barriers: usize,
    pub aliased_region_count: usize,
    pub aliasing_pool_bytes: u64,
}

/// Receives a capture exactly once per request. Implemented by inspector UIs;
/// kept object-safe so the compiler can hold a `Box<dyn CaptureSink>`.
pub trait CaptureSink: Send {
    fn accept(&mut self, capture: GraphCapture);
}

/// A one-shot, thread-safe request flag. `request()` may be called from any
/// thread (e.g. a debug UI); `take()` is polled by the compiler at the start
/// of `compile()` and clears the flag atomically so a capture is hand off
/// exactly once even under concurrent requests (§8, Capture hand-off
/// invariant).
#[derive(Default)]
pub struct CaptureRequest {
    pending: AtomicBool,
}

impl CaptureRequest {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    pub fn request(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Clears and returns whether a capture was pending. Idempotent: calling
    /// twice in a row without an intervening `request()` returns `false` the
    /// second time.
    #[must_use]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_request_is_consumed_exactly_once() {
        let request = CaptureRequest::new();
        request.request();
        assert!(request.take());
        assert!(!request.take());
    }

    struct CollectingSink {
        received: Vec<GraphCapture>,
    }

    impl CaptureSink for CollectingSink {
        fn accept(&mut self, capture: GraphCapture) {
            self.received.push(capture);
        }
    }

    #[test]
    fn sink_receives_handed_off_capture() {
        let mut sink = CollectingSink { received: Vec::new() };
        sink.accept(GraphCapture {
            frame_index: 1,
            nodes: Vec::new(),
            total_barriers: 0,
            aliased_region_count: 0,
            aliasing_pool_bytes: 0,
        });
        assert_eq!(sink.received.len(), 1);
    }
}
