//! Frame Context (§4.F): per-frame lifetime, stage events, frames-in-flight
//! pacing, and the GPU-finished waitable.
//!
//! The GPU-finished waitable is a small [`Event`] backed by a
//! `parking_lot::Mutex<bool>` + `Condvar`, matching this codebase's existing
//! dependency on `parking_lot` for its locks. The per-frame arena is a
//! [`bumpalo::Bump`], the same allocator already used conceptually by
//! transient pooling elsewhere in this codebase; it is reset (not freed) once
//! the frame's GPU-finished event fires, avoiding per-frame heap churn the
//! same way [`crate::renderer::graph::transient_pool::TransientTexturePool::reset`]
//! avoids texture churn.

use std::sync::Arc;
use std::time::Duration;

use bumpalo::Bump;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::renderer::orchestrator::view::RenderStage;

/// A GPU-finished waitable. Cheap to clone (shares the inner state).
#[derive(Clone)]
pub struct Event {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn signal(&self) {
        let (lock, cvar) = &*self.inner;
        let mut signalled = lock.lock();
        *signalled = true;
        cvar.notify_all();
    }

    #[must_use]
    pub fn is_signalled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Blocks until signalled.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut signalled = lock.lock();
        while !*signalled {
            cvar.wait(&mut signalled);
        }
    }

    /// Blocks until signalled or `timeout` elapses. Expiry is non-fatal:
    /// the caller is expected to report it to the host (§5, Cancellation
    /// and timeouts) rather than treat it as an error.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut signalled = lock.lock();
        if *signalled {
            return true;
        }
        let result = cvar.wait_for(&mut signalled, timeout);
        !result.timed_out() && *signalled
    }
}

/// Records `begin`/`end` timestamps per stage so collaborators can pace
/// dependent work against the frame's own progress.
#[derive(Default)]
pub struct StageEventTable {
    begins: FxHashMap<RenderStage, f64>,
    ends: FxHashMap<RenderStage, f64>,
}

impl StageEventTable {
    pub fn begin(&mut self, stage: RenderStage, time: f64) {
        self.begins.insert(stage, time);
    }

    pub fn end(&mut self, stage: RenderStage, time: f64) {
        self.ends.insert(stage, time);
    }

    #[must_use]
    pub fn has_begun(&self, stage: RenderStage) -> bool {
        self.begins.contains_key(&stage)
    }

    #[must_use]
    pub fn has_ended(&self, stage: RenderStage) -> bool {
        self.ends.contains_key(&stage)
    }

    fn reset(&mut self) {
        self.begins.clear();
        self.ends.clear();
    }
}

/// Owns the frame index, delta-time/time, the stage-event table, the
/// GPU-finished waitable, and a per-frame bump arena.
pub struct FrameContext {
    pub frame_index: u64,
    pub delta_time: f32,
    pub time: f64,
    pub stage_events: StageEventTable,
    gpu_finished: Event,
    arena: Bump,
}

impl FrameContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            delta_time: 0.0,
            time: 0.0,
            stage_events: StageEventTable::default(),
            gpu_finished: Event::new(),
            arena: Bump::new(),
        }
    }

    #[must_use]
    pub fn arena(&self) -> &Bump {
        &self.arena
    }

    #[must_use]
    pub fn gpu_finished_event(&self) -> Event {
        self.gpu_finished.clone()
    }

    /// Advances to a new frame: bumps the index, updates dt/time, installs a
    /// fresh GPU-finished event, and clears the per-frame arena (called after
    /// the previous frame's event fired, per Frames-in-flight pacing below).
    pub fn begin_frame(&mut self, delta_time: f32, time: f64) {
        self.frame_index += 1;
        self.delta_time = delta_time;
        self.time = time;
        self.stage_events.reset();
        self.gpu_finished = Event::new();
        self.arena.reset();
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks in-flight frame events so `begin_frame(N+1)` can block until frame
/// `N + 1 - K` has signalled (K = `frames_in_flight`), per §4.F / §9's
/// resolved open question on the GPU-finished/begin-frame boundary.
pub struct FramePacer {
    frames_in_flight: u64,
    in_flight: std::collections::VecDeque<Event>,
    max_fps: Option<f32>,
    last_frame_start: Option<std::time::Instant>,
}

impl FramePacer {
    #[must_use]
    pub fn new(frames_in_flight: u64, max_fps: Option<f32>) -> Self {
        Self {
            frames_in_flight: frames_in_flight.max(1),
            in_flight: std::collections::VecDeque::new(),
            max_fps,
            last_frame_start: None,
        }
    }

    /// Blocks if the CPU would otherwise get more than `K` frames ahead of
    /// the GPU (§8, Frame pacing invariant), then applies the soft `max_fps`
    /// sleep before returning.
    pub fn wait_for_slot(&mut self) {
        if self.in_flight.len() as u64 >= self.frames_in_flight {
            if let Some(oldest) = self.in_flight.pop_front() {
                oldest.wait();
            }
        }

        if let Some(max_fps) = self.max_fps {
            if max_fps > 0.0 {
                let target = Duration::from_secs_f32(1.0 / max_fps);
                if let Some(last) = self.last_frame_start {
                    let elapsed = last.elapsed();
                    if elapsed < target {
                        std::thread::sleep(target - elapsed);
                    }
                }
            }
        }
        self.last_frame_start = Some(std::time::Instant::now());
    }

    pub fn push_in_flight(&mut self, event: Event) {
        self.in_flight.push_back(event);
    }

    #[must_use]
    pub fn frames_ahead_of_gpu(&self) -> usize {
        self.in_flight.iter().filter(|e| !e.is_signalled()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_signals_and_polls() {
        let event = Event::new();
        assert!(!event.is_signalled());
        event.signal();
        assert!(event.is_signalled());
        event.wait();
    }

    #[test]
    fn pacer_never_lets_cpu_get_more_than_k_frames_ahead() {
        let mut pacer = FramePacer::new(2, None);
        let e1 = Event::new();
        let e2 = Event::new();
        let e3 = Event::new();
        pacer.wait_for_slot();
        pacer.push_in_flight(e1.clone());
        pacer.wait_for_slot();
        pacer.push_in_flight(e2.clone());
        e1.signal();
        // Third frame must wait for the oldest (e1) slot, which is signalled.
        pacer.wait_for_slot();
        pacer.push_in_flight(e3);
        assert!(pacer.frames_ahead_of_gpu() <= 2);
    }

    #[test]
    fn frame_context_advances_and_resets_arena() {
        let mut ctx = FrameContext::new();
        ctx.begin_frame(0.016, 1.0);
        let first_index = ctx.frame_index;
        ctx.begin_frame(0.016, 2.0);
        assert_eq!(ctx.frame_index, first_index + 1);
    }
}
