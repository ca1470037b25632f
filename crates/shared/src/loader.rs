//! Budget-bounded incremental marker loading.
//!
//! Inserting thousands of markers in one go stalls the interface, so
//! the loader keeps a resumable queue of pending features and processes
//! them a frame at a time: each call to [`IncrementalLoader::process_frame`]
//! consumes items until the wall-clock budget is spent, then hands
//! control back so the caller can schedule the next frame. The clock is
//! injected, which makes the frame-splitting behavior reproducible in
//! tests without a real rendering loop.

use std::collections::VecDeque;

use crate::feature::Feature;
use crate::geo::Bounds;

/// Wall-clock source for budget checks. The browser driver wraps
/// `performance.now()`; tests use a fake.
pub trait FrameClock {
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    /// Maximum time one frame may spend processing items.
    pub frame_budget_ms: f64,
    /// Items processed between elapsed-time checks, so the check
    /// itself doesn't dominate tiny work items.
    pub items_per_check: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            frame_budget_ms: 4.0,
            items_per_check: 18,
        }
    }
}

/// Result of one processing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Budget exhausted with items still pending; schedule another frame.
    MoreWork,
    /// The queue ran dry; the current batch is complete.
    Drained,
}

#[derive(Debug)]
pub struct IncrementalLoader {
    pending: VecDeque<Feature>,
    config: LoaderConfig,
    generation: u64,
    bounds_fitted: bool,
}

impl IncrementalLoader {
    pub fn new(config: LoaderConfig) -> Self {
        IncrementalLoader {
            pending: VecDeque::new(),
            config,
            generation: 0,
            bounds_fitted: false,
        }
    }

    /// Append a batch of features to the pending queue.
    pub fn enqueue(&mut self, batch: Vec<Feature>) {
        self.pending.extend(batch);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Current generation. A scheduled continuation records the
    /// generation it was created under and bails out if it no longer
    /// matches, so a continuation belonging to a replaced dataset can
    /// never insert stale markers.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Abandon pending work and invalidate in-flight continuations.
    /// Returns the new generation.
    pub fn reset(&mut self) -> u64 {
        self.pending.clear();
        self.bounds_fitted = false;
        self.generation += 1;
        self.generation
    }

    /// Viewport bounds to fit, exactly once, for the first non-empty
    /// batch. Later batches (and empty first batches) return `None`.
    pub fn take_initial_bounds(&mut self, batch: &[Feature]) -> Option<Bounds> {
        if self.bounds_fitted || batch.is_empty() {
            return None;
        }
        let bounds = Bounds::from_features(batch)?;
        self.bounds_fitted = true;
        Some(bounds)
    }

    /// Process pending features until the frame budget is spent or the
    /// queue drains, feeding each feature to `sink` (which creates the
    /// marker, registers it, and sets its initial visibility).
    ///
    /// Elapsed time is checked after every `items_per_check` items
    /// rather than after each one.
    pub fn process_frame(
        &mut self,
        clock: &dyn FrameClock,
        sink: &mut dyn FnMut(Feature),
    ) -> FrameOutcome {
        let start = clock.now_ms();
        loop {
            for _ in 0..self.config.items_per_check {
                match self.pending.pop_front() {
                    Some(feature) => sink(feature),
                    None => return FrameOutcome::Drained,
                }
            }
            if self.pending.is_empty() {
                return FrameOutcome::Drained;
            }
            if clock.now_ms() - start >= self.config.frame_budget_ms {
                return FrameOutcome::MoreWork;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Record;
    use std::cell::Cell;

    /// Clock that advances a fixed amount per reading.
    struct FakeClock {
        now: Cell<f64>,
        tick_ms: f64,
    }

    impl FakeClock {
        fn new(tick_ms: f64) -> Self {
            FakeClock {
                now: Cell::new(0.0),
                tick_ms,
            }
        }
    }

    impl FrameClock for FakeClock {
        fn now_ms(&self) -> f64 {
            let now = self.now.get();
            self.now.set(now + self.tick_ms);
            now
        }
    }

    fn features(n: usize) -> Vec<Feature> {
        (0..n)
            .map(|i| Feature {
                lon: i as f64,
                lat: i as f64 / 2.0,
                roles: vec![],
                properties: Record::new(),
            })
            .collect()
    }

    #[test]
    fn test_small_batch_drains_in_one_frame() {
        let mut loader = IncrementalLoader::new(LoaderConfig::default());
        loader.enqueue(features(5));
        let clock = FakeClock::new(0.1);
        let mut seen = 0;
        let outcome = loader.process_frame(&clock, &mut |_| seen += 1);
        assert_eq!(outcome, FrameOutcome::Drained);
        assert_eq!(seen, 5);
        assert!(loader.is_idle());
    }

    #[test]
    fn test_large_batch_spreads_across_frames_and_completes_once() {
        let config = LoaderConfig {
            frame_budget_ms: 4.0,
            items_per_check: 10,
        };
        let mut loader = IncrementalLoader::new(config);
        loader.enqueue(features(1000));

        // Each now_ms() call advances 2 ms, so a frame survives two
        // budget checks at most: 20-30 items per frame.
        let clock = FakeClock::new(2.0);
        let mut seen = 0;
        let mut frames = 0;
        let mut completions = 0;
        loop {
            frames += 1;
            match loader.process_frame(&clock, &mut |_| seen += 1) {
                FrameOutcome::MoreWork => continue,
                FrameOutcome::Drained => {
                    completions += 1;
                    break;
                }
            }
        }

        assert_eq!(seen, 1000);
        assert_eq!(completions, 1);
        assert!(frames > 1, "1000 items must not fit a single frame");
        assert!(loader.is_idle());
    }

    #[test]
    fn test_items_delivered_in_order() {
        let mut loader = IncrementalLoader::new(LoaderConfig {
            frame_budget_ms: 1.0,
            items_per_check: 3,
        });
        loader.enqueue(features(10));
        let clock = FakeClock::new(0.6);
        let mut lons = Vec::new();
        loop {
            if loader.process_frame(&clock, &mut |f| lons.push(f.lon)) == FrameOutcome::Drained {
                break;
            }
        }
        let expected: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(lons, expected);
    }

    #[test]
    fn test_budget_checked_per_group_not_per_item() {
        // With a huge tick the budget is blown after the first check,
        // but a full group of items is still processed before it.
        let mut loader = IncrementalLoader::new(LoaderConfig {
            frame_budget_ms: 1.0,
            items_per_check: 7,
        });
        loader.enqueue(features(20));
        let clock = FakeClock::new(100.0);
        let mut seen = 0;
        let outcome = loader.process_frame(&clock, &mut |_| seen += 1);
        assert_eq!(outcome, FrameOutcome::MoreWork);
        assert_eq!(seen, 7);
    }

    #[test]
    fn test_bounds_fit_once_on_first_nonempty_batch() {
        let mut loader = IncrementalLoader::new(LoaderConfig::default());

        // An empty first batch must not consume the fit
        assert!(loader.take_initial_bounds(&[]).is_none());

        let first = features(3);
        let bounds = loader.take_initial_bounds(&first).unwrap();
        assert_eq!(bounds.min_lon, 0.0);
        assert_eq!(bounds.max_lon, 2.0);

        // Subsequent batches never re-fit
        assert!(loader.take_initial_bounds(&features(50)).is_none());
    }

    #[test]
    fn test_reset_abandons_pending_and_bumps_generation() {
        let mut loader = IncrementalLoader::new(LoaderConfig::default());
        loader.enqueue(features(100));
        loader.take_initial_bounds(&features(1));
        let old_gen = loader.generation();

        let new_gen = loader.reset();
        assert_eq!(new_gen, old_gen + 1);
        assert!(loader.is_idle());

        // A continuation holding old_gen must notice and bail
        assert_ne!(loader.generation(), old_gen);

        // The fresh dataset gets its own bounds fit again
        assert!(loader.take_initial_bounds(&features(2)).is_some());
    }

    #[test]
    fn test_multiple_batches_queue_up() {
        let mut loader = IncrementalLoader::new(LoaderConfig::default());
        loader.enqueue(features(4));
        loader.enqueue(features(6));
        assert_eq!(loader.pending_len(), 10);
    }
}
