//! Event-time reordering of incoming samples.
//!
//! GPS feeds deliver samples out of order. The buffer holds each sample until
//! the newest timestamp seen is at least one window ahead of it, then
//! releases samples in timestamp order. The watermark is the timestamp of the
//! last released sample; anything older arriving afterwards can no longer be
//! placed and is rejected as late, as is a sample equal to it, since its
//! peers at that instant have already gone. Samples sharing a timestamp are
//! released in [`sample_order`], matching the batch analyzer.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use waytrace_core::ActualPosition;
use waytrace_core::position::sample_order;

/// Outcome of [`ReorderBuffer::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The sample is waiting for release.
    Buffered,
    /// The sample predates the watermark and was discarded.
    Late,
}

/// Holds samples until they can be released in timestamp order.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use waytrace_core::ActualPosition;
/// use waytrace_stream::reorder::{Admission, ReorderBuffer};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
/// let mut buffer = ReorderBuffer::new(Duration::seconds(5));
/// buffer.insert(ActualPosition::new(0.0, 0.0, t0 + Duration::seconds(2)));
/// buffer.insert(ActualPosition::new(0.0, 0.0, t0));
/// assert!(buffer.release().is_empty());
///
/// buffer.insert(ActualPosition::new(0.0, 0.0, t0 + Duration::seconds(9)));
/// let released: Vec<_> = buffer.release().into_iter().map(|s| s.timestamp).collect();
/// assert_eq!(released, vec![t0, t0 + Duration::seconds(2)]);
///
/// let late = ActualPosition::new(0.0, 0.0, t0 + Duration::seconds(1));
/// assert_eq!(buffer.insert(late), Admission::Late);
/// ```
#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    window: TimeDelta,
    pending: BTreeMap<DateTime<Utc>, Vec<ActualPosition>>,
    newest: Option<DateTime<Utc>>,
    watermark: Option<DateTime<Utc>>,
}

impl ReorderBuffer {
    /// Create an empty buffer with the given event-time window.
    #[must_use]
    pub const fn new(window: TimeDelta) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
            newest: None,
            watermark: None,
        }
    }

    /// Admit a sample unless it is at or behind the watermark.
    pub fn insert(&mut self, sample: ActualPosition) -> Admission {
        if self.watermark.is_some_and(|mark| sample.timestamp <= mark) {
            return Admission::Late;
        }
        self.newest = Some(
            self.newest
                .map_or(sample.timestamp, |newest| newest.max(sample.timestamp)),
        );
        self.pending
            .entry(sample.timestamp)
            .or_default()
            .push(sample);
        Admission::Buffered
    }

    /// Release every sample at least one window older than the newest.
    pub fn release(&mut self) -> Vec<ActualPosition> {
        let Some(cutoff) = self
            .newest
            .and_then(|newest| newest.checked_sub_signed(self.window))
        else {
            return Vec::new();
        };
        // Timestamps strictly after `cutoff` stay pending.
        let retained = match cutoff.checked_add_signed(TimeDelta::nanoseconds(1)) {
            Some(after) => self.pending.split_off(&after),
            None => BTreeMap::new(),
        };
        let ready = std::mem::replace(&mut self.pending, retained);
        self.emit(ready)
    }

    /// Release everything regardless of age.
    pub fn drain(&mut self) -> Vec<ActualPosition> {
        let ready = std::mem::take(&mut self.pending);
        self.emit(ready)
    }

    /// Samples waiting for release.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Whether no samples are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Timestamp of the last released sample.
    #[must_use]
    pub const fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark
    }

    fn emit(
        &mut self,
        ready: BTreeMap<DateTime<Utc>, Vec<ActualPosition>>,
    ) -> Vec<ActualPosition> {
        if let Some((last, _)) = ready.last_key_value() {
            self.watermark = Some(*last);
        }
        ready
            .into_values()
            .flat_map(|mut group| {
                group.sort_by(sample_order);
                group
            })
            .collect()
    }
}
