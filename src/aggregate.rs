//! Fixed-window bar aggregation
//!
//! Each window size is aggregated independently over the same raw sequence:
//! position 30 produces a 5-, a 15- and a 30-record aggregate at once.

use tracing::debug;

use crate::config::WindowSpan;
use crate::types::{IntervalRecord, Money, Quote};

/// Aggregates produced for one window size, in trigger order.
///
/// The k-th record (1-based) summarizes raw positions `(k-1)*window+1 ..= k*window`.
#[derive(Debug, Clone)]
pub struct WindowAggregates {
    pub window: usize,
    pub records: Vec<IntervalRecord>,
}

impl WindowAggregates {
    /// Aggregate due right after the raw record at 1-based `position`, if any.
    pub fn triggered_at(&self, position: usize) -> Option<&IntervalRecord> {
        if self.window == 0 || position == 0 || position % self.window != 0 {
            return None;
        }
        self.records.get(position / self.window - 1)
    }
}

/// Summarize every complete window of `window` consecutive records.
///
/// Produces `records.len() / window` aggregates; a trailing partial window
/// is ignored.
pub fn aggregate(records: &[IntervalRecord], window: usize, span: WindowSpan) -> Vec<IntervalRecord> {
    if window == 0 {
        return Vec::new();
    }

    records
        .chunks_exact(window)
        .enumerate()
        .filter_map(|(idx, chunk)| {
            debug!(
                "Creating row for window {} at position {}",
                window,
                (idx + 1) * window
            );
            summarize(chunk, span)
        })
        .collect()
}

/// Run [`aggregate`] once per window size, keeping the given order.
pub fn aggregate_all(
    records: &[IntervalRecord],
    windows: &[usize],
    span: WindowSpan,
) -> Vec<WindowAggregates> {
    windows
        .iter()
        .map(|&window| WindowAggregates {
            window,
            records: aggregate(records, window, span),
        })
        .collect()
}

/// Build one aggregate from a complete window.
fn summarize(chunk: &[IntervalRecord], span: WindowSpan) -> Option<IntervalRecord> {
    let (first, tail) = chunk.split_first()?;
    let (last, body) = chunk.split_last()?;

    let scanned = match span {
        WindowSpan::ExcludeOpen => tail,
        WindowSpan::ExcludeClose => body,
        WindowSpan::Full => chunk,
    };

    // First value wins; later values replace it only when strictly beyond it
    let mut high: Option<&Quote> = None;
    let mut low: Option<&Quote> = None;
    for record in scanned {
        if high.map_or(true, |h| record.high.value() > h.value()) {
            high = Some(&record.high);
        }
        if low.map_or(true, |l| record.low.value() < l.value()) {
            low = Some(&record.low);
        }
    }
    let volume: Money = scanned.iter().map(|r| r.volume.value()).sum();

    Some(IntervalRecord {
        instrument_id: last.instrument_id.clone(),
        close: last.close.clone(),
        created_at: last.created_at,
        interval: chunk.len(),
        high: high.unwrap_or(&last.high).clone(),
        low: low.unwrap_or(&last.low).clone(),
        open: first.open.clone(),
        volume: volume.into(),
    })
}

/// Merge raw records with their aggregates.
///
/// Each raw record is followed by every aggregate it completes, in the order
/// of `aggregates`.
pub fn interleave(raw: &[IntervalRecord], aggregates: &[WindowAggregates]) -> Vec<IntervalRecord> {
    let total = raw.len() + aggregates.iter().map(|a| a.records.len()).sum::<usize>();
    let mut combined = Vec::with_capacity(total);

    for (idx, record) in raw.iter().enumerate() {
        combined.push(record.clone());

        let position = idx + 1;
        combined.extend(
            aggregates
                .iter()
                .filter_map(|set| set.triggered_at(position))
                .cloned(),
        );
    }

    combined
}
