//! Fixed-window segmentation of decoded audio durations.
//!
//! A file is partitioned into contiguous, non-overlapping windows of a
//! configured length; only the last window may be shorter. Segments are
//! derived on demand from a duration and a window length and are never
//! stored themselves, only their labels are.

/// One contiguous time window of an audio file, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSpan {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SegmentSpan {
    /// Window length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Display label in whole seconds, e.g. `"5-10"`.
    ///
    /// This is the string the annotation table keeps in its `Segment Time`
    /// column. It is display-only and never parsed back.
    pub fn time_label(&self) -> String {
        format!("{}-{}", self.start_ms / 1000, self.end_ms / 1000)
    }
}

/// Split `duration_ms` into consecutive windows of at most `window_ms`.
///
/// Window `i` covers `[i * window_ms, min((i + 1) * window_ms, duration_ms))`.
/// A zero duration yields no windows. `window_ms` must be positive; a zero
/// window also yields no windows rather than looping.
pub fn compute_segments(duration_ms: u64, window_ms: u64) -> Vec<SegmentSpan> {
    if window_ms == 0 {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut start = 0;
    while start < duration_ms {
        let end = (start + window_ms).min(duration_ms);
        spans.push(SegmentSpan {
            start_ms: start,
            end_ms: end,
        });
        start = end;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duration_yields_no_segments() {
        assert!(compute_segments(0, 5000).is_empty());
    }

    #[test]
    fn test_zero_window_yields_no_segments() {
        assert!(compute_segments(10_000, 0).is_empty());
    }

    #[test]
    fn test_exact_multiple() {
        let spans = compute_segments(10_000, 5000);
        assert_eq!(
            spans,
            vec![
                SegmentSpan {
                    start_ms: 0,
                    end_ms: 5000
                },
                SegmentSpan {
                    start_ms: 5000,
                    end_ms: 10_000
                },
            ]
        );
    }

    #[test]
    fn test_short_final_segment() {
        let spans = compute_segments(12_000, 5000);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0], SegmentSpan { start_ms: 0, end_ms: 5000 });
        assert_eq!(
            spans[1],
            SegmentSpan {
                start_ms: 5000,
                end_ms: 10_000
            }
        );
        assert_eq!(
            spans[2],
            SegmentSpan {
                start_ms: 10_000,
                end_ms: 12_000
            }
        );
    }

    #[test]
    fn test_window_longer_than_file() {
        let spans = compute_segments(3000, 5000);
        assert_eq!(spans, vec![SegmentSpan { start_ms: 0, end_ms: 3000 }]);
    }

    #[test]
    fn test_segments_are_contiguous_and_cover_duration() {
        for duration in [1, 999, 5000, 5001, 44_100, 123_456] {
            let spans = compute_segments(duration, 5000);
            assert_eq!(spans[0].start_ms, 0);
            assert_eq!(spans.last().unwrap().end_ms, duration);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].end_ms, pair[1].start_ms);
            }
            for span in &spans {
                assert!(span.start_ms < span.end_ms);
                assert!(span.duration_ms() <= 5000);
            }
        }
    }

    #[test]
    fn test_time_label_is_whole_seconds() {
        let span = SegmentSpan {
            start_ms: 5000,
            end_ms: 10_000,
        };
        assert_eq!(span.time_label(), "5-10");

        let tail = SegmentSpan {
            start_ms: 10_000,
            end_ms: 12_500,
        };
        assert_eq!(tail.time_label(), "10-12");
    }
}
