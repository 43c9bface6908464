//! Stream reduction
//!
//! Folds the ordered, finite sequence of partial-text fragments from one
//! in-flight provider call into a single growing message body. Whether a
//! fragment is appended or replaces the accumulated text depends on the
//! provider's event shape, so the strategy is chosen by the provider
//! integration rather than assumed here.

/// How the provider shapes its stream fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Each fragment is an increment; the reducer appends.
    Delta,
    /// Each fragment is the full cumulative text so far; the reducer
    /// replaces. Mixing this up with [`Accumulation::Delta`] duplicates or
    /// truncates output, hence the explicit selection.
    Snapshot,
}

/// Fold state for one in-flight stream.
#[derive(Debug)]
pub struct StreamReducer {
    strategy: Accumulation,
    text: String,
}

impl StreamReducer {
    pub fn new(strategy: Accumulation) -> Self {
        Self {
            strategy,
            text: String::new(),
        }
    }

    /// Apply one incoming fragment. Returns the new cumulative value when
    /// the fragment carried text, to be published as a full replacement of
    /// the in-flight message content. Absent or empty text is a no-op tick
    /// and publishes nothing.
    pub fn apply(&mut self, fragment: Option<&str>) -> Option<&str> {
        let text = match fragment {
            Some(t) if !t.is_empty() => t,
            _ => return None,
        };
        match self.strategy {
            Accumulation::Delta => self.text.push_str(text),
            Accumulation::Snapshot => self.text = text.to_string(),
        }
        Some(&self.text)
    }

    /// The cumulative text so far. After the stream ends normally this is
    /// the final message content.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_fragments_are_appended() {
        let mut reducer = StreamReducer::new(Accumulation::Delta);
        assert_eq!(reducer.apply(Some("Hel")), Some("Hel"));
        assert_eq!(reducer.apply(Some("lo ")), Some("Hello "));
        assert_eq!(reducer.apply(Some("there")), Some("Hello there"));
        assert_eq!(reducer.into_text(), "Hello there");
    }

    #[test]
    fn snapshot_fragments_replace() {
        let mut reducer = StreamReducer::new(Accumulation::Snapshot);
        assert_eq!(reducer.apply(Some("H")), Some("H"));
        assert_eq!(reducer.apply(Some("Hello there")), Some("Hello there"));
        assert_eq!(reducer.into_text(), "Hello there");
    }

    #[test]
    fn empty_and_absent_fragments_are_noop_ticks() {
        let mut reducer = StreamReducer::new(Accumulation::Delta);
        assert_eq!(reducer.apply(None), None);
        assert_eq!(reducer.apply(Some("")), None);
        reducer.apply(Some("abc"));
        assert_eq!(reducer.apply(None), None);
        assert_eq!(reducer.text(), "abc");
    }

    #[test]
    fn empty_stream_yields_empty_final_text() {
        let reducer = StreamReducer::new(Accumulation::Snapshot);
        assert_eq!(reducer.text(), "");
    }

    /// Published length never shrinks under either strategy, given
    /// well-formed input (non-empty deltas; growing snapshots).
    #[test]
    fn published_length_is_monotonic() {
        let fragment_runs: &[&[&str]] = &[
            &["a"],
            &["a", "b", "c", "d"],
            &["one ", "two ", "three"],
            &["x", "", "y", "", "z"],
        ];

        for fragments in fragment_runs {
            let mut reducer = StreamReducer::new(Accumulation::Delta);
            let mut last_len = 0;
            for fragment in *fragments {
                if let Some(published) = reducer.apply(Some(fragment)) {
                    assert!(published.len() >= last_len);
                    last_len = published.len();
                }
            }
        }

        // Snapshot runs as a provider would emit them: each event carries
        // everything so far.
        let mut reducer = StreamReducer::new(Accumulation::Snapshot);
        let mut last_len = 0;
        for snapshot in ["H", "He", "Hello", "Hello there"] {
            let published = reducer.apply(Some(snapshot)).unwrap();
            assert!(published.len() >= last_len);
            last_len = published.len();
        }
    }

    /// The same logical stream produces the same final text regardless of
    /// which shape the provider emits it in, as long as the matching
    /// strategy is selected.
    #[test]
    fn matched_strategies_agree_on_final_text() {
        let deltas = ["Str", "eam", " red", "uction"];
        let mut snapshots = Vec::new();
        let mut acc = String::new();
        for d in deltas {
            acc.push_str(d);
            snapshots.push(acc.clone());
        }

        let mut delta_reducer = StreamReducer::new(Accumulation::Delta);
        for d in deltas {
            delta_reducer.apply(Some(d));
        }
        let mut snapshot_reducer = StreamReducer::new(Accumulation::Snapshot);
        for s in &snapshots {
            snapshot_reducer.apply(Some(s));
        }

        assert_eq!(delta_reducer.text(), snapshot_reducer.text());
        assert_eq!(delta_reducer.text(), "Stream reduction");
    }
}
