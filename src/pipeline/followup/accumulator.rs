/// Append-only buffer for a streamed answer.
///
/// Every accepted fragment strictly grows the buffer, so each published
/// snapshot is a strict prefix of the next one.
#[derive(Debug, Default, Clone)]
pub struct StreamAccumulator {
    buffer: String,
    fragments: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Returns `false` (and changes nothing) for an empty one.
    pub fn push(&mut self, fragment: &str) -> bool {
        if fragment.is_empty() {
            return false;
        }
        self.buffer.push_str(fragment);
        self.fragments += 1;
        true
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of non-empty fragments applied.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_apply_in_arrival_order() {
        let mut acc = StreamAccumulator::new();
        for fragment in ["Your ", "iron ", "is ", "low."] {
            acc.push(fragment);
        }
        assert_eq!(acc.as_str(), "Your iron is low.");
        assert_eq!(acc.fragment_count(), 4);
    }

    #[test]
    fn each_snapshot_is_a_strict_prefix_of_the_next() {
        let mut acc = StreamAccumulator::new();
        let mut previous = acc.as_str().to_string();
        for fragment in ["a", "", "bc", "", "", "d"] {
            if acc.push(fragment) {
                assert!(acc.as_str().starts_with(&previous));
                assert!(acc.as_str().len() > previous.len());
                previous = acc.as_str().to_string();
            }
        }
        assert_eq!(acc.into_string(), "abcd");
    }

    #[test]
    fn empty_fragment_is_rejected() {
        let mut acc = StreamAccumulator::new();
        assert!(!acc.push(""));
        assert!(acc.is_empty());
        assert_eq!(acc.fragment_count(), 0);
    }
}
