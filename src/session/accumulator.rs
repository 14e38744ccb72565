//! Accumulation of streamed reply fragments into one growing transcript

use crate::providers::DeltaMode;

/// Number of leading fragments subject to the newline filter
const NEWLINE_FILTER_WINDOW: usize = 2;

/// Running transcript for one in-flight query
///
/// Callers always see the full text so far, never a diff. Every accepted
/// update extends the previous text.
#[derive(Debug, Clone)]
pub struct StreamAccumulator {
    mode: DeltaMode,
    text: String,
    accepted: usize,
}

impl StreamAccumulator {
    /// Creates an empty accumulator for fragments of the given kind
    pub fn new(mode: DeltaMode) -> Self {
        Self {
            mode,
            text: String::new(),
            accepted: 0,
        }
    }

    /// Applies one fragment from the provider
    ///
    /// Empty fragments are ignored. In incremental mode, a fragment
    /// containing a newline is discarded while fewer than two fragments have
    /// been accepted; models tend to lead with formatting newlines.
    ///
    /// In cumulative mode a fragment that extends the transcript replaces
    /// it, an exact repeat is ignored, and any other fragment is appended.
    ///
    /// # Returns
    ///
    /// The full transcript when the fragment changed it, otherwise `None`
    ///
    /// # Examples
    ///
    /// ```
    /// use shellq::providers::DeltaMode;
    /// use shellq::session::StreamAccumulator;
    ///
    /// let mut acc = StreamAccumulator::new(DeltaMode::Incremental);
    /// assert_eq!(acc.push("\n\n"), None);
    /// assert_eq!(acc.push("```"), Some("```"));
    /// assert_eq!(acc.push("bash"), Some("```bash"));
    /// assert_eq!(acc.push("\nls"), Some("```bash\nls"));
    /// ```
    pub fn push(&mut self, fragment: &str) -> Option<&str> {
        if fragment.is_empty() {
            return None;
        }

        match self.mode {
            DeltaMode::Incremental => {
                if self.accepted < NEWLINE_FILTER_WINDOW && fragment.contains('\n') {
                    tracing::debug!(accepted = self.accepted, "Discarding leading newline fragment");
                    return None;
                }
                self.text.push_str(fragment);
            }
            DeltaMode::Cumulative => {
                if fragment.len() > self.text.len() && fragment.starts_with(&self.text) {
                    self.text.replace_range(.., fragment);
                } else if fragment == self.text {
                    return None;
                } else {
                    self.text.push_str(fragment);
                }
            }
        }

        self.accepted += 1;
        Some(&self.text)
    }

    /// Transcript so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of fragments accepted
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Consumes the accumulator, returning the final transcript
    pub fn into_text(self) -> String {
        self.text
    }
}
