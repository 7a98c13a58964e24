/// Counters for a single stream cursor
///
/// A cursor has exactly one reader, so these are plain integers rather than
/// atomics. Read them through `ChatStream::stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Bytes pulled from the transport
    pub bytes_read: u64,
    /// Delimiter-terminated lines handed to the decoder
    pub lines: u64,
    /// Events returned to the caller
    pub events: u64,
    /// `ping` lines skipped
    pub keep_alives: u64,
    /// Blank, comment and other non-data lines skipped
    pub noise_lines: u64,
    /// Events with a kind tag this crate does not recognize
    pub unknown_events: u64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_line(&mut self) {
        self.lines += 1;
    }

    pub(crate) fn record_event(&mut self, recognized: bool) {
        self.events += 1;
        if !recognized {
            self.unknown_events += 1;
        }
    }

    pub(crate) fn record_keep_alive(&mut self) {
        self.keep_alives += 1;
    }

    pub(crate) fn record_noise(&mut self) {
        self.noise_lines += 1;
    }

    /// Share of lines that surfaced as events, as a percentage
    pub fn signal_ratio(&self) -> f64 {
        if self.lines > 0 {
            (self.events as f64 / self.lines as f64) * 100.0
        } else {
            0.0
        }
    }
}
