/// Detects a readiness marker in a byte stream delivered in arbitrary chunks.
///
/// The marker may straddle chunk boundaries, so the last `marker.len() - 1`
/// bytes of each chunk are carried over to the next one. Once found, the
/// scanner latches and stops buffering.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: Vec<u8>,
    tail: Vec<u8>,
    seen: bool,
}

impl MarkerScanner {
    pub fn new(marker: impl AsRef<[u8]>) -> Self {
        Self {
            marker: marker.as_ref().to_vec(),
            tail: Vec::new(),
            seen: false,
        }
    }

    /// Feed the next chunk.
    ///
    /// Returns `true` only for the chunk in which the marker first
    /// completes. An empty marker matches on the first call.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if self.seen {
            return false;
        }
        if self.marker.is_empty() {
            self.seen = true;
            return true;
        }

        self.tail.extend_from_slice(chunk);
        if self
            .tail
            .windows(self.marker.len())
            .any(|window| window == self.marker.as_slice())
        {
            self.seen = true;
            self.tail = Vec::new();
            return true;
        }

        let keep = self.marker.len() - 1;
        if self.tail.len() > keep {
            self.tail.drain(..self.tail.len() - keep);
        }
        false
    }

    pub fn seen(&self) -> bool {
        self.seen
    }
}
