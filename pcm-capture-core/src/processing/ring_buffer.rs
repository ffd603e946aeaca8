/// Fixed-capacity circular buffer of 16-bit samples.
///
/// Not synchronized itself: wrap in `Arc<parking_lot::Mutex<RingBuffer>>`
/// to hand samples from a device thread to `AudioSource::read`.
///
/// Overflow behavior: drops oldest samples.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<i16>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
    dropped: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
            dropped: 0,
        }
    }

    /// Write samples into the ring buffer.
    ///
    /// If the buffer overflows, the oldest samples are dropped.
    /// If `samples` is larger than capacity, only the last `capacity` samples are kept.
    pub fn write(&mut self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }

        let samples = if samples.len() > self.capacity {
            self.dropped += (samples.len() - self.capacity) as u64;
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        let overflow = (self.available + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
            self.dropped += overflow as u64;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += samples.len();
    }

    /// Move up to `out.len()` samples into `out`, returning how many were copied.
    pub fn read_into(&mut self, out: &mut [i16]) -> usize {
        let to_read = out.len().min(self.available);
        for (i, slot) in out.iter_mut().take(to_read).enumerate() {
            *slot = self.buffer[(self.read_index + i) % self.capacity];
        }
        self.read_index = (self.read_index + to_read) % self.capacity;
        self.available -= to_read;
        to_read
    }

    /// Number of samples currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Samples discarded because the reader fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
        self.dropped = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buf: &mut RingBuffer, count: usize) -> Vec<i16> {
        let mut out = vec![0; count];
        let n = buf.read_into(&mut out);
        out.truncate(n);
        out
    }

    #[test]
    fn basic_write_read() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3]);

        assert_eq!(buf.count(), 3);
        assert_eq!(drain(&mut buf, 3), vec![1, 2, 3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn read_partial() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3, 4, 5]);

        assert_eq!(drain(&mut buf, 3), vec![1, 2, 3]);
        assert_eq!(buf.count(), 2);
        assert_eq!(drain(&mut buf, 10), vec![4, 5]);
        assert!(buf.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1, 2, 3, 4]);
        buf.write(&[5, 6]);

        assert_eq!(buf.count(), 4);
        assert_eq!(buf.dropped(), 2);
        assert_eq!(drain(&mut buf, 4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn write_larger_than_capacity() {
        let mut buf = RingBuffer::new(3);
        buf.write(&[1, 2, 3, 4, 5]);

        assert_eq!(buf.count(), 3);
        assert_eq!(buf.dropped(), 2);
        assert_eq!(drain(&mut buf, 3), vec![3, 4, 5]);
    }

    #[test]
    fn wraparound() {
        let mut buf = RingBuffer::new(4);

        buf.write(&[1, 2, 3]);
        drain(&mut buf, 2);
        buf.write(&[4, 5, 6]);

        assert_eq!(buf.count(), 4);
        assert_eq!(drain(&mut buf, 4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1, 2, 3]);
        buf.reset();

        assert!(buf.is_empty());
        assert!(drain(&mut buf, 10).is_empty());
    }

    #[test]
    fn empty_operations() {
        let mut buf = RingBuffer::new(10);
        assert!(drain(&mut buf, 5).is_empty());
        buf.write(&[]);
        assert!(buf.is_empty());
    }
}
