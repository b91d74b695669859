use heapless::Vec;
use static_assertions::const_assert;

const MAX_PENDING_FRAMES: usize = 8;

const_assert!(MAX_PENDING_FRAMES > 0);

/// Ticket for one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// "Run once before the next display refresh", with cancellation.
///
/// A host drains due handles once per refresh through [`FrameScheduler::poll_due`].
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    /// Withdraws a request. Returns `false` if it was already fired or cancelled.
    fn cancel_frame(&mut self, handle: FrameHandle) -> bool;
    /// Takes the oldest outstanding request, if any.
    fn poll_due(&mut self) -> Option<FrameHandle>;
}

#[derive(Debug, Clone, Default)]
pub struct FrameQueueStats {
    pub total_requested: u64,
    pub total_fired: u64,
    pub total_cancelled: u64,
    pub total_dropped: u64,
}

/// Bounded FIFO of outstanding frame requests.
#[derive(Debug)]
pub struct FrameQueue {
    pending: Vec<FrameHandle, MAX_PENDING_FRAMES>,
    next_handle: u64,
    stats: FrameQueueStats,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_handle: 1,
            stats: FrameQueueStats::default(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle)
    }

    pub fn stats(&self) -> &FrameQueueStats {
        &self.stats
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        // Oldest request is dropped when the queue is saturated.
        if self.pending.is_full() {
            self.pending.remove(0);
            self.stats.total_dropped += 1;
        }
        let pushed = self.pending.push(handle);
        debug_assert!(pushed.is_ok(), "queue has room after eviction");

        self.stats.total_requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        match self.pending.iter().position(|pending| *pending == handle) {
            Some(index) => {
                self.pending.remove(index);
                self.stats.total_cancelled += 1;
                true
            }
            None => false,
        }
    }

    fn poll_due(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            return None;
        }

        self.stats.total_fired += 1;
        Some(self.pending.remove(0))
    }
}
