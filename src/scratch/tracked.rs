//! Scratch buffers with write-before-read tracking.

/// A reusable scratch buffer that remembers whether it holds live data.
///
/// [`write`](Self::write) hands out the buffer for filling and marks it live;
/// [`read`](Self::read) and [`modify`](Self::modify) expect a live buffer and
/// fail a debug assertion otherwise. Producers [`retire`](Self::retire) a
/// buffer once its contents have been consumed, so a later read of stale data
/// is caught in debug builds.
#[derive(Clone, Debug)]
pub struct Tracked<T> {
    name: &'static str,
    value: T,
    live: bool,
    writes: u64,
}

impl<T> Tracked<T> {
    /// Wrap `value`; the buffer starts retired.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            value,
            live: false,
            writes: 0,
        }
    }

    /// Buffer for (re)filling; marks it live.
    #[inline]
    pub fn write(&mut self) -> &mut T {
        self.live = true;
        self.writes += 1;
        &mut self.value
    }

    /// Live contents.
    #[inline]
    pub fn read(&self) -> &T {
        debug_assert!(self.live, "read of retired scratch buffer '{}'", self.name);
        &self.value
    }

    /// Live contents for in-place update.
    #[inline]
    pub fn modify(&mut self) -> &mut T {
        debug_assert!(self.live, "update of retired scratch buffer '{}'", self.name);
        &mut self.value
    }

    /// Mark the contents as consumed.
    #[inline]
    pub fn retire(&mut self) {
        self.live = false;
    }

    /// Whether the buffer holds data written since the last retire.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Number of times the buffer has been handed out for writing.
    #[inline]
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Buffer name used in diagnostics.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The wrapped storage, regardless of liveness.
    #[inline]
    pub fn storage(&self) -> &T {
        &self.value
    }
}
