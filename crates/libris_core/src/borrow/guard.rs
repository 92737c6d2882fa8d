//! RAII guard for the single in-flight borrow of a client.

use core::sync::atomic::{AtomicBool, Ordering};

/// Holds the in-flight flag while alive and clears it on drop, so the flag is released even if
/// the borrow future is cancelled or panics.
pub(crate) struct InFlightGuard<'flag> {
    flag: &'flag AtomicBool,
}

impl<'flag> InFlightGuard<'flag> {
    /// Set the flag, or return `None` if it is already set.
    pub(crate) fn acquire(flag: &'flag AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_releases_on_drop() {
        let flag = AtomicBool::new(false);

        let first = InFlightGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(flag.load(Ordering::Acquire));
        assert!(InFlightGuard::acquire(&flag).is_none());

        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(InFlightGuard::acquire(&flag).is_some());
    }
}
