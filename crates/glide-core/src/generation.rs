//! Process-wide generation numbers for obstacle data.
//!
//! Each new or mutated obstacle collection draws a fresh number, so two
//! collections never share a revision unless one is a clone of the other.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next() -> u64 {
    NEXT.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_unique_and_nonzero() {
        let a = next();
        let b = next();
        assert!(a > 0);
        assert_ne!(a, b);
    }
}
