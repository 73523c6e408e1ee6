//! Stack safety for the recursive phases (parser, resolver, evaluator).
//!
//! Deeply nested source would otherwise overflow the native stack before the
//! interpreter's own call-depth limit gets a chance to report it. Wrapping each
//! recursive entry point in [`ensure_sufficient_stack`] grows the stack on
//! demand instead.

/// If less than this remains, grow the stack.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first allocating a fresh stack segment if the current one is
/// nearly exhausted.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_recursion() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }

        assert_eq!(depth(100_000), 100_000);
    }
}
