//! Native stack growth for deeply nested input.
//!
//! Parsing nested expressions, evaluating them and rendering nested values
//! all map directly onto host recursion. Wrapping each recursive step in
//! [`ensure_sufficient_stack`] lets the host stack grow on demand, so source
//! nesting is bounded by memory and user-function recursion by the
//! configured call-depth limit.

/// If less than this much stack remains, grow before recursing.
const RED_ZONE: usize = 100 * 1024;

/// Size of each freshly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_closure_result() {
        let result: Result<i64, &str> = ensure_sufficient_stack(|| Ok(7));
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn survives_deep_recursion() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }
        assert_eq!(depth(100_000), 100_000);
    }
}
