//! Round-robin pair enumeration.

/// All `C(n, 2)` oriented pairs `(i, j)` with `i < j`, in roster order.
///
/// Deterministic for a fixed roster ordering, no self-pairs, each pair
/// exactly once; empty when `n < 2`. The orientation matters downstream:
/// match scores are asymmetric and the checkpoint ledger is keyed by the
/// exact `(player1, player2)` order.
pub fn round_robin_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}
