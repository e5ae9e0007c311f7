//! Plurality tally over sorted opinion hashes.

use obelisk_types::Hash;

/// Pick the winner from a sorted slice of opinion hashes: the value with the
/// longest run of equal elements. Ties break in favor of the first run of
/// maximum length, which after sorting is the lexically smallest value.
///
/// An empty slice yields [`Hash::ZERO`].
pub fn plurality_winner(sorted: &[Hash]) -> Hash {
    let mut winner = Hash::ZERO;
    let mut winner_len = 0usize;
    let mut run = Hash::ZERO;
    let mut run_len = 0usize;

    for &hash in sorted {
        if hash == run {
            run_len += 1;
        } else {
            if run_len > winner_len {
                winner = run;
                winner_len = run_len;
            }
            run = hash;
            run_len = 1;
        }
    }
    if run_len > winner_len {
        winner = run;
    }

    winner
}
