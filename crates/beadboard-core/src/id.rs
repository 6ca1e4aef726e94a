//! Short issue identifiers for the local store.
//!
//! Ids look like `bd-k1l2`: the `bd-` prefix followed by four lowercase
//! base-36 characters, the shape `bd` itself prints. With 36^4 = 1,679,616
//! possible values, the birthday bound puts a 50% chance of some collision
//! at roughly 1,500 issues. The generator does not check for collisions;
//! [`LocalTracker`](crate::tracker::LocalTracker) retries against the
//! current snapshot instead.

use rand::Rng;

/// Prefix on every generated id.
pub const ISSUE_ID_PREFIX: &str = "bd-";

/// Number of random characters after the prefix.
pub const ISSUE_ID_HASH_LEN: usize = 4;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Total number of distinct ids the generator can produce.
#[allow(clippy::cast_possible_truncation)]
pub const ISSUE_ID_SPACE: u64 = 36_u64.pow(ISSUE_ID_HASH_LEN as u32);

/// A new id from the thread-local RNG.
#[must_use]
pub fn generate_issue_id() -> String {
    generate_issue_id_with(&mut rand::thread_rng())
}

/// A new id drawn from `rng`. Deterministic for a seeded RNG.
pub fn generate_issue_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(ISSUE_ID_PREFIX.len() + ISSUE_ID_HASH_LEN);
    id.push_str(ISSUE_ID_PREFIX);
    for _ in 0..ISSUE_ID_HASH_LEN {
        id.push(char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]));
    }
    id
}

/// Returns `true` if `id` has the generated shape.
///
/// Ids arriving from `bd` or hand-edited snapshots may not; they are still
/// valid issue ids.
#[must_use]
pub fn is_generated_shape(id: &str) -> bool {
    id.strip_prefix(ISSUE_ID_PREFIX).is_some_and(|hash| {
        hash.len() == ISSUE_ID_HASH_LEN
            && hash
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
    })
}
