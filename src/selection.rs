//! Next-dish selection for the voting flow.
//!
//! The engine oversamples the least-voted approved dishes and filters out
//! everything the voter has already seen, rather than asking the store for a
//! combined "least voted and not voted by this user" query. The low-vote bias
//! is soft: once a voter has worked through more than a pool's worth of
//! low-vote dishes, slightly busier dishes surface on later calls.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::db::{Database, Dish, StoreError};

/// How many least-voted candidates to fetch per pick. Larger than a single
/// pick so the already-voted filter still leaves something to choose from.
pub const CANDIDATE_POOL_SIZE: i64 = 50;

/// Pick the next dish to show to a voter.
///
/// Returns `Ok(None)` when the voter has voted on every approved dish in the
/// candidate pool, or when no approved dishes exist at all.
pub async fn next_dish(db: &Database, voter_id: &str) -> Result<Option<Dish>, StoreError> {
    let voted = db.list_voted_dish_ids(voter_id).await?;
    let candidates = db.list_least_voted(CANDIDATE_POOL_SIZE).await?;

    debug!(
        voter_id,
        candidates = candidates.len(),
        already_voted = voted.len(),
        "Selecting next dish"
    );

    let mut rng = rand::thread_rng();
    Ok(pick_unvoted(candidates, &voted, &mut rng))
}

/// Choose uniformly at random among the candidates the voter has not voted on.
pub fn pick_unvoted<R: Rng + ?Sized>(
    candidates: Vec<Dish>,
    voted: &HashSet<i64>,
    rng: &mut R,
) -> Option<Dish> {
    let remaining: Vec<Dish> = candidates
        .into_iter()
        .filter(|dish| !voted.contains(&dish.id))
        .collect();

    remaining.choose(rng).cloned()
}
