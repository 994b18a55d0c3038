//! Vote recording and the callback payload format for vote buttons.

use chrono::Utc;
use tracing::info;

use crate::db::{Database, StoreError};

/// Prefix shared by every vote callback payload.
const VOTE_CALLBACK_PREFIX: &str = "vote";

/// The two possible vote classifications. Anything else arriving on the
/// wire is a protocol error and is dropped by the callback parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Like,
    Dislike,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Like => "like",
            Polarity::Dislike => "dislike",
        }
    }

    pub fn is_like(&self) -> bool {
        matches!(self, Polarity::Like)
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Polarity::Like),
            "dislike" => Some(Polarity::Dislike),
            _ => None,
        }
    }
}

/// Result of an attempt to record a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was stored and the matching counter incremented
    Recorded,
    /// The voter had already voted on this dish; nothing was changed
    AlreadyVoted,
}

/// Record a vote, enforcing at most one vote per (voter, dish) pair.
///
/// The guard is the conditional insert: the vote row is claimed first and the
/// counter is incremented only when this call actually inserted it, so a
/// concurrent duplicate loses the insert and changes nothing.
pub async fn record_vote(
    db: &Database,
    voter_id: &str,
    dish_id: i64,
    polarity: Polarity,
) -> Result<VoteOutcome, StoreError> {
    let inserted = db
        .try_insert_vote(voter_id, dish_id, polarity, Utc::now())
        .await?;

    if !inserted {
        info!(voter_id, dish_id, "Duplicate vote rejected");
        return Ok(VoteOutcome::AlreadyVoted);
    }

    db.increment_vote(dish_id, polarity).await?;

    info!(
        voter_id,
        dish_id,
        polarity = polarity.as_str(),
        "Vote recorded"
    );
    Ok(VoteOutcome::Recorded)
}

/// Build the callback payload carried by a vote button.
pub fn vote_callback_data(dish_id: i64, polarity: Polarity) -> String {
    format!("{}:{}:{}", VOTE_CALLBACK_PREFIX, dish_id, polarity.as_str())
}

/// Parse a `vote:<dish_id>:<polarity>` callback payload.
pub fn parse_vote_callback(data: &str) -> Option<(i64, Polarity)> {
    let mut parts = data.split(':');

    if parts.next() != Some(VOTE_CALLBACK_PREFIX) {
        return None;
    }
    let dish_id: i64 = parts.next()?.parse().ok()?;
    let polarity = Polarity::from_str(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    Some((dish_id, polarity))
}
