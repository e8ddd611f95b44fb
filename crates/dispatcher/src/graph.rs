//! Follow graph: who receives whose status updates.

use std::collections::{HashMap, HashSet};

use contracts::UserId;

/// Directed follow relation. `followers[u]` is the set of users that
/// follow `u`, i.e. the recipients of `u`'s status updates.
///
/// Membership is independent of the client registry: edges exist for
/// users that never connect.
#[derive(Debug, Default)]
pub struct FollowGraph {
    followers: HashMap<UserId, HashSet<UserId>>,
}

impl FollowGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `follower` following `followee`.
    ///
    /// Idempotent; returns `true` when the edge is new.
    pub fn follow(&mut self, follower: UserId, followee: UserId) -> bool {
        self.followers.entry(followee).or_default().insert(follower)
    }

    /// Remove the `follower -> followee` edge.
    ///
    /// Removing an absent edge is a no-op; returns `true` when an edge
    /// was actually removed.
    pub fn unfollow(&mut self, follower: UserId, followee: UserId) -> bool {
        match self.followers.get_mut(&followee) {
            Some(set) => set.remove(&follower),
            None => false,
        }
    }

    /// Snapshot of the users currently following `user`.
    pub fn followers_of(&self, user: UserId) -> Vec<UserId> {
        self.followers
            .get(&user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of users currently following `user`.
    pub fn follower_count(&self, user: UserId) -> usize {
        self.followers.get(&user).map_or(0, HashSet::len)
    }
}
