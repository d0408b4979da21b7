use std::str::FromStr;

use bsp::PeerId;

use crate::ConfigErr;

/// How the single leader of a job is chosen.
///
/// Every peer evaluates the same policy over the same enumeration, so the
/// election needs no messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeaderPolicy {
    /// The peer at position `N / 2` of the enumeration.
    #[default]
    MiddleIndex,
    /// The peer with the lexicographically smallest name.
    SmallestId,
    /// A peer named by the job configuration.
    Fixed(PeerId),
}

impl LeaderPolicy {
    /// Picks the leader among `peers`.
    ///
    /// # Arguments
    /// * `peers` - Every peer of the job, in enumeration order.
    ///
    /// # Returns
    /// The leader's name, or an error if a `Fixed` leader isn't part of the job.
    pub fn elect(&self, peers: &[PeerId]) -> Result<PeerId, ConfigErr> {
        let leader = match self {
            LeaderPolicy::MiddleIndex => peers.get(peers.len() / 2),
            LeaderPolicy::SmallestId => peers.iter().min(),
            LeaderPolicy::Fixed(id) => {
                return peers
                    .iter()
                    .find(|p| *p == id)
                    .cloned()
                    .ok_or_else(|| ConfigErr::UnknownLeader(id.to_string()));
            }
        };

        leader
            .cloned()
            .ok_or_else(|| ConfigErr::UnknownLeader("<empty job>".into()))
    }
}

impl FromStr for LeaderPolicy {
    type Err = ConfigErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "middle" | "middle_index" => Ok(LeaderPolicy::MiddleIndex),
            "smallest" | "smallest_id" => Ok(LeaderPolicy::SmallestId),
            _ => Err(ConfigErr::UnknownLeaderPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<PeerId> {
        names.iter().map(|n| PeerId::new(*n)).collect()
    }

    #[test]
    fn middle_index_is_floor_of_half() {
        let peers = ids(&["a", "b", "c", "d", "e"]);
        assert_eq!(LeaderPolicy::MiddleIndex.elect(&peers[..1]), Ok(PeerId::new("a")));
        assert_eq!(LeaderPolicy::MiddleIndex.elect(&peers[..2]), Ok(PeerId::new("b")));
        assert_eq!(LeaderPolicy::MiddleIndex.elect(&peers[..4]), Ok(PeerId::new("c")));
        assert_eq!(LeaderPolicy::MiddleIndex.elect(&peers), Ok(PeerId::new("c")));
    }

    #[test]
    fn smallest_id_ignores_enumeration_order() {
        let peers = ids(&["node-c", "node-a", "node-b"]);
        assert_eq!(LeaderPolicy::SmallestId.elect(&peers), Ok(PeerId::new("node-a")));
    }

    #[test]
    fn fixed_leader_must_be_a_peer() {
        let peers = ids(&["a", "b"]);
        let policy = LeaderPolicy::Fixed(PeerId::new("b"));
        assert_eq!(policy.elect(&peers), Ok(PeerId::new("b")));

        let policy = LeaderPolicy::Fixed(PeerId::new("z"));
        assert_eq!(policy.elect(&peers), Err(ConfigErr::UnknownLeader("z".into())));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("middle".parse::<LeaderPolicy>(), Ok(LeaderPolicy::MiddleIndex));
        assert_eq!("SMALLEST".parse::<LeaderPolicy>(), Ok(LeaderPolicy::SmallestId));
        assert!("random".parse::<LeaderPolicy>().is_err());
    }
}
