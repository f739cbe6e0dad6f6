use std::collections::VecDeque;

use tokio::sync::Mutex;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;

/// Defensive cap mentioned in `SPEC_FULL.md` §9: ICE candidate counts are
/// bounded by SDP negotiation, so an unbounded queue is safe in practice, but
/// a cap guards against a misbehaving remote.
const MAX_PENDING_CANDIDATES: usize = 256;

/// Per-endpoint queue of remote ICE candidates that arrived before the
/// remote session description was installed. Guarded by its own lock,
/// separate from the connector's `{connected, callbacks}` mutex (`SPEC_FULL.md`
/// §5: "never acquire both at once").
#[derive(Default)]
pub struct DeferredIceQueue {
    candidates: Mutex<VecDeque<RTCIceCandidateInit>>,
}

impl DeferredIceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate. Returns `false` (and drops it) if the defensive
    /// cap has been reached.
    pub async fn push(&self, candidate: RTCIceCandidateInit) -> bool {
        let mut guard = self.candidates.lock().await;
        if guard.len() >= MAX_PENDING_CANDIDATES {
            return false;
        }
        guard.push_back(candidate);
        true
    }

    /// Drains the queue in arrival order, discarding it.
    pub async fn drain(&self) -> Vec<RTCIceCandidateInit> {
        self.candidates.lock().await.drain(..).collect()
    }

    pub async fn clear(&self) {
        self.candidates.lock().await.clear();
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.candidates.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(sdp_mid: &str) -> RTCIceCandidateInit {
        RTCIceCandidateInit { candidate: sdp_mid.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn drains_in_arrival_order() {
        let q = DeferredIceQueue::new();
        assert!(q.push(candidate("a")).await);
        assert!(q.push(candidate("b")).await);
        assert!(q.push(candidate("c")).await);

        let drained = q.drain().await;
        let order: Vec<&str> = drained.iter().map(|c| c.candidate.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(q.len().await, 0);
    }

    #[tokio::test]
    async fn rejects_past_the_defensive_cap() {
        let q = DeferredIceQueue::new();
        for i in 0..MAX_PENDING_CANDIDATES {
            assert!(q.push(candidate(&i.to_string())).await);
        }
        assert!(!q.push(candidate("overflow")).await);
        assert_eq!(q.len().await, MAX_PENDING_CANDIDATES);
    }

    #[tokio::test]
    async fn clear_discards_everything() {
        let q = DeferredIceQueue::new();
        q.push(candidate("a")).await;
        q.clear().await;
        assert_eq!(q.len().await, 0);
    }
}
