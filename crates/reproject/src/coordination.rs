//! Process-group collectives the driver relies on.
//!
//! The reprojection math never talks to other processes; only the driver
//! does, through [`Coordinator`]. Payloads are opaque bytes, and the typed
//! helpers encode them with `serde_json`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoordinationError;

/// Result type for collective operations.
pub type CoordinationResult<T> = std::result::Result<T, CoordinationError>;

/// Collectives over a fixed group of `size()` ranks.
///
/// Every rank must call the same collectives in the same order. Once any
/// rank calls [`Coordinator::abort`], every pending and later collective on
/// every rank fails with [`CoordinationError::Aborted`].
pub trait Coordinator: Send {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Block until every rank has arrived.
    fn barrier(&self) -> CoordinationResult<()>;

    /// `root` supplies `payload`; every rank gets root's bytes back.
    fn broadcast(&self, root: usize, payload: Option<Vec<u8>>) -> CoordinationResult<Vec<u8>>;

    /// Every rank supplies `payload`; `root` gets them all in rank order,
    /// other ranks get `None`.
    fn gather(&self, root: usize, payload: Vec<u8>) -> CoordinationResult<Option<Vec<Vec<u8>>>>;

    /// Tear the group down so no rank waits forever on a failed peer.
    fn abort(&self, reason: &str);

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// Broadcast a serializable value from `root`.
pub fn broadcast_value<T, C>(coordinator: &C, root: usize, value: Option<&T>) -> CoordinationResult<T>
where
    T: Serialize + DeserializeOwned,
    C: Coordinator + ?Sized,
{
    let payload = match value {
        Some(value) if coordinator.rank() == root => Some(serde_json::to_vec(value)?),
        _ => None,
    };
    let bytes = coordinator.broadcast(root, payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Gather a serializable value from every rank at `root`.
pub fn gather_values<T, C>(coordinator: &C, root: usize, value: &T) -> CoordinationResult<Option<Vec<T>>>
where
    T: Serialize + DeserializeOwned,
    C: Coordinator + ?Sized,
{
    let gathered = coordinator.gather(root, serde_json::to_vec(value)?)?;
    gathered
        .map(|all| {
            all.iter()
                .map(|bytes| serde_json::from_slice(bytes).map_err(CoordinationError::from))
                .collect()
        })
        .transpose()
}

/// A group of one. Every collective returns immediately.
#[derive(Debug, Default)]
pub struct LocalCoordinator {
    aborted: std::sync::Mutex<Option<String>>,
}

impl LocalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, root: usize) -> CoordinationResult<()> {
        if let Some(reason) = self.aborted.lock().ok().and_then(|guard| guard.clone()) {
            return Err(CoordinationError::Aborted(reason));
        }
        if root != 0 {
            return Err(CoordinationError::InvalidRank { rank: root, size: 1 });
        }
        Ok(())
    }
}

impl Coordinator for LocalCoordinator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> CoordinationResult<()> {
        self.check(0)
    }

    fn broadcast(&self, root: usize, payload: Option<Vec<u8>>) -> CoordinationResult<Vec<u8>> {
        self.check(root)?;
        payload.ok_or_else(|| CoordinationError::Payload("root supplied no payload".to_string()))
    }

    fn gather(&self, root: usize, payload: Vec<u8>) -> CoordinationResult<Option<Vec<Vec<u8>>>> {
        self.check(root)?;
        Ok(Some(vec![payload]))
    }

    fn abort(&self, reason: &str) {
        if let Ok(mut guard) = self.aborted.lock() {
            guard.get_or_insert_with(|| reason.to_string());
        }
    }
}
