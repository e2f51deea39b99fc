//! In-process ranks on OS threads.
//!
//! Every collective is one rendezvous round: each rank deposits its
//! contribution, the last to arrive publishes the round's contributions
//! and bumps the generation, and everyone wakes up with the same view.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use reproject::{CoordinationError, CoordinationResult, Coordinator};
use tracing::{error, warn};

#[derive(Debug, Default)]
struct State {
    generation: u64,
    arrived: usize,
    slots: Vec<Option<Vec<u8>>>,
    /// Contributions of the last completed round.
    published: Arc<Vec<Option<Vec<u8>>>>,
    aborted: Option<String>,
}

#[derive(Debug)]
struct Shared {
    size: usize,
    state: Mutex<State>,
    wake: Condvar,
}

/// A group of ranks sharing one rendezvous.
#[derive(Debug, Clone)]
pub struct ThreadGroup {
    shared: Arc<Shared>,
}

impl ThreadGroup {
    pub fn new(size: usize) -> Self {
        let state = State {
            slots: vec![None; size],
            ..Default::default()
        };
        Self {
            shared: Arc::new(Shared {
                size,
                state: Mutex::new(state),
                wake: Condvar::new(),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.shared.size
    }

    /// One coordinator per rank, in rank order.
    pub fn coordinators(&self) -> Vec<ThreadCoordinator> {
        (0..self.shared.size)
            .map(|rank| ThreadCoordinator {
                rank,
                shared: Arc::clone(&self.shared),
            })
            .collect()
    }

    /// Run `work` on `size` threads, one per rank, and collect the results
    /// in rank order. A rank that panics aborts the group first.
    pub fn run<T, F>(size: usize, work: F) -> Vec<thread::Result<T>>
    where
        T: Send,
        F: Fn(&ThreadCoordinator) -> T + Sync,
    {
        let group = Self::new(size);
        let work = &work;
        thread::scope(|scope| {
            let handles: Vec<_> = group
                .coordinators()
                .into_iter()
                .map(|coordinator| {
                    thread::Builder::new()
                        .name(format!("rank-{}", coordinator.rank))
                        .spawn_scoped(scope, move || {
                            let _guard = AbortOnPanic(&coordinator);
                            work(&coordinator)
                        })
                        .inspect_err(|err| group.abort_all(&format!("could not spawn rank: {err}")))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle {
                    Ok(handle) => handle.join(),
                    Err(err) => Err(Box::new(err) as Box<dyn std::any::Any + Send>),
                })
                .collect()
        })
    }

    fn abort_all(&self, reason: &str) {
        abort(&self.shared, reason);
    }
}

/// One rank's handle on a [`ThreadGroup`].
#[derive(Debug)]
pub struct ThreadCoordinator {
    rank: usize,
    shared: Arc<Shared>,
}

impl ThreadCoordinator {
    fn lock(&self) -> CoordinationResult<MutexGuard<'_, State>> {
        self.shared
            .state
            .lock()
            .map_err(|_| CoordinationError::Aborted("coordinator lock poisoned".to_string()))
    }

    fn check_root(&self, root: usize) -> CoordinationResult<()> {
        if root >= self.shared.size {
            return Err(CoordinationError::InvalidRank {
                rank: root,
                size: self.shared.size,
            });
        }
        Ok(())
    }

    /// Deposit `contribution` and wait until every rank has deposited.
    fn exchange(&self, contribution: Option<Vec<u8>>) -> CoordinationResult<Arc<Vec<Option<Vec<u8>>>>> {
        let mut state = self.lock()?;
        if let Some(reason) = &state.aborted {
            return Err(CoordinationError::Aborted(reason.clone()));
        }

        state.slots[self.rank] = contribution;
        state.arrived += 1;
        let generation = state.generation;

        if state.arrived == self.shared.size {
            let slots = std::mem::replace(&mut state.slots, vec![None; self.shared.size]);
            state.published = Arc::new(slots);
            state.arrived = 0;
            state.generation += 1;
            self.shared.wake.notify_all();
            return Ok(Arc::clone(&state.published));
        }

        while state.generation == generation && state.aborted.is_none() {
            state = self
                .shared
                .wake
                .wait(state)
                .map_err(|_| CoordinationError::Aborted("coordinator lock poisoned".to_string()))?;
        }
        if state.generation == generation {
            let reason = state.aborted.clone().unwrap_or_default();
            return Err(CoordinationError::Aborted(reason));
        }
        Ok(Arc::clone(&state.published))
    }
}

impl Coordinator for ThreadCoordinator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) -> CoordinationResult<()> {
        self.exchange(None).map(|_| ())
    }

    fn broadcast(&self, root: usize, payload: Option<Vec<u8>>) -> CoordinationResult<Vec<u8>> {
        self.check_root(root)?;
        let contribution = if self.rank == root { payload } else { None };
        let round = self.exchange(contribution)?;
        round[root]
            .clone()
            .ok_or_else(|| CoordinationError::Payload(format!("rank {root} broadcast nothing")))
    }

    fn gather(&self, root: usize, payload: Vec<u8>) -> CoordinationResult<Option<Vec<Vec<u8>>>> {
        self.check_root(root)?;
        let round = self.exchange(Some(payload))?;
        if self.rank != root {
            return Ok(None);
        }
        round
            .iter()
            .enumerate()
            .map(|(rank, slot)| {
                slot.clone()
                    .ok_or_else(|| CoordinationError::Payload(format!("rank {rank} sent nothing")))
            })
            .collect::<CoordinationResult<Vec<_>>>()
            .map(Some)
    }

    fn abort(&self, reason: &str) {
        warn!(rank = self.rank, reason, "Aborting process group");
        abort(&self.shared, reason);
    }
}

fn abort(shared: &Shared, reason: &str) {
    let mut state = match shared.state.lock() {
        Ok(state) => state,
        Err(poisoned) => poisoned.into_inner(),
    };
    state.aborted.get_or_insert_with(|| reason.to_string());
    shared.wake.notify_all();
}

struct AbortOnPanic<'a>(&'a ThreadCoordinator);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(rank = self.0.rank, "Rank panicked");
            abort(&self.0.shared, &format!("rank {} panicked", self.0.rank));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reproject::{broadcast_value, gather_values};

    #[test]
    fn test_broadcast_and_gather() {
        let results = ThreadGroup::run(4, |c| {
            let value = (c.rank() == 2).then_some(99u32);
            let received: u32 = broadcast_value(c, 2, value.as_ref()).unwrap();
            c.barrier().unwrap();
            let gathered = gather_values(c, 0, &(c.rank() * 10)).unwrap();
            (received, gathered)
        });

        for (rank, result) in results.into_iter().enumerate() {
            let (received, gathered) = result.unwrap();
            assert_eq!(received, 99);
            if rank == 0 {
                assert_eq!(gathered, Some(vec![0, 10, 20, 30]));
            } else {
                assert_eq!(gathered, None);
            }
        }
    }

    #[test]
    fn test_many_rounds_stay_in_step() {
        let results = ThreadGroup::run(3, |c| {
            (0..200u32)
                .map(|round| {
                    let sum: u32 = gather_values(c, 1, &round)
                        .unwrap()
                        .map(|all| all.iter().sum())
                        .unwrap_or(0);
                    broadcast_value(c, 1, Some(&sum)).unwrap()
                })
                .collect::<Vec<u32>>()
        });
        let expected: Vec<u32> = (0..200).map(|round| round * 3).collect();
        for result in results {
            assert_eq!(result.unwrap(), expected);
        }
    }

    #[test]
    fn test_abort_releases_waiters() {
        let results = ThreadGroup::run(3, |c| {
            if c.rank() == 1 {
                c.abort("input unreadable");
                return Err(CoordinationError::Aborted("self".to_string()));
            }
            c.barrier()
        });
        for (rank, result) in results.into_iter().enumerate() {
            if rank != 1 {
                assert_eq!(
                    result.unwrap(),
                    Err(CoordinationError::Aborted("input unreadable".to_string()))
                );
            }
        }
    }

    #[test]
    fn test_panicking_rank_aborts_group() {
        let results = ThreadGroup::run(2, |c| {
            if c.rank() == 0 {
                panic!("boom");
            }
            c.barrier()
        });
        assert!(results[0].is_err());
        assert!(matches!(
            results[1].as_ref().unwrap(),
            Err(CoordinationError::Aborted(_))
        ));
    }

    #[test]
    fn test_invalid_root() {
        let group = ThreadGroup::new(2);
        let coordinators = group.coordinators();
        assert!(matches!(
            coordinators[0].broadcast(5, None),
            Err(CoordinationError::InvalidRank { rank: 5, size: 2 })
        ));
    }
}
