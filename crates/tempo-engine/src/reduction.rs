//! Cross-element reduction of stability quantities.
//!
//! Choosers that need global data wait for every element to contribute
//! its local minimum grid spacing and largest characteristic speed. The
//! reduced values are the global minimum and the global maximum.
//!
//! [`AllReduce::new`] spawns one coordinator thread and hands out one
//! [`ReductionHandle`] per element. Each [`contribute`](ReductionHandle::contribute)
//! blocks until the round is complete:
//!
//! ```text
//!   element 0 ──(index, local)──┐
//!   element 1 ──(index, local)──┼──> coordinator ──(global)──> every element
//!   element N ──(index, local)──┘    [bounded(N)]               [bounded(1) each]
//! ```
//!
//! Dropping a handle tells the coordinator to stop. Every element still
//! waiting, and every later contribution, then fails with
//! [`ReductionError::Disconnected`].

use std::error::Error;
use std::fmt;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use tempo_chooser::StepContext;
use tempo_core::StepQuantity;
use tracing::trace;

// ── Values ─────────────────────────────────────────────────────────

/// One element's input to the reduction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalContribution {
    /// Smallest grid spacing in the element.
    pub minimum_grid_spacing: f64,
    /// Largest characteristic speed in the element.
    pub largest_characteristic_speed: f64,
}

impl LocalContribution {
    /// The neutral contribution: infinite spacing, zero speed.
    pub fn identity() -> Self {
        Self {
            minimum_grid_spacing: f64::INFINITY,
            largest_characteristic_speed: 0.0,
        }
    }

    /// Combine two contributions.
    ///
    /// NaN wins in both slots so a broken element is never hidden.
    pub fn combine(self, other: Self) -> Self {
        Self {
            minimum_grid_spacing: nan_aware(
                self.minimum_grid_spacing,
                other.minimum_grid_spacing,
                f64::min,
            ),
            largest_characteristic_speed: nan_aware(
                self.largest_characteristic_speed,
                other.largest_characteristic_speed,
                f64::max,
            ),
        }
    }
}

fn nan_aware(a: f64, b: f64, pick: fn(f64, f64) -> f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        pick(a, b)
    }
}

/// Reduced quantities, identical on every element for one round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalQuantities {
    /// Minimum grid spacing over all elements.
    pub minimum_grid_spacing: f64,
    /// Largest characteristic speed over all elements.
    pub largest_characteristic_speed: f64,
    /// Number of elements that contributed.
    pub contributors: usize,
}

impl GlobalQuantities {
    /// Reduce contributions without any communication.
    pub fn reduce(contributions: impl IntoIterator<Item = LocalContribution>) -> Self {
        let mut acc = LocalContribution::identity();
        let mut contributors = 0;
        for c in contributions {
            acc = acc.combine(c);
            contributors += 1;
        }
        Self {
            minimum_grid_spacing: acc.minimum_grid_spacing,
            largest_characteristic_speed: acc.largest_characteristic_speed,
            contributors,
        }
    }

    /// Store the reduced values in `ctx` under their global tags.
    pub fn apply(&self, ctx: &mut StepContext) {
        ctx.set(
            StepQuantity::GlobalMinimumGridSpacing,
            self.minimum_grid_spacing,
        );
        ctx.set(
            StepQuantity::GlobalLargestCharacteristicSpeed,
            self.largest_characteristic_speed,
        );
    }
}

// ── ReductionError ─────────────────────────────────────────────────

/// Errors from the cross-element reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReductionError {
    /// [`AllReduce::new`] was asked for zero participants.
    NoParticipants,
    /// The coordinator thread could not be spawned.
    SpawnFailed {
        /// The OS error message.
        reason: String,
    },
    /// A peer handle was dropped, or the coordinator stopped.
    Disconnected,
}

impl fmt::Display for ReductionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoParticipants => write!(f, "a reduction needs at least one participant"),
            Self::SpawnFailed { reason } => {
                write!(f, "failed to spawn reduction coordinator: {reason}")
            }
            Self::Disconnected => write!(f, "a reduction peer disconnected"),
        }
    }
}

impl Error for ReductionError {}

// ── AllReduce ──────────────────────────────────────────────────────

enum Message {
    Contribute(usize, LocalContribution),
    Leave(usize),
}

/// Factory for a set of connected [`ReductionHandle`]s.
pub struct AllReduce;

impl AllReduce {
    /// Spawn a coordinator for `participants` elements and return their
    /// handles, indexed `0..participants`.
    pub fn new(participants: usize) -> Result<Vec<ReductionHandle>, ReductionError> {
        if participants == 0 {
            return Err(ReductionError::NoParticipants);
        }
        let (tx, rx) = crossbeam_channel::bounded(participants);
        let mut replies = Vec::with_capacity(participants);
        let mut handles = Vec::with_capacity(participants);
        for index in 0..participants {
            let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
            replies.push(reply_tx);
            handles.push(ReductionHandle {
                index,
                participants,
                tx: tx.clone(),
                rx: reply_rx,
            });
        }
        drop(tx);

        thread::Builder::new()
            .name("tempo-allreduce".into())
            .spawn(move || coordinator_loop(rx, replies))
            .map_err(|e| ReductionError::SpawnFailed {
                reason: e.to_string(),
            })?;
        Ok(handles)
    }
}

fn coordinator_loop(rx: Receiver<Message>, replies: Vec<Sender<GlobalQuantities>>) {
    let participants = replies.len();
    let mut round: Vec<Option<LocalContribution>> = vec![None; participants];
    let mut received = 0;
    let mut rounds = 0u64;

    while let Ok(message) = rx.recv() {
        match message {
            Message::Contribute(index, local) => {
                if round[index].replace(local).is_none() {
                    received += 1;
                }
                if received < participants {
                    continue;
                }
                let global = GlobalQuantities::reduce(round.iter_mut().filter_map(Option::take));
                received = 0;
                rounds += 1;
                trace!(
                    round = rounds,
                    spacing = global.minimum_grid_spacing,
                    speed = global.largest_characteristic_speed,
                    "reduction round complete"
                );
                for reply in &replies {
                    if reply.send(global).is_err() {
                        return;
                    }
                }
            }
            Message::Leave(index) => {
                trace!(index, "reduction participant left");
                return;
            }
        }
    }
}

/// One element's end of an [`AllReduce`].
pub struct ReductionHandle {
    index: usize,
    participants: usize,
    tx: Sender<Message>,
    rx: Receiver<GlobalQuantities>,
}

impl ReductionHandle {
    /// This element's index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of elements in the reduction.
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Contribute to the current round and wait for its result.
    pub fn contribute(&self, local: LocalContribution) -> Result<GlobalQuantities, ReductionError> {
        self.tx
            .send(Message::Contribute(self.index, local))
            .map_err(|_| ReductionError::Disconnected)?;
        self.rx.recv().map_err(|_| ReductionError::Disconnected)
    }
}

impl Drop for ReductionHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(Message::Leave(self.index));
    }
}

impl fmt::Debug for ReductionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReductionHandle")
            .field("index", &self.index)
            .field("participants", &self.participants)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(h: f64, v: f64) -> LocalContribution {
        LocalContribution {
            minimum_grid_spacing: h,
            largest_characteristic_speed: v,
        }
    }

    #[test]
    fn combine_takes_min_spacing_and_max_speed() {
        let c = local(0.1, 2.0).combine(local(0.05, 1.0));
        assert_eq!(c, local(0.05, 2.0));
        assert_eq!(local(0.3, 4.0).combine(LocalContribution::identity()), local(0.3, 4.0));
    }

    #[test]
    fn nan_is_never_hidden() {
        let c = local(f64::NAN, 1.0).combine(local(0.1, 2.0));
        assert!(c.minimum_grid_spacing.is_nan());
        assert_eq!(c.largest_characteristic_speed, 2.0);
    }

    #[test]
    fn reduce_counts_contributors() {
        let g = GlobalQuantities::reduce([local(0.2, 1.0), local(0.1, 3.0), local(0.4, 2.0)]);
        assert_eq!(g.minimum_grid_spacing, 0.1);
        assert_eq!(g.largest_characteristic_speed, 3.0);
        assert_eq!(g.contributors, 3);
    }

    #[test]
    fn apply_sets_global_tags() {
        let mut ctx = StepContext::new(0.1);
        GlobalQuantities::reduce([local(0.2, 1.0)]).apply(&mut ctx);
        assert_eq!(ctx.get(StepQuantity::GlobalMinimumGridSpacing), Some(0.2));
        assert_eq!(ctx.get(StepQuantity::GlobalLargestCharacteristicSpeed), Some(1.0));
        assert_eq!(ctx.get(StepQuantity::MinimumGridSpacing), None);
    }

    #[test]
    fn zero_participants_rejected() {
        assert_eq!(AllReduce::new(0).unwrap_err(), ReductionError::NoParticipants);
    }

    #[test]
    fn single_participant_reduces_alone() {
        let handles = AllReduce::new(1).unwrap();
        let g = handles[0].contribute(local(0.5, 2.0)).unwrap();
        assert_eq!(g.contributors, 1);
        assert_eq!(g.minimum_grid_spacing, 0.5);
        let g = handles[0].contribute(local(0.25, 1.0)).unwrap();
        assert_eq!(g.minimum_grid_spacing, 0.25);
    }

    #[test]
    fn every_element_sees_the_same_result() {
        let handles = AllReduce::new(4).unwrap();
        let joins: Vec<_> = handles
            .into_iter()
            .map(|h| {
                thread::spawn(move || {
                    let i = h.index() as f64;
                    let first = h.contribute(local(1.0 + i, i)).unwrap();
                    let second = h.contribute(local(10.0 - i, 2.0 * i)).unwrap();
                    (first, second)
                })
            })
            .collect();
        let results: Vec<_> = joins.into_iter().map(|j| j.join().unwrap()).collect();
        for (first, second) in &results {
            assert_eq!(*first, results[0].0);
            assert_eq!(*second, results[0].1);
        }
        assert_eq!(results[0].0.minimum_grid_spacing, 1.0);
        assert_eq!(results[0].0.largest_characteristic_speed, 3.0);
        assert_eq!(results[0].1.minimum_grid_spacing, 7.0);
        assert_eq!(results[0].1.largest_characteristic_speed, 6.0);
    }

    #[test]
    fn dropped_peer_disconnects_the_rest() {
        let mut handles = AllReduce::new(2).unwrap();
        let survivor = handles.remove(0);
        drop(handles);
        assert_eq!(
            survivor.contribute(local(0.1, 1.0)).unwrap_err(),
            ReductionError::Disconnected
        );
    }
}
