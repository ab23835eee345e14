//! Hand-off of enumeration results to a single owner context
//!
//! World storage must only be mutated from one thread per world. Workers
//! compute candidate batches in parallel and push them through a
//! [`HandoffSender`]; the owning thread drains its [`HandoffReceiver`] and
//! applies each batch in turn.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

/// Hand-off failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    /// Owning context dropped its receiver
    #[error("Hand-off owner disconnected")]
    OwnerGone,
}

/// Producer side of a hand-off channel, cloneable across workers
#[derive(Debug)]
pub struct HandoffSender<T> {
    send: Sender<Vec<T>>,
}

impl<T> Clone for HandoffSender<T> {
    fn clone(&self) -> Self {
        Self {
            send: Sender::clone(&self.send),
        }
    }
}

/// Consumer side of a hand-off channel, held by the owner context
#[derive(Debug)]
pub struct HandoffReceiver<T> {
    recv: Receiver<Vec<T>>,
}

/// Create a bounded hand-off channel holding up to `capacity` pending batches
pub fn handoff<T>(capacity: usize) -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (send, recv) = crossbeam_channel::bounded(capacity.max(1));
    (HandoffSender { send }, HandoffReceiver { recv })
}

impl<T> HandoffSender<T> {
    /// Deliver one batch, blocking while the channel is full
    pub fn deliver(&self, batch: Vec<T>) -> Result<(), HandoffError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.send.send(batch).map_err(|_| HandoffError::OwnerGone)
    }
}

impl<T> HandoffReceiver<T> {
    /// Apply every batch that is already waiting, without blocking.
    ///
    /// Returns the number of batches applied.
    pub fn drain<F>(&self, mut apply: F) -> usize
    where
        F: FnMut(Vec<T>),
    {
        let mut applied = 0;
        loop {
            match self.recv.try_recv() {
                Ok(batch) => {
                    apply(batch);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Apply batches until every sender has been dropped.
    ///
    /// Returns the number of batches applied.
    pub fn drain_blocking<F>(&self, mut apply: F) -> usize
    where
        F: FnMut(Vec<T>),
    {
        let mut applied = 0;
        for batch in self.recv.iter() {
            apply(batch);
            applied += 1;
        }
        applied
    }

    /// Number of batches waiting to be applied
    pub fn pending(&self) -> usize {
        self.recv.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_batches_arrive_in_send_order() {
        let (sender, receiver) = handoff(4);
        sender.deliver(vec![1, 2]).unwrap();
        sender.deliver(vec![3]).unwrap();

        let mut seen = Vec::new();
        assert_eq!(receiver.drain(|batch| seen.extend(batch)), 2);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(receiver.drain(|_| panic!("nothing pending")), 0);
    }

    #[test]
    fn test_empty_batches_are_skipped() {
        let (sender, receiver) = handoff::<u8>(1);
        sender.deliver(Vec::new()).unwrap();
        assert_eq!(receiver.drain(|_| ()), 0);
    }

    #[test]
    fn test_owner_gone() {
        let (sender, receiver) = handoff(1);
        drop(receiver);
        assert_eq!(sender.deliver(vec![1]), Err(HandoffError::OwnerGone));
    }

    #[test]
    fn test_many_workers_single_owner() {
        let (sender, receiver) = handoff(2);
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let sender = sender.clone();
                thread::spawn(move || {
                    for step in 0..5 {
                        sender.deliver(vec![worker * 10 + step]).unwrap();
                    }
                })
            })
            .collect();
        drop(sender);

        let mut total = Vec::new();
        let applied = receiver.drain_blocking(|batch| total.extend(batch));
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(applied, 20);
        total.sort_unstable();
        let expected: Vec<i32> = (0..4).flat_map(|w| (0..5).map(move |s| w * 10 + s)).collect();
        assert_eq!(total, expected);
        assert_eq!(receiver.pending(), 0);
    }
}
