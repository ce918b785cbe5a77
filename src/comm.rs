// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Message passing between the workers of a group.
//!
//! The `Communicator` trait is the only thing the rest of the crate
//! knows about the transport: blocking point-to-point send and
//! receive, a receive from whichever of several peers is ready first,
//! and an all-to-one gather built on top of those.
//!
//! `ChannelComm` implements it for a group of threads started by
//! `launch`.  Every ordered pair of ranks gets its own zero-capacity
//! crossbeam channel, so a send blocks until the receiver takes the
//! message, and payloads are always copied: no worker ever holds a
//! reference into another worker's buffer.  When a worker exits, its
//! endpoints drop and any peer waiting on it sees a disconnect
//! instead of waiting forever.

use crossbeam::channel::{bounded, Receiver, Select, Sender};
use log::debug;

use crate::error::{MandelError, Result};
use crate::raster::alloc_cells;

/// Distinguishes the kinds of message on a channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    /// A partial image sent point-to-point.
    Block,
    /// A contribution to a collective gather.
    Gather,
    /// The root's signal that a collective has completed.
    Release,
}

struct Packet {
    tag: Tag,
    payload: Vec<u32>,
}

/// Blocking message passing within a fixed group of ranks.
pub trait Communicator {
    /// This worker's rank, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of workers in the group.
    fn size(&self) -> usize;

    /// Copies `data` to `dest`.  Blocks until `dest` takes it.
    fn send(&self, dest: usize, tag: Tag, data: &[u32]) -> Result<()>;

    /// Receives one message from `source` into `buf`, which must be
    /// exactly as long as the message.
    fn recv_into(&self, source: usize, tag: Tag, buf: &mut [u32]) -> Result<()>;

    /// Receives one message from whichever rank in `sources` is ready
    /// first.  Returns the sender's rank alongside the payload.
    fn recv_any(&self, sources: &[usize], tag: Tag) -> Result<(usize, Vec<u32>)>;

    /// All-to-one gather of equal-sized blocks.  Every rank calls this
    /// with its own block; `root` also passes `recv`, sized
    /// `size() * send.len()`, and receives rank `i`'s block at offset
    /// `i * send.len()`.  Nobody returns until the root has every block.
    fn gather(&self, root: usize, send: &[u32], recv: Option<&mut [u32]>) -> Result<()> {
        let size = self.size();
        if root >= size {
            return Err(MandelError::InvalidRank { rank: root, size });
        }

        if self.rank() != root {
            self.send(root, Tag::Gather, send)?;
            return self.recv_into(root, Tag::Release, &mut []);
        }

        let recv = recv.ok_or_else(|| {
            MandelError::Transport("gather root supplied no receive buffer".to_string())
        })?;
        let block = send.len();
        if recv.len() != block * size {
            return Err(MandelError::Transport(format!(
                "gather receive buffer holds {} cells, expected {}",
                recv.len(),
                block * size
            )));
        }
        for rank in 0..size {
            let slot = &mut recv[rank * block..(rank + 1) * block];
            if rank == root {
                slot.copy_from_slice(send);
            } else {
                self.recv_into(rank, Tag::Gather, slot)?;
            }
        }
        for rank in (0..size).filter(|&rank| rank != root) {
            self.send(rank, Tag::Release, &[])?;
        }
        Ok(())
    }
}

/// One rank's endpoints in a channel-connected group.
pub struct ChannelComm {
    rank: usize,
    size: usize,
    // outbox[dest] feeds dest's inbox[rank]
    outbox: Vec<Sender<Packet>>,
    inbox: Vec<Receiver<Packet>>,
}

impl ChannelComm {
    /// Builds a fully connected group of `size` communicators, indexed
    /// by rank.
    pub fn group(size: usize) -> Result<Vec<ChannelComm>> {
        if size == 0 {
            return Err(MandelError::InvalidWorkers(size));
        }
        let mut outboxes: Vec<Vec<Sender<Packet>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Packet>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        for inbox in inboxes.iter_mut() {
            for outbox in outboxes.iter_mut() {
                let (tx, rx) = bounded(0);
                outbox.push(tx);
                inbox.push(rx);
            }
        }
        Ok(outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outbox, inbox))| ChannelComm {
                rank,
                size,
                outbox,
                inbox,
            })
            .collect())
    }

    fn peer(&self, other: usize) -> Result<()> {
        if other >= self.size {
            return Err(MandelError::InvalidRank {
                rank: other,
                size: self.size,
            });
        }
        if other == self.rank {
            return Err(MandelError::Transport(format!(
                "rank {} cannot message itself",
                self.rank
            )));
        }
        Ok(())
    }

    fn check_tag(&self, source: usize, expected: Tag, packet: &Packet) -> Result<()> {
        if packet.tag != expected {
            return Err(MandelError::Transport(format!(
                "rank {} expected {:?} from rank {}, got {:?}",
                self.rank, expected, source, packet.tag
            )));
        }
        Ok(())
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, data: &[u32]) -> Result<()> {
        self.peer(dest)?;
        debug!("rank {} -> {}: {:?}, {} cells", self.rank, dest, tag, data.len());
        let mut payload = alloc_cells(data.len())?;
        payload.copy_from_slice(data);
        self.outbox[dest]
            .send(Packet { tag, payload })
            .map_err(|_| {
                MandelError::Transport(format!(
                    "rank {} hung up before rank {} could send",
                    dest, self.rank
                ))
            })
    }

    fn recv_into(&self, source: usize, tag: Tag, buf: &mut [u32]) -> Result<()> {
        self.peer(source)?;
        let packet = self.inbox[source].recv().map_err(|_| {
            MandelError::Transport(format!(
                "rank {} hung up before rank {} could receive",
                source, self.rank
            ))
        })?;
        self.check_tag(source, tag, &packet)?;
        if packet.payload.len() != buf.len() {
            return Err(MandelError::Transport(format!(
                "rank {} sent {} cells, rank {} expected {}",
                source,
                packet.payload.len(),
                self.rank,
                buf.len()
            )));
        }
        buf.copy_from_slice(&packet.payload);
        Ok(())
    }

    fn recv_any(&self, sources: &[usize], tag: Tag) -> Result<(usize, Vec<u32>)> {
        if sources.is_empty() {
            return Err(MandelError::Transport(
                "receive from an empty set of ranks".to_string(),
            ));
        }
        for &source in sources {
            self.peer(source)?;
        }
        let mut select = Select::new();
        for &source in sources {
            select.recv(&self.inbox[source]);
        }
        let oper = select.select();
        let source = sources[oper.index()];
        let packet = oper.recv(&self.inbox[source]).map_err(|_| {
            MandelError::Transport(format!(
                "rank {} hung up before rank {} could receive",
                source, self.rank
            ))
        })?;
        self.check_tag(source, tag, &packet)?;
        Ok((source, packet.payload))
    }
}

/// Starts `size` workers, one scoped thread per rank, each running
/// `worker` with its own communicator.  Returns every worker's result
/// in rank order once all of them have finished.
pub fn launch<F, R>(size: usize, worker: F) -> Result<Vec<R>>
where
    F: Fn(ChannelComm) -> R + Sync,
    R: Send,
{
    let comms = ChannelComm::group(size)?;
    let worker = &worker;
    let joined = crossbeam::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| scope.spawn(move |_| worker(comm)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    })
    .map_err(|_| MandelError::Transport("worker group did not shut down cleanly".to_string()))?;

    joined
        .into_iter()
        .enumerate()
        .map(|(rank, result)| result.map_err(|_| MandelError::WorkerPanicked(rank)))
        .collect()
}
