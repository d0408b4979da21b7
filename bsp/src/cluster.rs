use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use log::{debug, warn};
use tokio::{
    sync::{
        Barrier,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
    task::JoinSet,
};

use crate::{BspErr, Envelope, OutputLog, OutputRecord, Partition, Peer, PeerId, Result, Sample};

/// Runs a fixed set of peers as tasks of the current tokio runtime.
///
/// Every peer owns one partition. Barriers are backed by a shared `Barrier`
/// and messages by one unbounded mailbox per peer.
pub struct LocalCluster<M> {
    ids: Arc<[PeerId]>,
    partitions: Vec<Partition>,
    output: OutputLog,
    _msg: PhantomData<fn() -> M>,
}

impl<M: Send + 'static> LocalCluster<M> {
    /// Creates a new `LocalCluster` with peers named `peer-0`, `peer-1`, ...
    ///
    /// # Arguments
    /// * `partitions` - One partition per peer.
    ///
    /// # Returns
    /// A new `LocalCluster` or an error if there are no partitions.
    pub fn new(partitions: Vec<Partition>) -> Result<Self> {
        let ids = (0..partitions.len())
            .map(|i| PeerId::new(format!("peer-{i}")))
            .collect();

        Self::with_ids(ids, partitions)
    }

    /// Creates a new `LocalCluster` with explicit peer names.
    ///
    /// # Arguments
    /// * `ids` - The peers' names, in enumeration order.
    /// * `partitions` - One partition per peer, in the same order as `ids`.
    ///
    /// # Returns
    /// A new `LocalCluster` or an error if the lengths differ, a name is
    /// repeated or there are no peers at all.
    pub fn with_ids(ids: Vec<PeerId>, partitions: Vec<Partition>) -> Result<Self> {
        if ids.is_empty() {
            return Err(BspErr::InvalidCluster("a job needs at least one peer".into()));
        }

        if ids.len() != partitions.len() {
            return Err(BspErr::InvalidCluster(format!(
                "got {} peer names for {} partitions",
                ids.len(),
                partitions.len()
            )));
        }

        let mut sorted = ids.clone();
        sorted.sort();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(BspErr::InvalidCluster(format!(
                "peer name {} is used more than once",
                pair[0]
            )));
        }

        Ok(Self {
            ids: Arc::from(ids),
            partitions,
            output: OutputLog::new(),
            _msg: PhantomData,
        })
    }

    pub fn ids(&self) -> &[PeerId] {
        &self.ids
    }

    /// Returns a handle to the job output, valid after `run` consumes the cluster.
    pub fn output(&self) -> OutputLog {
        self.output.clone()
    }

    /// Runs `body` once per peer, concurrently, until every peer is done.
    ///
    /// # Arguments
    /// * `body` - The program each peer executes.
    ///
    /// # Returns
    /// Every peer's value in enumeration order. The first peer that fails
    /// aborts the rest of the job and its error is returned instead.
    pub async fn run<F, Fut, T, E>(self, body: F) -> std::result::Result<Vec<T>, E>
    where
        F: Fn(LocalPeer<M>) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<BspErr> + Send + 'static,
    {
        let n = self.ids.len();
        let barrier = Arc::new(Barrier::new(n));
        let (txs, rxs): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::unbounded_channel()).unzip();
        let mailboxes: Arc<[UnboundedSender<Envelope<M>>]> = Arc::from(txs);

        let mut tasks = JoinSet::new();
        let mut task_peers = HashMap::with_capacity(n);

        for ((index, partition), mailbox) in self.partitions.into_iter().enumerate().zip(rxs) {
            let peer = LocalPeer {
                id: self.ids[index].clone(),
                index,
                ids: Arc::clone(&self.ids),
                partition,
                mailboxes: Arc::clone(&mailboxes),
                mailbox,
                inbox: Vec::new(),
                barrier: Arc::clone(&barrier),
                output: self.output.clone(),
                superstep: 0,
            };

            let fut = body(peer);
            let handle = tasks.spawn(async move { (index, fut.await) });
            task_peers.insert(handle.id(), index);
        }

        drop(mailboxes);

        let mut results: Vec<Option<T>> = (0..n).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(value))) => {
                    debug!(peer = self.ids[index].as_str(); "peer finished");
                    results[index] = Some(value);
                }
                Ok((index, Err(e))) => {
                    warn!(peer = self.ids[index].as_str(); "peer failed, aborting the job");
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    let id = task_peers
                        .get(&e.id())
                        .map(|&index| self.ids[index].clone())
                        .unwrap_or_else(|| PeerId::new("unknown"));

                    warn!(peer = id.as_str(); "peer panicked, aborting the job");
                    tasks.abort_all();
                    return Err(BspErr::PeerPanicked(id).into());
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

/// The `Peer` handed to each task of a `LocalCluster`.
pub struct LocalPeer<M> {
    id: PeerId,
    index: usize,
    ids: Arc<[PeerId]>,
    partition: Partition,
    mailboxes: Arc<[UnboundedSender<Envelope<M>>]>,
    mailbox: UnboundedReceiver<Envelope<M>>,
    inbox: Vec<Envelope<M>>,
    barrier: Arc<Barrier>,
    output: OutputLog,
    superstep: u64,
}

impl<M: Send + 'static> Peer for LocalPeer<M> {
    type Msg = M;

    fn id(&self) -> &PeerId {
        &self.id
    }

    fn index(&self) -> usize {
        self.index
    }

    fn peers(&self) -> &[PeerId] {
        &self.ids
    }

    fn superstep(&self) -> u64 {
        self.superstep
    }

    fn read_next(&mut self) -> Result<Option<Sample<'_>>> {
        Ok(self.partition.next_sample())
    }

    fn reopen_input(&mut self) -> Result<()> {
        self.partition.reset();
        Ok(())
    }

    fn send(&mut self, to: &PeerId, msg: M) -> Result<()> {
        let idx = self
            .ids
            .iter()
            .position(|id| id == to)
            .ok_or_else(|| BspErr::UnknownPeer(to.clone()))?;

        let envelope = Envelope {
            from: self.id.clone(),
            msg,
        };

        self.mailboxes[idx]
            .send(envelope)
            .map_err(|_| BspErr::Disconnected(to.clone()))
    }

    async fn sync(&mut self) -> Result<()> {
        // Every send of this superstep has been queued once everyone is here.
        self.barrier.wait().await;

        if !self.inbox.is_empty() {
            warn!(
                peer = self.id.as_str(),
                superstep = self.superstep,
                discarded = self.inbox.len();
                "discarding undrained messages"
            );
            self.inbox.clear();
        }

        while let Ok(envelope) = self.mailbox.try_recv() {
            self.inbox.push(envelope);
        }

        // Nobody may send for the next superstep before every mailbox is swapped.
        self.barrier.wait().await;
        self.superstep += 1;
        Ok(())
    }

    fn drain(&mut self) -> Vec<Envelope<M>> {
        std::mem::take(&mut self.inbox)
    }

    fn write(&mut self, theta: &[f64], cost: f64) -> Result<()> {
        self.output.append(OutputRecord {
            writer: self.id.clone(),
            superstep: self.superstep,
            theta: theta.to_vec(),
            cost,
        });

        Ok(())
    }
}
