//! Fluent builder for constructing a [`ClusterSim`].

use std::sync::Arc;

use dp_core::SimConfig;
use dp_field::HaloField;
use dp_partition::PartitionTree;
use dp_remote::{Directory, RemoteProcessor, mailbox, processor_name};

use crate::behavior::AgentBehavior;
use crate::cluster::ClusterSim;
use crate::error::SimResult;
use crate::partition_sim::PartitionSim;

/// Builder for [`ClusterSim<B>`].
///
/// Validates the configuration, builds the shared partition map, and wires
/// one mailbox, field, and processor per partition, binding each endpoint in
/// a fresh [`Directory`].
///
/// ```rust,ignore
/// let mut cluster = ClusterBuilder::new(config, Wanderer::default())
///     .record_stats()
///     .build()?;
/// cluster.run(&mut NoopObserver)?;
/// ```
pub struct ClusterBuilder<B: AgentBehavior> {
    config: SimConfig,
    behavior: B,
    record_stats: bool,
    record_debug: bool,
}

impl<B: AgentBehavior> ClusterBuilder<B> {
    pub fn new(config: SimConfig, behavior: B) -> Self {
        Self { config, behavior, record_stats: false, record_debug: false }
    }

    /// Turn on per-tick stat recording on every processor.
    pub fn record_stats(mut self) -> Self {
        self.record_stats = true;
        self
    }

    /// Turn on debug recording on every processor.
    pub fn record_debug(mut self) -> Self {
        self.record_debug = true;
        self
    }

    /// Validate inputs and assemble the cluster.
    pub fn build(self) -> SimResult<ClusterSim<B>> {
        self.config.validate()?;

        let partition = Arc::new(PartitionTree::build(
            self.config.world,
            self.config.num_partitions,
            self.config.aoi,
        )?);
        let directory = Directory::new();
        let behavior = Arc::new(self.behavior);

        let pids: Vec<_> = partition.pids().collect();
        let mut partitions = Vec::with_capacity(pids.len());
        for pid in pids {
            let (inbox, endpoint) = mailbox(pid);
            directory.bind(&processor_name(pid), Arc::new(endpoint))?;

            let field = HaloField::new(Arc::clone(&partition), pid)?;
            let processor = RemoteProcessor::new(field, self.config.make_clock());
            if self.record_stats {
                processor.lock().init_stat();
            }
            if self.record_debug {
                processor.lock().init_debug();
            }

            partitions.push(PartitionSim::new(
                pid,
                self.config.clone(),
                Arc::clone(&partition),
                processor,
                Arc::clone(&behavior),
                directory.clone(),
                inbox,
            ));
        }

        Ok(ClusterSim::new(self.config, partition, directory, partitions))
    }
}
