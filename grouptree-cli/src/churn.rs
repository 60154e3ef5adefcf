//! Concurrent append/pop churn against a shared hierarchy
//!
//! Every worker owns a few nodes and moves them between shared lists at
//! random. Afterwards each list is checked for ring integrity and the list
//! lengths are reconciled with the operation counters.

use anyhow::{bail, Result};
use grouptree_core::{Config, Hierarchy, HierarchyResult, ListId, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct ChurnOptions {
    pub threads: usize,
    pub ops: usize,
    pub lists: usize,
    pub nodes_per_thread: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChurnReport {
    pub threads: usize,
    pub ops_per_thread: usize,
    pub appends: u64,
    pub pops: u64,
    pub lock_contentions: u64,
    pub list_lengths: Vec<usize>,
    pub elapsed_ms: u128,
}

pub fn run(config: &Config, options: ChurnOptions) -> Result<ChurnReport> {
    if options.threads == 0 || options.lists == 0 || options.nodes_per_thread == 0 {
        bail!("threads, lists and nodes per thread must all be positive");
    }

    let hierarchy = Arc::new(Hierarchy::<usize>::from_config(config));
    let lists: Arc<Vec<ListId>> =
        Arc::new((0..options.lists).map(|_| hierarchy.new_list()).collect::<HierarchyResult<_>>()?);

    let started = Instant::now();
    let workers: Vec<_> = (0..options.threads)
        .map(|worker| {
            let hierarchy = hierarchy.clone();
            let lists = lists.clone();
            thread::spawn(move || churn_worker(&hierarchy, &lists, worker, options))
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => bail!("churn worker panicked"),
        }
    }
    let elapsed = started.elapsed();

    let mut list_lengths = Vec::with_capacity(lists.len());
    for list in lists.iter() {
        hierarchy.verify_list(*list)?;
        list_lengths.push(hierarchy.len(*list)?);
    }

    let metrics = hierarchy.metrics();
    let attached: usize = list_lengths.iter().sum();
    if metrics.appends - metrics.pops != attached as u64 {
        bail!(
            "length mismatch: {} appends - {} pops != {} attached",
            metrics.appends,
            metrics.pops,
            attached
        );
    }
    info!(appends = metrics.appends, pops = metrics.pops, ?list_lengths, "churn finished");

    Ok(ChurnReport {
        threads: options.threads,
        ops_per_thread: options.ops,
        appends: metrics.appends,
        pops: metrics.pops,
        lock_contentions: metrics.lock_contentions,
        list_lengths,
        elapsed_ms: elapsed.as_millis(),
    })
}

fn churn_worker(
    hierarchy: &Hierarchy<usize>,
    lists: &[ListId],
    worker: usize,
    options: ChurnOptions,
) -> HierarchyResult<()> {
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(worker as u64));
    let nodes = (0..options.nodes_per_thread)
        .map(|i| hierarchy.create(format!("w{}-n{}", worker, i), worker))
        .collect::<HierarchyResult<Vec<NodeId>>>()?;

    for _ in 0..options.ops {
        let node = nodes[rng.random_range(0..nodes.len())];
        match hierarchy.node(node)?.superlist() {
            Some(current) => {
                hierarchy.pop(current, node)?;
            }
            None => {
                let target = lists[rng.random_range(0..lists.len())];
                hierarchy.append(target, node)?;
            }
        }
    }
    debug!(worker, "churn worker done");
    Ok(())
}
