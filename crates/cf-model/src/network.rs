//! River network: topologically ordered accumulation of node discharge.

use std::collections::{BTreeMap, HashMap};

use cf_core::{NodeId, Real, ScopedTimer};
use cf_elements::StepContext;
use petgraph::graph::DiGraph;
use rayon::prelude::*;

use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use crate::run::{Forcing, RunOptions, RunOutput};

/// A rooted forest of nodes connected by a downstream-receiver map.
///
/// Construction validates the topography (every receiver exists, no cycles)
/// and freezes a topological order, so the run loop only ever walks a
/// precomputed schedule. Nodes without a receiver are outlets; their
/// accumulated discharge is the network output.
#[derive(Debug)]
pub struct Network {
    nodes: Vec<Node>,
    receivers: Vec<Option<NodeId>>,
    order: Vec<usize>,
    index: HashMap<String, usize>,
}

impl Network {
    /// Build a network from its nodes and a `node id -> downstream id` map
    /// (`None` marks an outlet).
    pub fn new(
        nodes: Vec<Node>,
        topography: &BTreeMap<String, Option<String>>,
    ) -> ModelResult<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id().to_string(), i).is_some() {
                return Err(ModelError::DuplicateNode {
                    node: node.id().to_string(),
                });
            }
        }

        let mut receivers = vec![None; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            let entry = topography
                .get(node.id())
                .ok_or_else(|| ModelError::MissingTopography {
                    node: node.id().to_string(),
                })?;
            if let Some(receiver) = entry {
                let &target =
                    index
                        .get(receiver.as_str())
                        .ok_or_else(|| ModelError::UnknownReceiver {
                            node: node.id().to_string(),
                            receiver: receiver.clone(),
                        })?;
                receivers[i] = Some(NodeId::from_index(target as u32));
            }
        }

        // Edges point downstream, so a topological sort visits every node
        // after all of its upstream contributors.
        let mut graph = DiGraph::<usize, ()>::with_capacity(nodes.len(), nodes.len());
        let graph_ids: Vec<_> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();
        for (i, receiver) in receivers.iter().enumerate() {
            if let Some(target) = receiver {
                graph.add_edge(graph_ids[i], graph_ids[target.index() as usize], ());
            }
        }
        let order = petgraph::algo::toposort(&graph, None)
            .map_err(|cycle| ModelError::CycleDetected {
                node: nodes[graph[cycle.node_id()]].id().to_string(),
            })?
            .into_iter()
            .map(|gid| graph[gid])
            .collect();

        Ok(Self {
            nodes,
            receivers,
            order,
            index,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Ids of the outlet nodes (no downstream receiver).
    pub fn outlet_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .zip(&self.receivers)
            .filter(|(_, receiver)| receiver.is_none())
            .map(|(node, _)| node.id())
            .collect()
    }

    /// Restore every node to its initial states.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Simulate the full forcing range and accumulate discharge downstream.
    ///
    /// `forcing` must hold an equal-length series for every node. Local node
    /// discharge is computed independently per node (data-parallel), then one
    /// topological pass adds each node's accumulated series into its
    /// receiver. Fan-in is plain summation; routing between nodes is
    /// instantaneous.
    pub fn run(
        &mut self,
        forcing: &BTreeMap<String, Forcing>,
        options: &RunOptions,
    ) -> ModelResult<RunOutput> {
        options.validate()?;
        let timesteps = self.check_forcing(forcing)?;
        let _timer = ScopedTimer::start("network-run");
        tracing::debug!(
            nodes = self.nodes.len(),
            timesteps,
            dt = options.dt,
            "starting network run"
        );

        let dt = options.dt;
        let record = options.record_states;

        // Local phase: nodes are independent until accumulation.
        let local: Vec<(Vec<Real>, BTreeMap<String, Vec<Real>>)> = self
            .nodes
            .par_iter_mut()
            .map(|node| -> ModelResult<(Vec<Real>, BTreeMap<String, Vec<Real>>)> {
                let series = &forcing[node.id()];
                let mut discharge = Vec::with_capacity(timesteps);
                let mut states: BTreeMap<String, Vec<Real>> = BTreeMap::new();
                for (step, forcing_step) in series.steps.iter().enumerate() {
                    let ctx = StepContext { dt, step };
                    discharge.push(node.step(forcing_step, ctx)?);
                    if record {
                        for (path, storage) in node.storages() {
                            states
                                .entry(path.to_string())
                                .or_insert_with(|| Vec::with_capacity(timesteps))
                                .push(storage);
                        }
                    }
                }
                Ok((discharge, states))
            })
            .collect::<ModelResult<_>>()?;

        let (mut accumulated, state_maps): (Vec<Vec<Real>>, Vec<BTreeMap<String, Vec<Real>>>) =
            local.into_iter().unzip();

        // Accumulation phase: walk the frozen topological order so every
        // node is complete before it feeds its receiver.
        for &i in &self.order {
            if let Some(receiver) = self.receivers[i] {
                let contribution = accumulated[i].clone();
                let downstream = &mut accumulated[receiver.index() as usize];
                for (total, value) in downstream.iter_mut().zip(&contribution) {
                    *total += value;
                }
            }
        }

        let mut outlets = BTreeMap::new();
        for ((node, receiver), series) in self.nodes.iter().zip(&self.receivers).zip(accumulated) {
            if receiver.is_none() {
                outlets.insert(node.id().to_string(), series);
            }
        }

        let states = record.then(|| state_maps.into_iter().flatten().collect());
        Ok(RunOutput { outlets, states })
    }

    fn check_forcing(&self, forcing: &BTreeMap<String, Forcing>) -> ModelResult<usize> {
        let mut timesteps = None;
        for node in &self.nodes {
            let series = forcing.get(node.id()).ok_or_else(|| ModelError::Forcing {
                what: format!("no forcing series for node '{}'", node.id()),
            })?;
            series.validate(node.id())?;
            match timesteps {
                None => timesteps = Some(series.len()),
                Some(expected) if expected != series.len() => {
                    return Err(ModelError::Forcing {
                        what: format!(
                            "forcing for node '{}' has {} timesteps, expected {expected}",
                            node.id(),
                            series.len()
                        ),
                    });
                }
                Some(_) => {}
            }
        }
        timesteps.ok_or_else(|| ModelError::Forcing {
            what: "network has no nodes".to_string(),
        })
    }

    /// Index of a node by id, if present.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }
}
