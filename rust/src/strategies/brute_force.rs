//! Exhaustive search over each interpreter's reachability graph.
//!
//! The graph is built by asking the availability index what could follow each
//! candidate once it is taken, so it respects the same rules as the ledger.
//! Path enumeration is exponential; only use on small candidate pools.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::models::{Appointment, AppointmentId, Interpreter, InterpreterKey, Schedule, ANCHOR_ID};
use crate::scheduler::{LedgerError, SchedulingContext, SearchDirection};
use crate::{log_assignments, log_debug};

use super::{Strategy, StrategyError};

/// How a path is scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightMode {
    /// Sum of raw priorities.
    #[default]
    Priority,
    /// Priorities scaled by the interpreter's building multipliers.
    Building,
}

impl WeightMode {
    pub fn weight(&self, interpreter: &Interpreter, appt: &Appointment) -> f64 {
        match self {
            WeightMode::Priority => appt.priority,
            WeightMode::Building => interpreter.effective_weight(appt),
        }
    }
}

/// Appointment → appointments that can directly follow it for one
/// interpreter. [`ANCHOR_ID`] is the start node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachabilityGraph {
    edges: BTreeMap<AppointmentId, Vec<AppointmentId>>,
}

impl ReachabilityGraph {
    pub fn build(ctx: &SchedulingContext, key: &InterpreterKey) -> Result<Self, LedgerError> {
        let shift_start = ctx.ledger().interpreter(key)?.shift_start;
        let pool = ctx.ledger().unassigned_in_order();

        let mut scratch = ctx.clone();
        scratch.update_valid_choices_for(key, shift_start, &pool, SearchDirection::Forward)?;
        let roots = scratch.valid_choices(key).to_vec();

        let mut edges = BTreeMap::new();
        for &node in &roots {
            let mut after = ctx.clone();
            let finish = after.ledger().appointment(node)?.finish;
            after.ledger_mut().assign(key, node)?;
            after.update_valid_choices_for(key, finish, &roots, SearchDirection::Forward)?;
            edges.insert(node, after.valid_choices(key).to_vec());
        }
        edges.insert(ANCHOR_ID, roots);
        Ok(Self { edges })
    }

    pub fn successors(&self, node: AppointmentId) -> &[AppointmentId] {
        self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = AppointmentId> + '_ {
        self.edges.keys().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// Depth-first walk over every simple path from `start`, visiting each path
/// (including `[start]`) once. Successors are explored in ascending order.
fn for_each_path(
    graph: &ReachabilityGraph,
    start: AppointmentId,
    mut visit: impl FnMut(&[AppointmentId]),
) {
    let mut stack = vec![vec![start]];
    while let Some(path) = stack.pop() {
        visit(&path);
        let Some(&tail) = path.last() else {
            continue;
        };
        for &next in graph.successors(tail).iter().rev() {
            if !path.contains(&next) {
                let mut longer = path.clone();
                longer.push(next);
                stack.push(longer);
            }
        }
    }
}

/// Every simple path from `start` ending at `end`.
pub fn all_paths(
    graph: &ReachabilityGraph,
    start: AppointmentId,
    end: AppointmentId,
) -> Vec<Vec<AppointmentId>> {
    let mut paths = Vec::new();
    for_each_path(graph, start, |path| {
        if path.last() == Some(&end) {
            paths.push(path.to_vec());
        }
    });
    paths
}

/// Heaviest path from `start`, any node may end it. The start node carries no
/// weight. The first path found wins ties.
pub fn best_path(
    graph: &ReachabilityGraph,
    start: AppointmentId,
    weight: impl Fn(AppointmentId) -> f64,
) -> (f64, Vec<AppointmentId>) {
    let mut best = (0.0, vec![start]);
    for_each_path(graph, start, |path| {
        let total: f64 = path[1..].iter().map(|&id| weight(id)).sum();
        if total > best.0 {
            best = (total, path.to_vec());
        }
    });
    best
}

/// Takes each interpreter's best path in turn.
#[derive(Clone, Debug, Default)]
pub struct BruteForce {
    pub mode: WeightMode,
    pub verbosity: u8,
}

impl BruteForce {
    pub fn new(mode: WeightMode) -> Self {
        Self { mode, verbosity: 0 }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

impl Strategy for BruteForce {
    fn name(&self) -> &str {
        match self.mode {
            WeightMode::Priority => "brute_force",
            WeightMode::Building => "brute_force_assignment",
        }
    }

    fn run(&self, base: &SchedulingContext) -> Result<Schedule, StrategyError> {
        let mut ctx = base.reset();
        for key in ctx.ledger().interpreter_keys() {
            let graph = ReachabilityGraph::build(&ctx, &key)?;
            if graph.successors(ANCHOR_ID).is_empty() {
                continue;
            }
            log_debug!(
                self.verbosity,
                "{}: {} candidates, {} edges",
                key,
                graph.successors(ANCHOR_ID).len(),
                graph.edge_count()
            );

            let interpreter = ctx.ledger().interpreter(&key)?;
            let mut weights = FxHashMap::default();
            for &id in graph.successors(ANCHOR_ID) {
                let appt = ctx.ledger().appointment(id)?;
                weights.insert(id, self.mode.weight(interpreter, appt));
            }
            let (score, path) = best_path(&graph, ANCHOR_ID, |id| {
                weights.get(&id).copied().unwrap_or(0.0)
            });

            log_assignments!(self.verbosity, "{}: takes {:?} worth {}", key, &path[1..], score);
            ctx.ledger_mut().group_assign(&key, &path[1..])?;
        }
        log_assignments!(
            self.verbosity,
            "{}: impact {}, {} left open",
            self.name(),
            ctx.ledger().impact(),
            ctx.ledger().unassigned_count()
        );
        Ok(ctx.into_schedule())
    }
}
