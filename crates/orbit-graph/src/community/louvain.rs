//! Greedy local-move modularity optimisation with coarsening (Louvain).
//!
//! Each level runs local-move passes over a [`Symmetric`] graph: every node,
//! in the level's visit order, is detached from its community and joined to
//! the neighbouring community with the largest gain
//!
//! ```text
//! ΔQ(c) = k_i,c / m − γ · k_i · tot_c / (2m²)
//! ```
//!
//! It only leaves its current community for a strictly larger gain, so
//! modularity never decreases. A level ends when a pass moves nothing. Then
//! communities become super-nodes and the next level starts, until a level
//! makes no move or `max_levels` is reached.

use std::collections::BTreeMap;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::debug;

use super::CommunityConfig;
use super::modularity::Symmetric;
use crate::cancel::CancelToken;
use crate::error::{Result, Stage};

/// Gains closer than this are treated as equal, so float noise never
/// triggers a move.
const GAIN_EPSILON: f64 = 1e-12;

/// Outcome of a full Louvain run, in terms of base-graph indices.
#[derive(Debug)]
pub(crate) struct Outcome {
    /// Dense community id of every base node.
    pub(crate) membership: Vec<usize>,
    /// Number of communities (`max(membership) + 1`).
    pub(crate) count: usize,
    /// Local-move passes over all levels.
    pub(crate) passes: usize,
    /// Levels run, including the final one that made no move.
    pub(crate) levels: usize,
    /// Base-graph visit order of the first level.
    pub(crate) visit_order: Vec<usize>,
}

pub(crate) fn run(base: &Symmetric, config: &CommunityConfig, cancel: &CancelToken) -> Result<Outcome> {
    let n = base.len();
    let mut rng = config.seed.map(StdRng::seed_from_u64);
    let mut membership: Vec<usize> = (0..n).collect();
    let mut count = n;
    let mut passes = 0;
    let mut levels = 0;
    let mut visit_order = Vec::new();
    let mut coarse: Option<Symmetric> = None;

    loop {
        let current = coarse.as_ref().unwrap_or(base);

        let mut order: Vec<usize> = (0..current.len()).collect();
        if let Some(rng) = rng.as_mut() {
            order.shuffle(rng);
        }
        if levels == 0 {
            visit_order.clone_from(&order);
        }

        let level = local_moves(current, &order, config, cancel)?;
        passes += level.passes;
        levels += 1;
        debug!(level = levels, passes = level.passes, moved = level.moved, "louvain level done");

        if level.moved == 0 {
            break;
        }

        let (dense, next_count) = renumber(&level.community);
        for m in &mut membership {
            *m = dense[*m];
        }
        count = next_count;

        if !config.coarsen || levels >= config.max_levels || next_count == current.len() {
            break;
        }
        let next = current.aggregate(&dense, next_count);
        coarse = Some(next);
    }

    Ok(Outcome {
        membership,
        count,
        passes,
        levels,
        visit_order,
    })
}

struct Level {
    community: Vec<usize>,
    passes: usize,
    moved: usize,
}

fn local_moves(
    g: &Symmetric,
    order: &[usize],
    config: &CommunityConfig,
    cancel: &CancelToken,
) -> Result<Level> {
    let m = g.two_m / 2.0;
    let mut community: Vec<usize> = (0..g.len()).collect();
    let mut total = g.strength.clone();
    let mut passes = 0;
    let mut moved_total = 0;

    while passes < config.max_passes {
        cancel.check(Stage::Community)?;
        passes += 1;
        let mut moved = 0;

        for &i in order {
            let ci = community[i];
            let ki = g.strength[i];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(j, w) in &g.adj[i] {
                *links.entry(community[j]).or_insert(0.0) += w;
            }

            total[ci] -= ki;
            let gain = |k_ic: f64, tot_c: f64| {
                k_ic / m - config.resolution * ki * tot_c / (2.0 * m * m)
            };

            let mut best = ci;
            let mut best_gain = gain(links.get(&ci).copied().unwrap_or(0.0), total[ci]);
            for (&c, &k_ic) in &links {
                if c == ci {
                    continue;
                }
                let candidate = gain(k_ic, total[c]);
                if candidate > best_gain + GAIN_EPSILON {
                    best = c;
                    best_gain = candidate;
                }
            }

            total[best] += ki;
            if best != ci {
                community[i] = best;
                moved += 1;
            }
        }

        moved_total += moved;
        if moved == 0 {
            break;
        }
    }

    Ok(Level {
        community,
        passes,
        moved: moved_total,
    })
}

/// Relabel communities densely in order of first appearance.
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut label: Vec<Option<usize>> = vec![None; community.len()];
    let mut next = 0;
    let dense = community
        .iter()
        .map(|&c| {
            *label[c].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect();
    (dense, next)
}
