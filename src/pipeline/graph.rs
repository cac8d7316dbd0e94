//! Dependency resolution: evaluation order of a pipeline's effect nodes.
//!
//! Kahn's algorithm over the `depends_on` relation. Among ready nodes the one
//! declared first is taken, so a pipeline without dependencies evaluates in
//! declaration order. The trend is evaluated before every effect and may be
//! named as a dependency under [`TREND_ID`].
use std::collections::{BTreeMap, BTreeSet};

use crate::pipeline::builder::EffectNode;
use crate::pipeline::errors::{PipelineError, PipelineResult};

/// Component name of the trend.
pub const TREND_ID: &str = "trend";

/// Declaration indices of `nodes` in evaluation order.
///
/// # Errors
/// - [`PipelineError::UnknownDependency`] for a reference to an undeclared id.
/// - [`PipelineError::Cycle`] listing the ids left unresolved, in
///   declaration order.
pub fn evaluation_order(nodes: &[EffectNode]) -> PipelineResult<Vec<usize>> {
    let position: BTreeMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n.id.as_str(), i)).collect();

    let mut indegree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for dep in &node.depends_on {
            if dep == TREND_ID {
                continue;
            }
            let &j = position.get(dep.as_str()).ok_or_else(|| PipelineError::UnknownDependency {
                effect: node.id.clone(),
                dependency: dep.clone(),
            })?;
            indegree[i] += 1;
            dependents[j].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &k in &dependents[i] {
            indegree[k] -= 1;
            if indegree[k] == 0 {
                ready.insert(k);
            }
        }
    }

    if order.len() < nodes.len() {
        let ids = (0..nodes.len())
            .filter(|&i| indegree[i] > 0)
            .map(|i| nodes[i].id.clone())
            .collect();
        return Err(PipelineError::Cycle { ids });
    }
    Ok(order)
}
