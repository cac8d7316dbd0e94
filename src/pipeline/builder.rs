//! Pipeline declaration: effect nodes and the validating builder.
//!
//! A [`Pipeline`] is a trend, an ordered list of [`EffectNode`]s and a target
//! likelihood. Every structural rule is checked once in
//! [`PipelineBuilder::build`]; a built pipeline is immutable and carries its
//! resolved evaluation order.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::effects::core::{ApplicationMode, ColumnSelector};
use crate::effects::effect::Effect;
use crate::effects::kinds::TrendEffect;
use crate::pipeline::decomposition::{MEAN_ID, OBS_ID};
use crate::pipeline::errors::{PipelineError, PipelineResult};
use crate::pipeline::graph::{TREND_ID, evaluation_order};
use crate::pipeline::likelihood::{LIKELIHOOD_ID, TargetLikelihood};

/// Ids no effect may take.
pub const RESERVED_IDS: [&str; 4] = [MEAN_ID, OBS_ID, TREND_ID, LIKELIHOOD_ID];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectNode {
    pub id: String,
    pub effect: Effect,
    #[serde(default)]
    pub selector: ColumnSelector,
    /// `None` uses the effect kind's default.
    #[serde(default)]
    pub mode: Option<ApplicationMode>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl EffectNode {
    pub fn new(id: impl Into<String>, effect: impl Into<Effect>) -> Self {
        Self {
            id: id.into(),
            effect: effect.into(),
            selector: ColumnSelector::NoInput,
            mode: None,
            depends_on: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: ColumnSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_mode(mut self, mode: ApplicationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.depends_on.contains(&id) {
            self.depends_on.push(id);
        }
        self
    }

    pub fn mode(&self) -> ApplicationMode {
        self.mode.unwrap_or_else(|| self.effect.default_mode())
    }
}

/// A validated pipeline. Nodes are kept in declaration order; `order` holds
/// their evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    trend: TrendEffect,
    nodes: Vec<EffectNode>,
    order: Vec<usize>,
    likelihood: TargetLikelihood,
    scale_target: bool,
    exclusive_columns: bool,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn trend(&self) -> &TrendEffect {
        &self.trend
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[EffectNode] {
        &self.nodes
    }

    /// Nodes in evaluation order.
    pub fn ordered_nodes(&self) -> impl Iterator<Item = &EffectNode> + '_ {
        self.order.iter().map(move |&i| &self.nodes[i])
    }

    pub fn evaluation_ids(&self) -> Vec<&str> {
        self.ordered_nodes().map(|n| n.id.as_str()).collect()
    }

    pub fn likelihood(&self) -> &TargetLikelihood {
        &self.likelihood
    }

    pub fn scale_target(&self) -> bool {
        self.scale_target
    }

    pub fn exclusive_columns(&self) -> bool {
        self.exclusive_columns
    }

    /// Builder pre-filled with this pipeline's declaration.
    pub fn to_builder(&self) -> PipelineBuilder {
        PipelineBuilder {
            trend: Some(self.trend.clone()),
            nodes: self.nodes.clone(),
            likelihood: Some(self.likelihood),
            scale_target: self.scale_target,
            exclusive_columns: self.exclusive_columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineBuilder {
    trend: Option<TrendEffect>,
    nodes: Vec<EffectNode>,
    likelihood: Option<TargetLikelihood>,
    scale_target: bool,
    exclusive_columns: bool,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Target scaling on, overlapping selections allowed.
    pub fn new() -> Self {
        Self {
            trend: None,
            nodes: Vec::new(),
            likelihood: None,
            scale_target: true,
            exclusive_columns: false,
        }
    }

    pub fn with_trend(mut self, trend: TrendEffect) -> Self {
        self.trend = Some(trend);
        self
    }

    pub fn with_effect(mut self, node: EffectNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_likelihood(mut self, likelihood: TargetLikelihood) -> Self {
        self.likelihood = Some(likelihood);
        self
    }

    pub fn scale_target(mut self, scale: bool) -> Self {
        self.scale_target = scale;
        self
    }

    /// Forbid two effects from naming the same column explicitly.
    pub fn exclusive_columns(mut self, exclusive: bool) -> Self {
        self.exclusive_columns = exclusive;
        self
    }

    /// Validate the declaration and resolve evaluation order.
    ///
    /// # Errors
    /// - [`PipelineError::MissingTrend`] / [`PipelineError::MissingLikelihood`].
    /// - [`PipelineError::ReservedId`], [`PipelineError::DuplicateId`],
    ///   [`PipelineError::DuplicateTrend`] for bad node ids or kinds.
    /// - [`PipelineError::UnknownBase`], [`PipelineError::UnknownDependency`],
    ///   [`PipelineError::Cycle`] for bad references.
    /// - [`PipelineError::OverlappingSelectors`] with `exclusive_columns`.
    /// - Effect and selector configuration errors.
    pub fn build(self) -> PipelineResult<Pipeline> {
        let trend = self.trend.ok_or(PipelineError::MissingTrend)?;
        trend.validate(TREND_ID)?;
        let likelihood = self.likelihood.ok_or(PipelineError::MissingLikelihood)?;
        likelihood.validate()?;

        let mut nodes = self.nodes;
        let mut seen = BTreeSet::new();
        for node in &nodes {
            if RESERVED_IDS.contains(&node.id.as_str()) {
                return Err(PipelineError::ReservedId { id: node.id.clone() });
            }
            if !seen.insert(node.id.clone()) {
                return Err(PipelineError::DuplicateId { id: node.id.clone() });
            }
            if matches!(node.effect, Effect::Trend(_)) {
                return Err(PipelineError::DuplicateTrend { id: node.id.clone() });
            }
            node.effect.validate(&node.id)?;
            node.selector.validate(&node.id)?;
        }

        for node in &mut nodes {
            let Some(base) = node.effect.composite_base().map(str::to_string) else {
                continue;
            };
            if base != TREND_ID && !seen.contains(&base) {
                return Err(PipelineError::UnknownBase { effect: node.id.clone(), base });
            }
            if !node.depends_on.contains(&base) {
                node.depends_on.push(base);
            }
        }

        if self.exclusive_columns {
            check_exclusive(&nodes)?;
        }

        let order = evaluation_order(&nodes)?;
        debug!(
            effects = nodes.len(),
            order = ?order.iter().map(|&i| nodes[i].id.as_str()).collect::<Vec<_>>(),
            "pipeline built"
        );
        Ok(Pipeline {
            trend,
            nodes,
            order,
            likelihood,
            scale_target: self.scale_target,
            exclusive_columns: self.exclusive_columns,
        })
    }
}

fn check_exclusive(nodes: &[EffectNode]) -> PipelineResult<()> {
    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for node in nodes {
        for column in node.selector.explicit_names() {
            if let Some(first) = owner.insert(column.as_str(), node.id.as_str()) {
                return Err(PipelineError::OverlappingSelectors {
                    column: column.clone(),
                    first: first.to_string(),
                    second: node.id.clone(),
                });
            }
        }
    }
    Ok(())
}
