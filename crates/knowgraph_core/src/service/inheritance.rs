//! Attribute inheritance through class-hierarchy links.
//!
//! # Invariants
//! - Only relations whose type is literally `is_a` / `is a` are followed.
//! - Each node is visited at most once per resolution, so cyclic class
//!   graphs (including self-loops) terminate.
//! - `inherited` is deduplicated by attribute id and keeps breadth-first
//!   discovery order; it is never merged with `direct`.

use crate::error::{EntityKind, GraphError, GraphResult};
use crate::model::attribute::PossibleAttributes;
use crate::model::node::NodeId;
use crate::repo::attribute_repo::AttributeRepository;
use std::collections::{HashSet, VecDeque};

/// Computes the direct and inherited possible attributes of a node.
pub fn resolve_possible_attributes<R>(repo: &R, node_id: NodeId) -> GraphResult<PossibleAttributes>
where
    R: AttributeRepository + ?Sized,
{
    if !repo.node_exists(node_id)? {
        return Err(GraphError::not_found(EntityKind::Node, node_id));
    }

    let direct = repo.list_possible_attributes(node_id)?;

    let mut visited = HashSet::from([node_id]);
    let mut frontier = VecDeque::from([node_id]);
    let mut seen_attributes = HashSet::new();
    let mut inherited = Vec::new();

    while let Some(current) = frontier.pop_front() {
        for parent in repo.class_parents(current)? {
            if !visited.insert(parent) {
                continue;
            }
            for attribute in repo.list_possible_attributes(parent)? {
                if seen_attributes.insert(attribute.id) {
                    inherited.push(attribute);
                }
            }
            frontier.push_back(parent);
        }
    }

    log::debug!(
        "event=possible_attributes module=attribute status=ok node_id={node_id} visited={} direct={} inherited={}",
        visited.len(),
        direct.len(),
        inherited.len()
    );
    Ok(PossibleAttributes { direct, inherited })
}
