//! Bottom-up propagation of trait entries through the alias tree.

use crate::{
    context::{ClassificationContext, TraitEntryId},
    descriptor::{DependencySet, TraitFlags},
    synthesize::store_results,
};
use privscan_core::{AliasNodeId, AliasNodeKind, EstimateId};
use tracing::trace;

/// Visits alias nodes children first. Each node collects the entries its children finalized,
/// folds duplicates, records its descriptor and hands its list on to its parent.
pub fn propagate_traits(ctx: &mut ClassificationContext<'_>, set: &mut DependencySet) {
    let tree = ctx.tree;
    for node in tree.post_order() {
        let mut entries = ctx.take_node_traits(node);
        let mut unknowns = ctx.take_node_unknowns(node);
        for &child in &tree.node(node).children {
            for id in ctx.take_node_traits(child) {
                let id = ctx.resolve(id);
                let em = ctx.entry(id).memory;
                match tree.estimate(em).parent {
                    Some(parent) if tree.alias_node(parent) == node => {
                        match ctx.explicit_entry(parent) {
                            Some(target) => ctx.fold(id, target),
                            None => {
                                ctx.entry_mut(id).memory = parent;
                                entries.push(id);
                            }
                        }
                    }
                    _ => entries.push(id),
                }
            }
            unknowns.extend(ctx.take_node_unknowns(child));
        }

        let entries = remove_redundant(ctx, node, entries);
        store_results(ctx, node, &entries, &unknowns, set);
        ctx.set_node_traits(node, entries);
        ctx.set_node_unknowns(node, unknowns);
    }
}

/// Topmost ancestor of `em` that still belongs to `node`.
fn generalize(ctx: &ClassificationContext<'_>, node: AliasNodeId, em: EstimateId) -> EstimateId {
    let mut current = em;
    while let Some(parent) = ctx.tree.estimate(current).parent {
        if ctx.tree.alias_node(parent) != node {
            break;
        }
        current = parent;
    }
    current
}

/// Lifts entries owned by `node` to the coarsest memory of the node, then folds entries for
/// the same memory, and entries covered by an ancestor entry, together. The result names every
/// estimate memory at most once and no entry is an ancestor of another.
fn remove_redundant(
    ctx: &mut ClassificationContext<'_>,
    node: AliasNodeId,
    entries: Vec<TraitEntryId>,
) -> Vec<TraitEntryId> {
    let tree = ctx.tree;
    for &id in &entries {
        let em = ctx.entry(id).memory;
        if tree.alias_node(em) == node {
            let top = generalize(ctx, node, em);
            ctx.entry_mut(id).memory = top;
        }
    }

    let mut kept: Vec<TraitEntryId> = Vec::with_capacity(entries.len());
    for id in entries {
        let id = ctx.resolve(id);
        if kept.contains(&id) {
            continue;
        }
        let em = ctx.entry(id).memory;
        let mut absorbed = false;
        let mut index = 0;
        while index < kept.len() {
            let other = kept[index];
            let other_em = ctx.entry(other).memory;
            if tree.is_estimate_ancestor(other_em, em) {
                ctx.fold(id, other);
                absorbed = true;
                break;
            }
            if tree.is_estimate_ancestor(em, other_em) {
                ctx.fold(other, id);
                kept.remove(index);
                continue;
            }
            index += 1;
        }
        if !absorbed {
            kept.push(id);
        }
    }
    kept
}

/// Alias nodes whose root memories are spanned by the memory the loop explicitly accesses in
/// that node.
pub fn explicit_access_coverage(
    ctx: &ClassificationContext<'_>,
    set: &DependencySet,
) -> Vec<AliasNodeId> {
    let tree = ctx.tree;
    let accessed: Vec<EstimateId> = ctx.explicitly_accessed().collect();
    tree.nodes()
        .filter(|node| node.kind == AliasNodeKind::Estimate && set.contains(node.id))
        .filter(|node| {
            let roots = tree.node_roots(node.id);
            let pieces: Vec<EstimateId> = accessed
                .iter()
                .copied()
                .filter(|&em| tree.alias_node(em) == node.id)
                .collect();
            !roots.is_empty() && roots.iter().all(|&root| tree.cover(root, &pieces))
        })
        .map(|node| node.id)
        .collect()
}

/// Memory below a fully covered node may overlap what the loop accesses under another name,
/// so no finer classification than a dependence is sound for it.
pub fn force_covered_descendants(ctx: &ClassificationContext<'_>, set: &mut DependencySet) {
    let tree = ctx.tree;
    for node in explicit_access_coverage(ctx, set) {
        for &child in &tree.node(node).children {
            for descendant in tree.descendants(child) {
                if let Some(alias_trait) = set.get_mut(descendant) {
                    if !alias_trait.descriptor.is(TraitFlags::NO_ACCESS) {
                        trace!(covered = %node, %descendant, "forced to dependency");
                        alias_trait.set_dependency();
                    }
                }
            }
        }
    }
}
