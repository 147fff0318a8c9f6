//! Turns the trait entries of a finalized alias node into descriptors.

use crate::{
    context::{ClassificationContext, TraitEntryId, UnknownEntryId},
    dependence::DependenceRecord,
    descriptor::{
        AliasTrait, DependencyDescriptor, DependencySet, EstimateMemoryTrait, TraitFlags,
        UnknownMemoryTrait,
    },
    first_private::refine_first_private,
    statistics::Statistics,
    traits::{Access, PrivateKind, TraitId, TraitSet},
};
use privscan_core::{AliasNodeId, EstimateId};

/// Decodes a lattice value and counts it `count` times.
pub fn to_descriptor(value: TraitSet, count: usize, stats: &mut Statistics) -> DependencyDescriptor {
    let mut descriptor = DependencyDescriptor::new();
    if value.has_address_access() {
        descriptor.set(TraitFlags::ADDRESS_ACCESS);
        stats.address_access += count;
    }
    let (private, read, shared) = match value.access() {
        Access::Dependency => {
            descriptor.set(TraitFlags::DEPENDENCY);
            stats.dependency += count;
            return descriptor;
        }
        Access::Independent {
            private,
            read,
            shared,
        } => (private, read, shared),
    };

    // Shared overrides every other category.
    if shared {
        descriptor.set(TraitFlags::SHARED);
        stats.shared += count;
        return descriptor;
    }
    match private {
        PrivateKind::None if !read => descriptor.set(TraitFlags::NO_ACCESS),
        PrivateKind::None => {
            descriptor.set(TraitFlags::READONLY);
            stats.readonly += count;
        }
        PrivateKind::Private if read => {
            descriptor.set(TraitFlags::FIRST_PRIVATE);
            stats.first_private += count;
        }
        PrivateKind::Private => {
            descriptor.set(TraitFlags::PRIVATE);
            stats.private += count;
        }
        kind => {
            let (flag, counter) = match kind {
                PrivateKind::SecondToLast => (
                    TraitFlags::SECOND_TO_LAST_PRIVATE,
                    &mut stats.second_to_last_private,
                ),
                PrivateKind::Last => (TraitFlags::LAST_PRIVATE, &mut stats.last_private),
                _ => (TraitFlags::DYNAMIC_PRIVATE, &mut stats.dynamic_private),
            };
            descriptor.set(flag);
            *counter += count;
            if read {
                descriptor.set(TraitFlags::FIRST_PRIVATE);
                stats.first_private += count;
            }
        }
    }
    descriptor
}

fn is_explicit(ctx: &ClassificationContext<'_>, node: AliasNodeId, em: EstimateId) -> bool {
    ctx.tree.alias_node(em) == node
        && ctx
            .explicit_entry(em)
            .is_some_and(|id| !ctx.entry(id).value.is(TraitId::NoAccess))
}

// Entries are lifted to coarser memory, so pieces below `em` contribute their records too.
fn dependence_of(ctx: &ClassificationContext<'_>, em: EstimateId) -> Option<DependenceRecord> {
    let mut merged: Option<DependenceRecord> = None;
    for (&piece, record) in &ctx.deps {
        if ctx.tree.is_estimate_ancestor(em, piece) {
            merged.get_or_insert_with(DependenceRecord::new).merge(record);
        }
    }
    merged
}

fn memory_trait(
    ctx: &mut ClassificationContext<'_>,
    node: AliasNodeId,
    id: TraitEntryId,
) -> (EstimateMemoryTrait, bool) {
    let entry = ctx.entry(id);
    let (em, value) = (entry.memory, entry.value);
    // Entries passing through on their way to the root, or moved onto a parent estimate of an
    // enclosing node, are counted only where the loop accessed them.
    let count = usize::from(ctx.is_explicit_in(id, node));
    let mut descriptor = to_descriptor(value, count, &mut ctx.statistics);
    if refine_first_private(ctx, id, &mut descriptor) {
        ctx.statistics.first_private += count;
    }
    let explicit = is_explicit(ctx, node, em);
    if explicit {
        descriptor.set(TraitFlags::EXPLICIT_ACCESS);
    }
    let memory = EstimateMemoryTrait {
        memory: em,
        descriptor,
        dependence: dependence_of(ctx, em),
    };
    (memory, explicit)
}

/// Records the result for `node`.
///
/// A node with a single estimate memory and no unknown access gets that memory's exact
/// category. Anything else gets a summary that is only ever read only, shared or a dependence:
/// a mix of private variants has no single copy discipline that is safe for all of them.
pub fn store_results(
    ctx: &mut ClassificationContext<'_>,
    node: AliasNodeId,
    entries: &[TraitEntryId],
    unknowns: &[UnknownEntryId],
    set: &mut DependencySet,
) {
    if entries.is_empty() && unknowns.is_empty() {
        return;
    }
    if let ([id], []) = (entries, unknowns) {
        let (memory, _) = memory_trait(ctx, node, *id);
        let mut alias_trait = AliasTrait::new(node, memory.descriptor);
        alias_trait.memories.push(memory);
        set.insert(alias_trait);
        return;
    }

    let mut combined = TraitSet::NO_ACCESS;
    let mut alias_trait = AliasTrait::new(node, DependencyDescriptor::new());
    let mut explicit = false;
    for &id in entries {
        combined &= ctx.entry(id).value;
        let (memory, is_explicit) = memory_trait(ctx, node, id);
        explicit |= is_explicit;
        alias_trait.memories.push(memory);
    }
    for &uid in unknowns {
        let unknown = ctx.unknown(uid);
        let (inst, value, origin) = (unknown.inst, unknown.value, unknown.node);
        combined &= value;
        let count = usize::from(origin == node);
        let mut descriptor = to_descriptor(value, count, &mut ctx.statistics);
        if origin == node && !value.is(TraitId::NoAccess) {
            descriptor.set(TraitFlags::EXPLICIT_ACCESS);
            explicit = true;
        }
        alias_trait
            .unknowns
            .push(UnknownMemoryTrait { inst, descriptor });
    }

    let summary = if combined.is(TraitId::Readonly) {
        TraitSet::READONLY
    } else if combined.is(TraitId::Shared) {
        TraitSet::SHARED
    } else {
        TraitSet::DEPENDENCY
    };
    combined &= summary;
    alias_trait.descriptor = to_descriptor(combined, 0, &mut ctx.statistics);
    if explicit {
        alias_trait.descriptor.set(TraitFlags::EXPLICIT_ACCESS);
    }
    set.insert(alias_trait);
}
