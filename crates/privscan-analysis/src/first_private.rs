use crate::{
    context::{ClassificationContext, TraitEntryId},
    descriptor::{DependencyDescriptor, TraitFlags},
    TraitSet,
};
use privscan_core::{DefinitionInfo, EstimateId};

/// Adds `FirstPrivate` to a last or second-to-last private entry whose memory is not written
/// in full on the relevant path: the bytes nobody writes keep their value from before the loop,
/// so each private copy has to start from it.
///
/// Returns whether the entry was refined.
pub fn refine_first_private(
    ctx: &mut ClassificationContext<'_>,
    id: TraitEntryId,
    descriptor: &mut DependencyDescriptor,
) -> bool {
    if descriptor.is(TraitFlags::FIRST_PRIVATE)
        || !descriptor.is_any(TraitFlags::LAST_PRIVATE | TraitFlags::SECOND_TO_LAST_PRIVATE)
    {
        return false;
    }
    let em = ctx.entry(id).memory;
    let last = descriptor.is(TraitFlags::LAST_PRIVATE);
    let written = |leaf: EstimateId, defs: &DefinitionInfo| {
        ctx.tree
            .estimate(leaf)
            .locations()
            .all(|loc| defs.must_reach.contain(&loc))
    };
    let defined_leaves: Vec<EstimateId> = ctx
        .tree
        .estimate_descendants(em)
        .into_iter()
        .filter(|&leaf| ctx.tree.estimate(leaf).is_leaf())
        .filter(|&leaf| {
            if last {
                written(leaf, ctx.exit_defs)
            } else {
                written(leaf, ctx.latch_defs) || written(leaf, ctx.exit_defs)
            }
        })
        .collect();
    if ctx.tree.cover(em, &defined_leaves) {
        return false;
    }
    ctx.entry_mut(id).value &= TraitSet::FIRST_PRIVATE;
    descriptor.set(TraitFlags::FIRST_PRIVATE);
    true
}
