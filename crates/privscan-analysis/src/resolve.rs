//! First classification of every memory access the loop makes explicitly.
//!
//! The three resolvers run in a fixed order: accesses establish a trait for each location,
//! pointers demote memory reached through a pointer the loop may change, and addresses mark
//! objects whose address escapes the body.

use crate::{context::ClassificationContext, errors::PrivateError, errors::Result, TraitId, TraitSet};
use privscan_core::{MemoryLocation, Operation, ValueKind};
use tracing::trace;

/// Classifies each explicitly accessed location from its def-use, reach and live facts, and
/// every unknown access from whether it only reads memory.
pub fn resolve_accesses(ctx: &mut ClassificationContext<'_>) -> Result<()> {
    let def_use = ctx.def_use;
    for loc in def_use.explicit_accesses() {
        let em = ctx.estimate(loc)?;
        let carried = ctx.deps.contains_key(&em);
        let shared = if carried {
            TraitSet::NO_ACCESS
        } else {
            TraitSet::SHAREABLE
        };
        let value = if !def_use.has_use(loc) {
            if !ctx.live.out.overlap(loc) {
                TraitSet::PRIVATE & shared
            } else if def_use.has_def(loc) {
                TraitSet::LAST_PRIVATE & shared
            } else if ctx.latch_defs.must_reach.contain(loc)
                && !ctx.exit_defs.may_reach.overlap(loc)
            {
                TraitSet::SECOND_TO_LAST_PRIVATE & TraitSet::FIRST_PRIVATE & shared
            } else {
                TraitSet::DYNAMIC_PRIVATE & TraitSet::FIRST_PRIVATE & shared
            }
        } else if carried && (def_use.has_may_def(loc) || def_use.has_def(loc)) {
            TraitSet::DEPENDENCY
        } else {
            // Also a location that is written when no dependence touches it.
            TraitSet::READONLY
        };
        trace!(location = %loc, memory = %em, trait_value = %value, "explicit access");
        let id = ctx.explicit_entry_or_insert(em);
        ctx.entry_mut(id).value &= value;
    }

    for &inst in def_use.explicit_unknowns() {
        let node = ctx.tree.find_unknown(inst).ok_or_else(|| {
            debug_assert!(false, "unknown access {} must be in the alias tree", inst);
            PrivateError::MissingUnknown {
                region: ctx.region.id,
                inst: inst.to_string(),
            }
        })?;
        let value = match &ctx.function.instruction(inst).op {
            Operation::Call {
                reads_only: true, ..
            }
            | Operation::Opaque {
                reads_only: true, ..
            } => TraitSet::READONLY,
            _ => TraitSet::DEPENDENCY,
        };
        trace!(%inst, %node, trait_value = %value, "unknown access");
        ctx.new_unknown(inst, node, value);
    }
    Ok(())
}

/// Memory reached through a pointer that may change between iterations cannot be privatized:
/// each iteration may be looking at a different object.
pub fn resolve_pointers(ctx: &mut ClassificationContext<'_>) -> Result<()> {
    let def_use = ctx.def_use;
    for loc in def_use.explicit_accesses() {
        let Some(ptr_loc) = ctx.function.value(loc.ptr).loaded_from().copied() else {
            continue;
        };
        let em = ctx.estimate(loc)?;
        let Some(id) = ctx.explicit_entry(em) else {
            continue;
        };
        let value = ctx.entry(id).value;
        if value.is(TraitId::Private) || value.is(TraitId::Readonly) || value.is(TraitId::Shared) {
            continue;
        }
        // A pointer the loop never touches is invariant.
        let Some(ptr_entry) = ctx
            .tree
            .find(&ptr_loc)
            .and_then(|ptr_em| ctx.explicit_entry(ptr_em))
        else {
            continue;
        };
        if ctx.entry(ptr_entry).value.is(TraitId::Readonly) {
            continue;
        }
        trace!(location = %loc, pointer = %ptr_loc, "pointer may change, demoted");
        ctx.entry_mut(id).value &= TraitSet::DEPENDENCY;
    }
    Ok(())
}

/// Marks automatic and global objects whose address is turned into an integer or stored as
/// data inside the loop.
pub fn resolve_addresses(ctx: &mut ClassificationContext<'_>) -> Result<()> {
    let def_use = ctx.def_use;
    for &ptr in def_use.address_accesses() {
        let em = ctx.estimate(&MemoryLocation::sized(ptr, 0))?;
        let root = ctx.tree.top_level_parent(em);
        let object = ctx.function.value(ctx.tree.estimate(root).front());
        if !object.is_object() {
            continue;
        }
        // Objects allocated inside the loop are fresh in every iteration.
        if let ValueKind::Alloca { block } = object.kind {
            if ctx.region.contains(block) {
                continue;
            }
        }
        let escapes = ctx
            .function
            .users(ptr)
            .iter()
            .any(|user| ctx.region.contains(user.block) && user.escapes_address(ptr));
        if escapes {
            trace!(pointer = %ptr, memory = %em, "address escapes");
            let id = ctx.explicit_entry_or_insert(em);
            ctx.entry_mut(id).value &= TraitSet::ADDRESS_ACCESS;
        }
    }
    Ok(())
}
