//! Frame graph compilation.
//!
//! Compilation never reorders passes: declaration order already is the frame
//! timeline. It only decides which passes survive and how long each
//! transient resource has to live:
//!
//! 1. **Reference counting** - every pass starts with one reference per
//!    written resource, every resource with one reference per reading pass.
//!    A pass that only reads (no creates, no writes) is a sink: its results
//!    leave the graph, so it holds a single reference nothing can take away.
//! 2. **Producer assignment** - the last writer of a resource becomes its
//!    producer for culling purposes.
//! 3. **Culling** - flood fill from unreferenced resources. An unread
//!    resource drops a reference from its producer; a producer that loses all
//!    references (and is not persistent) is culled and releases the
//!    resources it read, which may cascade further up the chain.
//! 4. **Lifetimes** - walking the surviving passes in order, the last pass
//!    that reads or writes a resource becomes its last user. Execution
//!    releases a transient resource right after that pass.

use crate::error::{FrameGraphError, FrameGraphResult};
use crate::pass::PassEntry;
use crate::resource::ResourceRegistry;

/// Summary of a compiled frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Passes that will execute.
    pub active_passes: usize,
    /// Passes removed because nothing consumes their output.
    pub culled_passes: usize,
    /// Resources created by passes this frame.
    pub transient_resources: usize,
    /// Resources registered from outside the graph.
    pub imported_resources: usize,
    /// Transient resources that will actually be materialized.
    pub materialized_resources: usize,
}

/// Reject declarations that reference handles not registered at their
/// position in declaration order.
///
/// Declaring a handle from another frame or another graph does not crash
/// compilation, it silently produces a wrong schedule, so this check runs
/// before anything is counted.
pub(crate) fn validate<C: 'static>(
    passes: &[PassEntry<C>],
    resources: &ResourceRegistry<C>,
) -> FrameGraphResult<()> {
    for pass in passes {
        let handles = pass
            .creates()
            .iter()
            .chain(pass.reads())
            .chain(pass.writes());

        for &handle in handles {
            let undeclared = || FrameGraphError::UndeclaredResource {
                pass: pass.name().to_string(),
                handle,
            };

            let entry = resources.get(handle).map_err(|_| undeclared())?;
            if entry
                .creator_pass()
                .is_some_and(|creator| creator > pass.handle())
            {
                return Err(undeclared());
            }
        }
    }

    Ok(())
}

/// Compute reference counts, cull dead passes and assign resource lifetimes.
///
/// Only `ref_count`, producer and last-user bookkeeping is touched, so
/// compiling the same declarations twice yields the same result.
pub(crate) fn compile_into<C: 'static>(
    passes: &mut [PassEntry<C>],
    resources: &mut ResourceRegistry<C>,
) -> FrameGraphResult<CompileStats> {
    for entry in resources.entries_mut() {
        entry.reset_compile_state();
    }

    // Initial reference counts and producer edges
    for pass in passes.iter_mut() {
        let is_sink =
            pass.writes().is_empty() && pass.creates().is_empty() && !pass.reads().is_empty();
        pass.ref_count = if is_sink {
            1
        } else {
            pass.writes().len() as u32
        };

        for &handle in pass.reads() {
            resources.get_mut(handle)?.add_ref();
        }

        for &handle in pass.writes() {
            resources.get_mut(handle)?.producer = Some(pass.handle());
        }
    }

    // Cull using flood fill
    let mut unreferenced: Vec<usize> = resources
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.ref_count() == 0)
        .map(|(slot, _)| slot)
        .collect();

    while let Some(slot) = unreferenced.pop() {
        let Some(producer) = resources.entries()[slot].producer_pass() else {
            continue;
        };

        let pass = &mut passes[producer.index()];
        if pass.ref_count == 0 {
            continue;
        }
        pass.ref_count -= 1;
        if pass.is_active() {
            continue;
        }

        for &handle in pass.reads() {
            if resources.get_mut(handle)?.release_ref() {
                unreferenced.push(handle.slot());
            }
        }
    }

    // Lifetimes of the surviving resources
    for pass in passes.iter().filter(|pass| pass.is_active()) {
        for &handle in pass.creates() {
            resources.get_mut(handle)?.producer = Some(pass.handle());
        }

        for &handle in pass.reads().iter().chain(pass.writes()) {
            resources.get_mut(handle)?.last_user = Some(pass.handle());
        }
    }

    let mut stats = CompileStats {
        active_passes: passes.iter().filter(|pass| pass.is_active()).count(),
        ..Default::default()
    };
    stats.culled_passes = passes.len() - stats.active_passes;

    for entry in resources.entries() {
        let Some(creator) = entry.creator_pass() else {
            stats.imported_resources += 1;
            continue;
        };
        stats.transient_resources += 1;

        if entry.last_user_pass().is_none() {
            continue;
        }

        let creator = &passes[creator.index()];
        if !creator.is_active() {
            return Err(FrameGraphError::CulledCreator {
                resource: entry.name().to_string(),
                creator: creator.name().to_string(),
            });
        }
        stats.materialized_resources += 1;
    }

    Ok(stats)
}
