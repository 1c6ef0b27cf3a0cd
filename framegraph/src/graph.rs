//! Frame graph definition, compilation and execution.

use std::fmt;

use crate::builder::FrameGraphBuilder;
use crate::compiler::{self, CompileStats};
use crate::config::FrameGraphConfig;
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::handle::{PassHandle, ResourceHandle};
use crate::pass::{CallbackPass, PassContext, PassDeclaration, PassEntry};
use crate::resource::{FrameGraphResource, ResourceEntry, ResourceRegistry, ResourceState};

/// Phase of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphState {
    /// Passes and imports are being declared.
    Building,
    /// Reference counts and lifetimes are up to date.
    Compiled,
    /// Execute ran; the graph must be reset before the next frame.
    Executed,
}

/// Per-frame scheduler of passes and the virtual resources they use.
///
/// One instance is reused across frames:
///
/// ```ignore
/// let mut graph = FrameGraph::<Device>::new();
///
/// let back_buffer = graph.import_resource("BackBuffer", swapchain_desc, swapchain_target);
/// let gbuffer = graph
///     .add_pass::<GBufferData, _, _>(
///         "GBuffer",
///         |builder, data| {
///             data.albedo = builder.create::<Texture>("Albedo", albedo_desc);
///             data.albedo = builder.write(data.albedo);
///         },
///         |data, ctx| draw_scene(ctx.resource::<Texture>(data.albedo)?),
///     )
///     .albedo;
///
/// graph.compile()?;
/// graph.execute(&mut device)?;
/// graph.reset();
/// ```
///
/// Setup callbacks run immediately inside [`add_pass`](Self::add_pass).
/// Execute callbacks run inside [`execute`](Self::execute), in declaration
/// order, and only for passes that survived culling.
pub struct FrameGraph<C = ()> {
    config: FrameGraphConfig,
    passes: Vec<PassEntry<C>>,
    resources: ResourceRegistry<C>,
    state: GraphState,
    stats: CompileStats,
}

impl<C: 'static> FrameGraph<C> {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }

    /// Create an empty graph.
    pub fn with_config(config: FrameGraphConfig) -> Self {
        Self {
            config,
            passes: Vec::new(),
            resources: ResourceRegistry::new(),
            state: GraphState::Building,
            stats: CompileStats::default(),
        }
    }

    pub fn config(&self) -> &FrameGraphConfig {
        &self.config
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Frame generation, advanced by every [`reset`](Self::reset).
    pub fn generation(&self) -> u32 {
        self.resources.generation()
    }

    /// Statistics of the last successful compile.
    pub fn stats(&self) -> CompileStats {
        self.stats
    }

    /// Declare a pass.
    ///
    /// `setup` runs immediately with a builder bound to the new pass and the
    /// pass-private data block. `execute` is stored and runs at most once,
    /// during [`execute`](Self::execute), if the pass survives culling.
    ///
    /// Returns the pass data as filled in by `setup`.
    pub fn add_pass<D, S, E>(&mut self, name: impl Into<String>, setup: S, execute: E) -> &D
    where
        D: Default + 'static,
        S: FnOnce(&mut FrameGraphBuilder<'_, C>, &mut D),
        E: FnOnce(&D, &mut PassContext<'_, C>) -> FrameGraphResult<()> + 'static,
    {
        self.invalidate("add a pass");

        let name = name.into();
        let handle = PassHandle::new(self.passes.len());
        let mut declaration = PassDeclaration::default();
        let mut data = D::default();
        {
            let mut builder =
                FrameGraphBuilder::new(handle, &name, &mut declaration, &mut self.resources);
            setup(&mut builder, &mut data);
        }

        log::trace!(
            "declare pass `{}`: {} creates, {} reads, {} writes",
            name,
            declaration.creates.len(),
            declaration.reads.len(),
            declaration.writes.len()
        );

        let node = CallbackPass::new(data, Box::new(execute));
        self.passes
            .push(PassEntry::new(name, handle, declaration, Box::new(node)));

        match self.passes[handle.index()].data().downcast_ref::<D>() {
            Some(data) => data,
            None => unreachable!(),
        }
    }

    /// Register an externally owned resource, such as a swapchain target.
    ///
    /// Imported resources have no creating pass: the graph never acquires,
    /// releases or culls them.
    pub fn import_resource<T>(
        &mut self,
        name: impl Into<String>,
        desc: T::Desc,
        resource: T,
    ) -> ResourceHandle
    where
        T: FrameGraphResource<C>,
    {
        self.invalidate("import a resource");
        self.resources.import(name.into(), desc, resource)
    }

    /// Compute reference counts, cull passes nothing depends on and assign
    /// resource lifetimes.
    pub fn compile(&mut self) -> FrameGraphResult<CompileStats> {
        if self.state == GraphState::Executed {
            return Err(FrameGraphError::AlreadyExecuted);
        }

        if self.config.validate_declarations {
            compiler::validate(&self.passes, &self.resources)?;
        }

        let stats = compiler::compile_into(&mut self.passes, &mut self.resources)?;
        log::debug!(
            "Frame graph `{}` compiled: {}/{} passes active, {}/{} transient resources used, {} imported",
            self.config.label,
            stats.active_passes,
            self.passes.len(),
            stats.materialized_resources,
            stats.transient_resources,
            stats.imported_resources
        );

        self.stats = stats;
        self.state = GraphState::Compiled;

        #[cfg(feature = "dump")]
        if let Some(path) = &self.config.dump_path {
            self.dump_to_file(path)?;
        }

        Ok(stats)
    }

    /// Run every active pass in declaration order.
    ///
    /// For each pass, transient resources it creates are acquired, the read
    /// and write hooks run, the execute callback runs, and finally every
    /// transient resource whose last user was this pass is released.
    ///
    /// The first error stops execution and is returned. Transient resources
    /// still materialized at that point are released before returning.
    pub fn execute(&mut self, context: &mut C) -> FrameGraphResult<()> {
        match self.state {
            GraphState::Building => return Err(FrameGraphError::NotCompiled),
            GraphState::Executed => return Err(FrameGraphError::AlreadyExecuted),
            GraphState::Compiled => {}
        }
        // Execute callbacks are consumed from here on
        self.state = GraphState::Executed;

        if let Err(err) = run_passes(&mut self.passes, &mut self.resources, context) {
            release_materialized(&mut self.resources, context);
            return Err(err);
        }

        Ok(())
    }

    /// Drop every pass and resource and start a new frame.
    ///
    /// Handles from the previous frame become stale.
    pub fn reset(&mut self) {
        self.passes.clear();
        self.resources.clear();
        self.state = GraphState::Building;
        self.stats = CompileStats::default();
    }

    /// Typed access to a materialized resource, e.g. an imported target.
    pub fn resource<T: FrameGraphResource<C>>(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&T> {
        self.resources.resource::<T>(handle)
    }

    pub fn resource_mut<T: FrameGraphResource<C>>(
        &mut self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&mut T> {
        self.resources.resource_mut::<T>(handle)
    }

    /// Descriptor of a resource.
    pub fn resource_desc<T: FrameGraphResource<C>>(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&T::Desc> {
        self.resources.desc::<T>(handle)
    }

    /// Bookkeeping of a resource.
    pub fn resource_entry(&self, handle: ResourceHandle) -> FrameGraphResult<&ResourceEntry<C>> {
        self.resources.get(handle)
    }

    /// All resources of this frame, indexed by handle.
    pub fn resources(&self) -> &[ResourceEntry<C>] {
        self.resources.entries()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn pass(&self, handle: PassHandle) -> Option<&PassEntry<C>> {
        self.passes.get(handle.index())
    }

    /// Find the first pass declared with `name`.
    pub fn find_pass(&self, name: &str) -> Option<PassHandle> {
        self.passes
            .iter()
            .find(|pass| pass.name() == name)
            .map(PassEntry::handle)
    }

    /// All passes in declaration order.
    pub fn passes(&self) -> &[PassEntry<C>] {
        &self.passes
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    fn invalidate(&mut self, action: &str) {
        match self.state {
            GraphState::Building => {}
            GraphState::Compiled => self.state = GraphState::Building,
            GraphState::Executed => log::warn!(
                "Frame graph `{}`: tried to {} after execution, reset it first",
                self.config.label,
                action
            ),
        }
    }
}

impl<C: 'static> Default for FrameGraph<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> fmt::Debug for FrameGraph<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameGraph")
            .field("label", &self.config.label)
            .field("state", &self.state)
            .field("generation", &self.generation())
            .field("passes", &self.passes)
            .field("resources", &self.resources.entries())
            .finish()
    }
}

fn run_passes<C: 'static>(
    passes: &mut [PassEntry<C>],
    resources: &mut ResourceRegistry<C>,
    context: &mut C,
) -> FrameGraphResult<()> {
    for pass in passes.iter_mut() {
        if !pass.is_active() {
            log::trace!("skip culled pass `{}`", pass.name());
            continue;
        }

        for &handle in pass.creates() {
            let entry = resources.get_mut(handle)?;
            if entry.last_user_pass().is_some() {
                entry.acquire(context)?;
            }
        }

        for &handle in pass.reads() {
            resources.get_mut(handle)?.before_read(context)?;
        }

        for &handle in pass.writes() {
            resources.get_mut(handle)?.before_write(context)?;
        }

        log::trace!("execute pass `{}`", pass.name());
        pass.execute(resources, context)?;

        let finished = Some(pass.handle());
        for entry in resources.entries_mut() {
            if entry.is_transient() && entry.last_user_pass() == finished {
                entry.release(context)?;
            }
        }
    }

    Ok(())
}

/// Tear down every transient resource left live by an aborted frame.
fn release_materialized<C: 'static>(resources: &mut ResourceRegistry<C>, context: &mut C) {
    for entry in resources.entries_mut() {
        if !entry.is_transient() || entry.state() != ResourceState::Materialized {
            continue;
        }
        if let Err(err) = entry.release(context) {
            log::warn!("Failed to release `{}` after aborted frame: {}", entry.name(), err);
        }
    }
}
