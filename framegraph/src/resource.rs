//! Virtual resources for the frame graph.
//!
//! A virtual resource is a registry entry plus a type-erased holder that owns
//! the concrete backing object. The graph only ever talks to the backing
//! object through the four lifecycle hooks of [`FrameGraphResource`]; typed
//! access is reserved for execute callbacks.

use std::any::{Any, type_name};
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{FrameGraphError, FrameGraphResult};
use crate::handle::{PassHandle, ResourceHandle};

/// Version assigned to every resource when it is registered.
pub const INITIAL_VERSION: u32 = 1;

/// Capability every concrete resource type must provide.
///
/// `C` is the backend context lent to the graph during
/// [`FrameGraph::execute`](crate::FrameGraph::execute), typically the object
/// manager or device that owns the real allocations.
pub trait FrameGraphResource<C = ()>: 'static {
    /// Descriptor the backing object is materialized from.
    type Desc: fmt::Debug + 'static;
    /// Error reported by the lifecycle operations.
    type Error: Error + Send + Sync + 'static;

    /// Materialize backing storage. Called at most once per frame, before the
    /// first read or write of a transient resource.
    fn acquire(&mut self, context: &mut C, desc: &Self::Desc) -> Result<(), Self::Error>;

    /// Tear down backing storage after the last live user finished.
    fn release(&mut self, context: &mut C) -> Result<(), Self::Error>;

    /// Invoked right before a live pass reads this resource.
    fn before_read(&mut self, _context: &mut C) {}

    /// Invoked right before a live pass writes this resource.
    fn before_write(&mut self, _context: &mut C) {}
}

/// Lifecycle state of a resource's backing object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Transient, declared but not materialized yet.
    Virtual,
    /// Transient, backing storage is live.
    Materialized,
    /// Transient, backing storage was torn down this frame.
    Released,
    /// Imported from outside the graph, always live and never managed.
    External,
}

type BoxedError = Box<dyn Error + Send + Sync>;

trait ResourceHolder<C>: Any {
    fn acquire(&mut self, context: &mut C) -> Result<(), BoxedError>;
    fn release(&mut self, context: &mut C) -> Result<(), BoxedError>;
    fn before_read(&mut self, context: &mut C);
    fn before_write(&mut self, context: &mut C);
    fn resource_type_name(&self) -> &'static str;
    fn describe(&self) -> String;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedHolder<T: FrameGraphResource<C>, C> {
    desc: T::Desc,
    resource: T,
    _context: PhantomData<fn(&mut C)>,
}

impl<T, C> ResourceHolder<C> for TypedHolder<T, C>
where
    T: FrameGraphResource<C>,
    C: 'static,
{
    fn acquire(&mut self, context: &mut C) -> Result<(), BoxedError> {
        self.resource.acquire(context, &self.desc).map_err(Into::into)
    }

    fn release(&mut self, context: &mut C) -> Result<(), BoxedError> {
        self.resource.release(context).map_err(Into::into)
    }

    fn before_read(&mut self, context: &mut C) {
        self.resource.before_read(context);
    }

    fn before_write(&mut self, context: &mut C) {
        self.resource.before_write(context);
    }

    fn resource_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn describe(&self) -> String {
        format!("{:?}", self.desc)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One virtual resource of the current frame.
pub struct ResourceEntry<C> {
    name: String,
    handle: ResourceHandle,
    version: u32,
    ref_count: u32,
    creator: Option<PassHandle>,
    pub(crate) producer: Option<PassHandle>,
    pub(crate) last_user: Option<PassHandle>,
    state: ResourceState,
    holder: Box<dyn ResourceHolder<C>>,
}

impl<C: 'static> ResourceEntry<C> {
    /// Debug name given at creation or import.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    /// Number of structural writes seen, starting at [`INITIAL_VERSION`].
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of live readers. Meaningful only after compile.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Pass that created this resource, `None` for imported resources.
    pub fn creator_pass(&self) -> Option<PassHandle> {
        self.creator
    }

    /// Authoritative producer edge computed by compile.
    pub fn producer_pass(&self) -> Option<PassHandle> {
        self.producer
    }

    /// Last live pass that reads or writes this resource.
    pub fn last_user_pass(&self) -> Option<PassHandle> {
        self.last_user
    }

    /// Transient resources are created by a pass and live within one frame.
    pub fn is_transient(&self) -> bool {
        self.creator.is_some()
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Check whether the backing object may be touched right now.
    pub fn is_materialized(&self) -> bool {
        matches!(
            self.state,
            ResourceState::Materialized | ResourceState::External
        )
    }

    /// Type name of the concrete backing object.
    pub fn type_name(&self) -> &'static str {
        self.holder.resource_type_name()
    }

    /// Debug rendering of the descriptor.
    pub fn describe(&self) -> String {
        self.holder.describe()
    }

    pub(crate) fn reset_compile_state(&mut self) {
        self.ref_count = 0;
        self.producer = None;
        self.last_user = None;
    }

    pub(crate) fn add_ref(&mut self) {
        self.ref_count += 1;
    }

    /// Drop one reference and report whether this dropped the last one.
    pub(crate) fn release_ref(&mut self) -> bool {
        if self.ref_count == 0 {
            return false;
        }
        self.ref_count -= 1;
        self.ref_count == 0
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub(crate) fn acquire(&mut self, context: &mut C) -> FrameGraphResult<()> {
        if self.state != ResourceState::Virtual {
            return Err(FrameGraphError::DoubleAcquire(self.name.clone()));
        }
        log::trace!("acquire `{}` (v{})", self.name, self.version);
        self.holder
            .acquire(context)
            .map_err(|source| FrameGraphError::Lifecycle {
                resource: self.name.clone(),
                source,
            })?;
        self.state = ResourceState::Materialized;
        Ok(())
    }

    pub(crate) fn release(&mut self, context: &mut C) -> FrameGraphResult<()> {
        if self.state != ResourceState::Materialized {
            return Err(FrameGraphError::ReleaseWithoutAcquire(self.name.clone()));
        }
        log::trace!("release `{}`", self.name);
        self.holder
            .release(context)
            .map_err(|source| FrameGraphError::Lifecycle {
                resource: self.name.clone(),
                source,
            })?;
        self.state = ResourceState::Released;
        Ok(())
    }

    pub(crate) fn before_read(&mut self, context: &mut C) -> FrameGraphResult<()> {
        if !self.is_materialized() {
            return Err(FrameGraphError::NotMaterialized(self.name.clone()));
        }
        self.holder.before_read(context);
        Ok(())
    }

    pub(crate) fn before_write(&mut self, context: &mut C) -> FrameGraphResult<()> {
        if !self.is_materialized() {
            return Err(FrameGraphError::NotMaterialized(self.name.clone()));
        }
        self.holder.before_write(context);
        Ok(())
    }

    fn typed<T: FrameGraphResource<C>>(&self) -> FrameGraphResult<&TypedHolder<T, C>> {
        self.holder
            .as_any()
            .downcast_ref::<TypedHolder<T, C>>()
            .ok_or_else(|| self.type_mismatch::<T>())
    }

    fn typed_mut<T: FrameGraphResource<C>>(
        &mut self,
    ) -> FrameGraphResult<&mut TypedHolder<T, C>> {
        let actual = self.holder.resource_type_name();
        self.holder
            .as_any_mut()
            .downcast_mut::<TypedHolder<T, C>>()
            .ok_or_else(|| FrameGraphError::TypeMismatch {
                resource: self.name.clone(),
                expected: type_name::<T>(),
                actual,
            })
    }

    fn type_mismatch<T>(&self) -> FrameGraphError {
        FrameGraphError::TypeMismatch {
            resource: self.name.clone(),
            expected: type_name::<T>(),
            actual: self.holder.resource_type_name(),
        }
    }
}

impl<C: 'static> fmt::Debug for ResourceEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceEntry")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("version", &self.version)
            .field("ref_count", &self.ref_count)
            .field("creator", &self.creator)
            .field("producer", &self.producer)
            .field("last_user", &self.last_user)
            .field("state", &self.state)
            .field("type", &self.type_name())
            .finish()
    }
}

/// Arena of every resource declared in the current frame.
///
/// The registry only grows during the build phase; handles are indices and
/// are never reused until [`clear`](Self::clear) advances the generation.
pub(crate) struct ResourceRegistry<C> {
    entries: Vec<ResourceEntry<C>>,
    generation: u32,
}

impl<C: 'static> ResourceRegistry<C> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            generation: 0,
        }
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[ResourceEntry<C>] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [ResourceEntry<C>] {
        &mut self.entries
    }

    /// Register a transient resource created by `creator`.
    pub(crate) fn create<T>(
        &mut self,
        name: String,
        desc: T::Desc,
        creator: PassHandle,
    ) -> ResourceHandle
    where
        T: FrameGraphResource<C> + Default,
    {
        self.register(name, desc, T::default(), Some(creator))
    }

    /// Register an externally owned resource.
    pub(crate) fn import<T>(&mut self, name: String, desc: T::Desc, resource: T) -> ResourceHandle
    where
        T: FrameGraphResource<C>,
    {
        self.register(name, desc, resource, None)
    }

    fn register<T>(
        &mut self,
        name: String,
        desc: T::Desc,
        resource: T,
        creator: Option<PassHandle>,
    ) -> ResourceHandle
    where
        T: FrameGraphResource<C>,
    {
        let handle = ResourceHandle::new(self.entries.len() as u32, self.generation);
        let state = if creator.is_some() {
            ResourceState::Virtual
        } else {
            ResourceState::External
        };

        self.entries.push(ResourceEntry {
            name,
            handle,
            version: INITIAL_VERSION,
            ref_count: 0,
            creator,
            producer: None,
            last_user: None,
            state,
            holder: Box::new(TypedHolder::<T, C> {
                desc,
                resource,
                _context: PhantomData,
            }),
        });

        handle
    }

    /// Resolve a handle to its registry slot.
    pub(crate) fn slot(&self, handle: ResourceHandle) -> FrameGraphResult<usize> {
        if !handle.is_valid() || handle.slot() >= self.entries.len() {
            return Err(FrameGraphError::InvalidHandle(handle));
        }
        if handle.generation() != self.generation {
            return Err(FrameGraphError::StaleHandle {
                handle,
                current: self.generation,
            });
        }
        Ok(handle.slot())
    }

    pub(crate) fn get(&self, handle: ResourceHandle) -> FrameGraphResult<&ResourceEntry<C>> {
        let slot = self.slot(handle)?;
        Ok(&self.entries[slot])
    }

    pub(crate) fn get_mut(
        &mut self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&mut ResourceEntry<C>> {
        let slot = self.slot(handle)?;
        Ok(&mut self.entries[slot])
    }

    /// Typed view of a live backing object.
    pub(crate) fn resource<T: FrameGraphResource<C>>(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&T> {
        let entry = self.get(handle)?;
        if !entry.is_materialized() {
            return Err(FrameGraphError::NotMaterialized(entry.name.clone()));
        }
        Ok(&entry.typed::<T>()?.resource)
    }

    /// Mutable typed view of a live backing object.
    pub(crate) fn resource_mut<T: FrameGraphResource<C>>(
        &mut self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&mut T> {
        let entry = self.get_mut(handle)?;
        if !entry.is_materialized() {
            return Err(FrameGraphError::NotMaterialized(entry.name.clone()));
        }
        Ok(&mut entry.typed_mut::<T>()?.resource)
    }

    /// Descriptor of a resource, available in every lifecycle state.
    pub(crate) fn desc<T: FrameGraphResource<C>>(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&T::Desc> {
        Ok(&self.get(handle)?.typed::<T>()?.desc)
    }

    /// Drop every entry and invalidate all outstanding handles.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}
