//! Declaration helper handed to a pass's setup callback.

use crate::error::FrameGraphResult;
use crate::handle::{PassHandle, ResourceHandle};
use crate::pass::PassDeclaration;
use crate::resource::{FrameGraphResource, ResourceRegistry};

/// Records the resources a pass creates, reads and writes.
///
/// A builder only lives for the duration of one setup callback. Declaration
/// order is the frame timeline: a pass may only reference handles that were
/// registered by an earlier pass, by itself, or by an import.
pub struct FrameGraphBuilder<'a, C> {
    pass: PassHandle,
    pass_name: &'a str,
    declaration: &'a mut PassDeclaration,
    resources: &'a mut ResourceRegistry<C>,
}

impl<'a, C: 'static> FrameGraphBuilder<'a, C> {
    pub(crate) fn new(
        pass: PassHandle,
        pass_name: &'a str,
        declaration: &'a mut PassDeclaration,
        resources: &'a mut ResourceRegistry<C>,
    ) -> Self {
        Self {
            pass,
            pass_name,
            declaration,
            resources,
        }
    }

    /// Handle of the pass being declared.
    pub fn pass_handle(&self) -> PassHandle {
        self.pass
    }

    /// Name of the pass being declared.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// Declare a new transient resource owned by this pass.
    ///
    /// The backing object is default-constructed now and only materialized
    /// when the pass executes.
    pub fn create<T>(&mut self, name: impl Into<String>, desc: T::Desc) -> ResourceHandle
    where
        T: FrameGraphResource<C> + Default,
    {
        let handle = self.resources.create::<T>(name.into(), desc, self.pass);
        self.declaration.creates.push(handle);
        handle
    }

    /// Declare that this pass reads `handle`. Repeated calls are no-ops.
    pub fn read(&mut self, handle: ResourceHandle) -> ResourceHandle {
        if !self.declaration.reads.contains(&handle) {
            self.declaration.reads.push(handle);
        }
        handle
    }

    /// Declare that this pass writes `handle`.
    ///
    /// Writing a resource produced elsewhere also records a read (the pass
    /// depends on the earlier contents) and advances the resource version.
    pub fn write(&mut self, handle: ResourceHandle) -> ResourceHandle {
        if self.declaration.creates.contains(&handle) {
            if !self.declaration.writes.contains(&handle) {
                self.declaration.writes.push(handle);
            }
            return handle;
        }

        self.read(handle);
        if !self.declaration.writes.contains(&handle) {
            self.declaration.writes.push(handle);
            match self.resources.get_mut(handle) {
                Ok(entry) => entry.bump_version(),
                Err(err) => log::warn!("Pass `{}` writes {:?}: {}", self.pass_name, handle, err),
            }
        }
        handle
    }

    /// Keep this pass alive even if nothing reads its outputs.
    pub fn mark_as_persistent(&mut self) {
        self.declaration.persistent = true;
    }

    /// Descriptor of an already registered resource.
    pub fn resource_desc<T: FrameGraphResource<C>>(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&T::Desc> {
        self.resources.desc::<T>(handle)
    }
}
