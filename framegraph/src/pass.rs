//! Pass definitions for the frame graph.

use std::any::Any;
use std::fmt;

use crate::error::{FrameGraphError, FrameGraphResult};
use crate::handle::{PassHandle, ResourceAccess, ResourceHandle};
use crate::resource::{FrameGraphResource, ResourceRegistry};

/// Execute callback stored on a pass, invoked at most once per frame.
pub(crate) type ExecuteFn<D, C> =
    Box<dyn FnOnce(&D, &mut PassContext<'_, C>) -> FrameGraphResult<()>>;

/// Resource relationships a pass declared during setup.
#[derive(Debug, Default)]
pub(crate) struct PassDeclaration {
    pub(crate) creates: Vec<ResourceHandle>,
    pub(crate) reads: Vec<ResourceHandle>,
    pub(crate) writes: Vec<ResourceHandle>,
    pub(crate) persistent: bool,
}

/// Type-erased pass payload: private data plus the execute callback.
pub(crate) trait PassNode<C> {
    fn execute(&mut self, context: &mut PassContext<'_, C>) -> FrameGraphResult<()>;
    fn data(&self) -> &dyn Any;
}

pub(crate) struct CallbackPass<D, C> {
    data: D,
    execute: Option<ExecuteFn<D, C>>,
}

impl<D, C> CallbackPass<D, C> {
    pub(crate) fn new(data: D, execute: ExecuteFn<D, C>) -> Self {
        Self {
            data,
            execute: Some(execute),
        }
    }
}

impl<D: 'static, C: 'static> PassNode<C> for CallbackPass<D, C> {
    fn execute(&mut self, context: &mut PassContext<'_, C>) -> FrameGraphResult<()> {
        match self.execute.take() {
            Some(callback) => callback(&self.data, context),
            None => Err(FrameGraphError::AlreadyExecuted),
        }
    }

    fn data(&self) -> &dyn Any {
        &self.data
    }
}

/// One declared unit of frame work.
pub struct PassEntry<C> {
    name: String,
    handle: PassHandle,
    pub(crate) declaration: PassDeclaration,
    pub(crate) ref_count: u32,
    node: Box<dyn PassNode<C>>,
}

impl<C: 'static> PassEntry<C> {
    pub(crate) fn new(
        name: String,
        handle: PassHandle,
        declaration: PassDeclaration,
        node: Box<dyn PassNode<C>>,
    ) -> Self {
        Self {
            name,
            handle,
            declaration,
            ref_count: 0,
            node,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> PassHandle {
        self.handle
    }

    /// Resources introduced by this pass, in declaration order.
    pub fn creates(&self) -> &[ResourceHandle] {
        &self.declaration.creates
    }

    /// Resources read by this pass, each listed once.
    pub fn reads(&self) -> &[ResourceHandle] {
        &self.declaration.reads
    }

    /// Resources written by this pass, each listed once.
    pub fn writes(&self) -> &[ResourceHandle] {
        &self.declaration.writes
    }

    /// Persistent passes are never culled.
    pub fn is_persistent(&self) -> bool {
        self.declaration.persistent
    }

    /// Number of live outputs. Meaningful only after compile.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// A pass executes iff something consumes its output or it is persistent.
    pub fn is_active(&self) -> bool {
        self.ref_count > 0 || self.declaration.persistent
    }

    /// How this pass touches `handle`.
    pub fn access(&self, handle: ResourceHandle) -> ResourceAccess {
        let mut access = ResourceAccess::empty();
        access.set(
            ResourceAccess::CREATE,
            self.declaration.creates.contains(&handle),
        );
        access.set(ResourceAccess::READ, self.declaration.reads.contains(&handle));
        access.set(ResourceAccess::WRITE, self.declaration.writes.contains(&handle));
        access
    }

    pub(crate) fn data(&self) -> &dyn Any {
        self.node.data()
    }

    pub(crate) fn execute(
        &mut self,
        resources: &mut ResourceRegistry<C>,
        context: &mut C,
    ) -> FrameGraphResult<()> {
        let mut pass_context = PassContext {
            pass_name: &self.name,
            resources,
            context,
        };
        self.node.execute(&mut pass_context)
    }
}

impl<C> fmt::Debug for PassEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassEntry")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("declaration", &self.declaration)
            .field("ref_count", &self.ref_count)
            .finish()
    }
}

/// Context handed to an execute callback.
///
/// This is the only way pass code reaches concrete resource contents.
pub struct PassContext<'a, C> {
    pass_name: &'a str,
    resources: &'a mut ResourceRegistry<C>,
    context: &'a mut C,
}

impl<'a, C: 'static> PassContext<'a, C> {
    /// Name of the executing pass.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// Backend context lent to the graph for this frame.
    pub fn context(&mut self) -> &mut C {
        self.context
    }

    /// Typed access to a materialized resource.
    pub fn resource<T: FrameGraphResource<C>>(
        &mut self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&mut T> {
        self.resources.resource_mut::<T>(handle)
    }

    /// Typed access to a resource together with the backend context.
    pub fn resource_with_context<T: FrameGraphResource<C>>(
        &mut self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<(&mut T, &mut C)> {
        let resource = self.resources.resource_mut::<T>(handle)?;
        Ok((resource, &mut *self.context))
    }

    /// Descriptor of a resource.
    pub fn resource_desc<T: FrameGraphResource<C>>(
        &self,
        handle: ResourceHandle,
    ) -> FrameGraphResult<&T::Desc> {
        self.resources.desc::<T>(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(declaration: PassDeclaration) -> PassEntry<()> {
        let node = CallbackPass::<u32, ()>::new(5, Box::new(|_, _| Ok(())));
        PassEntry::new("Pass".into(), PassHandle::new(0), declaration, Box::new(node))
    }

    #[test]
    fn test_active_rules() {
        let mut pass = entry(PassDeclaration::default());
        assert!(!pass.is_active());

        pass.ref_count = 1;
        assert!(pass.is_active());

        let mut pass = entry(PassDeclaration {
            persistent: true,
            ..Default::default()
        });
        pass.ref_count = 0;
        assert!(pass.is_active());
    }

    #[test]
    fn test_access_flags() {
        let created = ResourceHandle::new(0, 0);
        let read = ResourceHandle::new(1, 0);
        let pass = entry(PassDeclaration {
            creates: vec![created],
            reads: vec![read],
            writes: vec![created, read],
            persistent: false,
        });

        assert_eq!(
            pass.access(created),
            ResourceAccess::CREATE | ResourceAccess::WRITE
        );
        assert_eq!(pass.access(read), ResourceAccess::READ | ResourceAccess::WRITE);
        assert!(pass.access(ResourceHandle::new(2, 0)).is_empty());
    }

    #[test]
    fn test_execute_runs_once() {
        let mut pass = entry(PassDeclaration::default());
        let mut registry = ResourceRegistry::<()>::new();

        assert!(pass.execute(&mut registry, &mut ()).is_ok());
        assert!(matches!(
            pass.execute(&mut registry, &mut ()),
            Err(FrameGraphError::AlreadyExecuted)
        ));
        assert_eq!(pass.data().downcast_ref::<u32>(), Some(&5));
    }
}
