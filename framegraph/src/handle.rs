//! Handles into the frame graph's pass list and resource registry.

use bitflags::bitflags;

/// Handle to a virtual resource tracked by a [`FrameGraph`](crate::FrameGraph).
///
/// `ResourceHandle` is `Copy` and cheap to pass around. It indexes the
/// graph's resource registry and carries the frame generation it was minted
/// in, so a handle kept across [`FrameGraph::reset`](crate::FrameGraph::reset)
/// is rejected instead of silently aliasing a new resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    /// Index into the resource registry.
    index: u32,
    /// Frame generation of the graph that created this handle.
    generation: u32,
}

impl ResourceHandle {
    /// Sentinel denoting "no resource".
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the registry index of this handle.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Get the frame generation this handle belongs to.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Check that this is not the [`INVALID`](Self::INVALID) sentinel.
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }

    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Handle to a pass in the frame graph.
///
/// Passes are stored in declaration order, so comparing two handles
/// compares their position on the frame timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassHandle(u32);

impl PassHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the declaration index of this pass.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// How a pass touches a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceAccess: u8 {
        /// The pass introduced the resource.
        const CREATE = 1 << 0;
        /// The pass reads the resource.
        const READ = 1 << 1;
        /// The pass writes the resource.
        const WRITE = 1 << 2;
    }
}
