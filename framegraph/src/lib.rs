//! # RedLilium Frame Graph
//!
//! Per-frame scheduler of render passes and the transient resources they
//! exchange.
//!
//! ## Overview
//!
//! A frame is described declaratively, then compiled and executed:
//! - [`FrameGraph::add_pass`] - declare a pass; its setup callback records
//!   which resources it creates, reads and writes through a
//!   [`FrameGraphBuilder`]
//! - [`FrameGraph::import_resource`] - register an externally owned resource
//! - [`FrameGraph::compile`] - reference counting, culling of passes nothing
//!   depends on, and lifetime assignment for every transient resource
//! - [`FrameGraph::execute`] - run surviving passes in declaration order,
//!   materializing transient resources right before their first use and
//!   releasing them right after their last one
//! - [`FrameGraph::reset`] - start the next frame
//!
//! Concrete resources implement [`FrameGraphResource`]. The graph only sees
//! them through their descriptor and lifecycle hooks; pass code reaches the
//! typed object through [`PassContext::resource`].
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_framegraph::{FrameGraph, ResourceHandle};
//!
//! #[derive(Default)]
//! struct ShadowData {
//!     shadow_map: ResourceHandle,
//! }
//!
//! let mut graph = FrameGraph::<Device>::new();
//! let shadow_map = graph
//!     .add_pass::<ShadowData, _, _>(
//!         "Shadows",
//!         |builder, data| {
//!             data.shadow_map = builder.create::<Texture>("ShadowMap", shadow_desc);
//!             data.shadow_map = builder.write(data.shadow_map);
//!         },
//!         |data, ctx| {
//!             let (texture, device) = ctx.resource_with_context::<Texture>(data.shadow_map)?;
//!             device.draw_shadows(texture);
//!             Ok(())
//!         },
//!     )
//!     .shadow_map;
//!
//! graph.add_pass::<(), _, _>(
//!     "Lighting",
//!     |builder, _| {
//!         builder.read(shadow_map);
//!         builder.mark_as_persistent();
//!     },
//!     |_, ctx| ctx.context().draw_lighting(),
//! );
//!
//! graph.compile()?;
//! graph.execute(&mut device)?;
//! graph.reset();
//! ```

pub mod builder;
pub mod compiler;
pub mod config;
#[cfg(feature = "dump")]
pub mod dump;
pub mod error;
pub mod graph;
pub mod handle;
pub mod pass;
pub mod resource;

// Re-export main types for convenience
pub use builder::FrameGraphBuilder;
pub use compiler::CompileStats;
pub use config::FrameGraphConfig;
pub use error::{FrameGraphError, FrameGraphResult};
pub use graph::{FrameGraph, GraphState};
pub use handle::{PassHandle, ResourceAccess, ResourceHandle};
pub use pass::{PassContext, PassEntry};
pub use resource::{FrameGraphResource, INITIAL_VERSION, ResourceEntry, ResourceState};

/// Frame graph library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("RedLilium Frame Graph v{} initialized", VERSION);
}
