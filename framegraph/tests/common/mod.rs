//! Common utilities for frame graph integration tests.
//!
//! The backend context is a [`Recorder`] that logs every lifecycle hook and
//! pass execution, so tests can assert on the exact order of events.

#![allow(dead_code)]

use redlilium_framegraph::{
    FrameGraph, FrameGraphConfig, FrameGraphResource, FrameGraphResult, PassContext,
};

/// Initialize test logging once per process.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Fresh graph with declaration validation enabled.
pub fn new_graph() -> FrameGraph<Recorder> {
    init_logging();
    FrameGraph::with_config(
        FrameGraphConfig::new()
            .with_label("TestGraph")
            .with_validation(true),
    )
}

// ============================================================================
// Event Recording
// ============================================================================

/// Observable side effect of executing a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Acquire(String),
    Release(String),
    BeforeRead(String),
    BeforeWrite(String),
    Execute(String),
}

/// Backend context lent to [`FrameGraph::execute`].
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// Make acquiring the texture with this label fail.
    pub fail_acquire: Option<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of executed passes, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Execute(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }

    /// Check that no lifecycle hook ever ran for `label`.
    pub fn untouched(&self, label: &str) -> bool {
        !self.events.iter().any(|event| match event {
            Event::Acquire(name)
            | Event::Release(name)
            | Event::BeforeRead(name)
            | Event::BeforeWrite(name) => name == label,
            Event::Execute(_) => false,
        })
    }
}

/// Execute callback that only records the pass name.
pub fn record<D: 'static>(
    name: &str,
) -> impl FnOnce(&D, &mut PassContext<'_, Recorder>) -> FrameGraphResult<()> + 'static {
    let name = name.to_string();
    move |_, ctx| {
        ctx.context().events.push(Event::Execute(name));
        Ok(())
    }
}

// ============================================================================
// Test Texture
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl TextureDesc {
    pub fn new(label: &str, width: u32, height: u32) -> Self {
        Self {
            label: label.to_string(),
            width,
            height,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Out of texture memory while allocating `{0}`")]
pub struct OutOfMemory(pub String);

/// Texture whose lifecycle hooks append to the [`Recorder`].
#[derive(Debug, Default)]
pub struct TestTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub live: bool,
}

impl TestTexture {
    /// An externally owned texture, live from the start.
    pub fn imported(desc: &TextureDesc) -> Self {
        Self {
            label: desc.label.clone(),
            width: desc.width,
            height: desc.height,
            live: true,
        }
    }
}

impl FrameGraphResource<Recorder> for TestTexture {
    type Desc = TextureDesc;
    type Error = OutOfMemory;

    fn acquire(&mut self, recorder: &mut Recorder, desc: &TextureDesc) -> Result<(), OutOfMemory> {
        if recorder.fail_acquire.as_deref() == Some(desc.label.as_str()) {
            return Err(OutOfMemory(desc.label.clone()));
        }
        self.label = desc.label.clone();
        self.width = desc.width;
        self.height = desc.height;
        self.live = true;
        recorder.events.push(Event::Acquire(self.label.clone()));
        Ok(())
    }

    fn release(&mut self, recorder: &mut Recorder) -> Result<(), OutOfMemory> {
        self.live = false;
        recorder.events.push(Event::Release(self.label.clone()));
        Ok(())
    }

    fn before_read(&mut self, recorder: &mut Recorder) {
        recorder.events.push(Event::BeforeRead(self.label.clone()));
    }

    fn before_write(&mut self, recorder: &mut Recorder) {
        recorder.events.push(Event::BeforeWrite(self.label.clone()));
    }
}
