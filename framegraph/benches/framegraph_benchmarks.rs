use std::convert::Infallible;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use redlilium_framegraph::{FrameGraph, FrameGraphResource, ResourceHandle};

#[derive(Debug, Default)]
struct Texture {
    size: u32,
}

impl FrameGraphResource for Texture {
    type Desc = u32;
    type Error = Infallible;

    fn acquire(&mut self, _: &mut (), desc: &u32) -> Result<(), Infallible> {
        self.size = *desc;
        Ok(())
    }

    fn release(&mut self, _: &mut ()) -> Result<(), Infallible> {
        self.size = 0;
        Ok(())
    }
}

#[derive(Default)]
struct Output {
    target: ResourceHandle,
}

/// `count` passes, each reading the previous pass's output. The last one is persistent.
fn build_chain(graph: &mut FrameGraph, count: usize) {
    let mut previous = ResourceHandle::INVALID;
    for i in 0..count {
        let last = i + 1 == count;
        previous = graph
            .add_pass::<Output, _, _>(
                format!("pass_{i}"),
                move |builder, data| {
                    if previous.is_valid() {
                        builder.read(previous);
                    }
                    data.target = builder.create::<Texture>(format!("target_{i}"), 256);
                    data.target = builder.write(data.target);
                    if last {
                        builder.mark_as_persistent();
                    }
                },
                |data, ctx| {
                    black_box(ctx.resource::<Texture>(data.target)?.size);
                    Ok(())
                },
            )
            .target;
    }
}

/// A live chain plus `count` dead branches hanging off its first resource.
fn build_with_dead_branches(graph: &mut FrameGraph, count: usize) {
    build_chain(graph, 4);
    let root = graph.resources()[0].handle();
    for i in 0..count {
        graph.add_pass::<Output, _, _>(
            format!("dead_{i}"),
            move |builder, data| {
                builder.read(root);
                data.target = builder.create::<Texture>(format!("dead_target_{i}"), 64);
                data.target = builder.write(data.target);
            },
            |_, _| Ok(()),
        );
    }
}

// ---------------------------------------------------------------------------
// Frame graph construction
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion) {
    c.bench_function("frame_graph_build_32_passes_chain", |b| {
        let mut graph = FrameGraph::new();
        b.iter(|| {
            graph.reset();
            build_chain(&mut graph, 32);
            black_box(graph.pass_count());
        });
    });
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

fn bench_compile(c: &mut Criterion) {
    c.bench_function("frame_graph_compile_128_passes_chain", |b| {
        let mut graph = FrameGraph::new();
        build_chain(&mut graph, 128);
        b.iter(|| black_box(graph.compile().unwrap()));
    });

    c.bench_function("frame_graph_compile_64_dead_branches", |b| {
        let mut graph = FrameGraph::new();
        build_with_dead_branches(&mut graph, 64);
        b.iter(|| black_box(graph.compile().unwrap()));
    });
}

// ---------------------------------------------------------------------------
// Full frame
// ---------------------------------------------------------------------------

fn bench_frame(c: &mut Criterion) {
    c.bench_function("frame_graph_full_frame_32_passes", |b| {
        let mut graph = FrameGraph::new();
        b.iter(|| {
            graph.reset();
            build_chain(&mut graph, 32);
            graph.compile().unwrap();
            graph.execute(&mut ()).unwrap();
        });
    });
}

criterion_group!(benches, bench_build, bench_compile, bench_frame);
criterion_main!(benches);
