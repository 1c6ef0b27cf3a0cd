//! Graphviz report of a frame graph.
//!
//! Passes are drawn as rounded boxes, resources as filled boxes, and every
//! declared access as an edge from the pass to the resource:
//! creates in green, writes in gold, reads in red.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::FrameGraphResult;
use crate::graph::FrameGraph;

const PASS_COLOR: &str = "darkorange";
const CULLED_PASS_COLOR: &str = "lightgray";
const TRANSIENT_COLOR: &str = "skyblue";
const IMPORTED_COLOR: &str = "steelblue";
const CREATE_COLOR: &str = "seagreen";
const WRITE_COLOR: &str = "gold";
const READ_COLOR: &str = "firebrick";

impl<C: 'static> FrameGraph<C> {
    /// Write the graph in DOT format.
    ///
    /// Reference counts are only meaningful after [`compile`](Self::compile).
    pub fn write_dot<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "digraph \"{}\" {{", escape(&self.config().label))?;
        writeln!(writer, "rankdir = LR")?;
        writeln!(writer, "splines = spline")?;
        writeln!(
            writer,
            "node [shape=rectangle, fontname=\"helvetica\", fontsize=12]"
        )?;
        writeln!(writer)?;

        for pass in self.passes() {
            let color = if pass.is_active() {
                PASS_COLOR
            } else {
                CULLED_PASS_COLOR
            };
            writeln!(
                writer,
                "pass_{} [label=\"{}\\nRefs: {}\", style=\"rounded, filled\", fillcolor={}]",
                pass.handle().index(),
                escape(pass.name()),
                pass.ref_count(),
                color
            )?;
        }
        writeln!(writer)?;

        for resource in self.resources() {
            let color = if resource.is_transient() {
                TRANSIENT_COLOR
            } else {
                IMPORTED_COLOR
            };
            writeln!(
                writer,
                "res_{} [label=\"{}\\nRefs: {}\\nHandle: {}\\nVersion: {}\", style=filled, fillcolor={}]",
                resource.handle().index(),
                escape(resource.name()),
                resource.ref_count(),
                resource.handle().index(),
                resource.version(),
                color
            )?;
        }
        writeln!(writer)?;

        for pass in self.passes() {
            let edges = [
                (pass.creates(), CREATE_COLOR),
                (pass.writes(), WRITE_COLOR),
                (pass.reads(), READ_COLOR),
            ];
            for (handles, color) in edges {
                if handles.is_empty() {
                    continue;
                }
                let targets: Vec<String> = handles
                    .iter()
                    .map(|handle| format!("res_{}", handle.index()))
                    .collect();
                writeln!(
                    writer,
                    "pass_{} -> {{ {} }} [color={}]",
                    pass.handle().index(),
                    targets.join(" "),
                    color
                )?;
            }
        }

        writeln!(writer, "}}")
    }

    /// Write the DOT report to a file, replacing any previous content.
    pub fn dump_to_file(&self, path: impl AsRef<Path>) -> FrameGraphResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_dot(&mut writer)?;
        writer.flush()?;
        log::debug!(
            "Frame graph `{}` written to {}",
            self.config().label,
            path.display()
        );
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
