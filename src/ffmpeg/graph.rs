//! `-filter_complex` description for a multi-segment preview.
//!
//! For a plan of N segments the rendered graph is
//!
//! ```text
//! [0]split=N[v1]..[vN]; [v1]trim=S:E,setpts=PTS-STARTPTS[v1t]; ...;
//! [v1t]..[vNt]concat=n=N:v=1:a=0[vc]; [vc]scale=W:-2[v]
//! ```
//!
//! and the encoder maps its output from `[v]`.

use std::fmt;

use crate::segments::{Segment, SegmentPlan};

/// Label of the final scaled stream.
pub const OUTPUT_LABEL: &str = "v";
const CONCAT_LABEL: &str = "vc";
const INPUT_LABEL: &str = "0";

/// One `[in]..filter[out]..` chain of the graph.
#[derive(Debug, Clone, PartialEq)]
struct Chain {
    inputs: Vec<String>,
    filter: String,
    outputs: Vec<String>,
}

impl Chain {
    fn new(inputs: Vec<String>, filter: String, outputs: Vec<String>) -> Self {
        Self {
            inputs,
            filter,
            outputs,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{label}]")?;
        }
        f.write_str(&self.filter)?;
        for label in &self.outputs {
            write!(f, "[{label}]")?;
        }
        Ok(())
    }
}

/// `scale` expression keeping the aspect ratio with an even height.
pub(crate) fn scale_filter(width: u32) -> String {
    format!("scale={width}:-2")
}

fn segment_label(index: usize) -> String {
    format!("v{}", index + 1)
}

fn trimmed_label(index: usize) -> String {
    format!("v{}t", index + 1)
}

/// Accumulates segments and renders the split → trim → concat → scale graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    segments: Vec<Segment>,
    scale_width: u32,
}

impl FilterGraph {
    pub fn new(scale_width: u32) -> Self {
        Self {
            segments: Vec::new(),
            scale_width,
        }
    }

    pub fn from_plan(plan: &SegmentPlan, scale_width: u32) -> Self {
        let mut graph = Self::new(scale_width);
        graph.segments.extend(plan.iter().copied());
        graph
    }

    pub fn push(&mut self, segment: Segment) -> &mut Self {
        self.segments.push(segment);
        self
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// `-map` argument for the rendered graph.
    pub fn output_map(&self) -> String {
        format!("[{OUTPUT_LABEL}]")
    }

    fn chains(&self) -> Vec<Chain> {
        let n = self.segments.len();
        if n == 0 {
            return vec![Chain::new(
                vec![INPUT_LABEL.into()],
                scale_filter(self.scale_width),
                vec![OUTPUT_LABEL.into()],
            )];
        }

        let mut chains = Vec::with_capacity(n + 3);
        chains.push(Chain::new(
            vec![INPUT_LABEL.into()],
            format!("split={n}"),
            (0..n).map(segment_label).collect(),
        ));
        for (i, segment) in self.segments.iter().enumerate() {
            chains.push(Chain::new(
                vec![segment_label(i)],
                format!(
                    "trim={}:{},setpts=PTS-STARTPTS",
                    segment.start, segment.end
                ),
                vec![trimmed_label(i)],
            ));
        }
        chains.push(Chain::new(
            (0..n).map(trimmed_label).collect(),
            format!("concat=n={n}:v=1:a=0"),
            vec![CONCAT_LABEL.into()],
        ));
        chains.push(Chain::new(
            vec![CONCAT_LABEL.into()],
            scale_filter(self.scale_width),
            vec![OUTPUT_LABEL.into()],
        ));
        chains
    }

    pub fn render(&self) -> String {
        self.chains()
            .iter()
            .map(Chain::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::plan_segments;

    #[test]
    fn renders_three_segment_graph() {
        let graph = FilterGraph::from_plan(&plan_segments(3, 1.0, 5.0), 320);
        assert_eq!(
            graph.render(),
            "[0]split=3[v1][v2][v3]; \
             [v1]trim=0.75:1.75,setpts=PTS-STARTPTS[v1t]; \
             [v2]trim=2:3,setpts=PTS-STARTPTS[v2t]; \
             [v3]trim=3.25:4.25,setpts=PTS-STARTPTS[v3t]; \
             [v1t][v2t][v3t]concat=n=3:v=1:a=0[vc]; \
             [vc]scale=320:-2[v]"
        );
    }

    #[test]
    fn renders_single_segment_graph() {
        let mut graph = FilterGraph::new(480);
        graph.push(Segment {
            start: 4.0,
            end: 6.0,
        });
        assert_eq!(
            graph.to_string(),
            "[0]split=1[v1]; [v1]trim=4:6,setpts=PTS-STARTPTS[v1t]; \
             [v1t]concat=n=1:v=1:a=0[vc]; [vc]scale=480:-2[v]"
        );
    }

    #[test]
    fn keeps_fractional_and_negative_bounds_verbatim() {
        let mut graph = FilterGraph::new(320);
        graph
            .push(Segment {
                start: -0.5,
                end: 0.5,
            })
            .push(Segment {
                start: 1.0 / 3.0,
                end: 4.0 / 3.0,
            });
        let rendered = graph.render();
        assert!(rendered.contains("[v1]trim=-0.5:0.5,"));
        assert!(rendered.contains("[v2]trim=0.3333333333333333:1.3333333333333333,"));
    }

    #[test]
    fn empty_graph_only_scales_the_input() {
        let graph = FilterGraph::new(320);
        assert_eq!(graph.render(), "[0]scale=320:-2[v]");
        assert_eq!(graph.output_map(), "[v]");
    }

    #[test]
    fn every_split_label_is_trimmed_and_concatenated_once() {
        let graph = FilterGraph::from_plan(&plan_segments(7, 0.5, 90.0), 320);
        let rendered = graph.render();
        for i in 1..=7 {
            assert_eq!(rendered.matches(&format!("[v{i}]")).count(), 2);
            assert_eq!(rendered.matches(&format!("[v{i}t]")).count(), 2);
        }
        assert_eq!(rendered.matches("; ").count(), 7 + 2);
    }
}
