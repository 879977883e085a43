//! Evenly spaced preview segments.
//!
//! The timeline is cut into `parts + 1` equal slots and one segment is
//! centred on each inner slot boundary, so the first and last segments keep
//! a slot of margin from the ends of the source. Windows are not clamped:
//! a long `part_duration` can start before zero, end past the source or
//! overlap its neighbour.

/// A `[start, end]` window of the source, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Ordered segments; segment `i` becomes graph label `v{i + 1}`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct SegmentPlan(Vec<Segment>);

impl SegmentPlan {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of segment lengths, i.e. the expected preview length.
    pub fn total_duration(&self) -> f64 {
        self.0.iter().map(Segment::duration).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a SegmentPlan {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Segment>> for SegmentPlan {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

pub fn plan_segments(parts: u32, part_duration: f64, total_duration: f64) -> SegmentPlan {
    let div = total_duration / (f64::from(parts) + 1.0);
    let half = part_duration / 2.0;
    (1..=parts)
        .map(|a| {
            let center = div * f64::from(a);
            Segment {
                start: center - half,
                end: center + half,
            }
        })
        .collect::<Vec<_>>()
        .into()
}
