//! The dissolve mask filter
//!
//! Pixels inside the mask are dissolved by assigning the label of the nearest
//! region outside of it. Distances are geodesic (measured through the mask
//! only) and scaled by the image spacing, so the fill advances from the mask
//! boundary towards its interior.

mod neighbors;
mod seeds;

pub use neighbors::{face_neighbors, neighbor_deltas, FaceNeighbor};
pub use seeds::{collect_seeds, Seed};

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Image, LabelPixel, Mask, Region};
use crate::progress::{ProgressObserver, ProgressReporter};

/// Replaces labels inside a mask with the surrounding labels
pub struct DissolveMaskFilter<T: LabelPixel> {
    /// Label assigned where the mask touches the edge of the processed region
    background: T,
    /// Region to process; the whole image when unset
    region: Option<Region>,
    /// Progress observer
    observer: Option<Arc<dyn ProgressObserver>>,
    /// Maximum number of progress updates per run
    updates: usize,
}

/// Result of running the filter
#[derive(Debug, Clone)]
pub struct DissolveOutput<T> {
    /// Output label image
    pub image: Image<T>,
    /// Summary counters
    pub summary: DissolveSummary,
}

/// Counters describing one filter run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DissolveSummary {
    /// Mask pixels inside the processed region
    pub mask_pixels: usize,
    /// Mask pixels that received a label
    pub pixels_dissolved: usize,
    /// Pixels whose label differs from the input
    pub pixels_changed: usize,
    /// Number of seeds found on mask boundaries
    pub seeds: usize,
}

impl<T: LabelPixel> Default for DissolveMaskFilter<T> {
    fn default() -> Self {
        Self {
            background: T::default(),
            region: None,
            observer: None,
            updates: ProgressReporter::DEFAULT_UPDATES,
        }
    }
}

impl<T: LabelPixel> DissolveMaskFilter<T> {
    /// Create a filter with a zero background and no region restriction
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the background label
    pub fn with_background(mut self, background: T) -> Self {
        self.background = background;
        self
    }

    /// Restrict processing to a region
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Attach a progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set the maximum number of progress updates
    pub fn with_progress_updates(mut self, updates: usize) -> Self {
        self.updates = updates;
        self
    }

    /// The background label
    pub fn background(&self) -> T {
        self.background
    }

    /// The requested region, if any
    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Run the filter
    pub fn apply(&self, image: &Image<T>, mask: &Mask) -> Result<DissolveOutput<T>> {
        mask.check_size(image.size())?;

        let largest = image.largest_region();
        let region = match &self.region {
            Some(region) => region.crop(&largest)?,
            None => largest,
        };

        let mut output = image.clone();
        let mut summary = DissolveSummary {
            mask_pixels: mask.count_in(&region),
            ..Default::default()
        };

        let seeds = collect_seeds(image, mask, &region, self.background);
        summary.seeds = seeds.len();
        tracing::debug!(
            seeds = seeds.len(),
            mask_pixels = summary.mask_pixels,
            region = %region,
            "collected dissolve seeds"
        );

        let neighbors = face_neighbors(image.dimension());
        let deltas = neighbor_deltas(&neighbors, image.spacing());
        let strides = image.strides();
        let size = image.size();

        let mut distance = vec![f32::MAX; image.len()];
        let mut finalized = vec![false; image.len()];
        let mut queue = BinaryHeap::with_capacity(seeds.len());
        let mut order = 0u64;

        for seed in seeds {
            distance[seed.offset] = 0.0;
            queue.push(Node {
                distance: 0.0,
                order,
                offset: seed.offset,
                value: seed.value,
            });
            order += 1;
        }

        let mut progress = ProgressReporter::new(
            self.observer.as_deref(),
            summary.mask_pixels,
            self.updates,
        );

        let out = output.data_mut();
        while let Some(node) = queue.pop() {
            // a shorter path, or an earlier one of equal length, already claimed it
            if finalized[node.offset] || distance[node.offset] < node.distance {
                continue;
            }
            finalized[node.offset] = true;
            out[node.offset] = node.value;
            progress.completed_pixel();

            for (neighbor, &delta) in neighbors.iter().zip(&deltas) {
                let axis = neighbor.axis;
                let coord = ((node.offset / strides[axis]) % size[axis]) as i64 + neighbor.step;
                if coord < region.index[axis] || coord >= region.upper(axis) {
                    continue;
                }

                let n_offset = if neighbor.step > 0 {
                    node.offset + strides[axis]
                } else {
                    node.offset - strides[axis]
                };
                if finalized[n_offset] || !mask.contains(n_offset) {
                    continue;
                }

                let n_distance = node.distance + delta;
                if distance[n_offset] > n_distance {
                    distance[n_offset] = n_distance;
                    queue.push(Node {
                        distance: n_distance,
                        order,
                        offset: n_offset,
                        value: node.value,
                    });
                    order += 1;
                }
            }
        }

        summary.pixels_dissolved = progress.completed();
        progress.finish();

        summary.pixels_changed = image
            .data()
            .iter()
            .zip(output.data())
            .filter(|(a, b)| a != b)
            .count();

        tracing::debug!(
            dissolved = summary.pixels_dissolved,
            changed = summary.pixels_changed,
            "dissolve finished"
        );

        Ok(DissolveOutput {
            image: output,
            summary,
        })
    }
}

impl<T: LabelPixel> fmt::Display for DissolveMaskFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DissolveMaskFilter")?;
        writeln!(f, "  Background value : {}", self.background)?;
        match &self.region {
            Some(region) => writeln!(f, "  Region : {}", region),
            None => writeln!(f, "  Region : largest possible"),
        }
    }
}

impl<T: LabelPixel> fmt::Debug for DissolveMaskFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DissolveMaskFilter")
            .field("background", &self.background)
            .field("region", &self.region)
            .field("observer", &self.observer.is_some())
            .field("updates", &self.updates)
            .finish()
    }
}

/// Priority queue entry: smallest distance first, then first queued
struct Node<T> {
    distance: f32,
    order: u64,
    offset: usize,
    value: T,
}

impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Node<T> {}

impl<T> PartialOrd for Node<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Node<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.order.cmp(&self.order))
    }
}
