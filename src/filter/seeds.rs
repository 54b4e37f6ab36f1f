//! Seed extraction along scan lines
//!
//! Every run of mask pixels along an axis ends either at a transition to an
//! unmasked pixel or at the edge of the processed region. The end pixel of the
//! run becomes a seed carrying the label just across the transition, or the
//! background label at the region edge.

use crate::models::{Image, LabelPixel, Mask, Region};

/// A mask pixel with the label it starts out carrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed<T> {
    /// Buffer position
    pub offset: usize,
    /// Label to propagate
    pub value: T,
}

/// Collect seeds for every scan line of `region` along every axis.
///
/// `region` must lie inside `image`, and `mask` must match its size.
pub fn collect_seeds<T: LabelPixel>(
    image: &Image<T>,
    mask: &Mask,
    region: &Region,
    background: T,
) -> Vec<Seed<T>> {
    let data = image.data();
    let strides = image.strides();
    let mut seeds = Vec::new();

    for direction in 0..image.dimension() {
        let len = region.size[direction];
        let stride = strides[direction];

        let mut starts = region.clone();
        starts.size[direction] = 1;

        for start in starts.indices() {
            let Some(base) = image.linear_index(&start) else {
                continue;
            };

            let mut last_offset = base;
            let mut last_inside = mask.contains(base);

            // mask touching the region edge
            if last_inside {
                seeds.push(Seed {
                    offset: base,
                    value: background,
                });
            }

            for k in 1..len {
                let offset = base + k * stride;
                let inside = mask.contains(offset);
                if inside != last_inside {
                    if last_inside {
                        // leaving the mask
                        seeds.push(Seed {
                            offset: last_offset,
                            value: data[offset],
                        });
                    } else {
                        // entering the mask
                        seeds.push(Seed {
                            offset,
                            value: data[last_offset],
                        });
                    }
                    last_inside = inside;
                }
                last_offset = offset;
            }

            if last_inside {
                seeds.push(Seed {
                    offset: last_offset,
                    value: background,
                });
            }
        }
    }

    seeds
}
