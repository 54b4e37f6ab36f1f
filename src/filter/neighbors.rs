//! Face-connected neighborhoods and their physical step lengths

/// One face neighbor: a unit step along a single axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceNeighbor {
    /// Axis of the step
    pub axis: usize,
    /// Direction, -1 or +1
    pub step: i64,
}

impl FaceNeighbor {
    /// Full offset vector in a `dimension`-D image
    pub fn offset(&self, dimension: usize) -> Vec<i64> {
        let mut offset = vec![0; dimension];
        offset[self.axis] = self.step;
        offset
    }
}

/// The 2·D face neighbors, ordered -1 then +1 along each axis in turn
pub fn face_neighbors(dimension: usize) -> Vec<FaceNeighbor> {
    (0..dimension)
        .flat_map(|axis| [-1, 1].into_iter().map(move |step| FaceNeighbor { axis, step }))
        .collect()
}

/// Euclidean length of each neighbor offset, scaled by the image spacing
pub fn neighbor_deltas(neighbors: &[FaceNeighbor], spacing: &[f64]) -> Vec<f32> {
    neighbors
        .iter()
        .map(|n| {
            let squared: f32 = n
                .offset(spacing.len())
                .iter()
                .zip(spacing)
                .map(|(&o, &s)| {
                    let d = (o as f64 * s) as f32;
                    d * d
                })
                .sum();
            squared.sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_neighbors_2d() {
        let offsets: Vec<_> = face_neighbors(2).iter().map(|n| n.offset(2)).collect();
        assert_eq!(
            offsets,
            vec![vec![-1, 0], vec![1, 0], vec![0, -1], vec![0, 1]]
        );
    }

    #[test]
    fn test_face_neighbors_3d() {
        let neighbors = face_neighbors(3);
        assert_eq!(neighbors.len(), 6);
        assert_eq!(neighbors[4], FaceNeighbor { axis: 2, step: -1 });
        assert_eq!(neighbors[5].offset(3), vec![0, 0, 1]);
    }

    #[test]
    fn test_deltas_follow_spacing() {
        let neighbors = face_neighbors(3);
        let deltas = neighbor_deltas(&neighbors, &[0.5, 1.0, 2.5]);
        assert_eq!(deltas, vec![0.5, 0.5, 1.0, 1.0, 2.5, 2.5]);
    }
}
