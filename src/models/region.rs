//! N-dimensional index regions

use std::fmt;
use std::str::FromStr;

use crate::error::{DissolveError, Result};

/// An axis-aligned box of pixel indices: a start index and a size per axis
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    /// Start index
    pub index: Vec<i64>,
    /// Extent along each axis
    pub size: Vec<usize>,
}

impl Region {
    /// Create a new region
    pub fn new(index: Vec<i64>, size: Vec<usize>) -> Result<Self> {
        if index.len() != size.len() {
            return Err(DissolveError::region(format!(
                "index has {} axes but size has {}",
                index.len(),
                size.len()
            )));
        }
        for (&start, &extent) in index.iter().zip(&size) {
            let end = i64::try_from(extent)
                .ok()
                .and_then(|extent| start.checked_add(extent));
            if end.is_none() {
                return Err(DissolveError::region(format!(
                    "extent {} from {} exceeds the index range",
                    extent, start
                )));
            }
        }
        Ok(Self { index, size })
    }

    /// Region starting at the origin with the given size
    pub fn from_size(size: &[usize]) -> Self {
        Self {
            index: vec![0; size.len()],
            size: size.to_vec(),
        }
    }

    /// Number of axes
    pub fn dimension(&self) -> usize {
        self.size.len()
    }

    /// Check if the region covers no pixels
    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|&s| s == 0)
    }

    /// Exclusive upper bound along `axis`
    pub fn upper(&self, axis: usize) -> i64 {
        self.index[axis] + self.size[axis] as i64
    }

    /// Check if an index lies inside the region
    pub fn is_inside(&self, idx: &[i64]) -> bool {
        idx.len() == self.dimension()
            && idx
                .iter()
                .enumerate()
                .all(|(axis, &i)| i >= self.index[axis] && i < self.upper(axis))
    }

    /// Clip this region to `bounds`, failing if nothing remains
    pub fn crop(&self, bounds: &Region) -> Result<Region> {
        if self.dimension() != bounds.dimension() {
            return Err(DissolveError::region(format!(
                "region has {} axes, image has {}",
                self.dimension(),
                bounds.dimension()
            )));
        }

        let mut index = Vec::with_capacity(self.dimension());
        let mut size = Vec::with_capacity(self.dimension());
        for axis in 0..self.dimension() {
            let lo = self.index[axis].max(bounds.index[axis]);
            let hi = self.upper(axis).min(bounds.upper(axis));
            if hi <= lo {
                return Err(DissolveError::region(format!(
                    "{} does not overlap {}",
                    self, bounds
                )));
            }
            index.push(lo);
            size.push((hi - lo) as usize);
        }

        Ok(Region { index, size })
    }

    /// Iterate over all indices, first axis fastest
    pub fn indices(&self) -> RegionIndices<'_> {
        RegionIndices {
            region: self,
            current: if self.is_empty() {
                None
            } else {
                Some(self.index.clone())
            },
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |v: Vec<String>| v.join(",");
        write!(
            f,
            "{}:{}",
            join(self.index.iter().map(|i| i.to_string()).collect()),
            join(self.size.iter().map(|s| s.to_string()).collect())
        )
    }
}

impl FromStr for Region {
    type Err = DissolveError;

    /// Parse `i,j,k:sx,sy,sz`
    fn from_str(s: &str) -> Result<Self> {
        let (index, size) = s
            .split_once(':')
            .ok_or_else(|| DissolveError::region(format!("expected INDEX:SIZE, got '{}'", s)))?;

        let index = parse_list::<i64>(index)
            .map_err(|_| DissolveError::region(format!("invalid index '{}'", index)))?;
        let size = parse_list::<usize>(size)
            .map_err(|_| DissolveError::region(format!("invalid size '{}'", size)))?;

        Region::new(index, size)
    }
}

/// Parse a comma separated list of numbers
pub fn parse_list<T: FromStr>(s: &str) -> std::result::Result<Vec<T>, T::Err> {
    s.split(',').map(|part| part.trim().parse()).collect()
}

/// Iterator over the indices of a [`Region`]
pub struct RegionIndices<'a> {
    region: &'a Region,
    current: Option<Vec<i64>>,
}

impl Iterator for RegionIndices<'_> {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.take()?;

        let mut next = out.clone();
        for axis in 0..next.len() {
            next[axis] += 1;
            if next[axis] < self.region.upper(axis) {
                self.current = Some(next);
                return Some(out);
            }
            next[axis] = self.region.index[axis];
        }

        // wrapped on every axis: iteration complete
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_inside() {
        let region = Region::new(vec![1, 2], vec![3, 2]).unwrap();
        assert!(region.is_inside(&[1, 2]));
        assert!(region.is_inside(&[3, 3]));
        assert!(!region.is_inside(&[4, 3]));
        assert!(!region.is_inside(&[0, 2]));
        assert!(!region.is_inside(&[1, 4]));
        assert!(!region.is_inside(&[1]));
    }

    #[test]
    fn test_indices_order() {
        let region = Region::new(vec![0, 5], vec![2, 2]).unwrap();
        let all: Vec<_> = region.indices().collect();
        assert_eq!(all, vec![vec![0, 5], vec![1, 5], vec![0, 6], vec![1, 6]]);

        let empty = Region::new(vec![0, 0], vec![0, 4]).unwrap();
        assert_eq!(empty.indices().count(), 0);
    }

    #[test]
    fn test_crop() {
        let bounds = Region::from_size(&[10, 10]);
        let region = Region::new(vec![-3, 8], vec![5, 5]).unwrap();
        let cropped = region.crop(&bounds).unwrap();
        assert_eq!(cropped, Region::new(vec![0, 8], vec![2, 2]).unwrap());

        let outside = Region::new(vec![20, 0], vec![2, 2]).unwrap();
        assert!(outside.crop(&bounds).is_err());
    }

    #[test]
    fn test_parse_region() {
        let region: Region = "30,20,50:10,20,30".parse().unwrap();
        assert_eq!(region.index, vec![30, 20, 50]);
        assert_eq!(region.size, vec![10, 20, 30]);
        assert_eq!(region.to_string(), "30,20,50:10,20,30");

        assert!("1,2".parse::<Region>().is_err());
        assert!("1,2:3".parse::<Region>().is_err());
        assert!("a,b:1,1".parse::<Region>().is_err());
    }

    #[test]
    fn test_extent_past_index_range() {
        assert!(matches!(
            "9223372036854775807,0:10,1".parse::<Region>(),
            Err(DissolveError::InvalidRegion(_))
        ));
        assert!(Region::new(vec![0], vec![usize::MAX]).is_err());

        let last: Region = "9223372036854775806:1".parse().unwrap();
        assert_eq!(last.upper(0), i64::MAX);
    }
}
