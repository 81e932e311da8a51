//! Indexed access to extracted chips
//!
//! A finite random-access view pairing every chip with the coordinate it
//! was cut around, as consumed when assembling training data.

use ndarray::Array3;

use super::chip::Chip;
use crate::coordinate::Point;
use crate::errors::{ChipError, ChipResult};

#[derive(Debug, Clone, Default)]
pub struct ChipDataset {
    chips: Vec<Array3<f64>>,
    coords: Vec<Point>,
}

impl ChipDataset {
    /// Pairs chips with coordinates; both sequences must have the same length
    pub fn new(chips: Vec<Array3<f64>>, coords: Vec<Point>) -> ChipResult<Self> {
        if chips.len() != coords.len() {
            return Err(ChipError::Precondition(format!(
                "{} chips but {} coordinates", chips.len(), coords.len())));
        }
        Ok(ChipDataset { chips, coords })
    }

    /// Builds a dataset from extracted chips, repeating each point once per year
    pub fn from_chips(chips: Vec<Chip>) -> Self {
        let (chips, coords) = chips.into_iter().map(|chip| (chip.data, chip.point)).unzip();
        ChipDataset { chips, coords }
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&Array3<f64>, &Point)> {
        Some((self.chips.get(index)?, self.coords.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Array3<f64>, &Point)> {
        self.chips.iter().zip(self.coords.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    #[test]
    fn test_length_mismatch() {
        let result = ChipDataset::new(vec![Array3::zeros((1, 1, 1))], vec![]);
        assert!(matches!(result, Err(ChipError::Precondition(_))));
    }

    #[test]
    fn test_indexing() {
        let dataset = ChipDataset::new(
            vec![Array3::zeros((1, 3, 3)), Array3::ones((1, 3, 3))],
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        ).unwrap();

        assert_eq!(dataset.len(), 2);
        let (chip, point) = dataset.get(1).unwrap();
        assert_eq!(chip[[0, 0, 0]], 1.0);
        assert_eq!(*point, Point::new(3.0, 4.0));
        assert!(dataset.get(2).is_none());
        assert_eq!(dataset.iter().count(), 2);
    }

    #[test]
    fn test_from_chips_repeats_points_per_year() {
        let point = Point::new(10.0, 50.0);
        let chips = (0..3).map(|year| Chip {
            point_index: 0,
            year,
            point,
            data: Array3::from_elem((2, 5, 5), year as f64),
            transform: GeoTransform::new(0.0, 1.0, 0.0, -1.0),
        }).collect();

        let dataset = ChipDataset::from_chips(chips);

        assert_eq!(dataset.len(), 3);
        assert!(dataset.iter().all(|(_, p)| *p == point));
        assert_eq!(dataset.get(2).unwrap().0[[0, 0, 0]], 2.0);
    }
}
