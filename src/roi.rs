use crate::error::Error;

/// Axis-aligned pixel rectangle used to clip every sub-dataset read to the
/// same window. Coordinates are (upper-left, lower-right) pixel corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    ulx: isize,
    uly: isize,
    lrx: isize,
    lry: isize,
}

impl Roi {
    pub fn new(ulx: isize, uly: isize, lrx: isize, lry: isize) -> Result<Self, Error> {
        if ulx >= lrx {
            return Err(Error::InvalidRoi(format!("ulx {} !< lrx {}", ulx, lrx)));
        }

        if uly >= lry {
            return Err(Error::InvalidRoi(format!("uly {} !< lry {}", uly, lry)));
        }

        Ok(Roi { ulx, uly, lrx, lry })
    }

    pub fn offset(&self) -> (isize, isize) {
        (self.ulx, self.uly)
    }

    pub fn size(&self) -> (usize, usize) {
        ((self.lrx - self.ulx) as usize, (self.lry - self.uly) as usize)
    }
}

impl TryFrom<[isize; 4]> for Roi {
    type Error = Error;

    fn try_from(rect: [isize; 4]) -> Result<Self, Error> {
        let [ulx, uly, lrx, lry] = rect;
        Roi::new(ulx, uly, lrx, lry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_corner_ordering() {
        let valid_roi = Roi::new(1100, 640, 1400, 740);
        assert!(valid_roi.is_ok());

        // Reversed x corners
        let invalid_x = Roi::new(1400, 640, 1100, 740);
        assert!(invalid_x.is_err());

        // Reversed y corners
        let invalid_y = Roi::new(1100, 740, 1400, 640);
        assert!(invalid_y.is_err());

        // Degenerate (zero-width) window
        let degenerate = Roi::new(100, 0, 100, 50);
        assert!(degenerate.is_err());
    }

    #[test]
    fn test_roi_window_geometry() {
        let roi = Roi::new(1100, 640, 1400, 740).unwrap();

        assert_eq!(roi.offset(), (1100, 640));
        assert_eq!(roi.size(), (300, 100));
    }

    #[test]
    fn test_roi_from_four_components() {
        let roi = Roi::try_from([0, 0, 10, 20]).unwrap();
        assert_eq!(roi.size(), (10, 20));

        assert!(Roi::try_from([10, 0, 0, 20]).is_err());
    }
}
