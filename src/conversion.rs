//! Bounding-box conversions into normalized center/size form.

/// Normalized YOLO-style box: center and size divided by the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Back to pixel corners `(xmin, ymin, xmax, ymax)`.
    #[cfg(test)]
    pub fn to_corners(&self, img_w: f64, img_h: f64) -> (f64, f64, f64, f64) {
        let half_w = self.width * img_w / 2.0;
        let half_h = self.height * img_h / 2.0;
        let cx = self.x_center * img_w;
        let cy = self.y_center * img_h;
        (cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }
}

/// Bounding box as read from a source, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceBox {
    /// Pixel corners `xmin, ymin, xmax, ymax` (VOC).
    Corners([f64; 4]),
    /// Pixel top-left origin plus width/height `x, y, w, h` (COCO).
    OriginSize([f64; 4]),
    /// Already normalized center/size (YOLO), passed through unchanged.
    Normalized(NormalizedBox),
}

impl SourceBox {
    /// Whether converting this box needs the image dimensions.
    pub fn needs_dimensions(&self) -> bool {
        !matches!(self, SourceBox::Normalized(_))
    }

    /// Width and height are both non-negative numbers.
    pub fn has_valid_size(&self) -> bool {
        let (width, height) = match *self {
            SourceBox::Corners([xmin, ymin, xmax, ymax]) => (xmax - xmin, ymax - ymin),
            SourceBox::OriginSize([_, _, w, h]) => (w, h),
            SourceBox::Normalized(bbox) => (bbox.width, bbox.height),
        };
        width >= 0.0 && height >= 0.0
    }

    /// Normalize against the given image size.
    ///
    /// Unknown dimensions fall back to a divisor of 1, so pixel boxes come out
    /// in pixel units. Callers that care check [`needs_dimensions`](Self::needs_dimensions).
    pub fn normalize(&self, dims: Option<(u32, u32)>) -> NormalizedBox {
        let (img_w, img_h) = divisors(dims);
        match *self {
            SourceBox::Corners([xmin, ymin, xmax, ymax]) => {
                convert_voc_to_yolo(xmin, ymin, xmax, ymax, img_w, img_h)
            }
            SourceBox::OriginSize([x, y, w, h]) => convert_coco_to_yolo(x, y, w, h, img_w, img_h),
            SourceBox::Normalized(bbox) => bbox,
        }
    }
}

fn divisors(dims: Option<(u32, u32)>) -> (f64, f64) {
    match dims {
        Some((w, h)) if w > 0 && h > 0 => (w as f64, h as f64),
        _ => (1.0, 1.0),
    }
}

/// Corner box in pixels to normalized center/size.
pub fn convert_voc_to_yolo(
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    img_w: f64,
    img_h: f64,
) -> NormalizedBox {
    let x_center = (xmin + xmax) / 2.0 / img_w;
    let y_center = (ymin + ymax) / 2.0 / img_h;
    let width = (xmax - xmin) / img_w;
    let height = (ymax - ymin) / img_h;

    NormalizedBox::new(x_center, y_center, width, height)
}

/// Origin/size box in pixels to normalized center/size.
pub fn convert_coco_to_yolo(x: f64, y: f64, w: f64, h: f64, img_w: f64, img_h: f64) -> NormalizedBox {
    NormalizedBox::new((x + w / 2.0) / img_w, (y + h / 2.0) / img_h, w / img_w, h / img_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_convert_voc_to_yolo() {
        let bbox = convert_voc_to_yolo(10.0, 10.0, 50.0, 50.0, 100.0, 100.0);

        assert_eq!(bbox.x_center, 0.3);
        assert_eq!(bbox.y_center, 0.3);
        assert_eq!(bbox.width, 0.4);
        assert_eq!(bbox.height, 0.4);
    }

    #[test]
    fn test_convert_coco_to_yolo() {
        let bbox = convert_coco_to_yolo(20.0, 40.0, 60.0, 20.0, 200.0, 100.0);

        assert_relative_eq!(bbox.x_center, 0.25);
        assert_relative_eq!(bbox.y_center, 0.5);
        assert_relative_eq!(bbox.width, 0.3);
        assert_relative_eq!(bbox.height, 0.2);
    }

    #[test]
    fn test_corner_round_trip() {
        let cases = [
            ([0.0, 0.0, 640.0, 480.0], (640, 480)),
            ([12.5, 7.0, 13.0, 400.25], (640, 480)),
            ([100.0, 200.0, 100.0, 200.0], (1920, 1080)),
            ([3.0, 5.0, 97.0, 41.0], (97, 41)),
        ];

        for (corners, (w, h)) in cases {
            let bbox = SourceBox::Corners(corners).normalize(Some((w, h)));
            assert!((0.0..=1.0).contains(&bbox.width));
            assert!((0.0..=1.0).contains(&bbox.height));

            let (xmin, ymin, xmax, ymax) = bbox.to_corners(w as f64, h as f64);
            assert_relative_eq!(xmin, corners[0], epsilon = 1e-9);
            assert_relative_eq!(ymin, corners[1], epsilon = 1e-9);
            assert_relative_eq!(xmax, corners[2], epsilon = 1e-9);
            assert_relative_eq!(ymax, corners[3], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unknown_dimensions_fall_back_to_unit_divisor() {
        let corners = SourceBox::Corners([10.0, 10.0, 50.0, 50.0]);
        assert!(corners.needs_dimensions());
        assert_eq!(
            corners.normalize(None),
            NormalizedBox::new(30.0, 30.0, 40.0, 40.0)
        );

        let origin = SourceBox::OriginSize([10.0, 10.0, 40.0, 40.0]);
        assert_eq!(
            origin.normalize(Some((0, 100))),
            NormalizedBox::new(30.0, 30.0, 40.0, 40.0)
        );
    }

    #[test]
    fn test_negative_sizes_are_invalid() {
        assert!(SourceBox::Corners([10.0, 10.0, 50.0, 50.0]).has_valid_size());
        assert!(SourceBox::Corners([5.0, 5.0, 5.0, 5.0]).has_valid_size());
        assert!(!SourceBox::Corners([50.0, 10.0, 10.0, 50.0]).has_valid_size());
        assert!(!SourceBox::Corners([10.0, 50.0, 50.0, 10.0]).has_valid_size());

        assert!(SourceBox::OriginSize([1.0, 2.0, 0.0, 4.0]).has_valid_size());
        assert!(!SourceBox::OriginSize([1.0, 2.0, -3.0, 4.0]).has_valid_size());
        assert!(!SourceBox::OriginSize([1.0, 2.0, 3.0, f64::NAN]).has_valid_size());

        assert!(SourceBox::Normalized(NormalizedBox::new(0.5, 0.5, 0.1, 0.1)).has_valid_size());
        assert!(!SourceBox::Normalized(NormalizedBox::new(0.5, 0.5, -0.1, 0.1)).has_valid_size());
    }

    #[test]
    fn test_normalized_box_passes_through() {
        let bbox = NormalizedBox::new(0.5, 0.25, 0.1, 0.2);
        let source = SourceBox::Normalized(bbox);
        assert!(!source.needs_dimensions());
        assert_eq!(source.normalize(None), bbox);
        assert_eq!(source.normalize(Some((640, 480))), bbox);
    }
}
