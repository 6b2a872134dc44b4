use crate::error::ReportResult;
use crate::pipeline::capabilities::{DocumentBody, ImageId};
use serde::{Deserialize, Serialize};

/// Displayed dimensions of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Scales the size down so the width fits `max_width`, keeping the aspect ratio.
    ///
    /// Only the width is constrained: an image no wider than `max_width` is
    /// returned unchanged however tall it is.
    pub fn normalized(self, max_width: f64) -> ImageSize {
        if self.width <= max_width {
            return self;
        }
        let ratio = self.width / self.height;
        if self.width >= self.height {
            ImageSize::new(max_width, max_width / ratio)
        } else {
            ImageSize::new(max_width * ratio, max_width)
        }
    }
}

/// Applies `ImageSize::normalized` to an image already embedded in `document`.
pub fn normalize_image<D: DocumentBody>(
    document: &mut D,
    image: ImageId,
    max_width: f64,
) -> ReportResult<ImageSize> {
    let size = document.image_size(image)?;
    let normalized = size.normalized(max_width);
    if normalized != size {
        document.set_image_size(image, normalized)?;
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_scaled_to_max_width() {
        let size = ImageSize::new(1280.0, 640.0).normalized(640.0);
        assert_eq!(size, ImageSize::new(640.0, 320.0));
    }

    #[test]
    fn image_at_max_width_is_untouched() {
        let size = ImageSize::new(640.0, 1280.0);
        assert_eq!(size.normalized(640.0), size);
    }

    #[test]
    fn tall_narrow_image_is_never_constrained_on_height() {
        let size = ImageSize::new(100.0, 1000.0);
        assert_eq!(size.normalized(640.0), size);
    }

    #[test]
    fn tall_image_wider_than_max_pins_height() {
        // Width-over-max but taller than wide: the height is set to the maximum.
        let size = ImageSize::new(800.0, 1600.0).normalized(640.0);
        assert_eq!(size, ImageSize::new(320.0, 640.0));
    }

    #[test]
    fn square_image_scales_evenly() {
        let size = ImageSize::new(1000.0, 1000.0).normalized(640.0);
        assert_eq!(size, ImageSize::new(640.0, 640.0));
    }
}
