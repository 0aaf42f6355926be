const APP_USER_AGENT: &str = "tile-recolor/1.0";

pub enum UserAgent {
    App,
}

impl UserAgent {
    pub fn value(&self) -> String {
        match self {
            UserAgent::App => APP_USER_AGENT,
        }
        .to_string()
    }
}

/// Scale a `0.0..=1.0` quality factor to the JPEG encoder's `1..=100` range.
pub fn jpeg_quality(quality: f32) -> u8 {
    let scaled = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    scaled.max(1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_jpeg_quality() {
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.5), 50);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(7.0), 100);
    }
}
