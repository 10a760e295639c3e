use std::fmt;

/// Relative tolerance when matching a known aspect ratio (3%).
pub const ASPECT_TOLERANCE: f64 = 0.03;

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Coarse orientation bucket used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrientationClass {
    Landscape,
    Portrait,
    Other,
}

impl OrientationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationClass::Landscape => "landscape",
            OrientationClass::Portrait => "portrait",
            OrientationClass::Other => "other",
        }
    }
}

impl fmt::Display for OrientationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_approx(ratio: f64, target: f64) -> bool {
    (ratio - target).abs() / target <= ASPECT_TOLERANCE
}

/// Maps frame geometry to an orientation: 16:9 is landscape, 9:16 is portrait,
/// anything else is other. Callers must not pass a zero dimension.
pub fn classify(width: u32, height: u32) -> OrientationClass {
    let ratio = f64::from(width) / f64::from(height);

    if is_approx(ratio, LANDSCAPE_RATIO) {
        OrientationClass::Landscape
    } else if is_approx(ratio, PORTRAIT_RATIO) {
        OrientationClass::Portrait
    } else {
        OrientationClass::Other
    }
}
