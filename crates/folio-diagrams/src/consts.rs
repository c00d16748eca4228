//! Constants for diagram compilation and display.

use std::time::Duration;

/// Default HTTP timeout for Kroki requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Smallest zoom factor of the fullscreen viewer.
pub const ZOOM_MIN: f64 = 0.1;

/// Largest zoom factor of the fullscreen viewer.
pub const ZOOM_MAX: f64 = 5.0;

/// Zoom change per step (wheel notch or button press).
pub const ZOOM_STEP: f64 = 0.1;
