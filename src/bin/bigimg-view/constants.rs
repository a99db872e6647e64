/// Initial window size in logical points.
pub const WINDOW_SIZE: [f32; 2] = [1280.0, 720.0];

/// Pinch factor applied per mouse-wheel notch or +/- key press.
pub const ZOOM_STEP: f32 = 1.1;

/// Directory under the platform config dir holding `config.ron`.
pub const CONFIG_DIR_NAME: &str = "bigimg-view";

pub const CONFIG_FILE_NAME: &str = "config.ron";

/// How long error toasts stay on screen, in seconds.
pub const ERROR_TOAST_SECONDS: f64 = 8.0;
