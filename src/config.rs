/// Side length of the nominal square that intersection points live in.
pub const NOMINAL_SIZE: f64 = 256.0;
/// Side length in pixels of exported PPM images.
pub const IMAGE_SIZE: usize = 256;
/// Minimum vector length to be considered non-degenerate.
pub const DEGENERATE_LENGTH: f64 = 1e-12;
/// Window title.
pub const WINDOW_TITLE: &str = "Caustics Simulation";
/// Built-in configuration layer, overridden by files, environment and flags.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
