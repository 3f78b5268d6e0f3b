use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CONFIG;
use crate::error::CausticError;
use crate::geom::NormalPairing;
use crate::palette::ColorScheme;
use crate::projection::NominalMapping;
use crate::snell::TirPolicy;


/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub refractive_index: f64,
    pub tir_policy: TirPolicy,
    pub normal_pairing: NormalPairing,
    pub small_step: f64,
    pub big_step: f64,
    pub window_width: u32,
    pub window_height: u32,
    pub color_scheme: ColorScheme,
    pub show_fps: bool,
    pub export_enabled: bool,
    pub export_path: PathBuf,
    pub mapping: NominalMapping,
}

impl Settings {
    /// The effective settings as a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialising settings")
    }
}

/// One run of the program: what to load, where to start, and how to show it.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub mesh_path: PathBuf,
    pub receiver_z: f64,
    pub headless: bool,
    pub dump_config: bool,
    pub settings: Settings,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Caustic - refract light through a lens mesh and view the pattern it casts",
    allow_negative_numbers = true
)]
pub struct CliArgs {
    /// Wavefront .obj file with vertex positions and one normal per vertex.
    mesh: PathBuf,

    /// Initial distance (z) of the receiver plane, in mesh units.
    distance: f64,

    /// Extra TOML configuration file layered over the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refractive index of the lens relative to the surrounding medium.
    #[arg(long)]
    eta: Option<f64>,

    /// Point colouring in the window.
    #[arg(long, value_enum)]
    colors: Option<ColorScheme>,

    /// Hide the FPS counter.
    #[arg(long)]
    no_fps: bool,

    /// File the P key (or a headless run) writes the PPM image to.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Disable PPM export.
    #[arg(long)]
    no_export: bool,

    /// Total internal reflection handling.
    #[arg(long, value_enum)]
    tir: Option<TirPolicy>,

    /// How normals are matched to vertices.
    #[arg(long, value_enum)]
    pairing: Option<NormalPairing>,

    /// Compute the caustic and export it without opening a window.
    #[arg(long)]
    headless: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,
}

/// Settings from the built-in defaults alone.
pub fn load_default_config() -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()
        .map_err(|e| CausticError::Argument(format!("configuration: {}", e)))?;

    let config: Settings = settings
        .try_deserialize()
        .map_err(|e| CausticError::Argument(format!("configuration: {}", e)))?;

    validate_config(&config)?;
    Ok(config)
}

/// Settings for this process, from its command line and environment.
pub fn load_config() -> Result<Invocation> {
    load_config_from(std::env::args_os())
}

/// Layers defaults, an optional `--config` file, `CAUSTIC_*` environment
/// variables and finally command-line flags.
pub fn load_config_from<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match CliArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => return Err(CausticError::Argument(err.to_string().trim_end().to_string()).into()),
        },
    };

    let mut builder =
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
    if let Some(path) = &args.config {
        log::info!("using configuration file {}", path.display());
        builder = builder.add_source(
            File::from(path.clone())
                .format(FileFormat::Toml)
                .required(true),
        );
    }
    let settings = builder
        .add_source(
            Environment::with_prefix("CAUSTIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| CausticError::Argument(format!("configuration: {}", e)))?;

    let mut config: Settings = settings
        .try_deserialize()
        .map_err(|e| CausticError::Argument(format!("configuration: {}", e)))?;

    if let Some(eta) = args.eta {
        config.refractive_index = eta;
    }
    if let Some(colors) = args.colors {
        config.color_scheme = colors;
    }
    if args.no_fps {
        config.show_fps = false;
    }
    if let Some(path) = args.export {
        config.export_path = path;
    }
    if args.no_export {
        config.export_enabled = false;
    }
    if let Some(tir) = args.tir {
        config.tir_policy = tir;
    }
    if let Some(pairing) = args.pairing {
        config.normal_pairing = pairing;
    }

    if !args.distance.is_finite() {
        return Err(CausticError::Argument(format!(
            "receiver plane distance must be finite, got {}",
            args.distance
        ))
        .into());
    }
    validate_config(&config)?;

    Ok(Invocation {
        mesh_path: args.mesh,
        receiver_z: args.distance,
        headless: args.headless,
        dump_config: args.dump_config,
        settings: config,
    })
}

fn validate_config(config: &Settings) -> Result<(), CausticError> {
    let fail = |msg: &str| Err(CausticError::Argument(msg.to_string()));

    if !(config.refractive_index.is_finite() && config.refractive_index > 0.0) {
        return fail("refractive index must be finite and positive");
    }
    if !(config.small_step.is_finite() && config.small_step > 0.0)
        || !(config.big_step.is_finite() && config.big_step > 0.0)
    {
        return fail("receiver plane steps must be finite and positive");
    }
    if config.window_width == 0 || config.window_height == 0 {
        return fail("window dimensions must be non-zero");
    }
    if !config.mapping.scale.is_finite() || config.mapping.scale == 0.0 {
        return fail("mapping scale must be finite and non-zero");
    }
    if !config.mapping.offset.iter().all(|o| o.is_finite()) {
        return fail("mapping offset must be finite");
    }
    Ok(())
}

impl fmt::Display for Settings {
    /// One `key: value` line per setting, as logged at start-up.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "refractive index: {}", self.refractive_index)?;
        writeln!(f, "tir policy: {:?}", self.tir_policy)?;
        writeln!(f, "normal pairing: {:?}", self.normal_pairing)?;
        writeln!(f, "plane steps: {} / {}", self.small_step, self.big_step)?;
        writeln!(f, "window: {}x{}", self.window_width, self.window_height)?;
        writeln!(
            f,
            "mapping: scale {} offset ({}, {})",
            self.mapping.scale, self.mapping.offset[0], self.mapping.offset[1]
        )?;
        writeln!(f, "colours: {:?}, fps overlay: {}", self.color_scheme, self.show_fps)?;
        if self.export_enabled {
            write!(f, "export: {}", self.export_path.display())
        } else {
            write!(f, "export: disabled")
        }
    }
}
