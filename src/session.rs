//! Interactive state of a running caustic view.
//!
//! The session owns everything that changes while the window is open: the
//! receiver plane depth, the points currently on screen and the window size.
//! Front ends translate platform input into [`Event`] values and feed them to
//! [`Session::handle`] one at a time; nothing here touches the platform.

use std::path::PathBuf;

use anyhow::{Context, Result};
use nalgebra::Point2;

use crate::{
    error::CausticError,
    geom::Mesh,
    output,
    projection::WindowSize,
    scene::Scene,
    settings::{Invocation, Settings},
};


/// A user request, already decoupled from whichever key produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Move the receiver plane by the given amount.
    Shift(f64),
    PrintDepth,
    Export,
    Quit,
}

/// The four plane adjustments bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SmallUp,
    SmallDown,
    BigUp,
    BigDown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Resized { width: f32, height: f32 },
    Command(Command),
    CloseRequested,
}

/// What the front end should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Redraw,
    Quit,
}

#[derive(Debug)]
pub struct Session {
    scene: Scene,
    depth: f64,
    points: Vec<Point2<f64>>,
    window: WindowSize,
    small_step: f64,
    big_step: f64,
    export_path: Option<PathBuf>,
}

impl Session {
    /// Projects the scene at the initial depth. Failing here is fatal, since
    /// there is no earlier point set to fall back on.
    pub fn new(scene: Scene, depth: f64, settings: &Settings) -> Result<Self, CausticError> {
        let points = scene.points_at(depth)?;
        Ok(Self {
            scene,
            depth,
            points,
            window: WindowSize::new(settings.window_width as f32, settings.window_height as f32),
            small_step: settings.small_step,
            big_step: settings.big_step,
            export_path: settings
                .export_enabled
                .then(|| settings.export_path.clone()),
        })
    }

    pub fn handle(&mut self, event: Event) -> Control {
        match event {
            Event::Resized { width, height } => {
                if width > 0.0 && height > 0.0 {
                    self.window = WindowSize::new(width, height);
                    Control::Redraw
                } else {
                    Control::Continue
                }
            }
            Event::Command(Command::Shift(delta)) => self.set_depth(self.depth + delta),
            Event::Command(Command::PrintDepth) => {
                println!(
                    "Current distance between lens and receiver plane: {}",
                    self.depth
                );
                Control::Continue
            }
            Event::Command(Command::Export) => {
                self.export();
                Control::Continue
            }
            Event::Command(Command::Quit) | Event::CloseRequested => Control::Quit,
        }
    }

    /// Moves the receiver plane. If the new depth yields no usable points
    /// the previous depth and points stay in place.
    pub fn set_depth(&mut self, depth: f64) -> Control {
        match self.scene.points_at(depth) {
            Ok(points) => {
                log::debug!("receiver plane at {}: {} points", depth, points.len());
                self.depth = depth;
                self.points = points;
                Control::Redraw
            }
            Err(e) => {
                log::warn!("keeping receiver plane at {}: {}", self.depth, e);
                Control::Continue
            }
        }
    }

    /// The command a plane adjustment key maps to.
    pub fn step(&self, step: Step) -> Command {
        match step {
            Step::SmallUp => Command::Shift(self.small_step),
            Step::SmallDown => Command::Shift(-self.small_step),
            Step::BigUp => Command::Shift(self.big_step),
            Step::BigDown => Command::Shift(-self.big_step),
        }
    }

    fn export(&self) {
        match self.export_now() {
            Ok(Some(_)) => {}
            Ok(None) => log::info!("export is disabled"),
            Err(e) => log::error!("{}", e),
        }
    }

    /// Writes the current points to the export path, if exporting is enabled.
    pub fn export_now(&self) -> Result<Option<&PathBuf>, CausticError> {
        match &self.export_path {
            Some(path) => output::save_ppm(path, &self.points).map(|_| Some(path)),
            None => Ok(None),
        }
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn window(&self) -> WindowSize {
        self.window
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

/// Runs the start-up pipeline: load the mesh, refract it and project it at
/// the requested depth.
pub fn prepare(invocation: &Invocation) -> Result<Session> {
    let settings = &invocation.settings;
    let mesh = Mesh::from_file(&invocation.mesh_path, settings.normal_pairing)
        .with_context(|| format!("loading {}", invocation.mesh_path.display()))?;
    let scene = Scene::new(
        mesh,
        settings.refractive_index,
        settings.tir_policy,
        settings.mapping,
    )?;
    let session = Session::new(scene, invocation.receiver_z, settings)?;
    log::info!(
        "{} caustic points at receiver plane z = {}",
        session.points().len(),
        session.depth()
    );
    Ok(session)
}
