//! macroquad front end for interactive caustic viewing.
//!
//! This module owns everything that talks to the window: it turns keyboard,
//! resize and close input into [`Event`] values for the [`Session`] and draws
//! the session's points every frame.
//!
//! Key bindings:
//! - `W` / `S`: move the receiver plane by the small step
//! - `E` / `D`: move the receiver plane by the big step
//! - `Q`: print the current depth
//! - `P`: save the caustic as a PPM image
//! - `Escape`: quit

use macroquad::prelude::*;
use nalgebra::Point2;

use crate::{
    config::WINDOW_TITLE,
    error::CausticError,
    palette::ColorScheme,
    projection::{nominal_to_screen, WindowSize},
    session::{Command, Control, Event, Session, Step},
    settings::Settings,
};


const BOUND_KEYS: [KeyCode; 7] = [
    KeyCode::W,
    KeyCode::S,
    KeyCode::E,
    KeyCode::D,
    KeyCode::Q,
    KeyCode::P,
    KeyCode::Escape,
];

/// How points are presented, independent of the caustic itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub color_scheme: ColorScheme,
    pub show_fps: bool,
}

impl From<&Settings> for Style {
    fn from(settings: &Settings) -> Self {
        Self {
            color_scheme: settings.color_scheme,
            show_fps: settings.show_fps,
        }
    }
}

/// The command bound to `key`, if any.
pub fn key_command(session: &Session, key: KeyCode) -> Option<Command> {
    match key {
        KeyCode::W => Some(session.step(Step::SmallUp)),
        KeyCode::S => Some(session.step(Step::SmallDown)),
        KeyCode::E => Some(session.step(Step::BigUp)),
        KeyCode::D => Some(session.step(Step::BigDown)),
        KeyCode::Q => Some(Command::PrintDepth),
        KeyCode::P => Some(Command::Export),
        KeyCode::Escape => Some(Command::Quit),
        _ => None,
    }
}

/// Collects this frame's input as discrete events.
fn poll_events(session: &Session) -> Vec<Event> {
    let mut events = Vec::new();

    if is_quit_requested() {
        events.push(Event::CloseRequested);
    }

    let size = WindowSize::new(screen_width(), screen_height());
    if size != session.window() {
        events.push(Event::Resized {
            width: size.width,
            height: size.height,
        });
    }

    for key in BOUND_KEYS {
        if is_key_pressed(key) {
            if let Some(command) = key_command(session, key) {
                events.push(Event::Command(command));
            }
        }
    }
    events
}

/// Clears the frame and plots every point, scaled from the nominal
/// 256 x 256 space to `window`.
pub fn draw_points(points: &[Point2<f64>], window: WindowSize, scheme: ColorScheme) {
    clear_background(BLACK);

    let count = points.len();
    for (i, point) in points.iter().enumerate() {
        let [r, g, b] = scheme.rgb(point, i, count);
        let (x, y) = nominal_to_screen(point, window);
        draw_rectangle(x, y, 1.0, 1.0, Color::from_rgba(r, g, b, 255));
    }
}

fn draw_fps() {
    draw_text(&format!("FPS: {}", get_fps()), 4.0, 14.0, 16.0, GRAY);
}

/// Frame loop: poll, dispatch, draw, until the session asks to quit.
pub async fn run(mut session: Session, style: Style) {
    prevent_quit();

    loop {
        for event in poll_events(&session) {
            if session.handle(event) == Control::Quit {
                log::info!("quitting at receiver plane z = {}", session.depth());
                return;
            }
        }

        draw_points(session.points(), session.window(), style.color_scheme);
        if style.show_fps {
            draw_fps();
        }

        next_frame().await;
    }
}

fn window_conf(settings: &Settings) -> Result<Conf, CausticError> {
    let to_i32 = |v: u32| {
        i32::try_from(v)
            .map_err(|_| CausticError::PlatformInit(format!("window dimension {} is too large", v)))
    };
    Ok(Conf {
        window_title: WINDOW_TITLE.to_string(),
        window_width: to_i32(settings.window_width)?,
        window_height: to_i32(settings.window_height)?,
        window_resizable: true,
        ..Default::default()
    })
}

/// Opens the window and blocks until the user quits.
///
/// The only error reported is a configured window dimension that does not fit
/// macroquad's `i32` sizes. Failures while creating the window itself happen
/// inside macroquad, which panics rather than returning them.
pub fn launch(session: Session, settings: &Settings) -> Result<(), CausticError> {
    let conf = window_conf(settings)?;
    log::info!(
        "opening {}x{} window",
        conf.window_width,
        conf.window_height
    );
    macroquad::Window::from_config(conf, run(session, Style::from(settings)));
    Ok(())
}
