use std::process::ExitCode;

use anyhow::Result;
use caustic::session::{self, Session};
use caustic::settings::{self, Settings};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let invocation = settings::load_config()?;
    if invocation.dump_config {
        print!("{}", invocation.settings.to_toml()?);
        return Ok(());
    }
    log::info!("effective settings:\n{}", invocation.settings);

    let session = session::prepare(&invocation)?;
    if invocation.headless {
        headless(&session)
    } else {
        show(session, &invocation.settings)
    }
}

fn headless(session: &Session) -> Result<()> {
    println!(
        "{} caustic points at receiver plane z = {}",
        session.points().len(),
        session.depth()
    );
    if let Some(path) = session.export_now()? {
        println!("Saved {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "visualization")]
fn show(session: Session, settings: &Settings) -> Result<()> {
    caustic::helpers::launch(session, settings)?;
    Ok(())
}

#[cfg(not(feature = "visualization"))]
fn show(session: Session, _settings: &Settings) -> Result<()> {
    log::warn!("built without the visualization feature, running headless");
    headless(&session)
}
