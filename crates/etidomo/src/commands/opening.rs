//! Opening command handlers.
//!
//! `position` drives the cover with the time-based estimator: it starts
//! the motion, ticks until the estimated target is reached and sends the
//! stop itself when the target lies between the end stops.

use std::time::{Duration, Instant};

use etidomo_core::{CoverEstimator, DeviceCommand, Manager, OpeningState, Progress};

use crate::cli::{GlobalOpts, OpeningArgs, OpeningCommand};
use crate::config;
use crate::error::CliError;

use super::util;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub async fn handle(
    manager: &mut Manager,
    args: OpeningArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (device, state) = match args.command {
        OpeningCommand::Open { device } => (device, OpeningState::Open),
        OpeningCommand::Close { device } => (device, OpeningState::Close),
        OpeningCommand::Stop { device } => (device, OpeningState::Stop),
        OpeningCommand::Position {
            device,
            percent,
            from,
        } => return move_to_position(manager, &device, percent, from, global).await,
    };
    util::execute(manager, &device, DeviceCommand::Move(Some(state)), global).await
}

async fn move_to_position(
    manager: &mut Manager,
    identifier: &str,
    percent: u8,
    from: u8,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_device(manager, identifier).await?;
    let unique_id = device.unique_id();
    let name = device.name().unwrap_or("opening").to_owned();

    let mut estimator = CoverEstimator::new(config::travel_times(global), Instant::now())
        .with_position(f64::from(from));
    let Some(motion) = estimator.start(f64::from(percent), Instant::now()) else {
        if !global.quiet {
            eprintln!("{name}: already at {percent}%");
        }
        return Ok(());
    };

    manager
        .execute(&unique_id, &DeviceCommand::Move(Some(motion)))
        .await?;
    tracing::info!(
        name = %name,
        target = percent,
        eta_secs = estimator.remaining().as_secs_f64(),
        "cover moving"
    );

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                manager
                    .execute(&unique_id, &DeviceCommand::Move(Some(OpeningState::Stop)))
                    .await?;
                estimator.stop(Instant::now());
                if !global.quiet {
                    eprintln!("{name}: interrupted at ~{}%", estimator.position());
                }
                return Ok(());
            }
            _ = ticker.tick() => {
                match estimator.tick(Instant::now()) {
                    Progress::Moving => {}
                    Progress::Idle => break,
                    Progress::Reached { needs_stop } => {
                        if needs_stop {
                            manager
                                .execute(&unique_id, &DeviceCommand::Move(Some(OpeningState::Stop)))
                                .await?;
                        }
                        break;
                    }
                }
            }
        }
    }

    if !global.quiet {
        eprintln!("{name}: at ~{}%", estimator.position());
    }
    Ok(())
}
