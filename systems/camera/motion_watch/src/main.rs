//! Motion watch binary. Takes one snapshot from a camera, then polls its
//! motion detection state until the configured window closes or the
//! operator presses Enter.
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};
use vigil::{
    components::prelude::*,
    devices::hardware::camera::{IpCamera, IpCameraConfig},
    utils::logging,
};

/// Arguments required for starting the program from the command line.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the config file for the camera.
    #[arg(short, long, default_value = "config.json")]
    filepath: PathBuf,
    /// Stop motion detection checking before it starts.
    #[arg(long)]
    stop: bool,
    /// Where to write the snapshot, overrides the config file.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    let config = match IpCameraConfig::from_file(&args.filepath) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Error loading config");
            return ExitCode::FAILURE;
        }
    };

    if args.stop {
        tracing::info!("Motion detection checking stopped by user.");
        return ExitCode::SUCCESS;
    }

    let camera = match IpCamera::new(&config) {
        Ok(camera) => camera,
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up camera client");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(camera = %camera.get_uuid(), url = %camera.base_url(), "Camera configured");
    let mut session = SessionManager::new(camera);

    let snapshot_path = args
        .snapshot
        .unwrap_or_else(|| config.snapshot_path().to_path_buf());
    let mut sink = FileSink::new(snapshot_path);
    // Rejected credentials and an unreachable camera both end the snapshot
    // step here, the snapshot itself only runs with a token in hand.
    let login = session.ensure_token().await.map(|_| ());
    match login {
        Ok(()) => {
            if let Err(e) = SnapshotController::capture(&mut session, &mut sink).await {
                tracing::error!(error = %e, "Snapshot failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "Login failed. Cannot take a snapshot."),
    }

    let window = config.motion_duration();
    if session.token().is_ok() && !session.lease_covers(window) {
        tracing::warn!(
            window_seconds = window.as_secs(),
            "Session lease ends before the motion polling window, the token is not renewed"
        );
    }

    let poller = MotionPoller::new(window, config.motion_check_interval());
    let (mut handle, signal) = MotionPollerController::start(poller, session.shared_camera());

    // Stdin is read on a plain thread so that a pending read never holds
    // up shutdown once polling has finished on its own.
    let operator_signal = signal.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut line) {
            tracing::warn!(error = %e, "Failed to read operator input");
        }
        tracing::info!(
            "Stopping motion detection checking. Please wait for the current check to complete."
        );
        operator_signal.blocking_stop();
    });
    tracing::info!("Press Enter to stop motion detection checking...");

    let report = tokio::select! {
        report = &mut handle => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping motion detection checking.");
            signal.stop().await;
            handle.await
        }
    };

    match report {
        Ok(report) => {
            tracing::info!(
                outcome = %report.outcome,
                ticks = report.ticks,
                no_motion = report.no_motion,
                motion = report.motion,
                unknown = report.unknown,
                elapsed_seconds = report.elapsed.as_secs(),
                "Motion poller finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Motion poller task failed");
            ExitCode::FAILURE
        }
    }
}
