use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::{fs, thread, time::Duration};

use home_guardian::config::constants;
use home_guardian::{
    AlarmStatus, AlertListener, CameraFeed, CatDetector, Config, JsonFileSecurityRepository,
    SecurityService,
};

/// Home Guardian - home security monitor with camera-based cat detection.
///
/// Restores sensors, arming mode and alarm status from the state file, then
/// classifies one camera frame per interval. Every frame is fed through the
/// security service, which decides whether the alarm goes off. Frames that
/// show a cat are annotated and saved to the output directory.
///
/// # Environment Variables
///
/// Required:
/// * `CAMERA_DIR` - Directory of camera frames (jpg, png or bmp)
///
/// Optional (with defaults):
/// * `STATE_FILE` - Security state file (default: "./security_state.json")
/// * `LABEL_FILE` - Path to label file (default: "./labels.txt")
/// * `MODEL_CFG` - Path to model config file (default: "./model.cfg")
/// * `WEIGHTS_FILE` - Path to weights file (default: "./model/model.weights")
/// * `OBJECTNESS_THRESHOLD` - Objectness threshold (default: "0.5")
/// * `CAT_CONFIDENCE_THRESHOLD` - Cat confidence in percent (default: "50.0")
/// * `OUTPUT_DIR` - Snapshot directory (default: "./output")
/// * `FLIP_IMAGE` - Flip frames vertically (default: "false")
/// * `ARMING_STATUS` - Arming mode to apply at startup (default: keep stored mode)
/// * `CAMERA_INTERVAL_SECONDS` - Delay between frames (default: "5")
///
/// # Usage
///
/// ```bash
/// export CAMERA_DIR="./captures"
/// export ARMING_STATUS="ARMED_HOME"
/// ./home-guardian
/// ```
fn main() -> Result<()> {
    // Initialize logger to output to stdout, using RUST_LOG env var or info level by default
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .filter_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|level| level.parse().ok())
                .unwrap_or(log::LevelFilter::Info),
        )
        .init();

    let config = Config::load()?;

    info!("Home Guardian starting...");
    info!("Using state file: {}", config.state_file.display());

    let repository = JsonFileSecurityRepository::open(&config.state_file)?;

    let detector = CatDetector::new(
        config.model_cfg.clone(),
        config.weights.clone(),
        config.label_file.clone(),
        config.objectness_threshold,
    )?;
    info!("Cat detector initialized");

    let mut camera = CameraFeed::from_dir(&config.camera_dir, config.flip_image)?;
    info!(
        "Camera feed initialized with {} frame(s) from {}",
        camera.get_frame_paths().len(),
        config.camera_dir.display()
    );

    let mut service = SecurityService::new(repository, detector);
    service.set_confidence_threshold(config.cat_confidence_threshold);
    service.add_status_listener(Arc::new(AlertListener::new()));

    for sensor in service.get_sensors() {
        info!("Tracking sensor {}", sensor);
    }

    if let Some(status) = config.arming_status {
        service.set_arming_status(status)?;
    }
    info!(
        "System is {} with alarm status {}",
        service.get_arming_status().description(),
        service.get_alarm_status()
    );

    fs::create_dir_all(&config.output_dir)?;

    // Create .ready file to indicate the application is fully initialized
    fs::write(".ready", "ready")?;
    info!("Application ready - created .ready file for healthcheck");

    let frame_interval = Duration::from_secs(config.camera_interval_seconds);
    let mut last_alarm_status = service.get_alarm_status();

    loop {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        debug!(
            "{}: Reading frame {}",
            timestamp,
            camera.get_current_frame_path().display()
        );

        let frame = match camera.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("{}: {}", timestamp, e);
                thread::sleep(Duration::from_secs(constants::RETRY_DELAY_SECONDS));
                continue;
            }
        };

        if let Err(e) = service.process_image(&frame) {
            error!("{}: Failed to process frame: {}", timestamp, e);
            thread::sleep(Duration::from_secs(constants::RETRY_DELAY_SECONDS));
            continue;
        }

        if service.is_cat_detected() {
            let cats = service.classifier().last_cat_detections();
            for cat in &cats {
                warn!(
                    "{}: Cat with {:.2}% confidence at x: {:.2}, y: {:.2}, w: {:.2}, h: {:.2}",
                    timestamp,
                    cat.confidence_percent(),
                    cat.center_x(),
                    cat.center_y(),
                    cat.width(),
                    cat.height()
                );
            }

            let annotated = CameraFeed::annotate_frame(&frame, &cats);
            match CameraFeed::save_snapshot(&config.output_dir, &annotated) {
                Ok(path) => info!("Saved cat snapshot to {}", path.display()),
                Err(e) => error!("{}: {}", timestamp, e),
            }
        }

        let alarm_status = service.get_alarm_status();
        if alarm_status != last_alarm_status {
            if alarm_status == AlarmStatus::Alarm {
                warn!(
                    "{}: ALARM raised while {}",
                    timestamp,
                    service.get_arming_status().description()
                );
            }
            last_alarm_status = alarm_status;
        }

        thread::sleep(frame_interval);
    }
}
