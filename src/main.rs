use anyhow::{anyhow, Context};
use clap::Parser;

use qr_guard::headless::run_headless;
use qr_guard::permission;
use qr_guard::source::build_source;
use qr_guard::{open_config, Args, ScanTool, PROGRAM_TITLE};

// Application Entry Point
fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    log::info!("Starting {}", PROGRAM_TITLE);

    let mut config = open_config().map_err(|e| anyhow!(e))?;
    args.apply_to(&mut config.data);
    log::debug!("Effective configuration: {:?}", config.data);

    if args.requests_camera() {
        permission::request_camera_access();
    }

    if args.headless {
        let source = build_source(&config.data)
            .with_context(|| format!("cannot start {} source", config.data.source))?;
        let stdout = std::io::stdout();
        run_headless(source, &mut stdout.lock())?;
        return Ok(());
    }

    let preview = args.preview;
    eframe::run_native(
        PROGRAM_TITLE,
        qr_guard::app::native_options(),
        Box::new(move |_cc| Ok(Box::new(ScanTool::new(config, preview)))),
    )
    .map_err(|e| anyhow!("GUI error: {}", e))
}
