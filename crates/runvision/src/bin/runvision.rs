use clap::Parser;
use runvision::{
    load_ranges, save_ranges, ActuatorSink, CalibrationOutcome, ImageSequenceSource,
    InputSource, JsonLinesBlackboard, LogHead, PngOverlay, RunConfig, Runner, ScriptedInput,
    StdinInput,
};
use runvision::nav::SteeringMode;
use std::path::PathBuf;
use std::process::ExitCode;

/// Color-segmentation and navigation loop for the running course.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration (every field optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of frames played back in file-name order
    #[arg(long)]
    frames: PathBuf,

    /// Restart the frame sequence when it runs out
    #[arg(long, default_value_t = false)]
    loop_frames: bool,

    /// Enable the step challenge
    #[arg(long, default_value_t = false)]
    step: bool,

    /// Enable the swerve challenge
    #[arg(long, default_value_t = false)]
    swerve: bool,

    /// Use discrete turn states instead of proportional steering
    #[arg(long, default_value_t = false)]
    discrete: bool,

    /// Write overlay images into this directory
    #[arg(long)]
    show: Option<PathBuf>,

    /// Blackboard output (JSON lines); stdout when omitted
    #[arg(long)]
    blackboard: Option<PathBuf>,

    /// Load calibrated ranges and skip calibration
    #[arg(long)]
    ranges: Option<PathBuf>,

    /// Save the ranges after calibration
    #[arg(long)]
    save_ranges: Option<PathBuf>,

    /// Scripted input events (JSON) instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Stop after this many cycles
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let level = runvision::core::parse_level(level);
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init_with_filter(level);
        runvision::core::init_tracing(level, false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if let Err(e) = runvision::core::init_with_level(level) {
            eprintln!("logger already installed: {e}");
        }
    }
}

fn build_config(args: &Args) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    config.challenges.step |= args.step;
    config.challenges.swerve |= args.swerve;
    if args.discrete {
        config.nav.steering = SteeringMode::Discrete;
    }
    if args.max_cycles.is_some() {
        config.max_cycles = args.max_cycles;
    }
    if args.ranges.is_some() {
        config.skip_calibration = true;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let source = ImageSequenceSource::open(&args.frames)?.looping(args.loop_frames);

    let blackboard: Box<dyn ActuatorSink> = match &args.blackboard {
        Some(path) => Box::new(JsonLinesBlackboard::create(path)?),
        None => Box::new(JsonLinesBlackboard::new(std::io::stdout())),
    };
    let input: Box<dyn InputSource> = match &args.script {
        Some(path) => Box::new(ScriptedInput::load(path)?),
        None => Box::new(StdinInput::spawn()),
    };

    let mut runner = Runner::new(config, source, blackboard, LogHead, input);
    if let Some(path) = &args.ranges {
        runner = runner.with_ranges(load_ranges(path)?);
    }
    if let Some(dir) = &args.show {
        let scale = runner.config().display_scale;
        runner = runner.with_overlay(Box::new(PngOverlay::create(dir, scale)?));
    }

    if !runner.config().skip_calibration {
        if runner.calibrate()? == CalibrationOutcome::Quit {
            log::info!("quit during calibration");
            return Ok(());
        }
        if let Some(path) = &args.save_ranges {
            save_ranges(runner.store(), path)?;
            log::info!("ranges saved to {}", path.display());
        }
    }

    let summary = runner.run()?;
    eprintln!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
