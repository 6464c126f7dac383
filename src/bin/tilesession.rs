use clap::*;

use tilesession::core::prelude::*;
use tilesession::devices::*;
use tilesession::kernels::*;

use log::*;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::available_parallelism;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TileOrderArg {
    Center,
    RightToLeft,
    LeftToRight,
    TopToBottom,
    BottomToTop,
    Shuffle,
}

impl From<TileOrderArg> for TileOrder {
    fn from(v: TileOrderArg) -> Self {
        match v {
            TileOrderArg::Center => TileOrder::Center,
            TileOrderArg::RightToLeft => TileOrder::RightToLeft,
            TileOrderArg::LeftToRight => TileOrder::LeftToRight,
            TileOrderArg::TopToBottom => TileOrder::TopToBottom,
            TileOrderArg::BottomToTop => TileOrder::BottomToTop,
            TileOrderArg::Shuffle => TileOrder::Shuffle,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KernelArg {
    Gradient,
    Noise,
}

#[derive(Debug, Parser)]
#[clap(author, about, version, disable_help_flag = true)]
struct CommandOptions {
    /// Session parameters as JSON; command line options override them.
    #[arg(long, value_name = "filename")]
    pub config: Option<PathBuf>,

    /// Write the final image to the given filename.
    #[arg(short, long, value_name = "filename")]
    pub outfile: Option<PathBuf>,

    /// Print this help text.
    #[arg(short, long, action = clap::ArgAction::HelpLong)]
    pub help: Option<bool>,

    /// Image width in pixels.
    #[arg(long, default_value = "256", value_name = "num")]
    pub width: i32,

    /// Image height in pixels.
    #[arg(long, default_value = "256", value_name = "num")]
    pub height: i32,

    /// Samples per pixel.
    #[arg(short = 's', long = "samples", value_name = "num")]
    pub samples: Option<i32>,

    /// Tile size in pixels.
    #[arg(long = "tile-size", value_delimiter = ',', value_name = "w,h")]
    pub tile_size: Option<Vec<i32>>,

    /// Order in which tiles are handed out.
    #[arg(long = "tile-order", value_enum)]
    pub tile_order: Option<TileOrderArg>,

    /// Procedural kernel to render.
    #[arg(long, value_enum, default_value = "noise")]
    pub kernel: KernelArg,

    /// Use specified number of threads for rendering.
    #[arg(short = 'j', long = "nthreads", value_name = "num")]
    pub nthreads: Option<usize>,

    /// Split the threads over this many devices.
    #[arg(long, default_value = "1", value_name = "num")]
    pub devices: usize,

    /// Refine all tiles one sample at a time.
    #[arg(long = "progressive-refine", default_value = "false")]
    pub progressive_refine: bool,

    /// Seed of the shuffled tile order and of the noise kernel.
    #[arg(long, value_name = "num")]
    pub seed: Option<u64>,

    /// Suppress all text output other than error messages.
    #[clap(long, default_value = "false")]
    pub quiet: bool,

    /// Log messages at or above this level (0 -> INFO,
    /// 1 -> WARNING, 2 -> ERROR, 3-> FATAL).
    #[arg(long, value_name = "num")]
    pub minloglevel: Option<i32>,
}

fn init_logger(opts: &CommandOptions) {
    if let Some(minloglevel) = opts.minloglevel {
        const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        let log_level = LOG_LEVELS[(minloglevel + 2).clamp(0, 4) as usize];
        env::set_var("RUST_LOG", log_level);
    } else {
        //default log level : warn
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_owned());
        env::set_var("RUST_LOG", log_level);
    }

    env_logger::Builder::from_default_env()
        .format_target(false)
        .format_module_path(false)
        .init();
}

fn create_params(opts: &CommandOptions) -> SessionResult<SessionParams> {
    let mut params = match opts.config.as_ref() {
        Some(path) => SessionParams::from_json_file(path)?,
        None => SessionParams {
            samples: 16,
            ..Default::default()
        },
    };
    params.background = true;
    if let Some(outfile) = opts.outfile.as_ref() {
        params.output_path = Some(outfile.clone());
    }
    if let Some(samples) = opts.samples {
        params.samples = samples;
    }
    if let Some(tile_size) = opts.tile_size.as_ref() {
        let w = tile_size.first().copied().unwrap_or(64);
        let h = tile_size.get(1).copied().unwrap_or(w);
        params.tile_size = Vector2i::new(w, h);
    }
    if let Some(tile_order) = opts.tile_order {
        params.tile_order = TileOrder::from(tile_order);
    }
    if let Some(nthreads) = opts.nthreads {
        params.threads = nthreads;
    }
    if opts.progressive_refine {
        params.progressive_refine = true;
    }
    if let Some(seed) = opts.seed {
        params.seed = seed;
    }
    if opts.width < 1 || opts.height < 1 {
        return Err(SessionError::config(format!(
            "invalid image size {}x{}",
            opts.width, opts.height
        )));
    }
    params.validate()?;
    return Ok(params);
}

fn create_device(opts: &CommandOptions, params: &SessionParams) -> SessionResult<Arc<dyn Device>> {
    let kernel: Arc<dyn Kernel> = match opts.kernel {
        KernelArg::Gradient => Arc::new(GradientKernel::new(opts.width, opts.height)),
        KernelArg::Noise => Arc::new(NoiseKernel::new(params.seed)),
    };

    if opts.devices <= 1 {
        let device = CpuDevice::new(DeviceInfo::cpu(0), kernel, params.threads)?;
        return Ok(Arc::new(device));
    }

    let total = if params.threads == 0 {
        available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        params.threads
    };
    let threads = usize::max(1, total / opts.devices);
    let mut devices: Vec<Arc<dyn Device>> = Vec::with_capacity(opts.devices);
    for i in 0..opts.devices {
        let device = CpuDevice::new(DeviceInfo::cpu(i), kernel.clone(), threads)?;
        devices.push(Arc::new(device));
    }
    return Ok(Arc::new(MultiDevice::new(devices)?));
}

fn render(opts: &CommandOptions) -> SessionResult<()> {
    let params = create_params(opts)?;
    let device = create_device(opts, &params)?;

    let tiles_x = divide_up(opts.width, params.tile_size.x);
    let tiles_y = divide_up(opts.height, params.tile_size.y);
    let total = (tiles_x * tiles_y) as usize * params.samples as usize;
    let title = match params.output_path.as_ref() {
        Some(path) => path.display().to_string(),
        None => String::from("tilesession"),
    };

    let samples = params.samples;
    let mut session = Session::new(params, device);
    let reporter = Arc::new(Mutex::new(ProgressReporter::new(total, &title)));
    if !opts.quiet {
        let progress = Arc::downgrade(&session.progress());
        let reporter = reporter.clone();
        session.progress().set_update_callback(Arc::new(move || {
            if let Some(progress) = progress.upgrade() {
                let mut reporter = reporter.lock().unwrap();
                reporter.set_position(progress.get_sample());
                let (status, substatus) = progress.get_status();
                reporter.set_message(&format!("{} {}", status, substatus));
            }
        }));
    }

    session.reset(&BufferParams::new(opts.width, opts.height), samples);
    session.start()?;
    session.wait();
    reporter.lock().unwrap().done();

    let progress = session.progress();
    if progress.get_error() {
        return Err(SessionError::device(progress.get_error_message()));
    }
    info!("Finished in {:.3}s", progress.get_time().1);
    return Ok(());
}

pub fn main() {
    let opts = CommandOptions::parse();
    init_logger(&opts);

    if !opts.quiet {
        let nthreads = available_parallelism().map(|n| n.get()).unwrap_or(1);
        let version = env!("CARGO_PKG_VERSION");
        println!("tilesession version {} [Detected {} cores]", version, nthreads);
        println!();
    }

    if let Err(e) = render(&opts) {
        error!("{}", e);
        process::exit(-1);
    }
}
