//! CLI Entry Point for kuwahara
//!
//! Provides command-line interface for:
//! - Filtering a plain graymap in memory (resident profile)
//! - Simulating the two-phase streaming protocol in one process
//! - Serving as the streaming device on a serial port
//! - Sending an image through a device as the host
//! - Comparing two filtered images
//!
//! # Usage
//!
//! Filter a file:
//! ```bash
//! kuwahara filter imgs_original/mona_lisa.ascii.pgm
//! ```
//!
//! Stream through a device attached on a serial port:
//! ```bash
//! kuwahara --config config/kuwahara.toml send mona_lisa.ascii.pgm --port /dev/ttyACM0
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use kuwahara_stream::codec::{read_pgm, write_pgm};
use kuwahara_stream::compare::compare;
use kuwahara_stream::config::{DeploymentProfile, Settings, DEFAULT_CONFIG_PATH};
use kuwahara_stream::controller::StreamController;
use kuwahara_stream::filter::{KuwaharaFilter, VarianceMode};
use kuwahara_stream::host::HostSession;
use kuwahara_stream::resident::ResidentRunner;
use kuwahara_stream::tracing_setup;
use kuwahara_stream::transport::{ChannelTransport, SerialTransportBuilder};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::info;

#[derive(Parser)]
#[command(name = "kuwahara")]
#[command(about = "Kuwahara edge-preserving filter with bounded-memory streaming", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter an image with the whole grid in memory
    Filter {
        /// Input plain graymap (P2)
        input: PathBuf,

        /// Output path (default: imgs_filtered/<input file name>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Window size override
        #[arg(long)]
        window: Option<usize>,

        /// Variance mode override (sample or population)
        #[arg(long)]
        variance: Option<VarianceMode>,
    },

    /// Run device and host over an in-memory link and check the result
    Simulate {
        /// Input plain graymap (P2), N x N
        input: PathBuf,

        /// Where to write the streamed result
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Act as the filtering device on a serial port
    Serve {
        /// Serial port override
        #[arg(long)]
        port: Option<String>,

        /// Image to print in the resident profile
        #[arg(long)]
        image: Option<PathBuf>,

        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Stream an image through a device on a serial port
    Send {
        /// Input plain graymap (P2), N x N
        input: PathBuf,

        /// Output path (default: filtered_<timestamp>.pgm)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Serial port override
        #[arg(long)]
        port: Option<String>,
    },

    /// Compare two images pixel by pixel
    Compare {
        /// First image
        a: PathBuf,
        /// Second image
        b: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
        settings.validate()?;
    }
    tracing_setup::init_from_settings(&settings)?;

    match cli.command {
        Commands::Filter {
            input,
            output,
            window,
            variance,
        } => run_filter(settings, &input, output, window, variance),
        Commands::Simulate { input, output } => run_simulation(&settings, &input, output),
        Commands::Serve {
            port,
            image,
            cycles,
        } => run_device(settings, port, image, cycles),
        Commands::Send {
            input,
            output,
            port,
        } => run_host(settings, &input, output, port),
        Commands::Compare { a, b } => run_compare(&a, &b),
        Commands::Config => {
            print!("{}", settings.to_toml_string()?);
            Ok(())
        }
    }
}

/// `imgs_filtered/<file name>` next to the working directory.
fn default_filtered_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(|| PathBuf::from("filtered.pgm"), PathBuf::from);
    PathBuf::from("imgs_filtered").join(name)
}

fn timestamped_output() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("filtered_{}.pgm", stamp))
}

fn run_filter(
    mut settings: Settings,
    input: &Path,
    output: Option<PathBuf>,
    window: Option<usize>,
    variance: Option<VarianceMode>,
) -> Result<()> {
    if let Some(size) = window {
        settings.filter.window_size = size;
    }
    if let Some(mode) = variance {
        settings.filter.variance_mode = mode;
    }

    let mut image = read_pgm(input).with_context(|| format!("reading {}", input.display()))?;
    let filter = KuwaharaFilter::from_config(&settings.filter)?;
    info!(
        "Filtering {}x{} image, window {}, {:?} variance",
        image.width(),
        image.height(),
        filter.window().size(),
        filter.mode()
    );
    filter.apply(&mut image);

    let output = output.unwrap_or_else(|| default_filtered_path(input));
    write_pgm(&output, &image)?;
    println!("Filtered image written to {}", output.display());
    Ok(())
}

fn run_simulation(settings: &Settings, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let image = read_pgm(input).with_context(|| format!("reading {}", input.display()))?;
    let (device_link, host_link) = ChannelTransport::pair();

    let mut device = StreamController::from_settings(settings, device_link)?;
    let device_thread = thread::Builder::new()
        .name("device".to_string())
        .spawn(move || device.run_cycle())?;

    let streamed = HostSession::from_settings(settings, host_link)?.process(&image);
    let device_result = device_thread
        .join()
        .map_err(|_| anyhow!("device thread panicked"))?;
    let streamed = streamed?;
    let report = device_result?;
    info!("Device finished cycle {}: {:?}", report.cycle, report.phase2);

    let resident = KuwaharaFilter::from_config(&settings.filter)?.filter(&image);
    let diff = compare(&resident, &streamed)?;
    println!("Streamed vs resident:\n{}", diff);

    if let Some(output) = output {
        write_pgm(&output, &streamed)?;
        println!("Streamed image written to {}", output.display());
    }
    Ok(())
}

fn run_device(
    mut settings: Settings,
    port: Option<String>,
    image: Option<PathBuf>,
    cycles: Option<u64>,
) -> Result<()> {
    if let Some(port) = port {
        settings.transport.port = port;
    }
    let link = SerialTransportBuilder::from_settings(&settings.transport).open()?;
    info!("Serving on {} as {:?}", link.port_name(), settings.profile);

    match settings.profile {
        DeploymentProfile::Streaming => {
            StreamController::from_settings(&settings, link)?.run(cycles)?;
        }
        DeploymentProfile::Resident => {
            let path = image.ok_or_else(|| anyhow!("the resident profile needs --image"))?;
            let image = read_pgm(&path).with_context(|| format!("reading {}", path.display()))?;
            ResidentRunner::new(&settings.filter, image, link)?.run(cycles)?;
        }
    }
    Ok(())
}

fn run_host(
    mut settings: Settings,
    input: &Path,
    output: Option<PathBuf>,
    port: Option<String>,
) -> Result<()> {
    if let Some(port) = port {
        settings.transport.port = port;
    }
    let image = read_pgm(input).with_context(|| format!("reading {}", input.display()))?;
    let link = SerialTransportBuilder::from_settings(&settings.transport).open()?;

    let filtered = HostSession::from_settings(&settings, link)?.process(&image)?;

    let output = output.unwrap_or_else(timestamped_output);
    write_pgm(&output, &filtered)?;
    println!("Filtered image written to {}", output.display());
    Ok(())
}

fn run_compare(a: &Path, b: &Path) -> Result<()> {
    let first = read_pgm(a).with_context(|| format!("reading {}", a.display()))?;
    let second = read_pgm(b).with_context(|| format!("reading {}", b.display()))?;
    print!("{}", compare(&first, &second)?);
    Ok(())
}
