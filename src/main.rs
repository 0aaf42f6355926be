use std::{
    io::Cursor,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tile_recolor::{
    color::{Channel, Preset},
    config::AppConfig,
    console::ConsoleView,
    data::ImageRef,
    endpoint::{http::Client, ConfigBuilder},
    media::desktop::{DesktopDevice, Source},
    progress::ProgressConfig,
    screen::{state::ConcurrencyPolicy, Acquisition, RecolorOutcome, Screen},
};
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Recolor the tiles in a photo through a remote endpoint")]
struct Cli {
    /// More log output, repeat for more
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Acquire a photo, recolor it and write the displayed image
    Recolor {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        color: ColorArgs,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Re-encode the output in this format instead of writing it as received
        #[arg(short, long)]
        format: Option<ImageFormat>,

        /// Press "Original Look" before writing
        #[arg(long)]
        revert: bool,

        /// Recolor endpoint url
        #[arg(short, long)]
        endpoint: Option<Url>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// What to do with a recolor issued while another is in flight
        #[arg(long)]
        policy: Option<Policy>,

        /// Hide the loading spinner
        #[arg(long)]
        no_progress: bool,
    },
    /// List the preset colors
    Presets,
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Photo to select from the library
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Take the photo from an encoded frame on stdin
    #[arg(long)]
    capture: bool,
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
struct ColorArgs {
    /// Preset tile color
    #[arg(short, long)]
    preset: Option<PresetArg>,

    /// Custom color, one value per channel
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], allow_hyphen_values = true)]
    rgb: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Red,
    Green,
    Blue,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Red => Preset::Red,
            PresetArg::Green => Preset::Green,
            PresetArg::Blue => Preset::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Reject,
    Supersede,
}

impl From<Policy> for ConcurrencyPolicy {
    fn from(value: Policy) -> Self {
        match value {
            Policy::Reject => ConcurrencyPolicy::Reject,
            Policy::Supersede => ConcurrencyPolicy::Supersede,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(value: ImageFormat) -> Self {
        match value {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Webp => image::ImageFormat::WebP,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    env_logger::Builder::new()
        .filter_level(config.log_level().raised_by(cli.verbose).to_level_filter())
        .parse_default_env()
        .init();
    log::debug!("{:?}", cli);

    match cli.command {
        Command::Recolor {
            source,
            color,
            output,
            format,
            revert,
            endpoint,
            timeout,
            policy,
            no_progress,
        } => {
            let endpoint = match endpoint {
                Some(url) => url,
                None => Url::parse(config.endpoint()).context("Invalid endpoint in config")?,
            };
            let timeout = timeout.map(Duration::from_secs).or(config.timeout());
            let client = Client::new(ConfigBuilder::new(endpoint).set_timeout(timeout).build());

            let mut options = config.screen_options();
            if let Some(policy) = policy {
                options.policy = policy.into();
            }

            let progress = if no_progress {
                ProgressConfig::disabled()
            } else {
                ProgressConfig::default()
            };

            let source = match source.image {
                Some(path) => Source::File(path),
                None => Source::Stdin,
            };
            let capture = source == Source::Stdin;
            let screen = Screen::new(
                DesktopDevice::new(source),
                client,
                ConsoleView::new(progress),
                options,
            );

            let acquired = if capture {
                screen.take_photo().await
            } else {
                screen.select_photo().await
            };
            if acquired != Acquisition::Acquired {
                bail!("No photo acquired ({:?})", acquired);
            }

            let outcome = match (color.preset, color.rgb) {
                (Some(preset), _) => screen.recolor_preset(preset.into()).await,
                (None, Some(rgb)) => {
                    let channels = [Channel::R, Channel::G, Channel::B];
                    for (channel, text) in channels.into_iter().zip(&rgb) {
                        screen.set_custom_channel(channel, text);
                    }
                    screen.recolor_custom().await
                }
                (None, None) => bail!("Either --preset or --rgb is required"),
            };
            if outcome != RecolorOutcome::Applied {
                bail!("Recolor was not applied ({:?})", outcome);
            }

            if revert {
                screen.revert();
            }

            let displayed = screen.displayed().context("Nothing to display")?;
            write_image(&displayed, &output, format).await?;
            println!("{}", output.display());
        }
        Command::Presets => {
            for preset in Preset::all() {
                println!("{:<12} {}", preset.label(), preset.color());
            }
        }
    };

    Ok(())
}

async fn write_image(image: &ImageRef, output: &Path, format: Option<ImageFormat>) -> Result<()> {
    let bytes = match image {
        ImageRef::File(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        ImageRef::DataUrl(url) => url.to_bytes()?,
    };

    let bytes = match format {
        Some(format) => {
            let mut decoded = image::load_from_memory(&bytes).context("Failed to decode image")?;
            // no alpha channel in jpeg
            if let ImageFormat::Jpeg = format {
                decoded = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
            }
            let mut encoded = Vec::new();
            decoded.write_to(&mut Cursor::new(&mut encoded), format.into())?;
            encoded
        }
        None => bytes,
    };

    tokio::fs::write(output, bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
