//! Command execution handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::error::{DissolveError, Result};
use crate::filter::DissolveSummary;
use crate::io;
use crate::models::{AnyImage, ElementType, Region};
use crate::phantom::{self, PhantomSpec};
use crate::progress::ProgressObserver;
use crate::stats::LabelStats;
use crate::{with_any_image, DissolveOptions};

use super::{Context, ReportFormat};

/// Number of ticks on a progress bar
const BAR_LENGTH: u64 = 1000;

/// Forwards filter progress to an indicatif bar
struct BarObserver(ProgressBar);

impl ProgressObserver for BarObserver {
    fn progress(&self, fraction: f32) {
        self.0.set_position((fraction * BAR_LENGTH as f32) as u64);
    }
}

/// Execute the run command
pub fn execute_run(args: &super::RunArgs, ctx: &Context) -> Result<()> {
    if args.output.is_some() && args.input.len() > 1 {
        return Err(DissolveError::Other(
            "--output takes a single input; use --output-dir for several".into(),
        ));
    }

    let jobs = args
        .input
        .iter()
        .map(|input| Ok((input.clone(), output_path(args, &ctx.config, input)?)))
        .collect::<Result<Vec<(PathBuf, PathBuf)>>>()?;

    for (_, output) in &jobs {
        if output.exists() && !args.force {
            return Err(DissolveError::Other(format!(
                "{} already exists; use --force to overwrite",
                output.display()
            )));
        }
    }

    let mask = io::read_mask(&args.mask)?;
    tracing::info!(
        mask = %args.mask.display(),
        pixels = mask.count(),
        "loaded mask"
    );

    let compress = resolve_compress(args.compress, args.no_compress, ctx.config.output.compress);

    let multi = if ctx.quiet {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    } else {
        MultiProgress::new()
    };
    let bar_style = ProgressStyle::with_template(
        "{prefix:.bold.dim} [{bar:40.cyan/blue}] {percent:>3}% {msg}"
    )
    .map_err(|e| DissolveError::Other(e.to_string()))?
    .progress_chars("█▓▒░ ");

    let results: Vec<Result<DissolveSummary>> = jobs
        .par_iter()
        .map(|(input, output)| {
            let pb = multi.add(ProgressBar::new(BAR_LENGTH));
            pb.set_style(bar_style.clone());
            pb.set_prefix(
                input
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
            );
            pb.set_message("dissolving...");

            let options = DissolveOptions {
                background: args.background.unwrap_or(ctx.config.filter.background),
                region: args.region.clone(),
                compress,
                progress_updates: ctx.config.filter.progress_updates,
                observer: Some(Arc::new(BarObserver(pb.clone()))),
            };

            let result = crate::dissolve_file(input, &mask, output, &options);
            match &result {
                Ok(summary) => pb.finish_with_message(format!(
                    "{} pixels changed -> {}",
                    summary.pixels_changed,
                    output.display()
                )),
                Err(e) => pb.abandon_with_message(format!("failed: {}", e)),
            }
            result
        })
        .collect();

    let mut first_error = None;
    let mut report = RunReport::default();
    for ((input, output), result) in jobs.iter().zip(results) {
        match result {
            Ok(summary) => report.add(input, output, summary),
            Err(e) => {
                tracing::error!(input = %input.display(), "{}", e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(text) = render(&report, args.format)? {
        println!("{}", text);
    } else if !ctx.quiet {
        println!(
            "{} {} of {} image(s): {} mask pixels dissolved, {} pixels changed",
            style("Done").green().bold(),
            report.files.len(),
            jobs.len(),
            report.total.pixels_dissolved,
            report.total.pixels_changed
        );
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Per-file and total counters of a run
#[derive(Debug, Default, Serialize)]
struct RunReport {
    total: DissolveSummary,
    files: Vec<FileReport>,
}

#[derive(Debug, Serialize)]
struct FileReport {
    input: PathBuf,
    output: PathBuf,
    summary: DissolveSummary,
}

impl RunReport {
    fn add(&mut self, input: &Path, output: &Path, summary: DissolveSummary) {
        self.total.mask_pixels += summary.mask_pixels;
        self.total.pixels_dissolved += summary.pixels_dissolved;
        self.total.pixels_changed += summary.pixels_changed;
        self.total.seeds += summary.seeds;
        self.files.push(FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            summary,
        });
    }
}

/// Serialize `value` for the machine-readable formats; `None` for pretty output
fn render<S: Serialize>(value: &S, format: ReportFormat) -> Result<Option<String>> {
    Ok(match format {
        ReportFormat::Pretty => None,
        ReportFormat::Json => Some(serde_json::to_string_pretty(value)?),
        ReportFormat::Toml => Some(
            toml::to_string_pretty(value).map_err(|e| DissolveError::Other(e.to_string()))?,
        ),
    })
}

/// Where `input` is written when no explicit output is given
fn output_path(args: &super::RunArgs, config: &Config, input: &Path) -> Result<PathBuf> {
    if let Some(ref output) = args.output {
        return Ok(output.clone());
    }

    let stem = input
        .file_stem()
        .ok_or_else(|| DissolveError::Other(format!("cannot derive an output name from {}", input.display())))?
        .to_string_lossy();
    let name = format!("{}{}.{}", stem, config.output.suffix, config.output.extension);

    let dir = args
        .output_dir
        .clone()
        .or_else(|| config.output.dir.clone())
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    Ok(dir.join(name))
}

fn resolve_compress(compress: bool, no_compress: bool, default: bool) -> bool {
    if no_compress {
        false
    } else if compress {
        true
    } else {
        default
    }
}

/// Execute the phantom command
pub fn execute_phantom(args: &super::PhantomArgs, ctx: &Context) -> Result<()> {
    let params = PhantomSpec {
        size: args.size.clone(),
        label: args.label,
        mask_region: Region::new(args.mask_index.clone(), args.mask_size.clone())?,
    };
    let compress = resolve_compress(false, args.no_compress, ctx.config.output.compress);

    let (image, mask) = phantom::generate(&params)?;
    io::write_image(&args.image, &AnyImage::from(image), compress)?;
    io::write_image(&args.mask, &AnyImage::from(mask.to_image(1u8)), compress)?;

    if !ctx.quiet {
        println!("Created {}", args.image.display());
        println!("Created {}", args.mask.display());
    }
    Ok(())
}

/// Image summary printed by the info command
#[derive(Debug, Serialize)]
struct ImageInfo {
    path: PathBuf,
    element_type: ElementType,
    size: Vec<usize>,
    spacing: Vec<f64>,
    origin: Vec<f64>,
    stats: LabelStats,
}

/// Execute the info command
pub fn execute_info(args: &super::InfoArgs) -> Result<()> {
    let image = io::read_image(&args.image)?;
    let mask = match &args.mask {
        Some(path) => {
            let mask = io::read_mask(path)?;
            mask.check_size(image.size())?;
            Some(mask)
        }
        None => None,
    };

    let info = ImageInfo {
        path: args.image.clone(),
        element_type: image.element_type(),
        size: image.size().to_vec(),
        spacing: image.spacing().to_vec(),
        origin: image.origin().to_vec(),
        stats: with_any_image!(&image, img => LabelStats::compute(img, mask.as_ref())),
    };

    if let Some(text) = render(&info, args.format)? {
        println!("{}", text);
        return Ok(());
    }

    println!("Image Information");
    println!("═══════════════════════════════════════");
    println!("Path:         {}", info.path.display());
    println!("Pixel type:   {} ({})", info.element_type, info.element_type.rust_name());
    println!("Size:         {:?}", info.size);
    println!("Spacing:      {:?}", info.spacing);
    println!("Origin:       {:?}", info.origin);
    println!("Pixels:       {}", info.stats.total_pixels);
    if let Some(mask_pixels) = info.stats.mask_pixels {
        println!("Mask pixels:  {}", mask_pixels);
    }

    println!("\n{}", style(format!("Labels ({})", info.stats.num_labels())).bold());
    for (label, count) in &info.stats.labels {
        let masked = info
            .stats
            .masked_labels
            .as_ref()
            .and_then(|m| m.get(label))
            .map(|c| format!("  ({} masked)", c))
            .unwrap_or_default();
        println!("  {:>8}: {}{}", label, count, masked);
    }

    Ok(())
}

/// Execute the config command
pub fn execute_config(args: &super::ConfigArgs, ctx: &Context) -> Result<()> {
    let path = &ctx.config_path;

    match &args.command {
        super::ConfigCommands::Show => {
            println!("{}", toml::to_string_pretty(&ctx.config).map_err(|e| DissolveError::Other(e.to_string()))?);
        }
        super::ConfigCommands::Path => {
            println!("{}", path.display());
        }
        super::ConfigCommands::Reset => {
            Config::reset(path)?;
            println!("Configuration reset to defaults");
        }
        super::ConfigCommands::Set { key, value } => {
            let mut config = ctx.config.clone();
            config.set(key, value)?;
            config.save_to(path)?;
            println!("Set {} = {}", key, value);
        }
        super::ConfigCommands::Get { key } => {
            if let Some(value) = ctx.config.get(key) {
                println!("{}", value);
            } else {
                println!("Key '{}' not found", key);
            }
        }
        super::ConfigCommands::Init { force } => {
            Config::init(path, *force)?;
            println!("Configuration initialized at {}", path.display());
        }
    }

    Ok(())
}
