use clap::{ArgGroup, Parser};
use rayon::prelude::*;
use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use kolam_reader::preview::render_preview_rgba;
use kolam_reader::{KolamConfig, KolamReport, PixelField, load_config, process, run_guarded};

#[derive(Parser, Debug)]
#[command(
    name = "kolam",
    about = "Analyse kolam images and write analysis JSON, reconstruction JSON, SVG and previews",
    version,
    group(
        ArgGroup::new("action")
            .required(true)
            .multiple(true)
            .args(["analysis", "reconstruction", "svg", "preview"])
    )
)]
struct Cli {
    /// Image file or directory containing input images
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output directory (defaults to the current directory)
    #[arg(short = 'o', long = "out", default_value = ".")]
    out: PathBuf,

    /// JSON config overriding detection thresholds
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write <stem>_analysis.json
    #[arg(long = "analysis", short = 'a')]
    analysis: bool,

    /// Write <stem>_reconstruction.json
    #[arg(long = "reconstruction", short = 'r')]
    reconstruction: bool,

    /// Write <stem>.svg
    #[arg(long = "svg", short = 's')]
    svg: bool,

    /// Write <stem>_preview.png
    #[arg(long = "preview", short = 'p')]
    preview: bool,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(format!("Not a file or directory: {}", input.display()).into());
    }
    let mut images: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    images.sort();
    Ok(images)
}

fn analyse_file(path: &Path, config: &KolamConfig) -> Result<(KolamReport, PixelField), Box<dyn Error>> {
    let img = image::open(path).map_err(|e| format!("invalid image {}: {e}", path.display()))?;
    let field = PixelField::from_image(&img)?;
    let report = run_guarded("analysis", || process(&field, config))?;
    Ok((report, field))
}

fn write_outputs(
    cli: &Cli,
    stem: &str,
    report: &KolamReport,
    field: &PixelField,
    config: &KolamConfig,
) -> Result<(), Box<dyn Error>> {
    let target = |suffix: &str| cli.out.join(format!("{stem}{suffix}"));
    if cli.analysis {
        fs::write(target("_analysis.json"), serde_json::to_string_pretty(&report.analysis)?)?;
    }
    if cli.reconstruction {
        fs::write(
            target("_reconstruction.json"),
            serde_json::to_string_pretty(&report.reconstruction)?,
        )?;
    }
    if cli.svg {
        fs::write(target(".svg"), &report.reconstruction.svg)?;
    }
    if cli.preview {
        let detections = &report.detections;
        let size = config.reconstruct.canvas_size;
        let pixels = render_preview_rgba(
            &detections.dots,
            &detections.curves,
            field.width(),
            field.height(),
            &config.reconstruct,
        )?;
        if pixels.is_empty() {
            eprintln!("Preview skipped (empty canvas) for {stem}");
        } else if let Some(rgba) = image::RgbaImage::from_raw(size, size, pixels) {
            rgba.save(target("_preview.png"))?;
        } else {
            eprintln!("Failed to build RGBA preview for {stem} ({size}x{size})");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => KolamConfig::default(),
    };

    let images = collect_inputs(&cli.input)?;
    if images.is_empty() {
        eprintln!("No images found in {}", cli.input.display());
        return Ok(());
    }
    fs::create_dir_all(&cli.out)?;

    let failures: usize = images
        .par_iter()
        .map(|image_path| {
            let stem = image_path
                .file_stem()
                .and_then(OsStr::to_str)
                .unwrap_or("kolam")
                .to_string();
            let result = analyse_file(image_path, &config)
                .and_then(|(report, field)| {
                    write_outputs(&cli, &stem, &report, &field, &config)?;
                    Ok(report)
                });
            match result {
                Ok(report) => {
                    println!(
                        "{}: {} {}, {} dots, {} curves, connected={}",
                        image_path.display(),
                        report.analysis.grid,
                        report.analysis.kolam_type,
                        report.analysis.dots_detected,
                        report.analysis.curves_detected,
                        report.analysis.connected
                    );
                    0
                }
                Err(e) => {
                    eprintln!("Analysis failed for {}: {e}", image_path.display());
                    1
                }
            }
        })
        .sum();

    if failures > 0 {
        eprintln!("{failures} of {} images failed", images.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_match_case_insensitively() {
        assert!(has_image_extension(Path::new("pattern.PNG")));
        assert!(has_image_extension(Path::new("dir/kolam.jpeg")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("README")));
    }
}
