//! Training CLI: run the full pipeline and write the artifact pair.

use std::path::PathBuf;

use scorecast::config::PipelineConfig;
use scorecast::logging;
use scorecast::pipeline;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = parse_args(std::env::args().skip(1).collect())?;
    let config = cli.config;
    if let Some(path) = cli.save_config {
        config.validate().map_err(|err| err.to_string())?;
        config.save(&path).map_err(|err| err.to_string())?;
        println!("config written to {}", path.display());
        return Ok(());
    }
    if let Err(err) = logging::init(&config.artifact_dir.join("logs")) {
        eprintln!("file logging disabled: {err}");
    }

    let summary = pipeline::run(&config).map_err(|err| err.to_string())?;

    println!("selected model: {}", summary.selected);
    println!("train R2: {:.4}", summary.train_r2);
    println!("test  R2: {:.4}", summary.test_r2);
    println!(
        "rows: {} train / {} test, feature width {}",
        summary.n_train, summary.n_test, summary.feature_width
    );
    for failure in &summary.failures {
        println!("skipped candidate {}: {}", failure.name, failure.reason);
    }
    println!("artifacts written to {}", summary.artifact_dir.display());
    Ok(())
}

struct CliArgs {
    config: PipelineConfig,
    /// Write the effective config here and exit instead of training.
    save_config: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliArgs, String> {
    let mut config_path: Option<PathBuf> = None;
    let mut train_path: Option<PathBuf> = None;
    let mut artifact_dir: Option<PathBuf> = None;
    let mut split_ratio: Option<f32> = None;
    let mut seed: Option<u64> = None;
    let mut threshold: Option<f64> = None;
    let mut save_config: Option<PathBuf> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = Some(PathBuf::from(take_value(&mut iter, "--config")?)),
            "--save-config" => {
                save_config = Some(PathBuf::from(take_value(&mut iter, "--save-config")?))
            }
            "--data" => train_path = Some(PathBuf::from(take_value(&mut iter, "--data")?)),
            "--artifacts" => {
                artifact_dir = Some(PathBuf::from(take_value(&mut iter, "--artifacts")?))
            }
            "--split-ratio" => {
                split_ratio = Some(parse_number(take_value(&mut iter, "--split-ratio")?)?)
            }
            "--seed" => seed = Some(parse_number(take_value(&mut iter, "--seed")?)?),
            "--threshold" => {
                threshold = Some(parse_number(take_value(&mut iter, "--threshold")?)?)
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument {other}; see --help")),
        }
    }

    let mut config = match config_path {
        Some(path) => PipelineConfig::load(&path).map_err(|err| err.to_string())?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = train_path {
        config.train_path = path;
    }
    if let Some(dir) = artifact_dir {
        config.artifact_dir = dir;
    }
    if let Some(ratio) = split_ratio {
        config.test_split_ratio = ratio;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(threshold) = threshold {
        config.quality_threshold = threshold;
    }
    Ok(CliArgs {
        config,
        save_config,
    })
}

fn take_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next().ok_or_else(|| format!("{flag} needs a value"))
}

fn parse_number<T: std::str::FromStr>(value: String) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid number {value:?}"))
}

fn print_usage() {
    println!(
        "usage: scorecast-train [--config file.toml] [--data students.csv] \
         [--artifacts dir] [--split-ratio 0.2] [--seed 42] [--threshold 0.6] \
         [--save-config file.toml]"
    );
}
