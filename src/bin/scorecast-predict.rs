//! Prediction CLI: load the persisted artifact pair and score one record.
//!
//! This is the serving-boundary contract in command-line form: six named
//! inputs, one numeric output.

use std::path::PathBuf;

use scorecast::artifacts;
use scorecast::dataset::StudentRecord;
use scorecast::pipeline;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let (transformer, saved) =
        artifacts::load_artifacts(&options.artifact_dir).map_err(|err| err.to_string())?;

    let prediction = pipeline::predict_one(&transformer, &saved.model, &options.record)
        .map_err(|err| err.to_string())?;
    println!("{prediction:.2}");
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    artifact_dir: PathBuf,
    record: StudentRecord,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut artifact_dir = PathBuf::from("artifacts");
    let mut gender = None;
    let mut ethnicity = None;
    let mut parental_education = None;
    let mut lunch = None;
    let mut test_prep = None;
    let mut reading = None;
    let mut writing = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--artifacts" => artifact_dir = PathBuf::from(take_value(&mut iter, "--artifacts")?),
            "--gender" => gender = Some(take_value(&mut iter, "--gender")?),
            "--ethnicity" => ethnicity = Some(take_value(&mut iter, "--ethnicity")?),
            "--parental-education" => {
                parental_education = Some(take_value(&mut iter, "--parental-education")?)
            }
            "--lunch" => lunch = Some(take_value(&mut iter, "--lunch")?),
            "--test-prep" => test_prep = Some(take_value(&mut iter, "--test-prep")?),
            "--reading" => {
                reading = Some(parse_score(take_value(&mut iter, "--reading")?)?)
            }
            "--writing" => {
                writing = Some(parse_score(take_value(&mut iter, "--writing")?)?)
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument {other}; see --help")),
        }
    }

    let record = StudentRecord {
        gender: gender.ok_or("missing --gender")?,
        ethnicity: ethnicity.ok_or("missing --ethnicity")?,
        parental_education: parental_education.ok_or("missing --parental-education")?,
        lunch: lunch.ok_or("missing --lunch")?,
        test_prep: test_prep.ok_or("missing --test-prep")?,
        reading_score: reading.ok_or("missing --reading")?,
        writing_score: writing.ok_or("missing --writing")?,
    };
    Ok(CliOptions {
        artifact_dir,
        record,
    })
}

fn parse_score(value: String) -> Result<f32, String> {
    let score: f32 = value
        .parse()
        .map_err(|_| format!("invalid score {value:?}"))?;
    if !(0.0..=100.0).contains(&score) {
        return Err(format!("score {score} outside [0, 100]"));
    }
    Ok(score)
}

fn take_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next().ok_or_else(|| format!("{flag} needs a value"))
}

fn print_usage() {
    println!(
        "usage: scorecast-predict [--artifacts dir] --gender F --ethnicity G \
         --parental-education E --lunch L --test-prep P --reading 72 --writing 74"
    );
}
