use anyhow::{bail, Context, Result};
use clap::Parser;
use dicom_deident::profile::{Profile, ProfileCatalog};
use dicom_deident::{tags, AnonymizationError, Anonymized, Anonymizer};
use env_logger::Builder;
use log::{warn, Level, LevelFilter};
use rayon::prelude::*;
use std::fmt;
use std::{
    fs::File,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Built-in catalog used when no `--profiles` file is given. It covers the
/// usual directly identifying attributes and keeps the patient ID linkable
/// through the persistent hash.
const DEFAULT_CATALOG: &str = r#"
{
    "profiles": {
        "default": [
            { "tag": "(0008,0050)", "action": "empty", "comment": "AccessionNumber" },
            { "tag": "(0008,0080)", "action": "remove", "comment": "InstitutionName" },
            { "tag": "(0008,0090)", "action": "remove", "comment": "ReferringPhysicianName" },
            { "tag": "(0008,1030)", "action": "empty", "comment": "StudyDescription" },
            { "tag": "(0008,1048)", "action": "remove", "comment": "PhysiciansOfRecord" },
            { "tag": "(0008,1070)", "action": "remove", "comment": "OperatorsName" },
            { "tag": "(0010,0010)", "action": "remove", "comment": "PatientName" },
            { "tag": "(0010,0020)", "action": "hash_persistent", "comment": "PatientID" },
            { "tag": "(0010,0030)", "action": "empty", "comment": "PatientBirthDate" },
            { "tag": "(0010,0040)", "action": "empty", "comment": "PatientSex" },
            { "tag": "(0010,1000)", "action": "remove", "comment": "OtherPatientIDs" },
            { "tag": "(0010,1040)", "action": "remove", "comment": "PatientAddress" },
            { "tag": "(0010,2154)", "action": "remove", "comment": "PatientTelephoneNumbers" }
        ]
    }
}"#;

/// De-identify DICOM files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file ('-' for stdin) or directory
    #[arg(short, long, value_name = "INPUT_PATH")]
    input: PathBuf,

    /// Output file ('-' for stdout) or directory
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: PathBuf,

    /// JSON profile catalog (default: built-in catalog)
    #[arg(long, value_name = "PROFILES_PATH")]
    profiles: Option<PathBuf>,

    /// Name of the profile to apply
    #[arg(short, long, default_value = "default")]
    profile: String,

    /// Salt for the hash_persistent action
    #[arg(
        long,
        env = "PERSISTENT_HASH_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    secret: String,

    /// Accept input without the 128-byte preamble and DICM signature
    #[arg(short, long)]
    force: bool,

    /// Recursively look for files in input directory
    #[arg(short, long)]
    recursive: bool,

    /// Continue when a file found is not DICOM
    #[arg(short, long = "continue")]
    r#continue: bool,

    /// Show more verbose output
    #[arg(short, long)]
    verbose: bool,
}

struct DicomOutputFilePath {
    study_instance_uid: String,
    series_instance_uid: String,
    sop_instance_uid: String,
}

impl fmt::Display for DicomOutputFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}.dcm",
            self.study_instance_uid, self.series_instance_uid, self.sop_instance_uid
        )
    }
}

impl DicomOutputFilePath {
    fn to_path_buf(&self) -> PathBuf {
        format!("{}", self).into()
    }

    fn from_anonymized(anonymized: &Anonymized) -> Result<Self> {
        let uid_of = |tag| {
            anonymized
                .dataset()
                .get(tag)
                .and_then(|elem| elem.string_value())
                .with_context(|| format!("missing {tag} in anonymized output"))
        };
        Ok(Self {
            study_instance_uid: uid_of(tags::STUDY_INSTANCE_UID)?,
            series_instance_uid: uid_of(tags::SERIES_INSTANCE_UID)?,
            sop_instance_uid: uid_of(tags::SOP_INSTANCE_UID)?,
        })
    }
}

fn anonymize(
    anonymizer: &Anonymizer,
    profile: &Profile,
    input_path: &PathBuf,
    output_path: &PathBuf,
) -> Result<()> {
    let input_src: Box<dyn Read> = if input_path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(input_path)
                .with_context(|| format!("failed to open {}", input_path.display()))?,
        )
    };

    let anonymized = anonymizer
        .anonymize(input_src, profile)
        .with_context(|| format!("failed to anonymize {}", input_path.display()))?;

    let output_target: Box<dyn Write> = if output_path == Path::new("-") {
        Box::new(io::stdout().lock())
    } else {
        let output_file_path = if output_path.is_dir() {
            let file_path = DicomOutputFilePath::from_anonymized(&anonymized)?;
            &output_path.join(file_path.to_path_buf())
        } else {
            output_path
        };

        // Create intermediate output file directories if they don't exist yet
        if let Some(parent_dir) = output_file_path.parent() {
            std::fs::create_dir_all(parent_dir)?;
        }

        Box::new(
            File::create(output_file_path)
                .with_context(|| format!("failed to create {}", output_file_path.display()))?,
        )
    };
    anonymized
        .write(output_target)
        .with_context(|| format!("failed to write output for {}", input_path.display()))?;

    Ok(())
}

fn load_profile(args: &Args) -> Result<Profile> {
    let catalog = match &args.profiles {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            ProfileCatalog::from_reader(file)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => ProfileCatalog::from_json(DEFAULT_CATALOG)?,
    };
    Ok(catalog.get(&args.profile)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug => "Debug",
                Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .filter(None, log_level);
    builder.init();

    let profile = load_profile(&args)?;
    let anonymizer = Anonymizer::new(args.secret.clone()).with_force(args.force);

    let input_path = &args.input;
    let output_path = &args.output;

    // Input is stdin or a file
    if input_path == Path::new("-") || input_path.is_file() {
        anonymize(&anonymizer, &profile, input_path, output_path)?;
        return Ok(());
    }

    // Input is a directory
    if input_path.is_dir() {
        if output_path == Path::new("-") || !output_path.is_dir() {
            bail!("output path should be an existing directory");
        }

        let mut walk_dir = WalkDir::new(input_path);
        if !args.recursive {
            walk_dir = walk_dir.max_depth(1);
        }

        // Process files
        walk_dir
            .into_iter()
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path_buf = entry.into_path();
                if path_buf.is_file() {
                    Some(path_buf)
                } else {
                    None
                }
            })
            .par_bridge() // convert to a parallel iterator
            .try_for_each(|path_buf| {
                let result = anonymize(&anonymizer, &profile, &path_buf, output_path);
                match result {
                    Err(e) if args.r#continue => {
                        if let Some(&AnonymizationError::ReadError(_)) =
                            e.downcast_ref::<AnonymizationError>()
                        {
                            warn!("{}", e);
                            return Ok(());
                        }
                        Err(e)
                    }
                    Err(e) => Err(e),
                    Ok(v) => Ok(v),
                }
            })?;

        return Ok(());
    }

    bail!("Input should either be a file, stdin ('-') or a directory");
}
