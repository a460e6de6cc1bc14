use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "oralmark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay one view's annotations over its base image and write a PNG.
    Render(RenderArgs),
    /// Flatten one view, store it through a directory-backed uploader, and
    /// update the submission document in place.
    Export(ExportArgs),
    /// Validate a submission document and print a summary.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Submission document JSON.
    #[arg(long = "submission")]
    submission_path: PathBuf,

    /// View to replay.
    #[arg(long, value_enum)]
    view: ViewChoice,

    /// Base image path; defaults to the submission's reference for the
    /// view, resolved relative to the document.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Maximum surface width the base image is fitted into.
    #[arg(long, default_value_t = 800)]
    max_width: u32,

    /// Maximum surface height the base image is fitted into.
    #[arg(long, default_value_t = 600)]
    max_height: u32,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Submission document JSON; updated in place after the export.
    #[arg(long = "submission")]
    submission_path: PathBuf,

    /// View to export.
    #[arg(long, value_enum)]
    view: ViewChoice,

    /// Base image path; defaults to the submission's reference for the
    /// view, resolved relative to the document.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Root directory the uploader stores assets under.
    #[arg(long, default_value = "store")]
    store: PathBuf,

    /// Maximum surface width the base image is fitted into.
    #[arg(long, default_value_t = 800)]
    max_width: u32,

    /// Maximum surface height the base image is fitted into.
    #[arg(long, default_value_t = 600)]
    max_height: u32,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Submission document JSON.
    #[arg(long = "submission")]
    submission_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewChoice {
    Upper,
    Front,
    Bottom,
}

impl From<ViewChoice> for oralmark::View {
    fn from(v: ViewChoice) -> Self {
        match v {
            ViewChoice::Upper => oralmark::View::Upper,
            ViewChoice::Front => oralmark::View::Front,
            ViewChoice::Bottom => oralmark::View::Bottom,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Export(args) => cmd_export(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_submission(path: &Path) -> anyhow::Result<oralmark::Submission> {
    let f = File::open(path).with_context(|| format!("open submission '{}'", path.display()))?;
    let r = BufReader::new(f);
    let submission: oralmark::Submission =
        serde_json::from_reader(r).with_context(|| "parse submission JSON")?;
    Ok(submission)
}

fn read_base_image(
    override_path: Option<&Path>,
    submission: &oralmark::Submission,
    view: oralmark::View,
    submission_path: &Path,
) -> anyhow::Result<Vec<u8>> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => {
            let root = submission_path.parent().unwrap_or_else(|| Path::new("."));
            root.join(submission.base_image_url(view))
        }
    };
    std::fs::read(&path).with_context(|| format!("read base image '{}'", path.display()))
}

fn fitted_frame(
    submission: &oralmark::Submission,
    view: oralmark::View,
    image_bytes: &[u8],
    max_width: u32,
    max_height: u32,
) -> anyhow::Result<oralmark::Frame> {
    let base = oralmark::decode_base_image(image_bytes)?;
    let max = oralmark::Surface::new(max_width, max_height)?;
    let surface = oralmark::Surface::fit(base.width, base.height, max)?;
    let frame = oralmark::render(&base, surface, submission.annotation_data.get(view))?;
    Ok(frame)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let submission = read_submission(&args.submission_path)?;
    submission.validate()?;
    let view = oralmark::View::from(args.view);

    let bytes = read_base_image(
        args.image.as_deref(),
        &submission,
        view,
        &args.submission_path,
    )?;
    let frame = fitted_frame(&submission, view, &bytes, args.max_width, args.max_height)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut submission = read_submission(&args.submission_path)?;
    submission.validate()?;
    let view = oralmark::View::from(args.view);

    let bytes = read_base_image(
        args.image.as_deref(),
        &submission,
        view,
        &args.submission_path,
    )?;
    let frame = fitted_frame(&submission, view, &bytes, args.max_width, args.max_height)?;
    let records = submission.annotation_data.get(view).to_vec();

    let bridge = oralmark::ExportBridge::new();
    let uploader = oralmark::FsUploader::new(&args.store);
    let outcome = bridge.export_view(&uploader, &mut submission, view, &records, &frame)?;

    let mut json =
        serde_json::to_string_pretty(&submission).with_context(|| "serialize submission JSON")?;
    json.push('\n');
    std::fs::write(&args.submission_path, json).with_context(|| {
        format!(
            "write submission '{}'",
            args.submission_path.display()
        )
    })?;

    eprintln!("wrote {}", outcome.reference);
    eprintln!("updated {}", args.submission_path.display());
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let submission = read_submission(&args.submission_path)?;
    submission.validate()?;

    println!("submission {}", submission.id);
    println!(
        "  patient: {} ({})",
        submission.patient_name, submission.patient_id
    );
    println!("  status:  {}", submission.status);
    for view in oralmark::View::ALL {
        println!(
            "  {view}:  {} record(s), annotated: {}",
            submission.annotation_data.len(view),
            submission.annotated_image_url(view).unwrap_or("-"),
        );
    }
    if let Some(report) = &submission.report_url {
        println!("  report:  {report}");
    }
    Ok(())
}
