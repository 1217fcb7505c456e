use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use shotreel::audit::{FixtureProfile, audit_render_files, manifest_file_uri, self_check};
use shotreel::model::{AssetManifest, RenderPlan};
use shotreel::resolve::count_stub_assets;
use shotreel::{EncoderOpts, PreviewRenderer, ProfileRegistry, RendererOpts};

#[derive(Parser, Debug)]
#[command(name = "shotreel", version)]
struct Cli {
    /// ffmpeg executable (overrides SHOTREEL_FFMPEG).
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,

    /// Encoder timeout in seconds (overrides SHOTREEL_FFMPEG_TIMEOUT_SECS).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a preview MP4 + SRT and print the result document.
    Render(RenderArgs),
    /// Render (or reuse a render) and print its fingerprint.
    Verify(RenderArgs),
    /// Render the same inputs twice and report any differences.
    Audit(AuditArgs),
    /// Verify the built-in fixture against reference hashes.
    Selfcheck(SelfcheckArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Asset manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Render plan JSON.
    #[arg(long)]
    plan: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Validate and write render_output.json without encoding.
    #[arg(long)]
    dry_run: bool,

    /// Caller correlation id (defaults to the derived output id).
    #[arg(long)]
    request_id: Option<String>,

    /// Custom profile registry JSON.
    #[arg(long)]
    profiles: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct AuditArgs {
    /// Render plan JSON.
    render_plan: PathBuf,

    /// Asset manifest JSON.
    asset_manifest: PathBuf,

    /// Compare dry-run documents only.
    #[arg(long)]
    dry_run: bool,

    /// Custom profile registry JSON.
    #[arg(long)]
    profiles: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SelfcheckArgs {
    /// Treat an mp4 hash mismatch as an error.
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value_t = ProfileChoice::Preview)]
    profile: ProfileChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileChoice {
    Preview,
    High,
}

impl From<ProfileChoice> for FixtureProfile {
    fn from(c: ProfileChoice) -> Self {
        match c {
            ProfileChoice::Preview => FixtureProfile::Preview,
            ProfileChoice::High => FixtureProfile::High,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    let mut encoder = EncoderOpts::from_env()?;
    if let Some(program) = cli.ffmpeg {
        encoder.program = program;
    }
    if let Some(secs) = cli.timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout-secs must be non-zero");
        encoder.timeout = Duration::from_secs(secs);
    }

    match cli.cmd {
        Command::Render(args) => cmd_render(args, encoder),
        Command::Verify(args) => cmd_verify(args, encoder),
        Command::Audit(args) => cmd_audit(args, encoder),
        Command::Selfcheck(args) => cmd_selfcheck(args, &encoder),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_profiles(path: Option<&Path>) -> anyhow::Result<ProfileRegistry> {
    Ok(match path {
        Some(p) => ProfileRegistry::from_path(p)?,
        None => ProfileRegistry::default(),
    })
}

fn make_renderer(
    args: &RenderArgs,
    encoder: EncoderOpts,
    dry_run: bool,
) -> anyhow::Result<PreviewRenderer> {
    let manifest = AssetManifest::from_path(&args.manifest)?;
    let plan = RenderPlan::from_path(&args.plan)?;

    let stubs = count_stub_assets(&manifest, &plan);
    if stubs > 0 {
        tracing::warn!(stubs, "visual assets are stub files of 100 bytes or less");
    }

    let opts = RendererOpts {
        dry_run,
        request_id: args.request_id.clone(),
        asset_manifest_ref: manifest_file_uri(&args.manifest)?,
        encoder,
        profiles: load_profiles(args.profiles.as_deref())?,
    };
    Ok(PreviewRenderer::new(manifest, plan, &args.out_dir, opts)?)
}

fn print_json<T: Serialize>(doc: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(doc).context("serialize output JSON")?;
    println!("{text}");
    Ok(())
}

fn cmd_render(args: RenderArgs, encoder: EncoderOpts) -> anyhow::Result<ExitCode> {
    let renderer = make_renderer(&args, encoder, args.dry_run)?;
    let out = renderer.render()?;
    print_json(&out)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_verify(args: RenderArgs, encoder: EncoderOpts) -> anyhow::Result<ExitCode> {
    anyhow::ensure!(!args.dry_run, "verify does not support --dry-run");
    let renderer = make_renderer(&args, encoder, false)?;
    let fp = renderer.verify()?;
    print_json(&fp)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_audit(args: AuditArgs, encoder: EncoderOpts) -> anyhow::Result<ExitCode> {
    let opts = RendererOpts {
        dry_run: args.dry_run,
        encoder,
        profiles: load_profiles(args.profiles.as_deref())?,
        ..RendererOpts::default()
    };
    let audit = audit_render_files(&args.render_plan, &args.asset_manifest, &opts)?;
    print_json(&audit)?;
    Ok(if audit.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_selfcheck(args: SelfcheckArgs, encoder: &EncoderOpts) -> anyhow::Result<ExitCode> {
    let report = match self_check(args.profile.into(), args.strict, encoder) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: {e}");
            eprintln!("ERROR: video verification failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    for w in &report.warnings {
        eprintln!("WARNING: {w}");
    }
    if report.is_ok() {
        println!("OK: video verified");
        Ok(ExitCode::SUCCESS)
    } else {
        for e in &report.errors {
            eprintln!("ERROR: {e}");
        }
        eprintln!("ERROR: video verification failed");
        Ok(ExitCode::FAILURE)
    }
}
