use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use remnant::application::dto::{AnalysisConfig, AnalysisSession, RunContext};
use remnant::application::{
    AnalyzeBbBackupUseCase, CarveFilesUseCase, DecryptRemFileUseCase, DetectBackupFormatUseCase,
    ExtractStringsUseCase, SearchFilesUseCase, SearchRequest,
};
use remnant::domain::services::SignatureRegistry;
use remnant::infrastructure::archive::ZipArchiveReader;
use remnant::infrastructure::persistence::LocalArtifactWriter;
use remnant::infrastructure::walk::WalkdirWalker;
use remnant::presentation::cli::{Cli, Commands, ProgressReporter, SignatureFilter, init_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Carve {
            ref path,
            ref output,
            ref disable,
        } => run_carve(&cli, config, path, output.clone(), disable),
        Commands::Search {
            ref path,
            ref query,
            hex,
            case_sensitive,
            archives,
        } => {
            let request = if hex {
                SearchRequest::hex(query.as_str())
            } else {
                SearchRequest::text(query.as_str()).case_sensitive(case_sensitive)
            }
            .in_archives(archives);
            run_search(&cli, config, path, &request)
        }
        Commands::Strings {
            ref file,
            min_length,
            limit,
        } => {
            let config = match min_length {
                Some(n) => config.with_min_string_length(n),
                None => config,
            };
            run_strings(&cli, config, file, limit)
        }
        Commands::Detect { ref path } => run_detect(&cli, config, path),
        Commands::Analyze {
            ref path,
            ref output,
        } => run_analyze(&cli, config, path, output.clone()),
        Commands::Decrypt { ref file, ref keys } => run_decrypt(&cli, config, file, keys),
        Commands::Signatures { show } => run_signatures(&cli, config, show),
    }
}

fn reporter(cli: &Cli, message: &str) -> ProgressReporter {
    if cli.json {
        ProgressReporter::hidden()
    } else {
        ProgressReporter::new(message)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_carve(
    cli: &Cli,
    config: AnalysisConfig,
    path: &Path,
    output: Option<PathBuf>,
    disable: &[String],
) -> Result<()> {
    let config = match output {
        Some(root) => config.with_output_root(root),
        None => config,
    };
    let config = disable
        .iter()
        .fold(config, |config, name| config.without_signature(name.as_str()));
    config.validate()?;

    let mut registry = SignatureRegistry::default_signatures();
    for unknown in config.apply_to_registry(&mut registry) {
        tracing::warn!(signature = %unknown, "unknown signature name ignored");
    }

    let session = AnalysisSession::new(config.output_root.clone());
    let out_dir = session.output_dir();
    let writer = LocalArtifactWriter::new(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let progress = reporter(cli, "Carving");
    let ctx = RunContext::new().with_progress(progress.callback());
    let use_case = CarveFilesUseCase::new(WalkdirWalker::new(), registry.shared(), config);
    let result = use_case
        .execute(path, &writer, &ctx)
        .with_context(|| format!("Carve failed for {}", path.display()))?;
    progress.finish("Carve complete");

    if cli.json {
        print_json(&result)
    } else {
        println!("\nSession {} -> {}", session.id(), out_dir.display());
        print!("{}", result.summary());
        Ok(())
    }
}

fn run_search(cli: &Cli, config: AnalysisConfig, path: &Path, request: &SearchRequest) -> Result<()> {
    config.validate()?;
    let progress = reporter(cli, "Searching");
    let ctx = RunContext::new().with_progress(progress.callback());
    let use_case = SearchFilesUseCase::new(WalkdirWalker::new(), ZipArchiveReader::new(), config);
    let result = use_case.execute(path, request, &ctx)?;
    progress.clear();

    if cli.json {
        return print_json(&result);
    }
    for hit in &result.hits {
        println!("{}:{:#x}  {}", hit.source, hit.offset, hit.context);
    }
    println!(
        "\n{} hit(s) in {} file(s){}",
        result.hits.len(),
        result.stats.files_scanned,
        if result.truncated { " (hit cap reached)" } else { "" }
    );
    Ok(())
}

fn run_strings(cli: &Cli, config: AnalysisConfig, file: &Path, limit: usize) -> Result<()> {
    config.validate()?;
    let progress = reporter(cli, "Extracting strings");
    let ctx = RunContext::new().with_progress(progress.callback());
    let result = ExtractStringsUseCase::new(config).execute(file, &ctx)?;
    progress.clear();

    if cli.json {
        return print_json(&result);
    }
    println!(
        "Entropy {:.3} bits/byte{}",
        result.entropy,
        if result.likely_encrypted { " (likely encrypted)" } else { "" }
    );
    for s in result.strings.iter().take(limit) {
        println!("{:>10x}  {}", s.offset, s.value);
    }
    println!(
        "\n{} string(s){}",
        result.strings.len(),
        if result.truncated { " (cap reached)" } else { "" }
    );
    Ok(())
}

fn run_detect(cli: &Cli, config: AnalysisConfig, path: &Path) -> Result<()> {
    config.validate()?;
    let use_case =
        DetectBackupFormatUseCase::new(WalkdirWalker::new(), ZipArchiveReader::new(), config);
    let result = use_case.execute(path, &RunContext::new())?;

    if cli.json {
        return print_json(&result);
    }
    println!("{} ({}% confidence)", result.format, result.confidence);
    println!("{}", result.rationale);
    println!(
        "Manifest.xml: {}, PkgInfo: {}, archive members: {}",
        result.manifest_found,
        result.pkginfo_found,
        result.archive_members.len()
    );
    Ok(())
}

fn run_analyze(cli: &Cli, config: AnalysisConfig, path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = match output {
        Some(root) => config.with_output_root(root),
        None => config,
    };
    config.validate()?;

    let session = AnalysisSession::new(config.output_root.clone());
    let progress = reporter(cli, "Analyzing");
    let ctx = RunContext::new().with_progress(progress.callback());
    let use_case =
        AnalyzeBbBackupUseCase::new(WalkdirWalker::new(), ZipArchiveReader::new(), config);
    let result = use_case
        .execute(path, &session, &ctx)
        .with_context(|| format!("Analysis failed for {}", path.display()))?;
    progress.finish("Analysis complete");

    let out_dir = session.output_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    let report = out_dir.join("analysis.json");
    fs::write(&report, serde_json::to_vec_pretty(&result)?)
        .with_context(|| format!("Failed to write {}", report.display()))?;

    if cli.json {
        print_json(&result)
    } else {
        print!("\n{}", result.summary());
        println!("Report written to {}", report.display());
        Ok(())
    }
}

fn run_decrypt(cli: &Cli, config: AnalysisConfig, file: &Path, keys: &[PathBuf]) -> Result<()> {
    config.validate()?;
    let attempt = DecryptRemFileUseCase::new(&config).execute(file, keys, &RunContext::new())?;

    if cli.json {
        return print_json(&attempt);
    }
    if !attempt.success {
        println!("No key produced readable output for {}", attempt.source);
        return Ok(());
    }
    println!("{}: {}", attempt.source, attempt.method);
    println!(
        "{} strings, {} message keywords, {} contacts, {} media headers",
        attempt.extracted_strings, attempt.message_keywords, attempt.contacts, attempt.media_signatures
    );
    for line in &attempt.preview {
        println!("  {}", line);
    }
    Ok(())
}

fn run_signatures(cli: &Cli, config: AnalysisConfig, show: SignatureFilter) -> Result<()> {
    let mut registry = SignatureRegistry::default_signatures();
    for unknown in config.apply_to_registry(&mut registry) {
        tracing::warn!(signature = %unknown, "unknown signature name ignored");
    }
    let signatures: Vec<_> = registry
        .all_signatures()
        .iter()
        .filter(|s| show == SignatureFilter::All || s.is_enabled())
        .collect();

    if cli.json {
        return print_json(&signatures);
    }
    println!("{:<10} {:<6} {:>10} {:<8} HEADER", "NAME", "EXT", "MAX", "ENABLED");
    println!("{}", "-".repeat(56));
    for sig in signatures {
        println!(
            "{:<10} {:<6} {:>10} {:<8} {}",
            sig.name(),
            sig.extension(),
            sig.max_size(),
            sig.is_enabled(),
            hex::encode(sig.header())
        );
    }
    Ok(())
}
