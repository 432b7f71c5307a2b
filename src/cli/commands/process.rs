//! `nlsx process`: rewrite localize calls under the output root and write the
//! message bundles next to the rewritten files.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::debug;

use super::{CommandContext, CommandResult, CommandSummary, Diagnostic, ProcessSummary};
use crate::bundle::{MetadataAccumulator, MetadataFile};
use crate::cli::args::ProcessArgs;
use crate::cli::scan::{relative_path, scan_files};
use crate::core::analyzer::AnalyzerOptions;
use crate::core::process::{ProcessOptions, process_file};
use crate::core::source_map::SourceMapInput;
use crate::core::text::split_lines;

pub const METADATA_BUNDLE_FILE: &str = "nls.metadata.json";
pub const METADATA_HEADER_FILE: &str = "nls.metadata.header.json";

/// Settings shared by every file of one run.
struct Settings {
    root: PathBuf,
    /// Where rewritten files go; equal to `root` when rewriting in place.
    output_root: PathBuf,
    base_dir: PathBuf,
    module_name: String,
    relative_paths: bool,
}

#[derive(Default)]
struct FileOutcome {
    diagnostics: Vec<Diagnostic>,
    rewritten: bool,
    messages: usize,
}

pub fn process(args: ProcessArgs) -> Result<CommandResult> {
    let ctx = CommandContext::load(args.common.root.as_deref(), args.common.verbose)?;
    if !ctx.root.is_dir() {
        anyhow::bail!("Root directory not found: {}", ctx.root.display());
    }

    let output_root = match (&args.out_dir, &ctx.config.out_dir) {
        (None, None) => ctx.root.clone(),
        (cli, configured) => ctx.resolve(cli.as_deref(), configured.as_deref().unwrap_or(""))?,
    };
    let settings = Settings {
        root: ctx.root.clone(),
        output_root,
        base_dir: ctx.base_dir.clone(),
        module_name: args
            .module_name
            .unwrap_or_else(|| ctx.config.module_name.clone()),
        relative_paths: args.relative_paths || ctx.config.relative_paths,
    };
    let bundle_id = args.bundle_id.or_else(|| ctx.config.bundle_id.clone());

    let scan = scan_files(&ctx.root, &ctx.config.includes, &ctx.config.ignores);
    if scan.skipped_count > 0 {
        eprintln!(
            "Warning: {} path(s) skipped due to access errors{}",
            scan.skipped_count,
            if args.common.verbose {
                ""
            } else {
                " (use -v for details)"
            }
        );
    }

    let accumulator = Mutex::new(MetadataAccumulator::new());
    let outcomes: Vec<FileOutcome> = scan
        .files
        .par_iter()
        .map(|file| {
            process_one(file, &settings, &accumulator).unwrap_or_else(|err| FileOutcome {
                diagnostics: vec![Diagnostic::error(
                    relative_path(&settings.base_dir, file),
                    format!("{:#}", err),
                )],
                ..Default::default()
            })
        })
        .collect();

    let mut summary = ProcessSummary {
        files_scanned: scan.files.len(),
        ..Default::default()
    };
    let mut diagnostics = Vec::new();
    for outcome in outcomes {
        summary.files_rewritten += usize::from(outcome.rewritten);
        summary.messages += outcome.messages;
        diagnostics.extend(outcome.diagnostics);
    }

    if let Some(id) = bundle_id {
        let accumulator = accumulator
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        write_metadata_bundle(accumulator, &id, &settings)?;
        summary.bundle_id = Some(id);
    }

    Ok(CommandResult::new(
        CommandSummary::Process(summary),
        diagnostics,
    ))
}

fn process_one(
    file: &Path,
    settings: &Settings,
    accumulator: &Mutex<MetadataAccumulator>,
) -> Result<FileOutcome> {
    let relative = relative_path(&settings.root, file);
    let shown = relative_path(&settings.base_dir, file);
    let contents =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", shown))?;

    let map_path = append_to_path(file, ".map");
    let map_contents = fs::read_to_string(&map_path).ok();
    let source_map: Option<SourceMapInput> = map_contents.clone().map(Into::into);
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let options = ProcessOptions {
        relative_filename: settings.relative_paths.then_some(file_name.as_str()),
        source_map,
        analyzer: AnalyzerOptions {
            module_name: settings.module_name.clone(),
        },
    };
    let result = process_file(&relative, &contents, options)?;
    let target = settings.output_root.join(&relative);

    if !result.errors.is_empty() {
        let lines = split_lines(&contents);
        let diagnostics = result
            .errors
            .iter()
            .map(|err| {
                let source_line = lines.get(err.position.line).map(|(content, _)| *content);
                Diagnostic::error(&shown, err.kind.to_string()).at(err.position, source_line)
            })
            .collect();
        copy_unchanged(settings, &target, &contents, map_contents.as_deref())?;
        return Ok(FileOutcome {
            diagnostics,
            ..Default::default()
        });
    }

    let (Some(rewritten), Some(bundle)) = (result.contents, result.bundle) else {
        debug!("{}: unchanged", shown);
        copy_unchanged(settings, &target, &contents, map_contents.as_deref())?;
        return Ok(FileOutcome::default());
    };

    write_file(&target, &rewritten)?;
    if let Some(map) = result.source_map {
        fs::write(append_to_path(&target, ".map"), map)?;
    }

    let stem = target.with_extension("");
    fs::write(
        append_to_path(&stem, ".nls.json"),
        serde_json::to_string(&bundle.messages)?,
    )?;

    let messages = bundle.messages.len();
    let metadata = MetadataFile::new(bundle, strip_extension(&relative));
    fs::write(
        append_to_path(&stem, ".nls.metadata.json"),
        serde_json::to_string_pretty(&metadata)?,
    )?;
    accumulator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .add(metadata);

    debug!("{}: {} message(s)", shown, messages);
    Ok(FileOutcome {
        diagnostics: Vec::new(),
        rewritten: true,
        messages,
    })
}

/// Write `contents` to `target`, creating its parent directories.
fn write_file(target: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(target, contents).with_context(|| format!("Failed to write {}", target.display()))
}

/// Copy a file that was not rewritten, and its source map, into a separate
/// output root. Nothing to do when rewriting in place.
fn copy_unchanged(
    settings: &Settings,
    target: &Path,
    contents: &str,
    source_map: Option<&str>,
) -> Result<()> {
    if settings.output_root == settings.root {
        return Ok(());
    }
    write_file(target, contents)?;
    if let Some(map) = source_map {
        fs::write(append_to_path(target, ".map"), map)?;
    }
    Ok(())
}

fn write_metadata_bundle(
    accumulator: MetadataAccumulator,
    id: &str,
    settings: &Settings,
) -> Result<()> {
    let out_dir = relative_path(&settings.base_dir, &settings.output_root);
    let (bundle, header) = accumulator.finalize(id, &out_dir);

    fs::create_dir_all(&settings.output_root)?;
    let bundle_path = settings.output_root.join(METADATA_BUNDLE_FILE);
    fs::write(&bundle_path, serde_json::to_string_pretty(&bundle)?)
        .with_context(|| format!("Failed to write {}", bundle_path.display()))?;
    fs::write(
        settings.output_root.join(METADATA_HEADER_FILE),
        serde_json::to_string_pretty(&header)?,
    )?;
    Ok(())
}

fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// `src/main.js` -> `src/main`
fn strip_extension(relative: &str) -> String {
    match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains('/') => relative[..dot].to_string(),
        _ => relative.to_string(),
    }
}
