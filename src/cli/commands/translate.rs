//! `nlsx translate`: merge `.i18n.json` translations into per-language
//! message files.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::debug;

use super::{CommandContext, CommandResult, CommandSummary, Diagnostic, TranslateSummary};
use super::process::METADATA_BUNDLE_FILE;
use crate::bundle::{
    MetadataBundle, MetadataFile, PackageJsonMessageBundle, TranslationMap, localize_messages,
    localize_package_messages, localized_file_path, read_localized_messages,
    resolve_message_bundle,
};
use crate::cli::args::TranslateArgs;
use crate::cli::scan::{METADATA_FILE_SUFFIX, PACKAGE_MESSAGES_FILE, relative_path, scan_bundle_files};

/// A target language: the folder holding its `.i18n.json` files and the id
/// used in output file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub folder: String,
    pub id: String,
}

impl Language {
    /// Parse `FOLDER[:ID]`; the id defaults to the folder name.
    pub fn parse(value: &str) -> Result<Self> {
        let (folder, id) = match value.split_once(':') {
            Some((folder, id)) => (folder.trim(), id.trim()),
            None => (value.trim(), value.trim()),
        };
        if folder.is_empty() || id.is_empty() {
            anyhow::bail!("Invalid language \"{}\", expected FOLDER[:ID]", value);
        }
        Ok(Self {
            folder: folder.to_string(),
            id: id.to_string(),
        })
    }
}

struct Translator<'a> {
    i18n: &'a Path,
    root: &'a Path,
    base_dir: &'a Path,
    languages: &'a [Language],
    diagnostics: Vec<Diagnostic>,
    files_written: usize,
}

pub fn translate(args: TranslateArgs) -> Result<CommandResult> {
    let ctx = CommandContext::load(args.common.root.as_deref(), args.common.verbose)?;
    if !ctx.root.is_dir() {
        anyhow::bail!("Root directory not found: {}", ctx.root.display());
    }
    let i18n = ctx.resolve(args.i18n.as_deref(), &ctx.config.i18n_root)?;
    let languages = args
        .languages
        .iter()
        .map(|l| Language::parse(l))
        .collect::<Result<Vec<_>>>()?;

    let scan = scan_bundle_files(&ctx.root, &ctx.config.ignores);
    let mut translator = Translator {
        i18n: &i18n,
        root: &ctx.root,
        base_dir: &ctx.base_dir,
        languages: &languages,
        diagnostics: Vec::new(),
        files_written: 0,
    };

    for file in &scan.files {
        let outcome = if is_package_file(file) {
            translator.translate_package(file)
        } else {
            translator.translate_metadata(file)
        };
        if let Err(err) = outcome {
            let display = relative_path(&ctx.base_dir, file);
            translator
                .diagnostics
                .push(Diagnostic::error(display, format!("{:#}", err)));
        }
    }

    let bundle_path = ctx.root.join(METADATA_BUNDLE_FILE);
    if bundle_path.is_file() {
        translator.translate_bundle(&bundle_path)?;
    }

    let summary = TranslateSummary {
        bundles: scan.files.len(),
        languages: languages.len(),
        files_written: translator.files_written,
    };
    Ok(CommandResult::new(
        CommandSummary::Translate(summary),
        translator.diagnostics,
    ))
}

impl Translator<'_> {
    /// `<X>.nls.metadata.json` -> `<X>.nls.<id>.json` per language.
    fn translate_metadata(&mut self, path: &Path) -> Result<()> {
        let display = relative_path(self.base_dir, path);
        let metadata: MetadataFile = read_json(path)?;
        let Some(resolved) = resolve_message_bundle(&metadata.bundle()) else {
            anyhow::bail!("keys and messages differ in length");
        };

        for language in self.languages {
            let translations = self.read_translations(language, &display, &metadata.file_path)?;
            let localized = localize_messages(&resolved, translations.as_ref());
            self.report_problems(&display, language, localized.problems);

            let target = sibling(path, METADATA_FILE_SUFFIX, &format!(".nls.{}.json", language.id));
            self.write(&target, &serde_json::to_string(&localized.messages)?)?;
        }
        Ok(())
    }

    /// `package.nls.json` -> `package.nls.<id>.json` per language, reading
    /// `package.i18n.json` from the matching directory of the language folder.
    fn translate_package(&mut self, path: &Path) -> Result<()> {
        let display = relative_path(self.base_dir, path);
        let bundle: PackageJsonMessageBundle = read_json(path)?;
        let dir = path
            .parent()
            .map(|p| relative_path(self.root, p))
            .unwrap_or_default();
        let filename = if dir.is_empty() {
            "package".to_string()
        } else {
            format!("{}/package", dir)
        };

        for language in self.languages {
            let translations = self.read_translations(language, &display, &filename)?;
            let localized = localize_package_messages(&bundle, translations.as_ref());
            self.report_problems(&display, language, localized.problems);

            let target = sibling(
                path,
                PACKAGE_MESSAGES_FILE,
                &format!("package.nls.{}.json", language.id),
            );
            self.write(&target, &serde_json::to_string_pretty(&localized.messages)?)?;
        }
        Ok(())
    }

    /// `nls.metadata.json` -> `nls.bundle.<id>.json` per language. Problems
    /// were already reported for the per-file metadata.
    fn translate_bundle(&mut self, path: &Path) -> Result<()> {
        let bundle: MetadataBundle = read_json(path)?;
        for language in self.languages {
            let mut localized_bundle = BTreeMap::new();
            for (file_path, entry) in &bundle {
                let Some(resolved) = resolve_message_bundle(entry) else {
                    debug!("{}: keys and messages differ in length", file_path);
                    continue;
                };
                let file = localized_file_path(self.i18n, &language.folder, None, file_path);
                let translations = read_localized_messages(&file)?;
                localized_bundle.insert(
                    file_path.clone(),
                    localize_messages(&resolved, translations.as_ref()).messages,
                );
            }
            let target = sibling(
                path,
                METADATA_BUNDLE_FILE,
                &format!("nls.bundle.{}.json", language.id),
            );
            self.write(&target, &serde_json::to_string(&localized_bundle)?)?;
        }
        Ok(())
    }

    fn read_translations(
        &mut self,
        language: &Language,
        display: &str,
        filename: &str,
    ) -> Result<Option<TranslationMap>> {
        let file = localized_file_path(self.i18n, &language.folder, None, filename);
        let translations = read_localized_messages(&file)?;
        if translations.is_none() {
            self.diagnostics.push(Diagnostic::warning(
                display,
                format!(
                    "No localized messages found for file {} [{}]",
                    filename, language.id
                ),
            ));
        }
        Ok(translations)
    }

    fn report_problems(&mut self, display: &str, language: &Language, problems: Vec<String>) {
        self.diagnostics.extend(
            problems
                .into_iter()
                .map(|p| Diagnostic::warning(display, format!("{} [{}]", p, language.id))),
        );
    }

    fn write(&mut self, target: &Path, contents: &str) -> Result<()> {
        fs::write(target, contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        self.files_written += 1;
        Ok(())
    }
}

fn is_package_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name == PACKAGE_MESSAGES_FILE)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Replace the `suffix` of the file name with `replacement`.
fn sibling(path: &Path, suffix: &str, replacement: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(suffix).unwrap_or(&name);
    path.with_file_name(format!("{}{}", stem, replacement))
}
