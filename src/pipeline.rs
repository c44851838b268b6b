//! Extraction and injection runs.
//!
//! Each run owns one scratch directory for its lifetime and goes through its
//! stages strictly in order; the first error aborts the run.

use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::Path;

use crate::archive::{self, ScratchDir};
use crate::config::{Mode, RunConfig};
use crate::error::{Result, SketchError};
use crate::page::{self, PageMutator};
use crate::table::{self, LookupTable};

/// Outcome of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub pages: usize,
    /// Rows written to the table
    pub entries: usize,
    /// Entries dropped because their label was already seen
    pub duplicates_dropped: usize,
}

/// Outcome of an injection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    pub pages: usize,
    /// Pages saved back because at least one text changed
    pub pages_rewritten: usize,
    pub fields_written: usize,
    pub fields_changed: usize,
    /// Table labels that matched no object in any page
    pub unmatched_labels: Vec<String>,
}

/// Run the pipeline selected by `config.mode`.
pub fn run(config: &RunConfig) -> Result<()> {
    match config.mode {
        Mode::Extract => {
            let report = extract(config)?;
            info!(
                "Done. {} strings from {} pages written to {}",
                report.entries,
                report.pages,
                config.output.display()
            );
        }
        Mode::Inject => {
            let report = inject(config)?;
            info!(
                "Done. {} of {} pages updated ({} strings changed) in {}",
                report.pages_rewritten,
                report.pages,
                report.fields_changed,
                config.output.display()
            );
        }
    }
    Ok(())
}

/// Unpack → enumerate pages → parse → filter → dedup → write table.
pub fn extract(config: &RunConfig) -> Result<ExtractionReport> {
    require_file(&config.input)?;

    let scratch = archive::unpack(&config.input)?;
    let pages = list_pages(&scratch, &config.input)?;
    info!("Pages loading... {} found", pages.len());

    let mut found = Vec::new();
    for page_path in &pages {
        debug!("Parsing {}", page_path.display());
        let document = page::load(page_path)?;
        let entries = page::collect_entries(&document, &config.prefix);
        debug!("  {} marked strings", entries.len());
        found.extend(entries);
    }

    let (entries, duplicates_dropped) = table::dedup_first_wins(found);
    if duplicates_dropped > 0 {
        warn!("{} duplicate labels dropped; the first occurrence was kept", duplicates_dropped);
    }

    info!("Saving output to {}...", config.output.display());
    table::write_csv(&config.output, &entries)?;

    Ok(ExtractionReport {
        pages: pages.len(),
        entries: entries.len(),
        duplicates_dropped,
    })
}

/// Read table → unpack → mutate each page → repack onto the same archive.
pub fn inject(config: &RunConfig) -> Result<InjectionReport> {
    require_file(&config.input)?;
    require_file(&config.output)?;

    let lookup = LookupTable::read_csv(&config.input, &config.prefix)?;
    info!("Loaded {} strings from {}", lookup.len(), config.input.display());

    let scratch = archive::unpack(&config.output)?;
    let pages = list_pages(&scratch, &config.output)?;
    info!("Pages loading... {} found", pages.len());

    let mutator = PageMutator::new(&lookup, &config.prefix);
    let mut report = InjectionReport {
        pages: pages.len(),
        ..Default::default()
    };
    let mut applied = BTreeSet::new();

    for page_path in &pages {
        debug!("Updating {}", page_path.display());
        let mut document = page::load(page_path)?;
        let changes = mutator.apply(&mut document);

        if changes.is_modified() {
            page::save(page_path, &document)?;
            report.pages_rewritten += 1;
        }
        report.fields_written += changes.fields_written;
        report.fields_changed += changes.fields_changed;
        applied.extend(changes.labels_applied);
    }

    report.unmatched_labels = lookup
        .labels()
        .into_iter()
        .filter(|label| !applied.contains(*label))
        .map(str::to_string)
        .collect();
    for label in &report.unmatched_labels {
        debug!("Label '{}' matched no layer", label);
    }
    if !report.unmatched_labels.is_empty() {
        info!("{} labels matched no layer", report.unmatched_labels.len());
    }

    archive::repack(&scratch, &config.output)?;
    Ok(report)
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SketchError::FileNotFound(path.to_path_buf()))
    }
}

fn list_pages(scratch: &ScratchDir, archive: &Path) -> Result<Vec<std::path::PathBuf>> {
    scratch.pages().map_err(|e| SketchError::ArchiveUnpack {
        path: archive.to_path_buf(),
        source: anyhow::Error::new(e).context("Failed to list pages"),
    })
}
