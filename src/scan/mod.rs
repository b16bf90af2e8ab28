//! Content scanning: resolve sources, read files, extract class tokens.
//!
//! Files are read and scanned in parallel. Each file yields its own token
//! set and the sets are merged by union, so the result is the same for
//! any split of the work.
//!
//! # Example
//!
//! ```ignore
//! use ucss::scan::{scan, ContentFiles};
//!
//! let (files, mut diagnostics) = ContentFiles::resolve(&config, root)?;
//! let output = scan(&files);
//! println!("{} tokens in {} files", output.tokens.len(), output.files_scanned);
//! ```

mod extract;
mod sources;

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::diagnostics::{codes, Diagnostic, Diagnostics};

pub use extract::{is_token, Extractor};
pub use sources::{Content, ContentFiles, ContentOrigin, RECOGNIZED_EXTENSIONS};

/// Tokens found in a set of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    pub tokens: BTreeSet<String>,
    pub diagnostics: Diagnostics,
    /// Items that were read successfully.
    pub files_scanned: usize,
}

impl ScanOutput {
    /// Union another output into this one.
    pub fn merge(&mut self, other: ScanOutput) {
        if self.tokens.len() < other.tokens.len() {
            let mine = std::mem::replace(&mut self.tokens, other.tokens);
            self.tokens.extend(mine);
        } else {
            self.tokens.extend(other.tokens);
        }
        self.diagnostics.merge(other.diagnostics);
        self.files_scanned += other.files_scanned;
    }
}

/// Scan one piece of content.
pub fn scan_content(content: Content<'_>) -> ScanOutput {
    let mut output = ScanOutput::default();
    match content.text {
        Ok(text) => {
            content.extractor.extract_into(&text, &mut output.tokens);
            output.files_scanned = 1;
        }
        Err(err) => {
            warn!(file = %content.origin, error = %err, "skipping unreadable file");
            output.diagnostics.push(
                Diagnostic::warning(
                    codes::UNREADABLE_FILE,
                    format!("cannot read {}: {}", content.origin, err),
                )
                .with_help("The file was skipped; its classes are not in the stylesheet"),
            );
        }
    }
    output
}

/// Scan all files in parallel.
pub fn scan(files: &ContentFiles) -> ScanOutput {
    let outputs: Vec<ScanOutput> = (0..files.len())
        .into_par_iter()
        .filter_map(|index| files.get(index).map(scan_content))
        .collect();

    let output = collect(outputs);
    debug!(
        files = output.files_scanned,
        tokens = output.tokens.len(),
        "scanned content"
    );
    output
}

/// Scan all files on the current thread.
pub fn scan_sequential(files: &ContentFiles) -> ScanOutput {
    collect(files.iter().map(scan_content))
}

/// Outputs are merged in file order so diagnostics keep a stable order.
fn collect(outputs: impl IntoIterator<Item = ScanOutput>) -> ScanOutput {
    outputs
        .into_iter()
        .fold(ScanOutput::default(), |mut acc, output| {
            acc.merge(output);
            acc
        })
}
