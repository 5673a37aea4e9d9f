//! Human-readable listing of catalogue entries.

use crate::catalogue::{Catalogue, CatalogueEntry};
use crate::errors::DiagResult;
use std::fmt::Write;

fn describe(out: &mut String, entry: &CatalogueEntry) {
    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{:<10} - [{}] : {}",
        entry.name(),
        entry.units(),
        entry.description()
    );
    let _ = writeln!(out, "  Requires : {}", entry.requirements().join(" ; "));
    out.push('\n');
}

/// Describe the named diagnostics, in the given order.
///
/// Fails with [`DiagError::UnknownDiagnostic`](crate::errors::DiagError::UnknownDiagnostic)
/// if any name is not in the catalogue.
pub fn list(catalogue: &Catalogue, names: &[&str]) -> DiagResult<String> {
    let mut out = String::new();
    for name in names {
        describe(&mut out, catalogue.lookup(name)?);
    }
    Ok(out)
}

/// Describe every diagnostic of the catalogue, in catalogue order.
pub fn list_all(catalogue: &Catalogue) -> String {
    let mut out = String::new();
    for entry in catalogue.entries() {
        describe(&mut out, entry);
    }
    out
}
