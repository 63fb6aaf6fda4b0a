//! Line-oriented text output.

use std::io::{self, Write};

use crate::duplicates::DuplicateReport;

/// Write `hash<TAB>size<TAB>path` per duplicate, sorted by hash then path.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_plain<W: Write>(report: &DuplicateReport, writer: &mut W) -> io::Result<()> {
    for (hash, size, path) in report.entries() {
        writeln!(writer, "{}\t{}\t{}", hash, size, path.display())?;
    }
    Ok(())
}

/// Write one duplicate path per line, in the same order as [`write_plain`].
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_paths<W: Write>(report: &DuplicateReport, writer: &mut W) -> io::Result<()> {
    for (_, _, path) in report.entries() {
        writeln!(writer, "{}", path.display())?;
    }
    Ok(())
}
