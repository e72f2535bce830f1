use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{CustomError, Result};
use crate::model::{Columns, Table};

/// Reads every data row of a tab-separated export. The first row is the header.
///
/// Quotes carry no meaning (VDJdb `meta` fields hold raw JSON) and rows may be
/// ragged: a row shorter than the layout is kept and left to each metric to skip.
pub fn read_table(path: &Path, columns: &Columns) -> Result<Table> {
    let f = File::open(path).map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: path.to_path_buf(),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(BufReader::new(f));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {spinner} {pos} records",
    )?);

    let widest = columns.widest();
    let mut rows = Vec::new();
    let mut n_short = 0usize;
    for result in reader.byte_records() {
        let record = result.map_err(|source| CustomError::TsvRead {
            source,
            path: path.to_path_buf(),
        })?;
        if record.len() < widest {
            n_short += 1;
        }
        rows.push(record);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if n_short > 0 {
        log::warn!(
            "{n_short} record(s) in {} have fewer than {widest} fields and are skipped by metrics that need the missing columns",
            path.display()
        );
    }
    log::debug!("read {} records from {}", rows.len(), path.display());
    Ok(Table::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Evaluator, Metric, Projection, Scope};
    use crate::model::{Layout, field};
    use std::io::Write;

    fn write_tsv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn skips_header_and_blank_lines() {
        let f = write_tsv("gene\tcdr3\tspecies\tantigen.epitope\nTRA\tCAV\tHomoSapiens\tGIL\n\nTRB\tCASS\tMusMusculus\tNLV\n");
        let table = read_table(f.path(), &Layout::AllSpecies.columns()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(field(&table.rows()[1], 3), Some(&b"MusMusculus"[..]));
    }

    #[test]
    fn keeps_quotes_and_ragged_rows() {
        let f = write_tsv("gene\tcdr3\tspecies\tantigen.epitope\tmeta\nTRA\tCAV\tHomoSapiens\tGIL\t{\"a\": 1}\nTRB\n");
        let table = read_table(f.path(), &Layout::AllSpecies.columns()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(field(&table.rows()[0], 5), Some(&b"{\"a\": 1}"[..]));
        assert_eq!(table.rows()[1].len(), 1);
    }

    #[test]
    fn non_utf8_bytes_are_kept_verbatim() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"gene\tcdr3\tspecies\tantigen.epitope\nTRA\tCA\xffV\tHomoSapiens\tGI\xfeL\nTRB\tCA\xfeV\tHomoSapiens\tGI\xfeL\n")
            .unwrap();
        f.flush().unwrap();

        let columns = Layout::AllSpecies.columns();
        let table = read_table(f.path(), &columns).unwrap();
        assert_eq!(field(&table.rows()[0], 2), Some(&b"CA\xffV"[..]));
        assert_eq!(field(&table.rows()[1], 2), Some(&b"CA\xfeV"[..]));

        let evaluator = Evaluator::new(&table, columns, Scope::All);
        assert_eq!(evaluator.value(Metric::Distinct(None, Projection::Cdr3)), 2);
        assert_eq!(evaluator.value(Metric::Shared(Projection::Epitope)), 1);
        let ranking = evaluator.rank_epitopes(20);
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[0].epitope_lossy(), "GI\u{FFFD}L");
    }

    #[test]
    fn header_only_is_empty() {
        let f = write_tsv("gene\tcdr3\tspecies\tantigen.epitope\n");
        let table = read_table(f.path(), &Layout::AllSpecies.columns()).unwrap();
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_table(Path::new("/nonexistent/vdjdb.tsv"), &Layout::Browser.columns())
            .unwrap_err();
        match err {
            CustomError::ReadWithPath { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/vdjdb.tsv"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
