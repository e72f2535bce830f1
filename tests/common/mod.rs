use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BROWSER_HEADER: &str = "complex.id\tGene\tCDR3\tV\tJ\tSpecies\tMHC A\tMHC B\tMHC class\tEpitope\tEpitope gene\tEpitope species\tReference\tMethod\tMeta\tCDR3fix\tScore";
pub const SLIM_HEADER: &str = "gene\tcdr3\tspecies\tantigen.epitope\tantigen.gene\tantigen.species\tcomplex.id\tv.segm\tj.segm\tv.end\tj.start\tmhc.a\tmhc.b\tmhc.class\treference.id\tvdjdb.score";

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct Dataset {
    pub dir: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One receptor record, laid out by the writer of the chosen export format.
pub struct Row<'a> {
    pub chain: &'a str,
    pub cdr3: &'a str,
    pub species: &'a str,
    pub epitope: &'a str,
}

pub const fn row<'a>(chain: &'a str, cdr3: &'a str, species: &'a str, epitope: &'a str) -> Row<'a> {
    Row {
        chain,
        cdr3,
        species,
        epitope,
    }
}

#[derive(Clone, Copy)]
pub enum Format {
    Slim,
    Browser,
}

pub fn create_dataset(format: Format, label: &str, rows: &[Row]) -> io::Result<Dataset> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join("vdjdb-summary-tests").join(format!(
        "{}-{}-{}",
        std::process::id(),
        id,
        label
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;

    let input = dir.join("vdjdb.tsv");
    let output = dir.join("summary.md");
    let mut file = fs::File::create(&input)?;
    match format {
        Format::Slim => {
            writeln!(file, "{SLIM_HEADER}")?;
            for (idx, r) in rows.iter().enumerate() {
                writeln!(
                    file,
                    "{}\t{}\t{}\t{}\tEBNA3A\tEBV\t{idx}\tTRBV7-9*01\tTRBJ2-7*01\t4\t-1\tHLA-A*02:01\tB2M\tMHCI\tPMID:1\t1",
                    r.chain, r.cdr3, r.species, r.epitope
                )?;
            }
        }
        Format::Browser => {
            writeln!(file, "{BROWSER_HEADER}")?;
            for (idx, r) in rows.iter().enumerate() {
                writeln!(
                    file,
                    "{idx}\t{}\t{}\tTRBV7-9*01\tTRBJ2-7*01\t{}\tHLA-A*02:01\tB2M\tMHCI\t{}\tEBNA3A\tEBV\tPMID:1\t{{\"frequency\": \"1/1\"}}\t{{}}\t{{\"cdr3\": \"{}\"}}\t1",
                    r.chain, r.cdr3, r.species, r.epitope, r.cdr3
                )?;
            }
        }
    }
    file.flush()?;

    Ok(Dataset { dir, input, output })
}
