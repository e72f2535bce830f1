use clap::ValueEnum;
use csv::ByteRecord;

pub const HUMAN: &[u8] = b"HomoSapiens";

/// Column arrangement of a VDJdb export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Combined multi-species export (gene, cdr3, species, antigen.epitope, ...).
    AllSpecies,
    /// VDJdb web browser export (complex.id, Gene, CDR3, V, J, Species, ..., Epitope, ...).
    Browser,
}

impl Layout {
    pub fn columns(self) -> Columns {
        match self {
            Layout::AllSpecies => Columns {
                chain: 1,
                cdr3: 2,
                species: 3,
                epitope: 4,
            },
            Layout::Browser => Columns {
                chain: 2,
                cdr3: 3,
                species: 6,
                epitope: 10,
            },
        }
    }

    pub fn default_output(self) -> &'static str {
        match self {
            Layout::AllSpecies => "vdjdb-all-species-tra-trb-non-paired-summary.md",
            Layout::Browser => "vdjdb-browser-summary.md",
        }
    }

    pub fn default_input(self) -> &'static str {
        match self {
            Layout::AllSpecies => "vdjdb-all-species-tra-trb-non-paired.tsv",
            Layout::Browser => "vdjdb-browser.tsv",
        }
    }

    /// Whether the report lists the most frequent epitopes by default.
    pub fn ranks_epitopes(self) -> bool {
        matches!(self, Layout::Browser)
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::AllSpecies => "all-species",
            Layout::Browser => "browser",
        }
    }
}

/// 1-based positions of the interpreted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub chain: usize,
    pub cdr3: usize,
    pub species: usize,
    pub epitope: usize,
}

impl Columns {
    pub fn widest(&self) -> usize {
        self.chain.max(self.cdr3).max(self.species).max(self.epitope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Tra,
    Trb,
}

impl Chain {
    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Tra => "TRA",
            Chain::Trb => "TRB",
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

/// Data rows of an export, header excluded.
#[derive(Debug)]
pub struct Table {
    rows: Vec<ByteRecord>,
}

impl Table {
    pub fn new(rows: Vec<ByteRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ByteRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Value at a 1-based column, `None` when the row is too short.
pub fn field(record: &ByteRecord, column: usize) -> Option<&[u8]> {
    column.checked_sub(1).and_then(|idx| record.get(idx))
}
