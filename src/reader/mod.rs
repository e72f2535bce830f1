pub mod tsv;

pub use tsv::read_table;
