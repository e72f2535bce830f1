use crate::Args;
use crate::error::{CustomError, Result};
use crate::metrics::{Evaluator, Scope};
use crate::model::{Columns, Layout};
use crate::output::{Report, render_json, render_markdown, write_atomically};
use crate::reader::read_table;
use rayon::ThreadPoolBuilder;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ReportSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub json: Option<PathBuf>,
    pub layout: Layout,
    pub columns: Columns,
    pub force: bool,
    // Size of the epitope ranking, `None` when the report has no ranking.
    pub ranking: Option<usize>,
    pub threads: Option<usize>,
}

impl ReportSpec {
    pub fn print_paths(&self) {
        println!("INPUT : {}", self.input.display());
        println!("OUTPUT: {}", self.output.display());
        if let Some(json) = &self.json {
            println!("JSON  : {}", json.display());
        }
        println!(
            "LAYOUT: {} (chain={}, cdr3={}, species={}, epitope={})",
            self.layout.name(),
            self.columns.chain,
            self.columns.cdr3,
            self.columns.species,
            self.columns.epitope
        );
        println!();
    }

    fn outputs(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.output.as_path()).chain(self.json.as_deref())
    }

    /// Checks run before anything is read or written: existing outputs need
    /// confirmation, and the input must be a readable file.
    pub fn validate(&self, answers: &mut impl BufRead, prompt: &mut impl Write) -> Result<()> {
        for path in self.outputs() {
            if path.exists()
                && !self.force
                && !confirm_overwrite(path, answers, prompt)?
            {
                return Err(CustomError::OutputExistsDeclined {
                    path: path.to_path_buf(),
                });
            }
        }

        let missing = || CustomError::InputMissing {
            path: self.input.clone(),
        };
        if !self.input.is_file() {
            return Err(missing());
        }
        File::open(&self.input).map_err(|_| missing())?;
        Ok(())
    }
}

pub fn confirm_overwrite(
    path: &Path,
    answers: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<bool> {
    let prompt_err = |e| CustomError::Prompt { source: e };
    write!(prompt, "\"{}\" already exists. Overwrite? [y/N] ", path.display())
        .map_err(prompt_err)?;
    prompt.flush().map_err(prompt_err)?;

    let mut line = String::new();
    answers.read_line(&mut line).map_err(prompt_err)?;
    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Parses "CHAIN,CDR3,SPECIES,EPITOPE" as 1-based column indices.
pub fn parse_columns(spec: &str) -> Result<Columns> {
    let mut indices = Vec::with_capacity(4);
    for raw in spec.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let idx: usize = raw.parse().map_err(|e| CustomError::ColumnIndexInt {
            source: e,
            arg: raw.to_string(),
        })?;
        if idx == 0 {
            return Err(CustomError::ColumnIndexLow);
        }
        indices.push(idx);
    }

    match indices[..] {
        [chain, cdr3, species, epitope] => Ok(Columns {
            chain,
            cdr3,
            species,
            epitope,
        }),
        _ => Err(CustomError::ColumnCount {
            n_columns: indices.len(),
        }),
    }
}

pub fn build_report_spec(args: &Args) -> Result<ReportSpec> {
    let columns = match &args.columns_spec {
        Some(spec) => parse_columns(spec)?,
        None => args.layout.columns(),
    };
    let ranking = (args.rank_epitopes || args.layout.ranks_epitopes()).then_some(args.top);
    Ok(ReportSpec {
        input: args
            .input
            .clone()
            .unwrap_or_else(|| PathBuf::from(args.layout.default_input())),
        output: args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(args.layout.default_output())),
        json: args.json.clone(),
        layout: args.layout,
        columns,
        force: args.force,
        ranking,
        threads: args.threads,
    })
}

fn build_report(spec: &ReportSpec) -> Result<String> {
    let table = read_table(&spec.input, &spec.columns)?;
    let input = spec.input.display().to_string();

    let sections = [Scope::All, Scope::Human]
        .into_iter()
        .map(|scope| {
            let start = Instant::now();
            let section = Evaluator::new(&table, spec.columns, scope).evaluate(spec.ranking);
            log::debug!(
                "{}: {} metrics over {} records in {:?}",
                scope.title(),
                section.values.len(),
                table.len(),
                start.elapsed()
            );
            section
        })
        .collect();

    let report = Report {
        input: &input,
        layout: spec.layout,
        columns: spec.columns,
        top: spec.ranking.unwrap_or_default(),
        sections,
    };

    if let Some(json_path) = &spec.json {
        let json = render_json(&report)?;
        println!("Writing metrics to {}...", json_path.display());
        write_atomically(json_path, json.as_bytes())?;
    }
    render_markdown(&report)
}

pub fn run(spec: &ReportSpec) -> Result<()> {
    spec.validate(&mut io::stdin().lock(), &mut io::stdout())?;

    let markdown = match spec.threads {
        Some(n) => {
            let pool = ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| build_report(spec))?
        }
        None => build_report(spec)?,
    };

    println!("Writing summary to {}...", spec.output.display());
    write_atomically(&spec.output, markdown.as_bytes())?;
    Ok(())
}
