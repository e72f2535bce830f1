use crate::model::{Chain, Columns, HUMAN, Table, field};
use csv::ByteRecord;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::HashSet;

/// Subset of records a report section is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Human,
}

impl Scope {
    pub fn title(self) -> &'static str {
        match self {
            Scope::All => "All records",
            Scope::Human => "Human-only records",
        }
    }
}

/// What a distinct set is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Cdr3,
    Epitope,
    Pair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Records(Option<Chain>),
    Distinct(Option<Chain>, Projection),
    Shared(Projection),
}

/// Metrics of one report section, in presentation order.
pub const METRICS: [Metric; 15] = [
    Metric::Records(None),
    Metric::Records(Some(Chain::Tra)),
    Metric::Records(Some(Chain::Trb)),
    Metric::Distinct(None, Projection::Cdr3),
    Metric::Distinct(Some(Chain::Tra), Projection::Cdr3),
    Metric::Distinct(Some(Chain::Trb), Projection::Cdr3),
    Metric::Distinct(None, Projection::Epitope),
    Metric::Distinct(Some(Chain::Tra), Projection::Epitope),
    Metric::Distinct(Some(Chain::Trb), Projection::Epitope),
    Metric::Distinct(None, Projection::Pair),
    Metric::Distinct(Some(Chain::Tra), Projection::Pair),
    Metric::Distinct(Some(Chain::Trb), Projection::Pair),
    Metric::Shared(Projection::Cdr3),
    Metric::Shared(Projection::Epitope),
    Metric::Shared(Projection::Pair),
];

impl Metric {
    pub fn label(self) -> String {
        match self {
            Metric::Records(None) => "Total number of records".to_string(),
            Metric::Records(Some(chain)) => format!("{} records", chain.as_str()),
            Metric::Distinct(None, Projection::Cdr3) => "Unique CDR3 sequences".to_string(),
            Metric::Distinct(Some(chain), Projection::Cdr3) => {
                format!("Unique {} sequences", chain.as_str())
            }
            Metric::Distinct(None, Projection::Epitope) => "Unique epitope sequences".to_string(),
            Metric::Distinct(Some(chain), Projection::Epitope) => {
                format!("Unique {} epitope sequences", chain.as_str())
            }
            Metric::Distinct(None, Projection::Pair) => "Unique CDR3-epitope pairs".to_string(),
            Metric::Distinct(Some(chain), Projection::Pair) => {
                format!("Unique {} CDR3-epitope pairs", chain.as_str())
            }
            Metric::Shared(Projection::Cdr3) => {
                "Number of CDR3 sequences shared between TRA and TRB records".to_string()
            }
            Metric::Shared(Projection::Epitope) => {
                "Number of epitope sequences shared between TRA and TRB records".to_string()
            }
            Metric::Shared(Projection::Pair) => {
                "Number of CDR3-epitope pairs shared between TRA and TRB records".to_string()
            }
        }
    }

    /// Shell pipeline reproducing the metric, shown next to its value in the report.
    pub fn command(self, columns: &Columns, scope: Scope, input: &str) -> String {
        let input = &shell_quote(input);
        let pipeline = Pipeline {
            columns,
            scope,
            input,
        };
        match self {
            Metric::Records(chain) => match pipeline.condition(chain) {
                None => format!("tail -n +2 {input} | wc -l"),
                Some(cond) => format!("tail -n +2 {input} | awk -F '\\t' '{cond}' | wc -l"),
            },
            Metric::Distinct(chain, projection) => {
                format!("{} | sort -u | wc -l", pipeline.select(chain, projection))
            }
            Metric::Shared(projection) => format!(
                "comm -12 <({} | sort -u) <({} | sort -u) | wc -l",
                pipeline.select(Some(Chain::Tra), projection),
                pipeline.select(Some(Chain::Trb), projection),
            ),
        }
    }
}

/// Command text of the epitope ranking.
pub fn ranking_command(columns: &Columns, scope: Scope, input: &str, top: usize) -> String {
    let input = &shell_quote(input);
    let pipeline = Pipeline {
        columns,
        scope,
        input,
    };
    format!(
        "{} | sort -u | cut -f2 | sort | uniq -c | sort -k1,1nr -k2,2 | head -n {top}",
        pipeline.select(None, Projection::Pair)
    )
}

/// Single-quotes `word` for a POSIX shell unless it only holds characters the shell leaves alone.
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"_-+./,:@%=".contains(&b));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

struct Pipeline<'a> {
    columns: &'a Columns,
    scope: Scope,
    input: &'a str,
}

impl Pipeline<'_> {
    fn condition(&self, chain: Option<Chain>) -> Option<String> {
        let mut terms = Vec::new();
        if let Some(chain) = chain {
            terms.push(format!("${} == \"{}\"", self.columns.chain, chain.as_str()));
        }
        if self.scope == Scope::Human {
            terms.push(format!("${} == \"HomoSapiens\"", self.columns.species));
        }
        if terms.is_empty() {
            None
        } else {
            Some(terms.join(" && "))
        }
    }

    fn select(&self, chain: Option<Chain>, projection: Projection) -> String {
        let input = self.input;
        let (cdr3, epitope) = (self.columns.cdr3, self.columns.epitope);
        match self.condition(chain) {
            None => {
                let fields = match projection {
                    Projection::Cdr3 => cdr3.to_string(),
                    Projection::Epitope => epitope.to_string(),
                    Projection::Pair => format!("{cdr3},{epitope}"),
                };
                format!("tail -n +2 {input} | cut -f{fields}")
            }
            Some(cond) => {
                let fields = match projection {
                    Projection::Cdr3 => format!("${cdr3}"),
                    Projection::Epitope => format!("${epitope}"),
                    Projection::Pair => format!("${cdr3} \"\\t\" ${epitope}"),
                };
                format!("tail -n +2 {input} | awk -F '\\t' '{cond} {{print {fields}}}'")
            }
        }
    }
}

/// Distinct-set key: a single field, or a (CDR3, epitope) pair.
type Key<'a> = (&'a [u8], Option<&'a [u8]>);

pub struct RankedEpitope {
    pub count: usize,
    pub epitope: Vec<u8>,
}

impl RankedEpitope {
    pub fn epitope_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.epitope)
    }
}

pub struct MetricValue {
    pub metric: Metric,
    pub value: usize,
}

pub struct SectionReport {
    pub scope: Scope,
    pub values: Vec<MetricValue>,
    pub ranking: Option<Vec<RankedEpitope>>,
}

/// Evaluates metrics over the rows of one section.
pub struct Evaluator<'a> {
    table: &'a Table,
    columns: Columns,
    scope: Scope,
}

impl<'a> Evaluator<'a> {
    pub fn new(table: &'a Table, columns: Columns, scope: Scope) -> Self {
        Self {
            table,
            columns,
            scope,
        }
    }

    fn in_scope(&self, record: &ByteRecord, chain: Option<Chain>) -> bool {
        if self.scope == Scope::Human && field(record, self.columns.species) != Some(HUMAN) {
            return false;
        }
        match chain {
            Some(chain) => field(record, self.columns.chain) == Some(chain.as_bytes()),
            None => true,
        }
    }

    fn records(&self, chain: Option<Chain>) -> impl Iterator<Item = &'a ByteRecord> + '_ {
        self.table
            .rows()
            .iter()
            .filter(move |record| self.in_scope(record, chain))
    }

    fn project(&self, record: &'a ByteRecord, projection: Projection) -> Option<Key<'a>> {
        match projection {
            Projection::Cdr3 => field(record, self.columns.cdr3).map(|c| (c, None)),
            Projection::Epitope => field(record, self.columns.epitope).map(|e| (e, None)),
            Projection::Pair => Some((
                field(record, self.columns.cdr3)?,
                Some(field(record, self.columns.epitope)?),
            )),
        }
    }

    pub fn distinct(&self, chain: Option<Chain>, projection: Projection) -> HashSet<Key<'a>> {
        self.records(chain)
            .filter_map(|record| self.project(record, projection))
            .collect()
    }

    pub fn value(&self, metric: Metric) -> usize {
        match metric {
            Metric::Records(chain) => self.records(chain).count(),
            Metric::Distinct(chain, projection) => self.distinct(chain, projection).len(),
            Metric::Shared(projection) => {
                let tra = self.distinct(Some(Chain::Tra), projection);
                let trb = self.distinct(Some(Chain::Trb), projection);
                tra.intersection(&trb).count()
            }
        }
    }

    /// Epitopes ranked by the number of distinct CDR3-epitope pairs they occur in.
    /// Ties are broken by epitope, ascending.
    pub fn rank_epitopes(&self, top: usize) -> Vec<RankedEpitope> {
        self.distinct(None, Projection::Pair)
            .into_iter()
            .filter_map(|(_, epitope)| epitope)
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(top)
            .map(|(epitope, count)| RankedEpitope {
                count,
                epitope: epitope.to_vec(),
            })
            .collect()
    }

    pub fn evaluate(&self, ranking: Option<usize>) -> SectionReport {
        let values = METRICS
            .par_iter()
            .map(|&metric| MetricValue {
                metric,
                value: self.value(metric),
            })
            .collect();
        SectionReport {
            scope: self.scope,
            values,
            ranking: ranking.map(|top| self.rank_epitopes(top)),
        }
    }
}
