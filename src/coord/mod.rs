pub mod cigar;
pub mod mapper;

pub use cigar::{parse_cigar, transcript_length, Cigar, CigarOp, Region};
pub use mapper::{map_coordinate, MappedCoord, Placement};

use std::io::{BufRead, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::io::queries::{QueryReader, QueryRecord};
use crate::io::transcripts::TranscriptTable;

/// 单条查询出错时的处理方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorPolicy {
    /// 第一条出错的查询即终止整个运行
    #[default]
    Abort,
    /// 记录警告并跳过出错的查询
    Skip,
}

#[derive(Clone, Debug)]
pub struct MapOpt {
    pub on_error: ErrorPolicy,
    pub threads: usize,
    /// 每批并行处理的查询条数
    pub batch_size: usize,
}

impl Default for MapOpt {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::Abort,
            threads: 1,
            batch_size: 8192,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapSummary {
    /// 写出的行数
    pub mapped: usize,
    /// 其中落在插入区内的行数
    pub in_insertion: usize,
    pub skipped: usize,
}

pub fn map_query_file(
    transcripts_path: &Path,
    queries_path: &Path,
    out_path: &Path,
    opt: &MapOpt,
) -> Result<MapSummary> {
    let table = TranscriptTable::from_path(transcripts_path)?;
    info!(
        transcripts = table.len(),
        path = %transcripts_path.display(),
        "loaded transcript mappings"
    );

    let fq = std::fs::File::open(queries_path)?;
    let reader = std::io::BufReader::new(fq);
    let out = std::io::BufWriter::new(std::fs::File::create(out_path)?);

    map_queries(&table, reader, out, opt)
}

/// 逐批读取查询，在线程池中并行换算，按输入顺序写出
/// `tx_id \t tx_pos \t chrom \t genomic_pos`。
pub fn map_queries<R: BufRead, W: Write>(
    table: &TranscriptTable,
    queries: R,
    mut out: W,
    opt: &MapOpt,
) -> Result<MapSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads.max(1))
        .build()?;
    let batch_size = opt.batch_size.max(1);

    let mut reader = QueryReader::new(queries);
    let mut summary = MapSummary::default();
    let mut batch: Vec<QueryRecord> = Vec::with_capacity(batch_size);
    let mut done = false;

    while !done {
        batch.clear();
        while batch.len() < batch_size {
            match reader.next_record() {
                Ok(Some(q)) => batch.push(q),
                Ok(None) => {
                    done = true;
                    break;
                }
                Err(e) => handle_failure(e, opt.on_error, &mut summary)?,
            }
        }
        if batch.is_empty() {
            break;
        }
        debug!(queries = batch.len(), "mapping batch");

        let results: Vec<Result<(&str, MappedCoord)>> =
            pool.install(|| batch.par_iter().map(|q| resolve(table, q)).collect());

        for (q, res) in batch.iter().zip(results) {
            match res {
                Ok((chrom, m)) => {
                    writeln!(out, "{}\t{}\t{}\t{}", q.tx_id, q.tx_pos, chrom, m.pos)?;
                    summary.mapped += 1;
                    if !m.is_exact() {
                        summary.in_insertion += 1;
                    }
                }
                Err(e) => handle_failure(
                    Error::AtLine {
                        line: q.line,
                        source: Box::new(e),
                    },
                    opt.on_error,
                    &mut summary,
                )?,
            }
        }
    }

    out.flush()?;
    if summary.in_insertion > 0 {
        warn!(
            count = summary.in_insertion,
            "queries fell inside insertions and were mapped to the right of the insertion"
        );
    }
    Ok(summary)
}

fn resolve<'t>(table: &'t TranscriptTable, q: &QueryRecord) -> Result<(&'t str, MappedCoord)> {
    let rec = table.get(&q.tx_id)?;
    let m = rec.cigar.map_coordinate(q.tx_pos, rec.start)?;
    Ok((rec.chrom.as_str(), m))
}

fn handle_failure(e: Error, policy: ErrorPolicy, summary: &mut MapSummary) -> Result<()> {
    if policy == ErrorPolicy::Skip && e.is_query_local() {
        warn!(error = %e, "skipping query");
        summary.skipped += 1;
        Ok(())
    } else {
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRANSCRIPTS: &str = "TR1\tCHR1\t3\t8M7D6M2I2M11D7M\nTR2\tCHR2\t10\t20M\n";

    fn table() -> TranscriptTable {
        TranscriptTable::from_reader(Cursor::new(TRANSCRIPTS)).unwrap()
    }

    fn run(queries: &str, opt: &MapOpt) -> Result<(String, MapSummary)> {
        let mut out = Vec::new();
        let summary = map_queries(&table(), Cursor::new(queries), &mut out, opt)?;
        Ok((String::from_utf8(out).unwrap(), summary))
    }

    #[test]
    fn maps_queries_in_input_order() {
        let queries = "TR1\t4\nTR2\t0\nTR1\t13\nTR2\t10\n";
        let (out, summary) = run(queries, &MapOpt::default()).unwrap();
        assert_eq!(out, "TR1\t4\tCHR1\t7\nTR2\t0\tCHR2\t10\nTR1\t13\tCHR1\t23\nTR2\t10\tCHR2\t20\n");
        assert_eq!(summary, MapSummary { mapped: 4, in_insertion: 0, skipped: 0 });
    }

    #[test]
    fn insertion_hits_are_written_and_counted() {
        let (out, summary) = run("TR1\t14\n", &MapOpt::default()).unwrap();
        assert_eq!(out, "TR1\t14\tCHR1\t24\n");
        assert_eq!(summary.in_insertion, 1);
    }

    #[test]
    fn abort_policy_stops_at_unknown_transcript() {
        let err = run("TR1\t4\nTR9\t0\nTR2\t1\n", &MapOpt::default()).unwrap_err();
        match err {
            Error::AtLine { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, Error::TranscriptNotFound(ref id) if id == "TR9"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn abort_policy_stops_at_malformed_query_line() {
        let err = run("TR1\t4\nTR1\t4\textra\n", &MapOpt::default()).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, expected: 2, found: 3 }));
    }

    #[test]
    fn skip_policy_continues_past_bad_queries() {
        let opt = MapOpt {
            on_error: ErrorPolicy::Skip,
            ..MapOpt::default()
        };
        let queries = "TR1\t4\nTR9\t0\nTR1\t25\nbroken\nTR1\t-1\nTR2\tx\nTR2\t19\n";
        let (out, summary) = run(queries, &opt).unwrap();
        assert_eq!(out, "TR1\t4\tCHR1\t7\nTR2\t19\tCHR2\t29\n");
        assert_eq!(summary, MapSummary { mapped: 2, in_insertion: 0, skipped: 5 });
    }

    #[test]
    fn malformed_transcript_fails_only_its_queries() {
        let table = TranscriptTable::from_reader(Cursor::new(
            "TR1\tCHR1\t3\t8M7D6M2I2M11D7M\nTR2\tCHR1\t3\t10Q\n",
        ))
        .unwrap();
        let queries = "TR1\t4\nTR2\t0\nTR1\t8\n";

        let opt = MapOpt {
            on_error: ErrorPolicy::Skip,
            ..MapOpt::default()
        };
        let mut out = Vec::new();
        let summary = map_queries(&table, Cursor::new(queries), &mut out, &opt).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "TR1\t4\tCHR1\t7\nTR1\t8\tCHR1\t18\n");
        assert_eq!(summary.skipped, 1);

        let err = map_queries(&table, Cursor::new(queries), Vec::new(), &MapOpt::default()).unwrap_err();
        match err {
            Error::AtLine { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, Error::MalformedEncoding { .. }));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn parallel_batches_preserve_order() {
        let queries: String = (0..25).map(|p| format!("TR1\t{}\n", p)).collect();
        let serial = run(&queries, &MapOpt::default()).unwrap();
        let opt = MapOpt {
            threads: 4,
            batch_size: 3,
            ..MapOpt::default()
        };
        let parallel = run(&queries, &opt).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(parallel.1.mapped, 25);
        assert_eq!(parallel.1.in_insertion, 2);
    }

    #[test]
    fn empty_query_input_writes_nothing() {
        let (out, summary) = run("", &MapOpt::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary, MapSummary::default());
    }

    #[test]
    fn map_query_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tx_path = dir.path().join("transcripts.tsv");
        let q_path = dir.path().join("queries.tsv");
        let out_path = dir.path().join("out.tsv");
        std::fs::write(&tx_path, TRANSCRIPTS).unwrap();
        std::fs::write(&q_path, "TR1\t4\nTR2\t0\n").unwrap();

        let summary = map_query_file(&tx_path, &q_path, &out_path, &MapOpt::default()).unwrap();
        assert_eq!(summary.mapped, 2);
        let out = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(out, "TR1\t4\tCHR1\t7\nTR2\t0\tCHR2\t10\n");
    }

    #[test]
    fn map_query_file_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = map_query_file(
            &dir.path().join("nope.tsv"),
            &dir.path().join("q.tsv"),
            &dir.path().join("out.tsv"),
            &MapOpt::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
