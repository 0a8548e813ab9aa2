use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use tracing::warn;

use super::{parse_i64, split_tsv_line};
use crate::coord::cigar::Cigar;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    pub tx_id: String,
    pub chrom: String,
    /// 比对起点（0-based 基因组坐标）
    pub start: i64,
    pub cigar: Cigar,
}

/// 转录本 ID → 映射记录。
///
/// 输入为四列制表符分隔文件 `tx_id, chrom, start, cigar`，无表头；
/// 每个转录本只能出现一次。CIGAR 在加载时即解析；格式错误的行不会中断加载，
/// 只有查询到该转录本时才报 `MalformedEncoding`。
#[derive(Debug)]
pub struct TranscriptTable {
    records: HashMap<String, Row>,
}

#[derive(Debug)]
enum Row {
    Mapped(TranscriptRecord),
    /// CIGAR 解析失败，保留诊断信息
    Malformed { cigar: String, reason: String },
}

impl TranscriptTable {
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut records = HashMap::new();
        let mut buf = String::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            let n = reader.read_line(&mut buf)?;
            if n == 0 {
                break;
            }
            line_no += 1;
            if buf.trim().is_empty() {
                continue;
            }

            let (tx_id, row) = parse_row(&buf, line_no)?;
            match records.entry(tx_id) {
                Entry::Occupied(slot) => {
                    return Err(Error::DuplicateTranscript { line: line_no, tx_id: slot.key().clone() });
                }
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
            }
        }

        Ok(Self { records })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let fh = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(fh))
    }

    pub fn get(&self, tx_id: &str) -> Result<&TranscriptRecord> {
        match self.records.get(tx_id) {
            Some(Row::Mapped(rec)) => Ok(rec),
            Some(Row::Malformed { cigar, reason }) => Err(Error::MalformedEncoding {
                cigar: cigar.clone(),
                reason: reason.clone(),
            }),
            None => Err(Error::TranscriptNotFound(tx_id.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_row(line: &str, line_no: usize) -> Result<(String, Row)> {
    let fields = split_tsv_line(line);
    if fields.len() != 4 {
        return Err(Error::Format { line: line_no, expected: 4, found: fields.len() });
    }
    let tx_id = fields[0].to_string();
    let start = parse_i64(fields[2], line_no, "mapping_start_pos")?;

    let row = match Cigar::parse(fields[3].trim()) {
        Ok(cigar) => Row::Mapped(TranscriptRecord {
            tx_id: tx_id.clone(),
            chrom: fields[1].to_string(),
            start,
            cigar,
        }),
        Err(Error::MalformedEncoding { cigar, reason }) => {
            warn!(line = line_no, tx_id = %tx_id, cigar = %cigar, reason = %reason, "malformed CIGAR in transcript mappings");
            Row::Malformed { cigar, reason }
        }
        Err(e) => return Err(e),
    };
    Ok((tx_id, row))
}
