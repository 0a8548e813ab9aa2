use std::io::BufRead;

use super::{parse_i64, split_tsv_line};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub tx_id: String,
    /// 0-based，可能为负数（由映射阶段报告越界）
    pub tx_pos: i64,
    /// 1-based line number in the query file
    pub line: usize,
}

/// 两列查询文件读取器：`tx_id \t tx_pos`，无表头。
pub struct QueryReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> QueryReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), line_no: 0, done: false }
    }

    /// 读取下一条查询。空行被跳过；列数不为 2 时返回 `Format` 错误，
    /// 该行已被消费，调用方可以选择继续读取。
    pub fn next_record(&mut self) -> Result<Option<QueryRecord>> {
        loop {
            if self.done { return Ok(None); }

            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 { self.done = true; return Ok(None); }
            self.line_no += 1;

            if self.buf.trim().is_empty() { continue; }

            let fields = split_tsv_line(&self.buf);
            if fields.len() != 2 {
                return Err(Error::Format { line: self.line_no, expected: 2, found: fields.len() });
            }
            let tx_pos = parse_i64(fields[1], self.line_no, "tx_pos")?;

            return Ok(Some(QueryRecord {
                tx_id: fields[0].to_string(),
                tx_pos,
                line: self.line_no,
            }));
        }
    }
}
