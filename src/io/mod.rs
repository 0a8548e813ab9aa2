//! 制表符分隔的输入文件：转录本映射表与查询列表。

pub mod queries;
pub mod transcripts;

/// 去掉首尾空白（含换行、多余的制表符）后按 `\t` 切分
pub(crate) fn split_tsv_line(line: &str) -> Vec<&str> {
    line.trim().split('\t').collect()
}

pub(crate) fn parse_i64(
    field: &str,
    line: usize,
    column: &'static str,
) -> crate::error::Result<i64> {
    field
        .trim()
        .parse::<i64>()
        .map_err(|_| crate::error::Error::InvalidInteger {
            line,
            column,
            value: field.to_string(),
        })
}
