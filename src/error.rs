use thiserror::Error;

use crate::coord::cigar::CigarOp;

/// 坐标映射过程中可能出现的错误。
///
/// 落在插入区内的查询不是错误：映射仍然返回右侧坐标，
/// 通过 [`crate::coord::Placement::InsideInsertion`] 标记。
#[derive(Debug, Error)]
pub enum Error {
    /// CIGAR string could not be split into `<len><op>` pairs.
    #[error("malformed CIGAR string '{cigar}': {reason}")]
    MalformedEncoding { cigar: String, reason: String },

    /// Queried transcript position lies outside `[0, transcript length)`.
    #[error("transcript position out of bounds (tx_pos = {pos}, transcript length = {tx_len}, CIGAR str = {cigar})")]
    OutOfBounds { pos: i64, tx_len: u64, cigar: String },

    /// The walk reached a region it cannot translate through (S, H, = or X).
    #[error("CIGAR operation '{op}' in region {region} is not supported for coordinate mapping (CIGAR str = {cigar})")]
    UnsupportedOperation { op: CigarOp, region: usize, cigar: String },

    /// Walking the alignment pushed the genomic coordinate past `i64` range.
    #[error("genomic coordinate overflows (tx_pos = {pos}, mapping start = {start}, CIGAR str = {cigar})")]
    CoordinateOverflow { pos: i64, start: i64, cigar: String },

    #[error("transcript '{0}' not found in transcript mappings")]
    TranscriptNotFound(String),

    #[error("line {line}: duplicate transcript id '{tx_id}'")]
    DuplicateTranscript { line: usize, tx_id: String },

    /// Wrong number of tab-separated columns on an input line.
    #[error("line {line}: expected {expected} tab-separated fields, found {found}")]
    Format { line: usize, expected: usize, found: usize },

    #[error("line {line}: invalid integer '{value}' in column '{column}'")]
    InvalidInteger { line: usize, column: &'static str, value: String },

    /// A per-query failure, tagged with the query line it came from.
    #[error("query line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// 是否只影响单条查询（可在 skip 策略下跳过）。I/O 错误总是致命的。
    pub fn is_query_local(&self) -> bool {
        match self {
            Error::OutOfBounds { .. }
            | Error::UnsupportedOperation { .. }
            | Error::CoordinateOverflow { .. }
            | Error::MalformedEncoding { .. }
            | Error::TranscriptNotFound(_)
            | Error::Format { .. }
            | Error::InvalidInteger { .. } => true,
            Error::AtLine { source, .. } => source.is_query_local(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
