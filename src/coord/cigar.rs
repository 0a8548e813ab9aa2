use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::error::{Error, Result};

/// CIGAR 操作类型。只有 M / D / I 参与坐标换算，其余符号仅做语法识别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CigarOp {
    Match,
    Deletion,
    Insertion,
    SoftClip,
    HardClip,
    Equal,
    Mismatch,
}

impl CigarOp {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            'M' => Some(CigarOp::Match),
            'D' => Some(CigarOp::Deletion),
            'I' => Some(CigarOp::Insertion),
            'S' => Some(CigarOp::SoftClip),
            'H' => Some(CigarOp::HardClip),
            '=' => Some(CigarOp::Equal),
            'X' => Some(CigarOp::Mismatch),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Deletion => 'D',
            CigarOp::Insertion => 'I',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Equal => '=',
            CigarOp::Mismatch => 'X',
        }
    }

    /// 坐标映射的游走能否穿过该操作
    pub fn is_mappable(self) -> bool {
        matches!(self, CigarOp::Match | CigarOp::Deletion | CigarOp::Insertion)
    }

    /// Whether the operation occupies transcript positions.
    pub fn consumes_transcript(self) -> bool {
        matches!(self, CigarOp::Match | CigarOp::Insertion)
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

/// 一个 `<len><op>` 区段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub len: u32,
    pub op: CigarOp,
}

impl Region {
    pub fn new(len: u32, op: CigarOp) -> Self {
        Self { len, op }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.op)
    }
}

/// 将 CIGAR 字符串解析为有序区段列表。
///
/// 只做语法检查：空串、缺少长度的操作符、末尾悬空的数字、未知符号都会报
/// `MalformedEncoding`；长度为 0 的区段以及 S/H/=/X 均按原样接受。
pub fn parse_cigar(cigar: &str) -> Result<Vec<Region>> {
    let malformed = |reason: String| Error::MalformedEncoding {
        cigar: cigar.to_string(),
        reason,
    };

    if cigar.is_empty() {
        return Err(malformed("empty string".to_string()));
    }

    let mut regions = Vec::new();
    let mut num: Option<u32> = None;
    for (i, ch) in cigar.char_indices() {
        if let Some(d) = ch.to_digit(10) {
            let next = num
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|n| n.checked_add(d))
                .ok_or_else(|| malformed(format!("length overflows at offset {}", i)))?;
            num = Some(next);
        } else {
            let op = CigarOp::from_char(ch)
                .ok_or_else(|| malformed(format!("unknown operation '{}' at offset {}", ch, i)))?;
            let len = num
                .take()
                .ok_or_else(|| malformed(format!("operation '{}' at offset {} has no length", ch, i)))?;
            regions.push(Region { len, op });
        }
    }

    if num.is_some() {
        return Err(malformed("trailing length without operation".to_string()));
    }
    Ok(regions)
}

/// 转录本长度：M 与 I 区段长度之和（D 只存在于基因组上）
pub fn transcript_length(regions: &[Region]) -> u64 {
    regions
        .iter()
        .filter(|r| r.op.consumes_transcript())
        .map(|r| u64::from(r.len))
        .sum()
}

/// 解析后的 CIGAR，保留原始字符串用于诊断信息。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cigar {
    raw: String,
    regions: Vec<Region>,
}

impl Cigar {
    pub fn parse(cigar: &str) -> Result<Self> {
        let regions = parse_cigar(cigar)?;
        Ok(Self {
            raw: cigar.to_string(),
            regions,
        })
    }

    /// Build from regions, rendering the run-length text for them. Adjacent
    /// regions with the same operation are kept separate.
    pub fn from_regions(regions: Vec<Region>) -> Self {
        let mut raw = String::new();
        for r in &regions {
            let _ = write!(&mut raw, "{}", r);
        }
        Self { raw, regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn transcript_len(&self) -> u64 {
        transcript_length(&self.regions)
    }

    pub fn map_coordinate(&self, tx_pos: i64, mapping_start: i64) -> Result<super::MappedCoord> {
        super::map_coordinate(self, tx_pos, mapping_start)
    }
}

impl FromStr for Cigar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
