use tracing::warn;

use super::cigar::{Cigar, CigarOp};
use crate::error::{Error, Result};

/// 查询位置与基因组坐标的对应关系
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// 转录本碱基与基因组碱基一一对应
    Exact,
    /// 落在插入区内，没有对应的基因组碱基；返回值是插入区右侧的坐标
    InsideInsertion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappedCoord {
    pub pos: i64,
    pub placement: Placement,
}

impl MappedCoord {
    pub fn is_exact(&self) -> bool {
        self.placement == Placement::Exact
    }
}

/// 将 0-based 转录本坐标换算为 0-based 基因组坐标。
///
/// 从比对起点单遍游走，时间复杂度只与转录本长度相关，与染色体长度无关；
/// 每次调用都从头重新游走，不做缓存。
///
/// 步进规则：
/// - `M`：每个碱基前进一步，到达区段最后一个碱基时标记区段结束；
/// - `D`：一次性跨过整个删除区（基因组坐标 `+len+1`），只占一个步进；
/// - `I`：转录本索引一次跳过 `len`，基因组坐标只 `+1`；若查询落在插入区内，
///   发出警告并返回插入区右侧的坐标。
///
/// 长度为 1 的 `M` 区段永远不会触发"区段结束"标记（`within == len - 1`
/// 在进入区段时已经成立），游走会继续按匹配处理后续碱基。
///
/// # Errors
///
/// - `OutOfBounds`：`tx_pos < 0` 或 `tx_pos >= transcript_len`；
/// - `UnsupportedOperation`：游走需要穿过 S/H/=/X 区段；
/// - `CoordinateOverflow`：基因组坐标超出 `i64` 范围。
pub fn map_coordinate(cigar: &Cigar, tx_pos: i64, mapping_start: i64) -> Result<MappedCoord> {
    let tx_len = cigar.transcript_len();
    let out_of_bounds = || Error::OutOfBounds {
        pos: tx_pos,
        tx_len,
        cigar: cigar.as_str().to_string(),
    };
    if tx_pos < 0 || tx_pos as u64 >= tx_len {
        return Err(out_of_bounds());
    }

    let regions = cigar.regions();
    // tx_len > 0 guarantees at least one region
    let mut active = *regions.first().ok_or_else(out_of_bounds)?;
    let mut region_ix = 0usize;
    let mut within_ix = 0i64;
    let mut tx_ix = 0i64;
    let mut at_region_end = false;
    let mut genomic_pos = mapping_start;
    let overflow = || Error::CoordinateOverflow {
        pos: tx_pos,
        start: mapping_start,
        cigar: cigar.as_str().to_string(),
    };

    while tx_ix < tx_pos {
        let len = i64::from(active.len);
        match active.op {
            CigarOp::Match => {
                genomic_pos = genomic_pos.checked_add(1).ok_or_else(overflow)?;
                within_ix += 1;
                if within_ix == len - 1 {
                    at_region_end = true;
                }
            }
            CigarOp::Deletion => {
                genomic_pos = genomic_pos.checked_add(len + 1).ok_or_else(overflow)?;
                at_region_end = true;
            }
            CigarOp::Insertion => {
                tx_ix += len;
                genomic_pos = genomic_pos.checked_add(1).ok_or_else(overflow)?;
                at_region_end = true;
                if tx_pos <= tx_ix {
                    warn!(
                        tx_pos,
                        genomic_pos,
                        cigar = cigar.as_str(),
                        "transcript coordinate maps to insertion region and has no corresponding genomic coordinate; returning coordinate to the right of insertion"
                    );
                    return Ok(MappedCoord {
                        pos: genomic_pos,
                        placement: Placement::InsideInsertion,
                    });
                }
            }
            op => {
                return Err(Error::UnsupportedOperation {
                    op,
                    region: region_ix,
                    cigar: cigar.as_str().to_string(),
                });
            }
        }

        if at_region_end {
            region_ix += 1;
            if let Some(&next) = regions.get(region_ix) {
                active = next;
                within_ix = 0;
                at_region_end = false;
            }
        }

        tx_ix += 1;
    }

    Ok(MappedCoord {
        pos: genomic_pos,
        placement: Placement::Exact,
    })
}
