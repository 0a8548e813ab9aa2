//! # txmap
//!
//! 基于 CIGAR 比对，将转录本坐标换算为基因组坐标。
//!
//! 本 crate 提供：
//!
//! - **CIGAR 解析**：`<len><op>` 串解析为有序区段（M / D / I / S / H / = / X）
//! - **坐标换算**：从比对起点单遍游走，耗时只取决于转录本长度
//! - **批量处理**：读取制表符分隔的转录本映射表与查询文件，并行换算后按序写出
//!
//! ## 快速示例
//!
//! ```rust
//! use txmap::coord::{Cigar, Placement};
//!
//! let cigar: Cigar = "8M7D6M2I2M11D7M".parse().unwrap();
//! assert_eq!(cigar.transcript_len(), 25);
//!
//! // TR1:4 -> CHR1:7
//! let m = cigar.map_coordinate(4, 3).unwrap();
//! assert_eq!(m.pos, 7);
//! assert_eq!(m.placement, Placement::Exact);
//!
//! // 落在 2I 内的碱基返回插入区右侧的坐标
//! let m = cigar.map_coordinate(14, 3).unwrap();
//! assert_eq!(m.placement, Placement::InsideInsertion);
//! ```
//!
//! ## 模块说明
//!
//! - [`coord`] — CIGAR 解析、坐标换算与批量驱动
//! - [`io`] — 转录本映射表 / 查询文件读取
//! - [`error`] — 错误类型

pub mod coord;
pub mod error;
pub mod io;

pub use error::{Error, Result};
