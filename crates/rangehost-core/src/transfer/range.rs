//! `Range` 请求头解析
//!
//! 只识别两种形式：`bytes=<start>-<end>` 和 `bytes=<start>-`。
//! 其他任何内容（多段范围、缺少 `bytes=` 前缀、非数字）都视为没有请求范围，
//! 按整文件下载，不会报错。

use regex::Regex;
use std::sync::LazyLock;

static RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bytes=(\d+)-(\d*)$").unwrap());

/// 从请求头解析出的范围，尚未与具体文件比对
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// 起始偏移（包含）
    pub start: u64,
    /// 结束偏移（包含），`None` 表示到文件末尾
    pub end: Option<u64>,
}

impl RangeSpec {
    /// 解析请求头文本，无法识别时返回 `None`
    pub fn parse(header: &str) -> Option<Self> {
        let caps = RANGE_PATTERN.captures(header.trim())?;
        let start = caps[1].parse().ok()?;
        let end = match &caps[2] {
            "" => None,
            digits => Some(digits.parse().ok()?),
        };
        Some(Self { start, end })
    }

    /// 与文件大小比对，得到实际服务的范围
    ///
    /// 不可满足的范围（起点越过文件末尾，或终点小于起点）退化为整文件；
    /// 越过文件末尾的终点被截断到 `size - 1`。
    pub fn resolve(self, size: u64) -> Option<ResolvedRange> {
        if size == 0 || self.start >= size {
            return None;
        }
        let last = size - 1;
        let end = self.end.map_or(last, |end| end.min(last));
        if end < self.start {
            return None;
        }
        Some(ResolvedRange {
            start: self.start,
            end,
            size,
            explicit_end: self.end.is_some(),
        })
    }
}

/// 针对某个文件确定的服务范围，满足 `start <= end < size`（空文件除外）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub size: u64,
    /// 请求里是否给出了结束偏移
    pub explicit_end: bool,
}

impl ResolvedRange {
    /// 整个文件
    pub fn whole(size: u64) -> Self {
        Self {
            start: 0,
            end: size.saturating_sub(1),
            size,
            explicit_end: false,
        }
    }

    /// 解析请求头并与文件比对，任何无法使用的范围都回退到整文件
    pub fn from_header(header: Option<&str>, size: u64) -> Self {
        header
            .and_then(RangeSpec::parse)
            .and_then(|spec| spec.resolve(size))
            .unwrap_or_else(|| Self::whole(size))
    }

    /// 剩余到文件末尾的字节数
    ///
    /// 这是 `content-length` 的取值，与 `end` 无关。
    pub fn remaining(&self) -> u64 {
        self.size - self.start
    }

    /// 是否按 206 Partial Content 响应
    pub fn is_partial(&self) -> bool {
        self.start > 0 || self.explicit_end
    }

    /// `content-range` 响应头的值
    pub fn content_range(&self) -> String {
        if self.size == 0 {
            return "bytes */0".to_string();
        }
        format!("bytes {}-{}/{}", self.start, self.end, self.size)
    }
}
