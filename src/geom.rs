//! 像素尺寸类型与缩放换算。

use std::fmt;

/// 以物理像素计的二维尺寸。
///
/// 宽高均大于 0 时为有效尺寸；[`SizePx::ZERO`] 是文档化的无效哨兵值，
/// 同时在 [`crate::ImageBundle::bitmap`] 中充当"使用默认尺寸"的占位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizePx {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

impl SizePx {
    /// 零面积哨兵尺寸。
    pub const ZERO: SizePx = SizePx {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 宽高是否均为正。
    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// 按倍率缩放，逐维四舍五入（远离零取整）并钳制到至少 1 像素。
    ///
    /// 舍入规则采用 `f64::round`（0.5 进位），有边界测试覆盖；
    /// 倍率的合法性（有限且为正）由调用方保证。
    pub fn scaled_by(self, scale: f64) -> SizePx {
        SizePx {
            width: scale_dim(self.width, scale),
            height: scale_dim(self.height, scale),
        }
    }
}

fn scale_dim(dim: u32, scale: f64) -> u32 {
    // f64 -> u32 的 as 转换自带饱和语义，极端倍率不会回绕。
    (dim as f64 * scale).round().max(1.0) as u32
}

impl fmt::Display for SizePx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
