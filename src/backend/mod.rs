//! 位图束后端：面向 [`crate::ImageBundle`] 的多态策略接口及内置实现。

/// 固定候选集后端（按宽度选择 + 重采样）
pub mod fixed_set;
/// 矢量文档后端（按需栅格化 + 逐尺寸缓存）
pub mod vector;

pub use fixed_set::FixedSetBackend;
pub use vector::VectorBackend;

use crate::bitmap::Bitmap;
use crate::geom::SizePx;

/// 位图束后端契约。
///
/// 实现方必须保证：
/// - [`default_size`](Self::default_size) 恒返回有效（正面积）尺寸；
/// - [`preferred_size_at_scale`](Self::preferred_size_at_scale) 恒返回
///   有效尺寸，且对倍率单调不减；
/// - [`bitmap`](Self::bitmap) 对任何有效尺寸都返回精确等于该尺寸的位图，
///   必要时重采样或栅格化合成；允许在内部写缓存（经锁保护的内部可变性），
///   但不允许失败——产不出位图属于构造期错误，不是查询期错误。
///
/// 后端经 `Arc<dyn BundleBackend>` 在束的各个克隆之间共享，
/// 因此要求 `Send + Sync`；内置实现用 `std::sync::Mutex` 守护缓存。
pub trait BundleBackend: Send + Sync + 'static {
    /// 100% 缩放（基准倍率）下的尺寸。
    fn default_size(&self) -> SizePx;

    /// 给定显示倍率下的首选尺寸。
    ///
    /// 默认实现为 `default_size * scale` 的四舍五入（见
    /// [`SizePx::scaled_by`]），逐维钳制到至少 1 像素；
    /// 覆写时必须保持对 `scale` 单调不减。
    fn preferred_size_at_scale(&self, scale: f64) -> SizePx {
        self.default_size().scaled_by(scale)
    }

    /// 取得精确等于 `size` 的位图。入参必须是有效尺寸（由门面保证）。
    fn bitmap(&self, size: SizePx) -> Bitmap;
}
