//! 位图束门面：值语义句柄 + 全部工厂函数与查询入口。

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{BundleBackend, FixedSetBackend, VectorBackend};
use crate::bitmap::Bitmap;
use crate::error::BundleError;
use crate::geom::SizePx;
use crate::resolver::{self, FileResolver, ResourceResolver};

/// 窗口（或其它显示载体）当前 DPI 倍率的查询收口。
///
/// 倍率应为正实数；具体取值来源（窗口系统、显示器枚举、测试桩）
/// 由实现方决定。
pub trait DpiScaleSource {
    /// 当前内容缩放倍率。
    fn dpi_scale(&self) -> f64;
}

/// 零或多张候选位图之上的值语义句柄。
///
/// 克隆是 O(1) 的引用计数复制，所有克隆共享同一个后端实例
/// （后端随最后一个持有者释放）；克隆不产生隔离，只是同一份
/// 可变缓存的第二个引用，内置后端以锁保证这一点安全。
///
/// 空束（[`is_ok`](Self::is_ok) 为假）可以安全查询：尺寸类查询
/// 返回 [`SizePx::ZERO`] 哨兵，位图类查询返回 `None`，永不报错。
#[derive(Clone, Default)]
pub struct ImageBundle {
    backend: Option<Arc<dyn BundleBackend>>,
}

impl ImageBundle {
    /// 空束。后续可整体赋值替换，但自身无法变为非空。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 单张位图包成单候选束。[`Bitmap`] 按构造即有效，故不会失败。
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        Self::from_construction(FixedSetBackend::new(vec![bitmap]), "单位图")
    }

    /// 从位图列表构造；同尺寸后写覆盖先写，列表为空得到空束。
    pub fn from_bitmaps(bitmaps: Vec<Bitmap>) -> Self {
        Self::from_construction(FixedSetBackend::new(bitmaps), "位图列表")
    }

    /// 从 SVG 文本构造（UTF-8）。
    ///
    /// `default_size` 传 [`SizePx::ZERO`] 时采用文档自身声明的尺寸；
    /// 解析失败得到空束。
    pub fn from_svg_data(data: &str, default_size: SizePx) -> Self {
        Self::from_construction(VectorBackend::new(data, default_size), "SVG 文档")
    }

    /// 经调用方提供的解析器按命名约定探测变体族；零命中得到空束。
    pub fn from_resolver(base: &str, resolver: &dyn ResourceResolver) -> Self {
        Self::from_construction(
            resolver::resolve_scaled_set(base, resolver, Default::default()),
            "命名约定",
        )
    }

    /// [`from_resolver`](Self::from_resolver) 的文件系统便捷入口：
    /// 探测 `path` 及其 `@2x` / `_2x` 族兄弟文件。
    ///
    /// 解析接口以 UTF-8 字符串为基标识；路径含非 UTF-8 字节时按
    /// 有损转换处理并记录警告（此时探测可能落空，得到空束）。
    pub fn from_files(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.to_str().is_none() {
            tracing::warn!("路径含非 UTF-8 字节, 按有损转换探测: {}", path.display());
        }
        Self::from_resolver(&path.to_string_lossy(), &FileResolver)
    }

    /// 扩展点：把调用方自备的后端实现收进束里，此后与内置后端
    /// 一视同仁地被共享。
    pub fn from_backend(backend: impl BundleBackend) -> Self {
        Self {
            backend: Some(Arc::new(backend)),
        }
    }

    fn from_construction<B: BundleBackend>(result: Result<B, BundleError>, what: &str) -> Self {
        match result {
            Ok(backend) => Self::from_backend(backend),
            Err(e) => {
                tracing::warn!("{what}构造失败, 返回空束: {e}");
                Self::empty()
            }
        }
    }

    /// 束是否非空。尺寸敏感的调用方应先检查再使用查询结果。
    pub fn is_ok(&self) -> bool {
        self.backend.is_some()
    }

    /// 100% 缩放下的尺寸；空束返回 [`SizePx::ZERO`]。
    pub fn default_size(&self) -> SizePx {
        match &self.backend {
            Some(backend) => backend.default_size(),
            None => SizePx::ZERO,
        }
    }

    /// 给定倍率下的首选尺寸；空束返回 [`SizePx::ZERO`]。
    ///
    /// 倍率策略：非有限或非正的倍率按 1.0 处理并记录警告
    /// （显式钳制，而非未定义行为）。
    pub fn preferred_size_at_scale(&self, scale: f64) -> SizePx {
        match &self.backend {
            Some(backend) => backend.preferred_size_at_scale(sanitize_scale(scale)),
            None => SizePx::ZERO,
        }
    }

    /// 按显示载体当前倍率计算首选尺寸。
    pub fn preferred_size_for(&self, source: &impl DpiScaleSource) -> SizePx {
        self.preferred_size_at_scale(source.dpi_scale())
    }

    /// 取精确 `size` 尺寸的位图；空束返回 `None`。
    ///
    /// `size` 为 [`SizePx::ZERO`]（或任一维为零）时代以默认尺寸，
    /// 与"使用默认尺寸"哨兵的语义一致。
    pub fn bitmap(&self, size: SizePx) -> Option<Bitmap> {
        let backend = self.backend.as_ref()?;
        let size = if size.is_valid() {
            size
        } else {
            backend.default_size()
        };
        Some(backend.bitmap(size))
    }

    /// [`bitmap`](Self::bitmap) 与 [`preferred_size_for`](Self::preferred_size_for)
    /// 的组合：适配显示载体当前 DPI 的位图。
    pub fn bitmap_for(&self, source: &impl DpiScaleSource) -> Option<Bitmap> {
        self.bitmap(self.preferred_size_for(source))
    }

    /// 共享后端句柄（非空束），供需要直接访问扩展后端的调用方使用。
    pub fn backend(&self) -> Option<Arc<dyn BundleBackend>> {
        self.backend.clone()
    }
}

/// 非法倍率钳制到 1.0。
fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        tracing::warn!("非法的 DPI 倍率 {scale}, 按 1.0 处理");
        1.0
    }
}

impl fmt::Debug for ImageBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBundle")
            .field("is_ok", &self.is_ok())
            .field("default_size", &self.default_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::vector::tests::SAMPLE_SVG;
    use crate::bitmap::tests::solid;

    /// 固定倍率的测试 DPI 源。
    struct FixedScale(f64);

    impl DpiScaleSource for FixedScale {
        fn dpi_scale(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn empty_bundle_sentinels() {
        let bundle = ImageBundle::empty();
        assert!(!bundle.is_ok());
        assert_eq!(bundle.default_size(), SizePx::ZERO);
        assert_eq!(bundle.preferred_size_at_scale(2.0), SizePx::ZERO);
        assert!(bundle.bitmap(SizePx::new(32, 32)).is_none());
        assert!(bundle.bitmap_for(&FixedScale(2.0)).is_none());
    }

    #[test]
    fn from_bitmaps_empty_list_is_not_ok() {
        assert!(!ImageBundle::from_bitmaps(Vec::new()).is_ok());
    }

    #[test]
    fn from_bitmap_default_size_roundtrip_is_pixel_identical() {
        let original = solid(SizePx::new(24, 24), [9, 8, 7, 255]);
        let bundle = ImageBundle::from_bitmap(original.clone());
        assert!(bundle.is_ok());
        let out = bundle.bitmap(bundle.default_size()).expect("非空束");
        assert!(out.ptr_eq(&original));
    }

    #[test]
    fn zero_size_sentinel_substitutes_default() {
        let bundle = ImageBundle::from_bitmap(solid(SizePx::new(24, 24), [1, 1, 1, 255]));
        let out = bundle.bitmap(SizePx::ZERO).expect("非空束");
        assert_eq!(out.size(), SizePx::new(24, 24));
        // 单维为零同样按哨兵处理
        let out = bundle.bitmap(SizePx::new(0, 64)).expect("非空束");
        assert_eq!(out.size(), SizePx::new(24, 24));
    }

    #[test]
    fn malformed_svg_yields_empty_bundle() {
        let bundle = ImageBundle::from_svg_data("<svg", SizePx::new(10, 10));
        assert!(!bundle.is_ok());
    }

    #[test]
    fn svg_bundle_serves_any_size() {
        let bundle = ImageBundle::from_svg_data(SAMPLE_SVG, SizePx::new(10, 10));
        assert!(bundle.is_ok());
        assert_eq!(bundle.preferred_size_at_scale(2.0), SizePx::new(20, 20));
        let out = bundle.bitmap(SizePx::new(33, 17)).expect("非空束");
        assert_eq!(out.size(), SizePx::new(33, 17));
    }

    #[test]
    fn clones_share_one_backend() {
        let bundle = ImageBundle::from_svg_data(SAMPLE_SVG, SizePx::new(10, 10));
        let copy = bundle.clone();
        let a = bundle.bitmap(SizePx::new(50, 50)).expect("非空束");
        let b = copy.bitmap(SizePx::new(50, 50)).expect("非空束");
        // 两个克隆回到同一份缓存条目: 内容乃至存储都相同
        assert!(a.ptr_eq(&b));
        assert_eq!(a.pixel_bytes(), b.pixel_bytes());
    }

    #[test]
    fn invalid_scale_is_clamped_to_one() {
        let bundle = ImageBundle::from_bitmap(solid(SizePx::new(16, 16), [0, 0, 0, 255]));
        assert_eq!(bundle.preferred_size_at_scale(0.0), SizePx::new(16, 16));
        assert_eq!(bundle.preferred_size_at_scale(-2.0), SizePx::new(16, 16));
        assert_eq!(
            bundle.preferred_size_at_scale(f64::NAN),
            SizePx::new(16, 16)
        );
    }

    #[test]
    fn preferred_size_doubles_at_scale_two() {
        let bundle = ImageBundle::from_bitmap(solid(SizePx::new(16, 16), [0, 0, 0, 255]));
        assert_eq!(
            bundle.preferred_size_at_scale(2.0),
            bundle.default_size().scaled_by(2.0)
        );
        assert_eq!(
            bundle.bitmap_for(&FixedScale(2.0)).expect("非空束").size(),
            SizePx::new(32, 32)
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_degrades_to_empty_without_panic() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // 0x80 不是合法 UTF-8 序列的起始字节
        let path = OsStr::from_bytes(b"icons/\x80save.png");
        let bundle = ImageBundle::from_files(path);
        assert!(!bundle.is_ok());
    }

    #[test]
    fn custom_backend_extension_point() {
        /// 恒定输出棋盘色的示例后端。
        struct Checker;

        impl BundleBackend for Checker {
            fn default_size(&self) -> SizePx {
                SizePx::new(8, 8)
            }

            fn bitmap(&self, size: SizePx) -> Bitmap {
                solid(size, [0, 255, 0, 255])
            }
        }

        let bundle = ImageBundle::from_backend(Checker);
        assert!(bundle.is_ok());
        assert_eq!(bundle.default_size(), SizePx::new(8, 8));
        let out = bundle.bitmap(SizePx::new(20, 20)).expect("非空束");
        assert_eq!(out.size(), SizePx::new(20, 20));
        assert!(bundle.backend().is_some());
    }
}
