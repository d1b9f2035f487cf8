//! 矢量文档后端：usvg 解析一次，resvg 按需栅格化并逐尺寸缓存。

use std::collections::HashMap;
use std::sync::Mutex;

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::backend::BundleBackend;
use crate::bitmap::Bitmap;
use crate::error::BundleError;
use crate::geom::SizePx;
use crate::raster::RasterQuality;

/// 持有一份已解析 SVG 文档的后端。
///
/// 文档与默认尺寸在构造后不可变；栅格化结果按请求尺寸缓存，
/// 只增不减——请求过的不同尺寸越多缓存越大，属于已知的资源增长点，
/// 调用方应避免用连续变化的尺寸查询同一个束。
pub struct VectorBackend {
    tree: usvg::Tree,
    default_size: SizePx,
    cache: Mutex<RenderCache>,
}

/// 尺寸到渲染结果的映射，附带栅格化调用计数。
struct RenderCache {
    map: HashMap<SizePx, Bitmap>,
    renders: usize,
}

impl VectorBackend {
    /// 解析 UTF-8 的 SVG 文本并构造后端。
    ///
    /// `default_size` 为基准（1.0 倍率）尺寸；传 [`SizePx::ZERO`] 时
    /// 退回文档自身声明的尺寸。文档畸形时构造失败，不会留下半成品。
    pub fn new(data: &str, default_size: SizePx) -> Result<Self, BundleError> {
        Self::with_quality(data, default_size, RasterQuality::default())
    }

    /// 指定质量档位的构造变体。
    pub fn with_quality(
        data: &str,
        default_size: SizePx,
        quality: RasterQuality,
    ) -> Result<Self, BundleError> {
        let opts = usvg::Options {
            fontdb: crate::raster::global_font_db(),
            shape_rendering: quality.shape_rendering(),
            text_rendering: quality.text_rendering(),
            image_rendering: quality.image_rendering(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(data.as_bytes(), &opts)
            .map_err(|e| BundleError::SvgParse(e.to_string()))?;

        let default_size = if default_size.is_valid() {
            default_size
        } else {
            let intrinsic = tree.size().to_int_size();
            SizePx::new(intrinsic.width(), intrinsic.height())
        };
        if !default_size.is_valid() {
            return Err(BundleError::SvgParse(
                "文档未声明有效尺寸且调用方未提供默认尺寸".to_string(),
            ));
        }

        Ok(Self {
            tree,
            default_size,
            cache: Mutex::new(RenderCache {
                map: HashMap::new(),
                renders: 0,
            }),
        })
    }

    /// 至今实际触发栅格化的次数（缓存命中不计入）。诊断与测试用。
    pub fn render_count(&self) -> usize {
        self.cache.lock().map(|c| c.renders).unwrap_or(0)
    }

    /// 把文档渲染到精确的目标尺寸。
    ///
    /// 缩放在两个维度上独立计算，目标宽高比与文档不一致时按拉伸处理。
    fn rasterize(&self, size: SizePx) -> Result<Bitmap, BundleError> {
        let mut pixmap = Pixmap::new(size.width, size.height)
            .ok_or_else(|| BundleError::Raster(format!("无法分配 {size} 的像素缓冲")))?;

        let doc_size = self.tree.size();
        let sx = size.width as f32 / doc_size.width();
        let sy = size.height as f32 / doc_size.height();
        resvg::render(
            &self.tree,
            Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );
        Ok(Bitmap::from_pixmap(pixmap))
    }
}

impl BundleBackend for VectorBackend {
    fn default_size(&self) -> SizePx {
        self.default_size
    }

    // 矢量源可以精确渲染任意尺寸，首选尺寸没有"就近取候选"的权衡，
    // 直接使用 trait 的默认缩放实现。

    fn bitmap(&self, size: SizePx) -> Bitmap {
        if let Some(hit) = self
            .cache
            .lock()
            .ok()
            .and_then(|c| c.map.get(&size).cloned())
        {
            tracing::trace!("矢量栅格化缓存命中: {size}");
            return hit;
        }

        match self.rasterize(size) {
            Ok(bitmap) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.renders += 1;
                    cache.map.insert(size, bitmap.clone());
                }
                bitmap
            }
            Err(e) => {
                // 降级路径: 目标尺寸分配被拒时退回默认尺寸渲染
                tracing::error!("矢量栅格化 {size} 失败: {e}");
                match self.rasterize(self.default_size) {
                    Ok(bitmap) => bitmap,
                    // 默认尺寸在构造时已验证为正，这条分支实际不可达；
                    // 仍给出 1x1 透明图兜底，维持"查询不失败"的契约。
                    Err(_) => Bitmap::from_pixmap(Pixmap::new(1, 1).unwrap()),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect x="0" y="0" width="10" height="10" fill="#ff0000"/></svg>"##;

    #[test]
    fn malformed_document_fails_construction() {
        let result = VectorBackend::new("<svg", SizePx::new(10, 10));
        assert!(matches!(result, Err(BundleError::SvgParse(_))));
    }

    #[test]
    fn zero_default_size_falls_back_to_intrinsic() {
        let backend = VectorBackend::new(SAMPLE_SVG, SizePx::ZERO).expect("解析");
        assert_eq!(backend.default_size(), SizePx::new(10, 10));
    }

    #[test]
    fn renders_exact_requested_size() {
        let backend = VectorBackend::new(SAMPLE_SVG, SizePx::new(10, 10)).expect("解析");
        let out = backend.bitmap(SizePx::new(100, 50));
        assert_eq!(out.size(), SizePx::new(100, 50));
        // 整面矩形填充为红色
        assert_eq!(out.to_rgba8().get_pixel(50, 25).0, [255, 0, 0, 255]);
    }

    #[test]
    fn second_request_hits_cache_without_rerender() {
        let backend = VectorBackend::new(SAMPLE_SVG, SizePx::new(10, 10)).expect("解析");
        let a = backend.bitmap(SizePx::new(100, 100));
        assert_eq!(backend.render_count(), 1);
        let b = backend.bitmap(SizePx::new(100, 100));
        // 第二次调用不得再次触发栅格化，且内容与首次一致
        assert_eq!(backend.render_count(), 1);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.pixel_bytes(), b.pixel_bytes());
    }

    #[test]
    fn distinct_sizes_render_separately() {
        let backend = VectorBackend::new(SAMPLE_SVG, SizePx::new(10, 10)).expect("解析");
        let _ = backend.bitmap(SizePx::new(20, 20));
        let _ = backend.bitmap(SizePx::new(40, 40));
        assert_eq!(backend.render_count(), 2);
    }

    #[test]
    fn preferred_size_scales_default() {
        let backend = VectorBackend::new(SAMPLE_SVG, SizePx::new(10, 10)).expect("解析");
        assert_eq!(
            backend.preferred_size_at_scale(1.5),
            SizePx::new(15, 15)
        );
        // 10 * 1.25 = 12.5 -> 13 (0.5 边界进位)
        assert_eq!(
            backend.preferred_size_at_scale(1.25),
            SizePx::new(13, 13)
        );
    }
}
