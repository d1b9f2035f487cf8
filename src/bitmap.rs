//! 位图句柄：预乘 RGBA 像素上的廉价克隆封装。
//!
//! 栅格存储由 tiny-skia 的 [`Pixmap`] 承担，重采样走 image crate
//! 的 `imageops`（质量档 Lanczos3，速度档 Triangle）。

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tiny_skia::{ColorU8, Pixmap};

use crate::error::BundleError;
use crate::geom::SizePx;

/// 一张具体尺寸的栅格图。
///
/// 内部以 `Arc` 共享像素数据，`clone` 为 O(1)；按构造即有效，
/// 宽高恒为正（[`Pixmap`] 不存在零尺寸实例）。
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixmap: Arc<Pixmap>,
}

impl Bitmap {
    /// 直接包装一张现成的 pixmap。
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap: Arc::new(pixmap),
        }
    }

    /// 从直通（非预乘）RGBA8 像素构造，入参按行主序、每像素 4 字节。
    pub fn from_rgba8(size: SizePx, data: &[u8]) -> Result<Self, BundleError> {
        if !size.is_valid() {
            return Err(BundleError::Decode(format!("无效尺寸 {size}")));
        }
        let expected = size.width as usize * size.height as usize * 4;
        if data.len() != expected {
            return Err(BundleError::Decode(format!(
                "像素数据长度不符: 期望 {expected} 字节, 实际 {}",
                data.len()
            )));
        }

        let mut pixmap = Pixmap::new(size.width, size.height)
            .ok_or_else(|| BundleError::Raster(format!("无法分配 {size} 的像素缓冲")))?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(data.chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Ok(Self::from_pixmap(pixmap))
    }

    /// 解码一个磁盘图片文件（PNG/JPEG 等，由 image crate 识别格式）。
    pub fn decode_path(path: &Path) -> Result<Self, BundleError> {
        let img = image::open(path)?.to_rgba8();
        let size = SizePx::new(img.width(), img.height());
        Self::from_rgba8(size, img.as_raw())
    }

    /// 从内存字节解码（用于内嵌资源表等非文件来源）。
    pub fn decode_bytes(data: &[u8]) -> Result<Self, BundleError> {
        let img = image::load_from_memory(data)?.to_rgba8();
        let size = SizePx::new(img.width(), img.height());
        Self::from_rgba8(size, img.as_raw())
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.pixmap.width(), self.pixmap.height())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// 底层 pixmap（预乘 RGBA）。
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// 原始预乘 RGBA 字节，用于内容比对或交给渲染侧上传。
    pub fn pixel_bytes(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// 两个句柄是否指向同一份像素数据（克隆共享判定）。
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixmap, &other.pixmap)
    }

    /// 重采样到精确的目标尺寸。
    ///
    /// 先反预乘回直通 RGBA 再缩放，避免预乘像素在滤波时产生暗边。
    pub fn resampled_to(&self, size: SizePx, filter: FilterType) -> Result<Self, BundleError> {
        if !size.is_valid() {
            return Err(BundleError::Raster(format!("无效的目标尺寸 {size}")));
        }
        if size == self.size() {
            return Ok(self.clone());
        }
        let src = self.to_rgba8();
        let resized = imageops::resize(&src, size.width, size.height, filter);
        Self::from_rgba8(size, resized.as_raw())
    }

    /// 反预乘导出为直通 RGBA8 缓冲。
    pub fn to_rgba8(&self) -> RgbaImage {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        // 长度恒为 w*h*4，from_raw 不会失败；保险起见仍给出兜底。
        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), out)
            .unwrap_or_else(|| RgbaImage::new(self.pixmap.width(), self.pixmap.height()))
    }
}
