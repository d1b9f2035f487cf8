//! 栅格化质量档位与共享的 usvg 选项 / 字体库。

use std::sync::Arc;

use image::imageops::FilterType;
use once_cell::sync::OnceCell;
use resvg::usvg::{self, fontdb};

/// 全局字体数据库单例（首次使用时加载系统字体）。
static GLOBAL_FONT_DB: OnceCell<Arc<fontdb::Database>> = OnceCell::new();

/// 获取全局字体数据库。
///
/// SVG 文档里的文本节点需要可用字体才能正确成形；字体库加载较慢，
/// 进程内只做一次并在所有矢量后端间共享。
pub fn global_font_db() -> Arc<fontdb::Database> {
    GLOBAL_FONT_DB
        .get_or_init(|| {
            let mut font_db = fontdb::Database::new();
            font_db.load_system_fonts();
            tracing::debug!("字体数据库初始化完成, 共 {} 个字面", font_db.len());
            Arc::new(font_db)
        })
        .clone()
}

/// 栅格化质量档位。
///
/// `Quality` 偏向输出质量（Lanczos3 重采样、几何精度优先），
/// `Speed` 偏向吞吐（Triangle 重采样、速度优先）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterQuality {
    /// 质量优先（默认）
    #[default]
    Quality,
    /// 速度优先
    Speed,
}

impl RasterQuality {
    /// 位图重采样使用的滤波器。
    pub fn filter_type(self) -> FilterType {
        match self {
            RasterQuality::Quality => FilterType::Lanczos3,
            RasterQuality::Speed => FilterType::Triangle,
        }
    }

    /// SVG 形状渲染模式。
    pub(crate) fn shape_rendering(self) -> usvg::ShapeRendering {
        match self {
            RasterQuality::Quality => usvg::ShapeRendering::GeometricPrecision,
            RasterQuality::Speed => usvg::ShapeRendering::OptimizeSpeed,
        }
    }

    /// SVG 文本渲染模式。
    pub(crate) fn text_rendering(self) -> usvg::TextRendering {
        match self {
            RasterQuality::Quality => usvg::TextRendering::OptimizeLegibility,
            RasterQuality::Speed => usvg::TextRendering::OptimizeSpeed,
        }
    }

    /// SVG 内嵌图片渲染模式。
    pub(crate) fn image_rendering(self) -> usvg::ImageRendering {
        match self {
            RasterQuality::Quality => usvg::ImageRendering::OptimizeQuality,
            RasterQuality::Speed => usvg::ImageRendering::OptimizeSpeed,
        }
    }
}
