//! 按倍率后缀命名约定发现兄弟资源。
//!
//! 约定形如 `icon.png` / `icon@2x.png` / `icon_2x.png`：同一基名下，
//! 每个倍率后缀对应一张以该倍率预渲染的位图。探测在构造期一次完成，
//! 结果归并为一个 [`FixedSetBackend`]，此后不再保留任何发现期状态。

use std::path::{Path, PathBuf};

use crate::backend::FixedSetBackend;
use crate::bitmap::Bitmap;
use crate::error::BundleError;
use crate::raster::RasterQuality;

/// 探测使用的固定倍率序列，升序，覆盖常见显示倍率。
pub const SCALE_SEQUENCE: &[f64] = &[1.0, 1.25, 1.5, 2.0, 3.0, 4.0];

/// 资源解析收口：给定基标识与倍率，定位并加载对应变体。
///
/// "没有该变体"用 `None` 表达，永远不是错误；实现方自行决定
/// 基标识的含义（文件路径、内嵌资源表键等）。
pub trait ResourceResolver {
    /// 加载 `base` 在 `scale` 倍率下的变体；不存在则返回 `None`。
    fn load_variant(&self, base: &str, scale: f64) -> Option<Bitmap>;
}

/// 基于文件系统的内置解析器。
///
/// `base` 是含扩展名的路径（如 `icons/save.png`）；1.0 倍率探测
/// 路径本身，其余倍率探测 `save@2x.png` 与 `save_2x.png` 两种
/// 后缀拼法，命中的文件用 image crate 解码。
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResolver;

impl ResourceResolver for FileResolver {
    fn load_variant(&self, base: &str, scale: f64) -> Option<Bitmap> {
        for path in candidate_paths(Path::new(base), scale) {
            if !path.is_file() {
                continue;
            }
            match Bitmap::decode_path(&path) {
                Ok(bitmap) => {
                    tracing::debug!("命名约定命中: {} ({scale}x)", path.display());
                    return Some(bitmap);
                }
                Err(e) => {
                    // 文件存在但解码失败按未命中处理，继续探测其它拼法
                    tracing::warn!("变体解码失败 '{}': {e}", path.display());
                }
            }
        }
        None
    }
}

/// 给定倍率下所有待探测的路径拼法。
fn candidate_paths(base: &Path, scale: f64) -> Vec<PathBuf> {
    if scale == 1.0 {
        return vec![base.to_path_buf()];
    }

    let stem = match base.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s,
        None => return Vec::new(),
    };
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("png");

    // 2.0 -> "2"; 1.5 -> "1.5"
    let compact = if scale.fract() == 0.0 {
        format!("{}", scale as u32)
    } else {
        format!("{scale}")
    };
    let at_form = format!("{stem}@{compact}x.{ext}");
    let underscore_form = format!("{stem}_{}x.{ext}", compact.replace('.', "_"));

    [at_form, underscore_form]
        .into_iter()
        .map(|name| base.with_file_name(name))
        .collect()
}

/// 沿固定倍率序列探测并归并为一个固定候选集后端。
///
/// 零命中即构造失败；单一命中也构成合法（退化的单候选）后端。
/// 基准尺寸 = 最低命中倍率变体的原生尺寸除以该倍率，保证只发现
/// 高倍率变体时仍报告 1.0 倍率下的逻辑尺寸。
pub(crate) fn resolve_scaled_set(
    base: &str,
    resolver: &dyn ResourceResolver,
    quality: RasterQuality,
) -> Result<FixedSetBackend, BundleError> {
    let mut variants: Vec<(f64, Bitmap)> = Vec::new();
    for &scale in SCALE_SEQUENCE {
        if let Some(bitmap) = resolver.load_variant(base, scale) {
            variants.push((scale, bitmap));
        }
    }

    let (lowest_scale, lowest) = match variants.first() {
        Some((s, b)) => (*s, b),
        None => return Err(BundleError::NoResolvedVariant(base.to_string())),
    };
    let default_size = lowest.size().scaled_by(1.0 / lowest_scale);

    let bitmaps = variants.iter().map(|(_, b)| b.clone()).collect();
    Ok(FixedSetBackend::with_default_size(bitmaps, default_size)?.with_quality(quality))
}
