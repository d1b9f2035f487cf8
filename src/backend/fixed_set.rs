//! 固定候选集后端：在一组不同尺寸的预渲染位图中选优，必要时重采样。

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::backend::BundleBackend;
use crate::bitmap::Bitmap;
use crate::error::BundleError;
use crate::geom::SizePx;
use crate::raster::RasterQuality;

/// 重采样结果的 LRU 容量。
///
/// 同一个束通常只会被少数几个倍率反复查询（显示器数量级），
/// 16 足以覆盖并同时限制内存占用。
const RESCALE_CACHE_SIZE: usize = 16;

/// 一个具体尺寸的候选位图。
#[derive(Debug, Clone)]
struct Candidate {
    size: SizePx,
    bitmap: Bitmap,
}

/// 持有有限、不可变候选集的后端。
///
/// 候选按宽度升序存放，构造完成后不增不删；唯一的内部可变状态是
/// 重采样结果缓存。重采样是否记忆化由实现自行取舍，本库选择
/// 有界 LRU 记忆化，容量见 `RESCALE_CACHE_SIZE`。
pub struct FixedSetBackend {
    /// 按宽度升序排列的候选
    candidates: Vec<Candidate>,
    /// 基准（1.0 倍率）尺寸
    default_size: SizePx,
    quality: RasterQuality,
    /// 重采样结果缓存，键为请求尺寸
    rescaled: Mutex<LruCache<SizePx, Bitmap>>,
}

impl FixedSetBackend {
    /// 从位图列表构造。
    ///
    /// 同尺寸条目去重，后写的覆盖先写的（文档化策略：后者生效）；
    /// 列表为空时构造失败。基准尺寸取最小宽度候选。
    pub fn new(bitmaps: Vec<Bitmap>) -> Result<Self, BundleError> {
        let candidates = dedup_and_sort(bitmaps);
        let default_size = match candidates.first() {
            Some(c) => c.size,
            None => return Err(BundleError::EmptySource),
        };
        Ok(Self::assemble(candidates, default_size))
    }

    /// 指定基准尺寸构造（命名约定路径使用：基准尺寸由最低倍率变体换算而来，
    /// 未必与任何候选的原生尺寸一致）。
    pub fn with_default_size(
        bitmaps: Vec<Bitmap>,
        default_size: SizePx,
    ) -> Result<Self, BundleError> {
        if !default_size.is_valid() {
            return Err(BundleError::EmptySource);
        }
        let candidates = dedup_and_sort(bitmaps);
        if candidates.is_empty() {
            return Err(BundleError::EmptySource);
        }
        Ok(Self::assemble(candidates, default_size))
    }

    /// 设置栅格化质量档位（默认 [`RasterQuality::Quality`]）。
    pub fn with_quality(mut self, quality: RasterQuality) -> Self {
        self.quality = quality;
        self
    }

    fn assemble(candidates: Vec<Candidate>, default_size: SizePx) -> Self {
        Self {
            candidates,
            default_size,
            quality: RasterQuality::default(),
            rescaled: Mutex::new(LruCache::new(
                NonZeroUsize::new(RESCALE_CACHE_SIZE).unwrap(),
            )),
        }
    }

    /// 候选数量。
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// 宽度选优：在宽度不小于请求值的候选里取最小者（自上逼近）；
    /// 都不够宽则退回最大的候选。缩小大图比放大小图保真，所以向大取。
    fn select(&self, size: SizePx) -> &Candidate {
        match self
            .candidates
            .iter()
            .find(|c| c.size.width >= size.width)
        {
            Some(c) => c,
            // 构造时保证候选非空
            None => &self.candidates[self.candidates.len() - 1],
        }
    }
}

impl BundleBackend for FixedSetBackend {
    fn default_size(&self) -> SizePx {
        self.default_size
    }

    fn bitmap(&self, size: SizePx) -> Bitmap {
        // 尺寸完全相等: 原样返回，零重采样开销
        if let Some(c) = self.candidates.iter().find(|c| c.size == size) {
            return c.bitmap.clone();
        }

        if let Some(hit) = self.rescaled.lock().ok().and_then(|mut cache| {
            cache.get(&size).cloned()
        }) {
            tracing::trace!("重采样缓存命中: {size}");
            return hit;
        }

        let chosen = self.select(size);
        match chosen.bitmap.resampled_to(size, self.quality.filter_type()) {
            Ok(bitmap) => {
                if let Ok(mut cache) = self.rescaled.lock() {
                    cache.put(size, bitmap.clone());
                }
                bitmap
            }
            Err(e) => {
                // 降级路径: 分配被拒时返回未缩放的选中候选，尺寸不符但内容正确
                tracing::error!("重采样 {} -> {size} 失败: {e}", chosen.size);
                chosen.bitmap.clone()
            }
        }
    }
}

/// 同尺寸去重（后写覆盖先写）并按宽度、宽度相同按高度升序排列。
fn dedup_and_sort(bitmaps: Vec<Bitmap>) -> Vec<Candidate> {
    let mut by_size: HashMap<SizePx, Bitmap> = HashMap::with_capacity(bitmaps.len());
    for bitmap in bitmaps {
        by_size.insert(bitmap.size(), bitmap);
    }
    let mut candidates: Vec<Candidate> = by_size
        .into_iter()
        .map(|(size, bitmap)| Candidate { size, bitmap })
        .collect();
    candidates.sort_by_key(|c| (c.size.width, c.size.height));
    candidates
}
