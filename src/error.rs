//! 统一错误类型。
//!
//! 错误只会出现在后端的构造阶段：任何一个工厂函数内部出错，
//! 对外都退化为一个空的 [`crate::ImageBundle`]，查询阶段不再失败。

use thiserror::Error;

/// 位图束构造错误
#[derive(Error, Debug)]
pub enum BundleError {
    /// SVG 解析错误
    #[error("SVG 解析失败: {0}")]
    SvgParse(String),

    /// 位图解码错误
    #[error("位图解码失败: {0}")]
    Decode(String),

    /// 输入为空（没有任何有效的候选位图）
    #[error("输入为空: 没有任何有效的候选位图")]
    EmptySource,

    /// 命名约定探测没有命中任何尺寸变体
    #[error("命名约定探测失败: '{0}' 没有解析到任何尺寸变体")]
    NoResolvedVariant(String),

    /// 栅格化 / 像素缓冲分配错误
    #[error("栅格化失败: {0}")]
    Raster(String),
}

impl From<image::ImageError> for BundleError {
    fn from(err: image::ImageError) -> Self {
        BundleError::Decode(err.to_string())
    }
}
