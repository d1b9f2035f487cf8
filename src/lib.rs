//! DPI 感知的位图束。
//!
//! 给定"某个逻辑尺寸 / 缩放倍率下的一张位图"这一请求，从一组候选
//! 表示（已知尺寸的预渲染位图、按需栅格化的 SVG 文档、按命名约定
//! 发现的文件族）中选择或合成最匹配的栅格图。
//!
//! ```no_run
//! use bitmap_bundle::{ImageBundle, SizePx};
//!
//! let bundle = ImageBundle::from_files("icons/save.png");
//! if bundle.is_ok() {
//!     // 200% 缩放的显示器上取首选尺寸的位图
//!     let size = bundle.preferred_size_at_scale(2.0);
//!     let bitmap = bundle.bitmap(size);
//! }
//! ```
//!
//! 构造失败（空输入、零命中、SVG 畸形）一律退化为空束并写一条
//! 警告日志；查询阶段不会失败。束按值克隆，各克隆共享同一个后端。

/// 统一错误处理模块
pub mod error;

/// 像素尺寸与缩放换算模块
pub mod geom;

/// 位图句柄模块
pub mod bitmap;

/// 栅格化质量与共享 usvg 选项模块
pub mod raster;

/// 后端策略模块
pub mod backend;

/// 命名约定资源发现模块
pub mod resolver;

/// 位图束门面模块
pub mod bundle;

// 导出常用类型供外部使用
pub use backend::{BundleBackend, FixedSetBackend, VectorBackend};
pub use bitmap::Bitmap;
pub use bundle::{DpiScaleSource, ImageBundle};
pub use error::BundleError;
pub use geom::SizePx;
pub use raster::RasterQuality;
pub use resolver::{FileResolver, ResourceResolver, SCALE_SEQUENCE};
