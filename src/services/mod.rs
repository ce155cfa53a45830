//! 业务能力层
//!
//! 每个服务只负责一件事，通过 trait 暴露给流程层，便于在测试中替换

pub mod answer_resolver;
pub mod chart_renderer;
pub mod content_fetcher;
pub mod data_acquirer;
pub mod parsers;
pub mod plan_extractor;

pub use answer_resolver::AnswerResolver;
pub use chart_renderer::{ChartData, ChartKind, ChartRenderer, PlottersChartRenderer};
pub use content_fetcher::{ContentFetcher, PageFetcher};
pub use data_acquirer::{DataAcquirer, DataSource};
pub use plan_extractor::{PlanExtractor, PLAN_SYSTEM_PROMPT};
