use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum QuizError {
    /// 浏览器渲染与 HTTP 兜底都失败
    #[error("页面抓取失败 ({url}): {message}")]
    Fetch { url: String, message: String },

    /// LLM 输出无法恢复为计划 JSON
    #[error("无法解析 LLM 返回的计划: {0}")]
    PlanParse(String),

    /// LLM 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyModelResponse { model: String },

    /// LLM API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {message}")]
    Llm { model: String, message: String },

    /// 单个数据源下载或解析失败
    #[error("数据获取失败 ({url}): {message}")]
    Acquisition { url: String, message: String },

    /// 图表生成失败
    #[error("图表生成失败: {0}")]
    Chart(String),

    /// 答案提交失败（非 200 或网络错误）
    #[error("答案提交失败 ({endpoint}), 状态码: {status:?}: {message}")]
    Submission {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// 密钥校验失败
    #[error("Invalid secret")]
    Auth,

    /// 请求校验失败
    #[error("{0}")]
    Validation(String),

    /// 任务队列已满
    #[error("任务队列已满，请稍后重试")]
    Busy,

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// HTTP 客户端无法创建
    #[error("无法创建 HTTP 客户端: {0}")]
    HttpClient(String),

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填项缺失
    #[error("缺少必要配置: {var_name}")]
    Missing { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },

    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 读取失败: {message}")]
    File { path: String, message: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for QuizError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        QuizError::Browser(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl QuizError {
    /// 创建页面抓取错误
    pub fn fetch_failed(url: impl Into<String>, message: impl ToString) -> Self {
        QuizError::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// 创建数据获取错误
    pub fn acquisition_failed(url: impl Into<String>, message: impl ToString) -> Self {
        QuizError::Acquisition {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, message: impl ToString) -> Self {
        QuizError::Llm {
            model: model.into(),
            message: message.to_string(),
        }
    }

    /// 创建提交失败错误
    pub fn submission_failed(
        endpoint: impl Into<String>,
        status: Option<u16>,
        message: impl ToString,
    ) -> Self {
        QuizError::Submission {
            endpoint: endpoint.into(),
            status,
            message: message.to_string(),
        }
    }
}

/// 接收端只对派发前的同步错误做出响应
impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = match &self {
            QuizError::Auth => StatusCode::FORBIDDEN,
            QuizError::Validation(_) => StatusCode::BAD_REQUEST,
            QuizError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, QuizError>;
