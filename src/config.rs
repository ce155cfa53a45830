use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
///
/// 进程启动时构建一次，之后以 `&Config` / `Arc<Config>` 传给各组件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 提交身份 ---
    /// 提交答案使用的邮箱
    pub email: String,
    /// 接收端校验 / 提交时携带的密钥
    pub secret: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次回复的 token 上限
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    // --- 接收端 ---
    pub bind_addr: String,
    /// 同时运行的解题链数量
    pub max_concurrent_chains: usize,
    /// 等待派发的任务队列长度
    pub chain_queue_capacity: usize,
    // --- 解题链限制 ---
    pub max_steps: u32,
    pub time_budget_secs: u64,
    // --- 抓取 ---
    pub navigation_timeout_secs: u64,
    /// 页面加载后等待动态内容的时间
    pub settle_delay_ms: u64,
    pub http_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    /// 浏览器可执行文件路径，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    // --- 提示词截断 ---
    pub page_content_limit: usize,
    pub data_preview_chars: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: String::new(),
            secret: String::new(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            llm_max_tokens: 8192,
            llm_timeout_secs: 120,
            bind_addr: "0.0.0.0:5000".to_string(),
            max_concurrent_chains: 8,
            chain_queue_capacity: 64,
            max_steps: 20,
            time_budget_secs: 170,
            navigation_timeout_secs: 30,
            settle_delay_ms: 2000,
            http_timeout_secs: 30,
            submit_timeout_secs: 30,
            chrome_executable: None,
            page_content_limit: 8000,
            data_preview_chars: 12000,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件，所有字段可选，只覆盖出现的项
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    email: Option<String>,
    secret: Option<String>,
    llm_api_key: Option<String>,
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    llm_max_tokens: Option<u32>,
    llm_timeout_secs: Option<u64>,
    bind_addr: Option<String>,
    max_concurrent_chains: Option<usize>,
    chain_queue_capacity: Option<usize>,
    max_steps: Option<u32>,
    time_budget_secs: Option<u64>,
    navigation_timeout_secs: Option<u64>,
    settle_delay_ms: Option<u64>,
    http_timeout_secs: Option<u64>,
    submit_timeout_secs: Option<u64>,
    chrome_executable: Option<String>,
    page_content_limit: Option<usize>,
    data_preview_chars: Option<usize>,
    verbose_logging: Option<bool>,
}

macro_rules! overlay {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $source.$field {
                $target.$field = value;
            }
        )+
    };
}

impl Config {
    /// 按 默认值 → .env → TOML 文件 → 环境变量 的顺序加载并校验
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(path) = std::env::var("QUIZ_CONFIG_FILE") {
            config.merge_toml_file(Path::new(&path))?;
        }
        config.merge_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 读取 TOML 文件并覆盖对应字段
    pub fn merge_toml_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.merge_toml_str(&content).map_err(|e| match e {
            ConfigError::File { message, .. } => ConfigError::File {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// 用 TOML 文本覆盖对应字段
    pub fn merge_toml_str(&mut self, content: &str) -> Result<(), ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|e| ConfigError::File {
            path: String::new(),
            message: e.to_string(),
        })?;

        overlay!(
            self,
            file,
            email,
            secret,
            llm_api_key,
            llm_api_base_url,
            llm_model_name,
            llm_max_tokens,
            llm_timeout_secs,
            bind_addr,
            max_concurrent_chains,
            chain_queue_capacity,
            max_steps,
            time_budget_secs,
            navigation_timeout_secs,
            settle_delay_ms,
            http_timeout_secs,
            submit_timeout_secs,
            page_content_limit,
            data_preview_chars,
            verbose_logging,
        );
        if file.chrome_executable.is_some() {
            self.chrome_executable = file.chrome_executable;
        }
        Ok(())
    }

    /// 用环境变量覆盖对应字段
    ///
    /// `lookup` 通常是 `std::env::var`，测试中可以传入固定映射
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = text("EMAIL") {
            self.email = v;
        }
        if let Some(v) = text("SECRET") {
            self.secret = v;
        }
        if let Some(v) = text("AI_INTEGRATIONS_OPENAI_API_KEY") {
            self.llm_api_key = v;
        }
        if let Some(v) = text("AI_INTEGRATIONS_OPENAI_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = text("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Some(v) = text("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = text("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }

        parse_into(&text, "LLM_MAX_TOKENS", "u32", &mut self.llm_max_tokens)?;
        parse_into(&text, "LLM_TIMEOUT_SECS", "u64", &mut self.llm_timeout_secs)?;
        parse_into(&text, "MAX_STEPS", "u32", &mut self.max_steps)?;
        parse_into(&text, "TIME_BUDGET_SECS", "u64", &mut self.time_budget_secs)?;
        parse_into(
            &text,
            "NAVIGATION_TIMEOUT_SECS",
            "u64",
            &mut self.navigation_timeout_secs,
        )?;
        parse_into(&text, "SETTLE_DELAY_MS", "u64", &mut self.settle_delay_ms)?;
        parse_into(&text, "HTTP_TIMEOUT_SECS", "u64", &mut self.http_timeout_secs)?;
        parse_into(&text, "SUBMIT_TIMEOUT_SECS", "u64", &mut self.submit_timeout_secs)?;
        parse_into(&text, "PAGE_CONTENT_LIMIT", "usize", &mut self.page_content_limit)?;
        parse_into(&text, "DATA_PREVIEW_CHARS", "usize", &mut self.data_preview_chars)?;
        parse_into(
            &text,
            "MAX_CONCURRENT_CHAINS",
            "usize",
            &mut self.max_concurrent_chains,
        )?;
        parse_into(
            &text,
            "CHAIN_QUEUE_CAPACITY",
            "usize",
            &mut self.chain_queue_capacity,
        )?;
        parse_into(&text, "VERBOSE_LOGGING", "bool", &mut self.verbose_logging)?;

        Ok(())
    }

    /// 校验必填项与取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("EMAIL", &self.email),
            ("SECRET", &self.secret),
            ("AI_INTEGRATIONS_OPENAI_API_KEY", &self.llm_api_key),
            ("AI_INTEGRATIONS_OPENAI_BASE_URL", &self.llm_api_base_url),
        ];
        for (var_name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing {
                    var_name: var_name.to_string(),
                });
            }
        }

        let positive = [
            ("max_steps", self.max_steps as usize),
            ("max_concurrent_chains", self.max_concurrent_chains),
            ("chain_queue_capacity", self.chain_queue_capacity),
            ("page_content_limit", self.page_content_limit),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "必须大于 0".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn parse_into<T, F>(
    lookup: &F,
    var_name: &str,
    expected_type: &str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(var_name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: raw.clone(),
                expected_type: expected_type.to_string(),
            })?;
    }
    Ok(())
}
