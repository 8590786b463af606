use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 众所周知的密钥环境变量，在配置文件之上覆盖对应字段
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const NEWS_API_KEY_VAR: &str = "NEWS_API_KEY";
pub const MANDI_API_KEY_VAR: &str = "MANDI_API_KEY";

/// 主配置结构体
///
/// 包含农业网关服务的所有配置信息，从配置文件和环境变量加载。
/// 所有小节都有默认值：没有任何配置文件和密钥时进程仍能启动，
/// 缺失的密钥推迟到具体请求时才报错。
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 生成类请求使用的提供商选择
    #[serde(default)]
    pub chat: ChatConfig,
    /// AI提供商配置
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// 新闻数据源配置
    #[serde(default)]
    pub news: NewsSettings,
    /// 市场行情数据源配置
    #[serde(default)]
    pub market: MarketSettings,
    /// 安全配置（可选，有默认值）
    #[serde(default)]
    pub security: SecurityConfig,
    /// 日志配置（可选，有默认值）
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size_bytes: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChatConfig {
    /// "openai" 或 "gemini"，部署时固定选择一个
    #[serde(default = "default_chat_provider")]
    pub provider: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderSettings,
    #[serde(default)]
    pub gemini: ProviderSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProviderSettings {
    /// 可以为空：启动时不校验，请求时缺失返回 ConfigurationMissing
    #[serde(default)]
    pub api_key: String,
    /// 不填时使用各提供商模块内置的默认地址
    #[serde(default)]
    pub api_base: Option<String>,
    /// 不填时使用各提供商模块内置的默认模型
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewsSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_news_page_size")]
    pub page_size: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MarketSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
    /// data.gov.in 上当日市场行情数据集的资源ID
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default = "default_market_limit")]
    pub limit: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SecurityConfig {
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_request_size() -> usize { 4 * 1024 * 1024 } // 4MB，诊断请求携带base64图片
fn default_chat_provider() -> String { "gemini".to_string() }
fn default_provider_timeout() -> u64 { 60 }
fn default_news_page_size() -> u32 { 5 }
fn default_market_limit() -> u32 { 20 }
fn default_cors_enabled() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_request_size_bytes: default_max_request_size(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_chat_provider(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: None,
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            page_size: default_news_page_size(),
        }
    }
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            resource_id: None,
            limit: default_market_limit(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_enabled: default_cors_enabled(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
            providers: ProvidersConfig::default(),
            news: NewsSettings::default(),
            market: MarketSettings::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// 加载配置文件和环境变量
///
/// ## 功能说明
/// 从指定的TOML文件和环境变量（前缀KISAN_）加载配置，环境变量会覆盖配置
/// 文件中的相同设置；最后把四个众所周知的密钥环境变量覆盖到对应字段上
///
/// ## 内部实现逻辑
/// 1. 使用Figment库创建配置加载器
/// 2. 首先加载TOML文件中的配置（文件不存在时视为空配置）
/// 3. 然后加载以KISAN_开头的环境变量，双下划线映射嵌套字段（如KISAN_SERVER__PORT）
/// 4. 将配置反序列化为Config结构体
/// 5. 应用OPENAI_API_KEY等密钥环境变量覆盖
/// 6. 调用validate()方法验证配置的有效性
///
/// ## 执行例子
/// ```rust,no_run
/// use kisan_gateway::config::load_config;
/// let config = load_config("config.toml".as_ref())?;
/// println!("Server will run on {}:{}", config.server.host, config.server.port);
/// # anyhow::Ok(())
/// ```
///
/// ## 错误处理
/// - 配置文件格式错误时返回解析错误
/// - 配置验证失败时返回验证错误
pub fn load_config(path: &Path) -> Result<Config> {
    // 创建配置加载器，按优先级合并配置源
    let mut config: Config = Figment::new()
        .merge(Toml::file(path)) // 基础配置文件
        .merge(Env::prefixed("KISAN_").split("__")) // 环境变量覆盖
        .extract()
        .context("Failed to load configuration from config file or environment variables")?;

    // 密钥通过专用环境变量注入，空值视为未设置
    config.apply_secret_overrides(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));

    // 验证加载的配置是否有效
    config.validate().context("Configuration validation failed")?;

    Ok(config)
}

impl Config {
    /// 应用密钥环境变量覆盖
    ///
    /// ## 功能说明
    /// 把部署环境中约定俗成的四个密钥变量覆盖到配置的对应字段上，
    /// 让密钥可以完全不出现在配置文件里
    ///
    /// ## 内部实现逻辑
    /// 1. 通过注入的lookup函数逐个查询密钥变量
    /// 2. 查到的值覆盖配置中的api_key字段
    /// 3. 查不到时保留配置文件中的原值
    ///
    /// ## 执行例子
    /// ```rust
    /// use kisan_gateway::config::Config;
    /// let mut config = Config::default();
    /// config.apply_secret_overrides(|name| match name {
    ///     "OPENAI_API_KEY" => Some("sk-test".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.providers.openai.api_key, "sk-test");
    /// ```
    pub fn apply_secret_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(OPENAI_API_KEY_VAR) {
            self.providers.openai.api_key = key;
        }
        if let Some(key) = lookup(GEMINI_API_KEY_VAR) {
            self.providers.gemini.api_key = key;
        }
        if let Some(key) = lookup(NEWS_API_KEY_VAR) {
            self.news.api_key = key;
        }
        if let Some(key) = lookup(MANDI_API_KEY_VAR) {
            self.market.api_key = key;
        }
    }

    /// 验证整个配置的有效性
    ///
    /// ## 功能说明
    /// 对配置对象的所有子配置进行全面验证，确保配置参数的合法性和一致性。
    /// 注意：各数据源的api_key不在此验证，密钥缺失属于请求时错误
    ///
    /// ## 内部实现逻辑
    /// 1. 验证服务器配置（主机、端口、超时等）
    /// 2. 验证提供商选择和各提供商的结构性配置
    /// 3. 验证新闻与市场数据源配置
    /// 4. 验证安全配置的有效性
    /// 5. 验证日志配置的有效性
    ///
    /// ## 返回值
    /// - `Ok(())`: 配置验证通过
    /// - `Err(anyhow::Error)`: 配置验证失败，包含详细错误信息
    pub fn validate(&self) -> Result<()> {
        // 验证服务器配置
        self.server
            .validate()
            .context("Server configuration validation failed")?;

        // 验证提供商选择
        self.chat
            .validate()
            .context("Chat configuration validation failed")?;

        // 逐个验证提供商配置
        self.providers
            .openai
            .validate()
            .context("Provider 'openai' configuration validation failed")?;
        self.providers
            .gemini
            .validate()
            .context("Provider 'gemini' configuration validation failed")?;

        // 验证数据源配置
        self.news
            .validate()
            .context("News configuration validation failed")?;
        self.market
            .validate()
            .context("Market configuration validation failed")?;

        // 验证安全配置
        self.security
            .validate()
            .context("Security configuration validation failed")?;

        // 验证日志配置
        self.logging
            .validate()
            .context("Logging configuration validation failed")?;

        Ok(())
    }
}

impl ServerConfig {
    /// 验证服务器配置参数
    ///
    /// ## 功能说明
    /// 验证HTTP服务器相关配置的有效性，包括主机地址、端口、超时时间和请求大小限制
    ///
    /// ## 参数验证规则
    /// - `host`: 不能为空字符串
    /// - `port`: 必须大于0
    /// - `request_timeout_seconds`: 1-300秒之间
    /// - `max_request_size_bytes`: 1字节-100MB之间
    pub fn validate(&self) -> Result<()> {
        // 验证主机地址
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        // 验证端口范围
        if self.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        // 验证超时时间范围
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }
        if self.request_timeout_seconds > 300 {
            return Err(anyhow::anyhow!("Request timeout cannot exceed 300 seconds"));
        }

        // 验证最大请求大小范围（100MB上限）
        if self.max_request_size_bytes == 0 {
            return Err(anyhow::anyhow!("Max request size must be greater than 0"));
        }
        if self.max_request_size_bytes > 100 * 1024 * 1024 {
            return Err(anyhow::anyhow!("Max request size cannot exceed 100MB"));
        }

        Ok(())
    }
}

impl ChatConfig {
    /// 验证提供商选择
    ///
    /// ## 参数验证规则
    /// - `provider`: 必须是 "openai" 或 "gemini" 之一
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["openai", "gemini"];
        if !valid_providers.contains(&self.provider.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid chat provider '{}': must be one of {:?}",
                self.provider,
                valid_providers
            ));
        }

        Ok(())
    }
}

impl ProviderSettings {
    /// 验证AI提供商配置参数
    ///
    /// ## 功能说明
    /// 验证单个AI提供商的结构性配置。api_key故意不在此验证：
    /// 服务必须在密钥缺失时照常启动，对应请求返回配置缺失错误
    ///
    /// ## 参数验证规则
    /// - `api_base`: 如果提供，必须以http://或https://开头
    /// - `model`: 如果提供，不能为空字符串
    /// - `timeout_seconds`: 1-600秒之间
    pub fn validate(&self) -> Result<()> {
        // 验证API基础URL协议
        if let Some(api_base) = &self.api_base {
            if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "Provider API base URL must start with http:// or https://"
                ));
            }
        }

        // 验证模型名称
        if let Some(model) = &self.model {
            if model.is_empty() {
                return Err(anyhow::anyhow!("Provider model name cannot be empty"));
            }
        }

        // 验证超时时间范围（10分钟上限）
        if self.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Provider timeout must be greater than 0"));
        }
        if self.timeout_seconds > 600 {
            return Err(anyhow::anyhow!("Provider timeout cannot exceed 600 seconds"));
        }

        Ok(())
    }
}

impl NewsSettings {
    /// 验证新闻数据源配置
    pub fn validate(&self) -> Result<()> {
        if let Some(api_base) = &self.api_base {
            if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "News API base URL must start with http:// or https://"
                ));
            }
        }

        if self.page_size == 0 || self.page_size > 100 {
            return Err(anyhow::anyhow!("News page size must be between 1 and 100"));
        }

        Ok(())
    }
}

impl MarketSettings {
    /// 验证市场行情数据源配置
    pub fn validate(&self) -> Result<()> {
        if let Some(api_base) = &self.api_base {
            if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "Market API base URL must start with http:// or https://"
                ));
            }
        }

        if let Some(resource_id) = &self.resource_id {
            if resource_id.is_empty() {
                return Err(anyhow::anyhow!("Market resource ID cannot be empty"));
            }
        }

        if self.limit == 0 || self.limit > 100 {
            return Err(anyhow::anyhow!("Market record limit must be between 1 and 100"));
        }

        Ok(())
    }
}

impl SecurityConfig {
    /// 验证安全配置参数
    ///
    /// ## 参数验证规则
    /// - `allowed_origins`: 如果CORS启用，源地址必须是"*"或有效的URL
    pub fn validate(&self) -> Result<()> {
        // 验证CORS允许的源地址（如果CORS启用）
        if self.cors_enabled && !self.allowed_origins.is_empty() {
            for origin in &self.allowed_origins {
                // 检查源地址不能为空
                if origin.is_empty() {
                    return Err(anyhow::anyhow!("Allowed origin cannot be empty"));
                }

                // 检查源地址格式（必须是通配符或有效URL）
                if origin != "*" && !origin.starts_with("http://") && !origin.starts_with("https://")
                {
                    return Err(anyhow::anyhow!(
                        "Allowed origin '{}' must be '*' or start with http:// or https://",
                        origin
                    ));
                }
            }
        }

        Ok(())
    }
}

impl LoggingConfig {
    /// 验证日志配置参数
    ///
    /// ## 参数验证规则
    /// - `level`: 必须是 "trace", "debug", "info", "warn", "error" 之一
    /// - `format`: 必须是 "json", "pretty", "compact" 之一
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}': must be one of {:?}",
                self.level,
                valid_levels
            ));
        }

        // 验证日志格式
        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}': must be one of {:?}",
                self.format,
                valid_formats
            ));
        }

        Ok(())
    }
}
