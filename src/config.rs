use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::Dictionary;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "word-downloader.toml";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 启用的词典（任意顺序，运行时按优先级排序）
    pub dicts: Vec<Dictionary>,
    /// 单词列表文件，为空时从标准输入读取
    pub word_list: Option<String>,
    /// 数据根目录，每个词典一个子目录
    pub data_dir: String,
    /// 发生网络请求后，处理下一个单词前的等待秒数
    pub sleep_interval_secs: u64,
    /// 缓存未命中时是否在线查询
    pub query_online: bool,
    /// 是否下载音频与图片
    pub download_assets: bool,
    /// 合并结果输出文件（JSON Lines），为空则不输出
    pub export_file: Option<String>,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- HTTP 配置 ---
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dicts: vec![Dictionary::Webster],
            word_list: None,
            data_dir: ".".to_string(),
            sleep_interval_secs: 1,
            query_online: true,
            download_assets: true,
            export_file: None,
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            http_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36".to_string(),
        }
    }
}

/// TOML 配置文件结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    dicts: Option<Vec<String>>,
    word_list: Option<String>,
    data_dir: Option<String>,
    sleep_interval_secs: Option<u64>,
    query_online: Option<bool>,
    download_assets: Option<bool>,
    export_file: Option<String>,
    output_log_file: Option<String>,
    verbose_logging: Option<bool>,
    http_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let explicit = std::env::var("WORD_DOWNLOADER_CONFIG").ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let base = if Path::new(&path).exists() {
            Self::from_toml_file(Path::new(&path))?
        } else if explicit.is_some() {
            return Err(AppError::Config(ConfigError::FileNotFound { path }));
        } else {
            Self::default()
        };

        base.with_env()
    }

    /// 只使用默认值与环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env()
    }

    /// 从 TOML 文件加载，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::Config(ConfigError::TomlParseFailed { source, .. }) => {
                AppError::Config(ConfigError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();

        let dicts = match file.dicts {
            Some(names) => parse_dicts(names.iter().map(String::as_str))?,
            None => default.dicts,
        };

        Ok(Self {
            dicts,
            word_list: file.word_list.or(default.word_list),
            data_dir: file.data_dir.unwrap_or(default.data_dir),
            sleep_interval_secs: file.sleep_interval_secs.unwrap_or(default.sleep_interval_secs),
            query_online: file.query_online.unwrap_or(default.query_online),
            download_assets: file.download_assets.unwrap_or(default.download_assets),
            export_file: file.export_file.or(default.export_file),
            output_log_file: file.output_log_file.unwrap_or(default.output_log_file),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            http_timeout_secs: file.http_timeout_secs.unwrap_or(default.http_timeout_secs),
            user_agent: file.user_agent.unwrap_or(default.user_agent),
        })
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> AppResult<Self> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(self, var: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let dicts = match var("DICTS") {
            Some(list) => parse_dicts(list.split(','))?,
            None => self.dicts,
        };

        Ok(Self {
            dicts,
            word_list: var("WORD_LIST").or(self.word_list),
            data_dir: var("DATA_DIR").unwrap_or(self.data_dir),
            sleep_interval_secs: var("SLEEP_INTERVAL").and_then(|v| v.parse().ok()).unwrap_or(self.sleep_interval_secs),
            query_online: var("QUERY_ONLINE").and_then(|v| v.parse().ok()).unwrap_or(self.query_online),
            download_assets: var("DOWNLOAD_MP3").and_then(|v| v.parse().ok()).unwrap_or(self.download_assets),
            export_file: var("EXPORT_FILE").or(self.export_file),
            output_log_file: var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: var("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            http_timeout_secs: var("HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.http_timeout_secs),
            user_agent: var("USER_AGENT").unwrap_or(self.user_agent),
        })
    }

    /// 词间等待时长
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval_secs)
    }

    /// 词典的数据目录
    pub fn dict_dir(&self, dictionary: Dictionary) -> PathBuf {
        Path::new(&self.data_dir).join(dictionary.id())
    }

    /// 按优先级排列的词典列表
    pub fn ordered_dicts(&self) -> Vec<Dictionary> {
        Dictionary::ordered(&self.dicts)
    }
}

/// 解析逗号分隔的词典列表，跳过空项
fn parse_dicts<'a>(names: impl Iterator<Item = &'a str>) -> AppResult<Vec<Dictionary>> {
    let mut dicts = Vec::new();
    for name in names {
        if name.trim().is_empty() {
            continue;
        }
        let dict = name
            .parse::<Dictionary>()
            .map_err(|e| AppError::Config(ConfigError::UnknownDictionary { name: e.0 }))?;
        dicts.push(dict);
    }
    if dicts.is_empty() {
        return Err(AppError::Config(ConfigError::NoDictionary));
    }
    Ok(dicts)
}
