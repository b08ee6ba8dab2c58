use crate::infrastructure::{AssetError, EntryLogError};
use crate::services::source::LookupError;
use crate::workflow::ResolveError;

/// 应用程序错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 查询日志错误（损坏或无法写入）
    #[error("日志错误: {0}")]
    EntryLog(#[from] EntryLogError),
    /// 资源下载错误
    #[error("资源错误: {0}")]
    Asset(#[from] AssetError),
    /// 词典查询错误
    #[error("查询错误: {0}")]
    Lookup(#[from] LookupError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 文件操作错误
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
    /// 创建目录失败
    #[error("创建目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: String,
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 指定的配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },
    /// 不支持的词典
    #[error("不支持的词典: {name}（支持: collins, webster, dictcn, bingdict）")]
    UnknownDictionary { name: String },
    /// 没有启用任何词典
    #[error("至少需要启用一个词典")]
    NoDictionary,
}

// ========== 从常见错误类型转换 ==========

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: err,
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Transient(e) => AppError::Lookup(e),
            ResolveError::Durability(e) => AppError::EntryLog(e),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建目录错误
    pub fn create_dir_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::CreateDirFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否属于必须中止运行的错误（日志损坏或无法落盘）
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::EntryLog(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
