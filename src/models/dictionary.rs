use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 词典来源枚举
///
/// 封闭集合：每个变体对应一个在线词典，标识字符串同时用作数据目录名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dictionary {
    /// 柯林斯
    Collins,
    /// 韦氏
    Webster,
    /// 海词
    Dictcn,
    /// 必应词典
    BingDict,
}

impl Dictionary {
    /// 全部词典（按声明顺序）
    pub const ALL: [Dictionary; 4] = [
        Dictionary::Collins,
        Dictionary::Webster,
        Dictionary::Dictcn,
        Dictionary::BingDict,
    ];

    /// 获取稳定标识（配置与目录名使用）
    pub fn id(self) -> &'static str {
        match self {
            Dictionary::Collins => "collins",
            Dictionary::Webster => "webster",
            Dictionary::Dictcn => "dictcn",
            Dictionary::BingDict => "bingdict",
        }
    }

    /// 获取显示名称
    pub fn name(self) -> &'static str {
        match self {
            Dictionary::Collins => "Collins",
            Dictionary::Webster => "Merriam-Webster",
            Dictionary::Dictcn => "海词",
            Dictionary::BingDict => "必应词典",
        }
    }

    /// 合并输出时的优先级分数，越小越靠前
    pub fn priority(self) -> u8 {
        match self {
            Dictionary::Collins => 0,
            Dictionary::Webster => 1,
            Dictionary::Dictcn => 2,
            Dictionary::BingDict => 3,
        }
    }

    /// 按优先级排序并去重
    ///
    /// # 参数
    /// - `dicts`: 配置中的词典列表（任意顺序，可能重复）
    ///
    /// # 返回
    /// 返回按优先级排列、无重复的词典列表
    pub fn ordered(dicts: &[Dictionary]) -> Vec<Dictionary> {
        let mut ordered = dicts.to_vec();
        ordered.sort_by_key(|d| d.priority());
        ordered.dedup();
        ordered
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 未知的词典标识
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("不支持的词典: '{0}'（支持: collins, webster, dictcn, bingdict）")]
pub struct UnknownDictionary(pub String);

impl FromStr for Dictionary {
    type Err = UnknownDictionary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Dictionary::ALL
            .into_iter()
            .find(|d| d.id() == normalized)
            .ok_or_else(|| UnknownDictionary(s.trim().to_string()))
    }
}
