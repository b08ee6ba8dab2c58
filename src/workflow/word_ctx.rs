//! 单词处理上下文
//!
//! 封装"我正在处理第几个单词、它的拼写是什么"这一信息

use std::fmt::Display;

/// 单词处理上下文
#[derive(Debug, Clone)]
pub struct WordCtx {
    /// 提交的关键词（原始拼写）
    pub keyword: String,

    /// 单词在输入流中的序号（从1开始，仅用于日志显示）
    pub word_index: usize,
}

impl WordCtx {
    /// 创建新的单词上下文
    pub fn new(keyword: impl Into<String>, word_index: usize) -> Self {
        Self {
            keyword: keyword.into(),
            word_index,
        }
    }
}

impl Display for WordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[单词 #{} '{}']", self.word_index, self.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        let ctx = WordCtx::new("kestrel", 3);
        assert_eq!(ctx.to_string(), "[单词 #3 'kestrel']");
    }
}
