//! 新闻情绪打分服务
//!
//! 基于固定关键词表的规则打分，纯函数、无 I/O；
//! 只用于数据源未自带情绪标签的新闻

use regex::Regex;

use crate::models::{Sentiment, SentimentLabel};

/// 正面关键词表
const POSITIVE_WORDS: [&str; 21] = [
    "good", "great", "excellent", "positive", "bullish", "strong", "growth",
    "profit", "gain", "increase", "high", "up", "rise", "surge", "boom",
    "success", "achieve", "beat", "exceed", "outperform", "robust",
];

/// 负面关键词表
const NEGATIVE_WORDS: [&str; 21] = [
    "bad", "terrible", "negative", "bearish", "weak", "decline", "loss",
    "fall", "drop", "down", "crash", "plunge", "fail", "miss", "underperform",
    "concern", "worry", "risk", "threat", "challenge", "struggle",
];

/// 情绪打分服务
pub struct SentimentAnalyzer {
    splitter: Regex,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            // 按连续空白切词
            splitter: Regex::new(r"\s+").expect("空白切词正则不合法"),
        }
    }

    /// 对一段文本打情绪分
    ///
    /// score = (正面词数 - 负面词数) / (正面词数 + 负面词数)，
    /// 无命中词时为 0；score > 0.1 判正面，< -0.1 判负面，其余中性
    pub fn analyze(&self, text: &str) -> Sentiment {
        let lowered = text.to_lowercase();
        let mut positive = 0i32;
        let mut negative = 0i32;

        for word in self.splitter.split(&lowered) {
            if POSITIVE_WORDS.contains(&word) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&word) {
                negative += 1;
            }
        }

        let total = positive + negative;
        if total == 0 {
            return Sentiment {
                sentiment: SentimentLabel::Neutral,
                score: 0.0,
            };
        }

        let score = f64::from(positive - negative) / f64::from(total);
        let sentiment = if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        Sentiment { sentiment, score }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== 测试模块 ====================
