//! 公共常量和辅助函数

use chrono::Utc;
use chrono_tz::Asia::Kolkata;
use reqwest::Client;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::errors::{MarketError, MarketResult};
use crate::services::providers::Market;

// ==================== 数据源 API 常量 ====================

/// Alpha Vantage 查询 API
pub const ALPHA_VANTAGE_API: &str = "https://www.alphavantage.co/query";
/// Finnhub API
pub const FINNHUB_API: &str = "https://finnhub.io/api/v1";
/// NSE（印度国家证券交易所）API
pub const NSE_API: &str = "https://www.nseindia.com/api";
/// NSE 站点首页（用于预热会话 Cookie）
pub const NSE_HOME_URL: &str = "https://www.nseindia.com";
/// Yahoo Finance K线 API
pub const YAHOO_CHART_API: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
/// Yahoo Finance 报价 API
pub const YAHOO_QUOTE_API: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
/// Yahoo Finance 搜索 API
pub const YAHOO_SEARCH_API: &str = "https://query1.finance.yahoo.com/v1/finance/search";
/// Twelve Data API
pub const TWELVE_DATA_API: &str = "https://api.twelvedata.com";

/// 浏览器 User-Agent（部分数据源拒绝无 UA 请求）
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 获取印度时间字符串（ISO 8601 格式，带+05:30时区）
pub fn get_ist_time() -> String {
    Utc::now().with_timezone(&Kolkata).to_rfc3339()
}

/// 构建上游 HTTP 客户端，统一设置超时
pub fn build_client(upstream: &UpstreamConfig, cookie_store: bool) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(upstream.timeout_secs))
        .connect_timeout(Duration::from_secs(upstream.connect_timeout_secs))
        .cookie_store(cookie_store)
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// 统一的 JSON GET 请求入口
///
/// 超时、限流、非 2xx 状态都在这里归类为 MarketError，
/// 各适配器只负责字段映射
pub async fn get_json(
    client: &Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> MarketResult<serde_json::Value> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                MarketError::upstream(provider, "请求超时")
            } else {
                MarketError::upstream(provider, e.to_string())
            }
        })?;

    let status = response.status();
    if status.as_u16() == 429 {
        return Err(MarketError::RateLimited(provider));
    }
    if !status.is_success() {
        return Err(MarketError::upstream(provider, format!("HTTP {}", status)));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| MarketError::upstream(provider, format!("响应解析失败: {}", e)))
}

/// 按市场推断计价货币
pub fn currency_for(symbol: &str) -> &'static str {
    match Market::of(symbol) {
        Market::India => "INR",
        Market::Global => "USD",
    }
}

/// 按代码后缀推断交易所
pub fn exchange_for(symbol: &str) -> &'static str {
    if symbol.ends_with(".NS") {
        "NSE"
    } else if symbol.ends_with(".BO") {
        "BSE"
    } else {
        "NASDAQ"
    }
}

/// 按市场推断国家
pub fn country_for(symbol: &str) -> &'static str {
    match Market::of(symbol) {
        Market::India => "India",
        Market::Global => "United States",
    }
}

/// JSON 字段取浮点数，兼容字符串和数字两种形式
pub fn json_f64(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// JSON 字段取整数，兼容字符串和数字两种形式
pub fn json_u64(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// JSON 字段取字符串
pub fn json_str(value: &serde_json::Value) -> String {
    value.as_str().unwrap_or("").to_string()
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试货币/交易所/国家推断
    #[test]
    fn test_symbol_locale_helpers() {
        println!("\n========== 测试代码区域推断 ==========");
        assert_eq!(currency_for("TCS.NS"), "INR");
        assert_eq!(currency_for("AAPL"), "USD");
        assert_eq!(exchange_for("TCS.NS"), "NSE");
        assert_eq!(exchange_for("TATASTEEL.BO"), "BSE");
        assert_eq!(exchange_for("MSFT"), "NASDAQ");
        assert_eq!(country_for("ITC.NS"), "India");
        assert_eq!(country_for("NVDA"), "United States");
        println!("✅ 代码区域推断测试通过！");
    }

    /// 测试 JSON 数值解析（字符串与数字兼容）
    #[test]
    fn test_json_number_parsing() {
        println!("\n========== 测试 JSON 数值解析 ==========");
        let v: serde_json::Value = serde_json::json!({
            "a": "12.5",
            "b": 7.25,
            "c": "1.58%",
            "d": "notanumber",
            "e": "123456",
            "f": 42,
        });

        assert_eq!(json_f64(&v["a"]), 12.5);
        assert_eq!(json_f64(&v["b"]), 7.25);
        assert_eq!(json_f64(&v["c"]), 1.58);
        assert_eq!(json_f64(&v["d"]), 0.0);
        assert_eq!(json_u64(&v["e"]), 123456);
        assert_eq!(json_u64(&v["f"]), 42);
        assert_eq!(json_f64(&v["missing"]), 0.0);
        println!("✅ JSON 数值解析测试通过！");
    }

    /// 测试印度时间格式
    #[test]
    fn test_get_ist_time() {
        let ts = get_ist_time();
        println!("  当前印度时间: {}", ts);
        assert!(ts.contains("+05:30"));
    }
}
