//! 内存存储
//!
//! 自选股与持仓的内存仓库，按用户 id 分桶；
//! actix 多线程运行，读写统一走互斥锁

use chrono::Utc;
use chrono_tz::Asia::Kolkata;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{NewPortfolioItem, NewWatchlistItem, PortfolioItem, WatchlistItem};

/// 获取印度时间字符串（ISO 8601 格式，带+05:30时区）
fn get_ist_time() -> String {
    Utc::now().with_timezone(&Kolkata).to_rfc3339()
}

/// 内部存储表
struct StoreInner {
    /// 用户 id -> 自选股列表
    watchlists: HashMap<i64, Vec<WatchlistItem>>,
    /// 用户 id -> 持仓列表
    portfolios: HashMap<i64, Vec<PortfolioItem>>,
    /// 自选股自增 id
    next_watchlist_id: i64,
    /// 持仓自增 id
    next_portfolio_id: i64,
}

/// 内存存储仓库
pub struct MemStorage {
    inner: Mutex<StoreInner>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                watchlists: HashMap::new(),
                portfolios: HashMap::new(),
                next_watchlist_id: 1,
                next_portfolio_id: 1,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ==================== 自选股 ====================

    /// 获取用户自选股列表
    pub fn get_user_watchlist(&self, user_id: i64) -> Vec<WatchlistItem> {
        self.lock()
            .watchlists
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 添加自选股
    pub fn add_to_watchlist(&self, user_id: i64, item: NewWatchlistItem) -> WatchlistItem {
        let mut inner = self.lock();
        let id = inner.next_watchlist_id;
        inner.next_watchlist_id += 1;

        let entry = WatchlistItem {
            id,
            user_id,
            symbol: item.symbol,
            market: item.market,
            added_at: get_ist_time(),
        };
        inner
            .watchlists
            .entry(user_id)
            .or_default()
            .push(entry.clone());
        entry
    }

    /// 按代码移除自选股
    pub fn remove_from_watchlist(&self, user_id: i64, symbol: &str) {
        let mut inner = self.lock();
        if let Some(list) = inner.watchlists.get_mut(&user_id) {
            list.retain(|item| item.symbol != symbol);
        }
    }

    // ==================== 持仓 ====================

    /// 获取用户持仓列表
    pub fn get_user_portfolio(&self, user_id: i64) -> Vec<PortfolioItem> {
        self.lock()
            .portfolios
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 添加持仓
    pub fn add_to_portfolio(&self, user_id: i64, item: NewPortfolioItem) -> PortfolioItem {
        let mut inner = self.lock();
        let id = inner.next_portfolio_id;
        inner.next_portfolio_id += 1;

        let entry = PortfolioItem {
            id,
            user_id,
            symbol: item.symbol,
            quantity: item.quantity,
            avg_price: item.avg_price,
            market: item.market,
            created_at: get_ist_time(),
        };
        inner
            .portfolios
            .entry(user_id)
            .or_default()
            .push(entry.clone());
        entry
    }

    /// 按代码原地更新持仓数量与成本价；代码不存在时不做任何事
    pub fn update_portfolio(&self, user_id: i64, symbol: &str, quantity: f64, avg_price: f64) {
        let mut inner = self.lock();
        if let Some(list) = inner.portfolios.get_mut(&user_id) {
            if let Some(item) = list.iter_mut().find(|p| p.symbol == symbol) {
                item.quantity = quantity;
                item.avg_price = avg_price;
            }
        }
    }

    /// 按代码移除持仓
    pub fn remove_from_portfolio(&self, user_id: i64, symbol: &str) {
        let mut inner = self.lock();
        if let Some(list) = inner.portfolios.get_mut(&user_id) {
            list.retain(|item| item.symbol != symbol);
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== 测试模块 ====================

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试自选股增删查闭环
    #[test]
    fn test_watchlist_round_trip() {
        println!("\n========== 测试自选股闭环 ==========");
        let storage = MemStorage::new();

        let added = storage.add_to_watchlist(
            1,
            NewWatchlistItem {
                symbol: "TCS.NS".to_string(),
                market: "NSE".to_string(),
            },
        );
        assert_eq!(added.id, 1);
        assert_eq!(added.user_id, 1);

        let list = storage.get_user_watchlist(1);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].symbol, "TCS.NS");

        storage.remove_from_watchlist(1, "TCS.NS");
        assert!(storage.get_user_watchlist(1).is_empty());
        println!("✅ 自选股闭环测试通过！");
    }

    /// 测试自选股 id 自增
    #[test]
    fn test_watchlist_id_increments() {
        let storage = MemStorage::new();
        for symbol in ["A", "B", "C"] {
            storage.add_to_watchlist(
                1,
                NewWatchlistItem {
                    symbol: symbol.to_string(),
                    market: "GLOBAL".to_string(),
                },
            );
        }
        let ids: Vec<i64> = storage.get_user_watchlist(1).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// 测试不同用户的数据互相隔离
    #[test]
    fn test_user_isolation() {
        let storage = MemStorage::new();
        storage.add_to_watchlist(
            1,
            NewWatchlistItem {
                symbol: "INFY.NS".to_string(),
                market: "NSE".to_string(),
            },
        );

        assert_eq!(storage.get_user_watchlist(1).len(), 1);
        assert!(storage.get_user_watchlist(2).is_empty());

        storage.remove_from_watchlist(2, "INFY.NS");
        assert_eq!(storage.get_user_watchlist(1).len(), 1);
    }

    /// 测试持仓增改删闭环
    #[test]
    fn test_portfolio_lifecycle() {
        println!("\n========== 测试持仓闭环 ==========");
        let storage = MemStorage::new();

        let added = storage.add_to_portfolio(
            1,
            NewPortfolioItem {
                symbol: "RELIANCE.NS".to_string(),
                quantity: 10.0,
                avg_price: 2750.50,
                market: "NSE".to_string(),
            },
        );
        assert_eq!(added.id, 1);
        assert_eq!(added.quantity, 10.0);

        storage.update_portfolio(1, "RELIANCE.NS", 15.0, 2800.0);
        let list = storage.get_user_portfolio(1);
        assert_eq!(list[0].quantity, 15.0);
        assert_eq!(list[0].avg_price, 2800.0);

        // 更新不存在的代码不产生任何变化
        storage.update_portfolio(1, "NOPE.NS", 1.0, 1.0);
        assert_eq!(storage.get_user_portfolio(1).len(), 1);

        storage.remove_from_portfolio(1, "RELIANCE.NS");
        assert!(storage.get_user_portfolio(1).is_empty());
        println!("✅ 持仓闭环测试通过！");
    }
}
