//! Venue-agnostic normalized records.
//!
//! Adapters populate these shapes from venue-specific JSON. The signer and
//! dispatch bridge never inspect them; they sit on the boundary for typed
//! decoding via [`crate::client::VenueClient::call_as`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Buy or sell side of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Order execution type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Execute immediately at the best available price
    Market,
    /// Execute at the given price or better
    Limit,
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Open and active
    Open,
    /// Completely filled
    Closed,
    /// Canceled before completion
    Canceled,
    /// Expired per its time-in-force
    Expired,
    /// Rejected by the venue
    Rejected,
}

/// A tradable market listed by a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Venue-specific market id
    pub id: String,
    /// Unified symbol, e.g. `BTC/USDT`
    pub symbol: String,
    /// Base currency code
    pub base: String,
    /// Quote currency code
    pub quote: String,
    /// Whether the market is currently tradable
    pub active: bool,
    /// Decimal places for amounts
    #[serde(default)]
    pub amount_precision: Option<u32>,
    /// Decimal places for prices
    #[serde(default)]
    pub price_precision: Option<u32>,
}

/// A 24h price snapshot for one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// Unified symbol
    pub symbol: String,
    /// Snapshot time in milliseconds since epoch
    pub timestamp: i64,
    /// Best bid
    pub bid: Option<Decimal>,
    /// Best ask
    pub ask: Option<Decimal>,
    /// Last traded price
    pub last: Option<Decimal>,
    /// 24h high
    pub high: Option<Decimal>,
    /// 24h low
    pub low: Option<Decimal>,
    /// 24h base volume
    pub volume: Option<Decimal>,
}

/// One price level of an order book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price of the level
    pub price: Decimal,
    /// Amount available at the level
    pub amount: Decimal,
}

/// An order book snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Unified symbol
    pub symbol: String,
    /// Snapshot time in milliseconds since epoch
    pub timestamp: i64,
    /// Bids, best first
    pub bids: Vec<BookLevel>,
    /// Asks, best first
    pub asks: Vec<BookLevel>,
}

/// A public or private trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Venue trade id
    pub id: String,
    /// Unified symbol
    pub symbol: String,
    /// Execution time in milliseconds since epoch
    pub timestamp: i64,
    /// Taker side
    pub side: OrderSide,
    /// Executed price
    pub price: Decimal,
    /// Executed amount in base currency
    pub amount: Decimal,
}

/// An order as reported by a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Venue order id
    pub id: String,
    /// Unified symbol
    pub symbol: String,
    /// Creation time in milliseconds since epoch
    pub timestamp: i64,
    /// Order type
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Order side
    pub side: OrderSide,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Requested price, if limit
    pub price: Option<Decimal>,
    /// Requested amount in base currency
    pub amount: Decimal,
    /// Filled amount in base currency
    pub filled: Decimal,
}

/// Balance of one currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// Currency code
    pub currency: String,
    /// Amount available for trading
    pub free: Decimal,
    /// Amount locked in open orders or withdrawals
    pub used: Decimal,
    /// `free + used`
    pub total: Decimal,
}

/// Direction of a funding transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Funds entering the account
    Deposit,
    /// Funds leaving the account
    Withdrawal,
}

/// A deposit or withdrawal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Venue transaction id
    pub id: String,
    /// Deposit or withdrawal
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Currency code
    pub currency: String,
    /// Amount transferred
    pub amount: Decimal,
    /// Venue status string, e.g. `ok`, `pending`
    pub status: String,
    /// Time in milliseconds since epoch
    pub timestamp: i64,
    /// On-chain transaction hash, when applicable
    pub txid: Option<String>,
}

/// A deposit address for one currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositAddress {
    /// Currency code
    pub currency: String,
    /// The address
    pub address: String,
    /// Memo/tag for venues that require one
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_roundtrip_field_names() {
        let json = serde_json::json!({
            "id": "42",
            "symbol": "BTC/USDT",
            "timestamp": 1700000000000i64,
            "type": "limit",
            "side": "buy",
            "status": "open",
            "price": "50000.5",
            "amount": "0.25",
            "filled": "0"
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.price.unwrap().to_string(), "50000.5");
    }

    #[test]
    fn test_ticker_optional_fields() {
        let json = serde_json::json!({
            "symbol": "ETH/USD",
            "timestamp": 1700000000000i64,
            "bid": null,
            "ask": null,
            "last": "3000",
            "high": null,
            "low": null,
            "volume": null
        });

        let ticker: Ticker = serde_json::from_value(json).unwrap();
        assert!(ticker.bid.is_none());
        assert_eq!(ticker.last.unwrap().to_string(), "3000");
    }
}
