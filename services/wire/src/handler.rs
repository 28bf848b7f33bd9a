//! Bundle dispatch against the exchange core
//!
//! One handler serves every connection; it owns nothing but a shared
//! engine handle. Per-child failures become `<error>` items carrying the
//! attributes the child would have shown on success, and never disturb
//! sibling children. A `<transactions>` bundle naming an invalid account
//! errors every child the same way.

use std::str::FromStr;
use std::sync::Arc;

use exchange_core::Exchange;
use rust_decimal::Decimal;
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::Quantity;

use crate::request::{parse_request, CreateItem, Request, TxChild};
use crate::response::{render_request_error, render_results, ResultItem, StatusBody};

/// Translates parsed bundles into engine calls and result items
#[derive(Clone)]
pub struct RequestHandler {
    exchange: Arc<Exchange>,
}

impl RequestHandler {
    pub fn new(exchange: Arc<Exchange>) -> Self {
        Self { exchange }
    }

    /// Parse, dispatch, and render one request document
    pub fn process(&self, xml: &str) -> String {
        match parse_request(xml) {
            Ok(request) => render_results(&self.handle(request)),
            Err(err) => {
                tracing::debug!(error = %err, "rejecting unparseable request");
                render_request_error(&err.to_string())
            }
        }
    }

    /// Dispatch a parsed bundle, one result item per child in order
    pub fn handle(&self, request: Request) -> Vec<ResultItem> {
        match request {
            Request::Create(items) => self.handle_create(items),
            Request::Transactions {
                account_id,
                children,
            } => self.handle_transactions(account_id, children),
        }
    }

    fn handle_create(&self, items: Vec<CreateItem>) -> Vec<ResultItem> {
        let mut results = Vec::new();
        for item in items {
            match item {
                CreateItem::Account { id, balance } => {
                    results.push(self.create_account(id, balance));
                }
                CreateItem::Symbol { sym, allocations } => {
                    for allocation in allocations {
                        results.push(self.grant_shares(
                            &sym,
                            allocation.account_id,
                            allocation.amount,
                        ));
                    }
                }
            }
        }
        results
    }

    fn create_account(&self, id: String, balance: String) -> ResultItem {
        let attrs = vec![("id", id.clone())];
        let Some(account_id) = AccountId::try_new(id.as_str()) else {
            return error(attrs, "Malformed request: account id must be decimal digits");
        };
        let Ok(balance) = Decimal::from_str(&balance) else {
            return error(attrs, "Malformed request: balance is not a number");
        };
        match self.exchange.create_account(account_id, balance) {
            Ok(()) => ResultItem::CreatedAccount { id },
            Err(e) => error(attrs, e.to_string()),
        }
    }

    fn grant_shares(&self, sym: &str, id: String, amount: String) -> ResultItem {
        let attrs = vec![("sym", sym.to_string()), ("id", id.clone())];
        let Some(symbol) = Symbol::try_new(sym) else {
            return error(attrs, "Malformed request: symbol must be alphanumeric");
        };
        let Some(account_id) = AccountId::try_new(id.as_str()) else {
            return error(attrs, "Malformed request: account id must be decimal digits");
        };
        let shares = match Quantity::parse(&amount) {
            Some(shares) if !shares.is_zero() => shares,
            _ => return error(attrs, "Malformed request: share amount must be positive"),
        };
        match self
            .exchange
            .create_or_add_shares(&symbol, &account_id, shares)
        {
            Ok(()) => ResultItem::CreatedShares {
                sym: sym.to_string(),
                id,
            },
            Err(e) => error(attrs, e.to_string()),
        }
    }

    fn handle_transactions(&self, account_id: String, children: Vec<TxChild>) -> Vec<ResultItem> {
        let account = AccountId::try_new(account_id.as_str())
            .filter(|id| self.exchange.account_exists(id));

        let Some(account) = account else {
            // Invalid account: every child reports the same failure with
            // its success-shape attributes.
            let message = format!("Account {account_id} does not exist");
            return children
                .into_iter()
                .map(|child| error(child_attrs(&child), message.clone()))
                .collect();
        };

        children
            .into_iter()
            .map(|child| self.handle_tx_child(&account, child))
            .collect()
    }

    fn handle_tx_child(&self, account: &AccountId, child: TxChild) -> ResultItem {
        match child {
            TxChild::Order { sym, amount, limit } => {
                let attrs = vec![
                    ("sym", sym.clone()),
                    ("amount", amount.clone()),
                    ("limit", limit.clone()),
                ];
                let Some(symbol) = Symbol::try_new(sym.as_str()) else {
                    return error(attrs, "Malformed request: symbol must be alphanumeric");
                };
                let Ok(parsed_amount) = Decimal::from_str(&amount) else {
                    return error(attrs, "Malformed request: amount is not a number");
                };
                let Ok(parsed_limit) = Decimal::from_str(&limit) else {
                    return error(attrs, "Malformed request: limit is not a number");
                };
                match self
                    .exchange
                    .place_order(account, &symbol, parsed_amount, parsed_limit)
                {
                    Ok(id) => ResultItem::Opened {
                        sym,
                        amount,
                        limit,
                        id,
                    },
                    Err(e) => error(attrs, e.to_string()),
                }
            }
            TxChild::Query { id } => {
                let attrs = vec![("id", id.clone())];
                let Some(order_id) = parse_order_id(&id) else {
                    return error(attrs, "Malformed request: order id is not a number");
                };
                match self.exchange.query(order_id) {
                    Ok(order) => ResultItem::Status {
                        id,
                        body: StatusBody::from(&order),
                    },
                    Err(e) => error(attrs, e.to_string()),
                }
            }
            TxChild::Cancel { id } => {
                let attrs = vec![("id", id.clone())];
                let Some(order_id) = parse_order_id(&id) else {
                    return error(attrs, "Malformed request: order id is not a number");
                };
                match self.exchange.cancel(order_id) {
                    Ok(order) => ResultItem::Canceled {
                        id,
                        body: StatusBody::from(&order),
                    },
                    Err(e) => error(attrs, e.to_string()),
                }
            }
        }
    }
}

fn parse_order_id(id: &str) -> Option<OrderId> {
    id.parse::<u64>().ok().map(OrderId::from_u64)
}

fn child_attrs(child: &TxChild) -> Vec<(&'static str, String)> {
    match child {
        TxChild::Order { sym, amount, limit } => vec![
            ("sym", sym.clone()),
            ("amount", amount.clone()),
            ("limit", limit.clone()),
        ],
        TxChild::Query { id } | TxChild::Cancel { id } => vec![("id", id.clone())],
    }
}

fn error(attrs: Vec<(&'static str, String)>, message: impl Into<String>) -> ResultItem {
    ResultItem::Error {
        attrs,
        message: message.into(),
    }
}
