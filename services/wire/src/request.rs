//! Typed request algebra and XML parsing
//!
//! Two bundle shapes exist: `<create>` (accounts and share grants,
//! processed in input order) and `<transactions id="...">` (orders,
//! queries, cancels scoped to one account). Attribute values are kept
//! as the raw client text so responses can echo them byte-for-byte;
//! numeric interpretation happens per child in the handler.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::WireError;

/// One parsed request bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Create(Vec<CreateItem>),
    Transactions {
        account_id: String,
        children: Vec<TxChild>,
    },
}

/// Child of a `<create>` bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateItem {
    Account { id: String, balance: String },
    Symbol { sym: String, allocations: Vec<Allocation> },
}

/// `<account id="...">amount</account>` inside `<symbol>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub account_id: String,
    pub amount: String,
}

/// Child of a `<transactions>` bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxChild {
    Order {
        sym: String,
        amount: String,
        limit: String,
    },
    Query {
        id: String,
    },
    Cancel {
        id: String,
    },
}

/// Parse one XML document into a request bundle
pub fn parse_request(xml: &str) -> Result<Request, WireError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match read(&mut reader)? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Start(root) => {
                return match root.name().as_ref() {
                    b"create" => parse_create(&mut reader),
                    b"transactions" => parse_transactions(&mut reader, &root),
                    other => Err(WireError::malformed(format!(
                        "unknown request type: {}",
                        String::from_utf8_lossy(other)
                    ))),
                }
            }
            Event::Empty(root) => {
                // A childless bundle is structurally valid and produces
                // an empty results document.
                return match root.name().as_ref() {
                    b"create" => Ok(Request::Create(Vec::new())),
                    b"transactions" => Ok(Request::Transactions {
                        account_id: require_attr(&root, "id")?,
                        children: Vec::new(),
                    }),
                    other => Err(WireError::malformed(format!(
                        "unknown request type: {}",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Event::Eof => return Err(WireError::malformed("empty document")),
            _ => return Err(WireError::malformed("unexpected content before root element")),
        }
    }
}

fn parse_create(reader: &mut Reader<&[u8]>) -> Result<Request, WireError> {
    let mut items = Vec::new();
    loop {
        match read(reader)? {
            Event::Empty(e) if e.name().as_ref() == b"account" => {
                items.push(CreateItem::Account {
                    id: require_attr(&e, "id")?,
                    balance: require_attr(&e, "balance")?,
                });
            }
            Event::Start(e) if e.name().as_ref() == b"account" => {
                let item = CreateItem::Account {
                    id: require_attr(&e, "id")?,
                    balance: require_attr(&e, "balance")?,
                };
                expect_end(reader, "account")?;
                items.push(item);
            }
            Event::Start(e) if e.name().as_ref() == b"symbol" => {
                let sym = require_attr(&e, "sym")?;
                items.push(CreateItem::Symbol {
                    sym,
                    allocations: parse_allocations(reader)?,
                });
            }
            Event::Empty(e) if e.name().as_ref() == b"symbol" => {
                items.push(CreateItem::Symbol {
                    sym: require_attr(&e, "sym")?,
                    allocations: Vec::new(),
                });
            }
            Event::End(e) if e.name().as_ref() == b"create" => return Ok(Request::Create(items)),
            Event::Eof => return Err(WireError::malformed("unterminated <create>")),
            other => {
                return Err(WireError::malformed(format!(
                    "unexpected element in <create>: {other:?}"
                )))
            }
        }
    }
}

fn parse_allocations(reader: &mut Reader<&[u8]>) -> Result<Vec<Allocation>, WireError> {
    let mut allocations = Vec::new();
    loop {
        match read(reader)? {
            Event::Start(e) if e.name().as_ref() == b"account" => {
                let account_id = require_attr(&e, "id")?;
                let amount = match read(reader)? {
                    Event::Text(text) => text
                        .unescape()
                        .map_err(|e| WireError::malformed(e.to_string()))?
                        .trim()
                        .to_string(),
                    _ => return Err(WireError::malformed("share grant without an amount")),
                };
                expect_end(reader, "account")?;
                allocations.push(Allocation { account_id, amount });
            }
            Event::End(e) if e.name().as_ref() == b"symbol" => return Ok(allocations),
            Event::Eof => return Err(WireError::malformed("unterminated <symbol>")),
            other => {
                return Err(WireError::malformed(format!(
                    "unexpected element in <symbol>: {other:?}"
                )))
            }
        }
    }
}

fn parse_transactions(
    reader: &mut Reader<&[u8]>,
    root: &BytesStart,
) -> Result<Request, WireError> {
    let account_id = require_attr(root, "id")?;
    let mut children = Vec::new();
    loop {
        let event = read(reader)?;
        let (element, needs_end) = match &event {
            Event::Empty(e) => (e.clone(), false),
            Event::Start(e) => (e.clone(), true),
            Event::End(e) if e.name().as_ref() == b"transactions" => {
                return Ok(Request::Transactions {
                    account_id,
                    children,
                })
            }
            Event::Eof => return Err(WireError::malformed("unterminated <transactions>")),
            other => {
                return Err(WireError::malformed(format!(
                    "unexpected element in <transactions>: {other:?}"
                )))
            }
        };

        let child = match element.name().as_ref() {
            b"order" => TxChild::Order {
                sym: require_attr(&element, "sym")?,
                amount: require_attr(&element, "amount")?,
                limit: require_attr(&element, "limit")?,
            },
            b"query" => TxChild::Query {
                id: require_attr(&element, "id")?,
            },
            b"cancel" => TxChild::Cancel {
                id: require_attr(&element, "id")?,
            },
            other => {
                return Err(WireError::malformed(format!(
                    "unknown transaction child: {}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        if needs_end {
            expect_end(reader, std::str::from_utf8(element.name().as_ref()).unwrap_or(""))?;
        }
        children.push(child);
    }
}

fn read<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, WireError> {
    reader
        .read_event()
        .map_err(|e| WireError::malformed(e.to_string()))
}

fn expect_end(reader: &mut Reader<&[u8]>, name: &str) -> Result<(), WireError> {
    match read(reader)? {
        Event::End(e) if e.name().as_ref() == name.as_bytes() => Ok(()),
        _ => Err(WireError::malformed(format!("expected </{name}>"))),
    }
}

fn require_attr(element: &BytesStart, name: &str) -> Result<String, WireError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| WireError::malformed(e.to_string()))?
        .ok_or_else(|| {
            WireError::malformed(format!(
                "<{}> missing attribute {name}",
                String::from_utf8_lossy(element.name().as_ref())
            ))
        })?;
    Ok(attr
        .unescape_value()
        .map_err(|e| WireError::malformed(e.to_string()))?
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_bundle() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<create>
  <account id="123456" balance="1000"/>
  <symbol sym="SPY">
    <account id="123456">100000</account>
  </symbol>
</create>"#;

        let request = parse_request(xml).unwrap();
        assert_eq!(
            request,
            Request::Create(vec![
                CreateItem::Account {
                    id: "123456".to_string(),
                    balance: "1000".to_string(),
                },
                CreateItem::Symbol {
                    sym: "SPY".to_string(),
                    allocations: vec![Allocation {
                        account_id: "123456".to_string(),
                        amount: "100000".to_string(),
                    }],
                },
            ])
        );
    }

    #[test]
    fn test_parse_transactions_bundle() {
        let xml = r#"<transactions id="123456">
  <order sym="SPY" amount="-100" limit="145.67"/>
  <query id="1"/>
  <cancel id="2"/>
</transactions>"#;

        let request = parse_request(xml).unwrap();
        assert_eq!(
            request,
            Request::Transactions {
                account_id: "123456".to_string(),
                children: vec![
                    TxChild::Order {
                        sym: "SPY".to_string(),
                        amount: "-100".to_string(),
                        limit: "145.67".to_string(),
                    },
                    TxChild::Query { id: "1".to_string() },
                    TxChild::Cancel { id: "2".to_string() },
                ],
            }
        );
    }

    #[test]
    fn test_attribute_text_round_trips() {
        // The parser must keep the client's numeric spelling untouched.
        let xml = r#"<transactions id="007"><order sym="X" amount="100.50" limit="0145.670"/></transactions>"#;
        let Request::Transactions { children, .. } = parse_request(xml).unwrap() else {
            panic!("wrong bundle type");
        };
        assert_eq!(
            children[0],
            TxChild::Order {
                sym: "X".to_string(),
                amount: "100.50".to_string(),
                limit: "0145.670".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_xml_rejected() {
        assert!(parse_request("not xml at all").is_err());
        assert!(parse_request("<create><account id=\"1\"").is_err());
        assert!(parse_request("").is_err());
    }

    #[test]
    fn test_unknown_root_rejected() {
        let err = parse_request("<swap/>").unwrap_err();
        assert!(err.to_string().contains("unknown request type"));
    }

    #[test]
    fn test_missing_attribute_rejected() {
        let err = parse_request(r#"<create><account id="1"/></create>"#).unwrap_err();
        assert!(err.to_string().contains("missing attribute balance"));
    }

    #[test]
    fn test_transactions_requires_account_id() {
        assert!(parse_request("<transactions><query id=\"1\"/></transactions>").is_err());
    }

    #[test]
    fn test_empty_bundles() {
        assert_eq!(parse_request("<create/>").unwrap(), Request::Create(vec![]));
        assert_eq!(
            parse_request(r#"<transactions id="5"/>"#).unwrap(),
            Request::Transactions {
                account_id: "5".to_string(),
                children: vec![],
            }
        );
    }
}
