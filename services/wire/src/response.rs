//! Typed results and XML rendering
//!
//! One result item per request child, rendered in request order inside
//! a single `<results>` document. Client-supplied attribute text is
//! echoed verbatim; engine-computed numbers print in normalized decimal
//! form (no trailing zeros).

use quick_xml::events::BytesText;
use quick_xml::Writer;

use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::{CancelRecord, Fill, Order};

/// One `<results>` child
#[derive(Debug, Clone, PartialEq)]
pub enum ResultItem {
    /// `<created id="..."/>` — account creation
    CreatedAccount { id: String },
    /// `<created sym="..." id="..."/>` — share grant
    CreatedShares { sym: String, id: String },
    /// `<opened sym amount limit id/>` — order accepted
    Opened {
        sym: String,
        amount: String,
        limit: String,
        id: OrderId,
    },
    /// `<status id="...">...</status>` — query reply
    Status { id: String, body: StatusBody },
    /// `<canceled id="...">...</canceled>` — cancel reply
    Canceled { id: String, body: StatusBody },
    /// `<error ...>message</error>` with the attributes the child would
    /// have carried on success
    Error {
        attrs: Vec<(&'static str, String)>,
        message: String,
    },
}

/// Execution-state body shared by status and cancel replies
///
/// At most one `<open>`, at most one `<canceled>`, and the fills in the
/// order they were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBody {
    pub open: Option<Quantity>,
    pub canceled: Option<CancelRecord>,
    pub executed: Vec<Fill>,
}

impl From<&Order> for StatusBody {
    fn from(order: &Order) -> Self {
        Self {
            open: order.is_open().then_some(order.open_shares),
            canceled: order.cancel,
            executed: order.fills.clone(),
        }
    }
}

/// Render a full `<results>` document
pub fn render_results(items: &[ResultItem]) -> String {
    let mut writer = Writer::new(Vec::new());
    writer
        .create_element("results")
        .write_inner_content(|w| {
            for item in items {
                write_item(w, item)?;
            }
            Ok::<(), quick_xml::Error>(())
        })
        .expect("in-memory XML rendering cannot fail");
    String::from_utf8(writer.into_inner()).expect("rendered XML is UTF-8")
}

/// Render a whole-request failure as a single-error document
pub fn render_request_error(message: &str) -> String {
    render_results(&[ResultItem::Error {
        attrs: Vec::new(),
        message: message.to_string(),
    }])
}

fn write_item(w: &mut Writer<Vec<u8>>, item: &ResultItem) -> Result<(), quick_xml::Error> {
    match item {
        ResultItem::CreatedAccount { id } => {
            w.create_element("created")
                .with_attribute(("id", id.as_str()))
                .write_empty()?;
        }
        ResultItem::CreatedShares { sym, id } => {
            w.create_element("created")
                .with_attribute(("sym", sym.as_str()))
                .with_attribute(("id", id.as_str()))
                .write_empty()?;
        }
        ResultItem::Opened {
            sym,
            amount,
            limit,
            id,
        } => {
            let id = id.to_string();
            w.create_element("opened")
                .with_attribute(("sym", sym.as_str()))
                .with_attribute(("amount", amount.as_str()))
                .with_attribute(("limit", limit.as_str()))
                .with_attribute(("id", id.as_str()))
                .write_empty()?;
        }
        ResultItem::Status { id, body } => {
            w.create_element("status")
                .with_attribute(("id", id.as_str()))
                .write_inner_content(|w| write_status_body(w, body))?;
        }
        ResultItem::Canceled { id, body } => {
            w.create_element("canceled")
                .with_attribute(("id", id.as_str()))
                .write_inner_content(|w| write_status_body(w, body))?;
        }
        ResultItem::Error { attrs, message } => {
            let mut element = w.create_element("error");
            for (name, value) in attrs {
                element = element.with_attribute((*name, value.as_str()));
            }
            element.write_text_content(BytesText::new(message))?;
        }
    }
    Ok(())
}

fn write_status_body(w: &mut Writer<Vec<u8>>, body: &StatusBody) -> Result<(), quick_xml::Error> {
    if let Some(open) = body.open {
        let shares = open.to_string();
        w.create_element("open")
            .with_attribute(("shares", shares.as_str()))
            .write_empty()?;
    }
    if let Some(canceled) = body.canceled {
        let shares = canceled.shares.to_string();
        let time = canceled.time.to_string();
        w.create_element("canceled")
            .with_attribute(("shares", shares.as_str()))
            .with_attribute(("time", time.as_str()))
            .write_empty()?;
    }
    for fill in &body.executed {
        let shares = fill.shares.to_string();
        let price = fill.price.to_string();
        let time = fill.time.to_string();
        w.create_element("executed")
            .with_attribute(("shares", shares.as_str()))
            .with_attribute(("price", price.as_str()))
            .with_attribute(("time", time.as_str()))
            .write_empty()?;
    }
    Ok(())
}
