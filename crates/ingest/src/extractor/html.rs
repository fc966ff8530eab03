//! Cash bid page parsing.
//!
//! Tries table rows first (`commodity | delivery | cash | basis | change`),
//! from the most specific selector to the least, then falls back to widget
//! blocks whose first line is the commodity label. The first row seen for a
//! commodity wins.

use cashbid_core::{Commodity, ExtractionError, RawBid, RawBidSheet};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

const ROW_SELECTORS: &[&str] = &[
    "table.cash-bids tr",
    ".dtn-cash-bids-table tr",
    "[class*=\"cash\"] table tr",
    ".widget-content table tr",
    "table tr",
];

const WIDGET_SELECTORS: &[&str] = &[
    "[data-commodity]",
    ".commodity-row",
    ".bid-row",
    "[class*=\"cashbid\"]",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Collapses runs of whitespace, including non-breaking spaces, to one space.
fn clean_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.filter(|s| !s.is_empty()).cloned()
}

/// Which part of the page belongs to the configured location.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocationScope {
    /// No location configured, or no bid table or widget is labelled with it.
    Any,
    /// Only elements with a label naming this (lowercase) location.
    Only(String),
}

impl LocationScope {
    /// Only bid containers (tables and widgets) count as naming the location;
    /// pickers and menus elsewhere on the page do not.
    fn resolve(document: &Html, location: Option<&str>) -> Self {
        let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) else {
            return Self::Any;
        };
        let wanted = location.to_lowercase();

        let mentioned = std::iter::once("table")
            .chain(WIDGET_SELECTORS.iter().copied())
            .filter_map(selector)
            .any(|sel| document.select(&sel).any(|el| names_location(el, &wanted)));

        if mentioned {
            Self::Only(wanted)
        } else {
            Self::Any
        }
    }

    fn admits(&self, el: ElementRef<'_>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => names_location(el, wanted),
        }
    }
}

/// True when any label around `el` contains `wanted` (lowercase).
fn names_location(el: ElementRef<'_>, wanted: &str) -> bool {
    scope_labels(el)
        .iter()
        .any(|label| label.to_lowercase().contains(wanted))
}

/// Every location label for an element, innermost first: `data-location`
/// attributes, table captions, and the closest preceding heading at each
/// level, searched outward to the document root.
fn scope_labels(el: ElementRef<'_>) -> Vec<String> {
    let caption = selector("caption");
    let mut labels = Vec::new();

    for node in std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap)) {
        if let Some(attr) = node.value().attr("data-location") {
            labels.push(attr.to_string());
        }
        if node.value().name() == "table" {
            if let Some(cap) = caption.as_ref().and_then(|c| node.select(c).next()) {
                labels.push(clean_text(cap));
            }
        }
        if let Some(heading) = node
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sib| HEADINGS.contains(&sib.value().name()))
        {
            labels.push(clean_text(heading));
        }
    }

    labels.retain(|l| !l.is_empty());
    labels
}

/// One table row: first cell names the commodity, the rest follow the
/// `delivery | cash | basis | change` column order.
fn parse_row(row: ElementRef<'_>, cells: &Selector) -> Option<(Commodity, RawBid)> {
    let texts: Vec<String> = row.select(cells).map(clean_text).collect();
    if texts.len() < 3 {
        return None;
    }

    let commodity = Commodity::from_label(&texts[0])?;
    let bid = RawBid {
        price: texts[2].clone(),
        basis: non_empty(texts.get(3)),
        futures_change: non_empty(texts.get(4)),
        delivery: non_empty(texts.get(1)),
        snapshot: texts.join(" | "),
    };
    Some((commodity, bid))
}

/// A widget block: label line, then the first numeric line is the cash price
/// and the second the basis.
fn parse_widget(el: ElementRef<'_>) -> Option<(Commodity, RawBid)> {
    let lines: Vec<String> = el
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect();

    let (label, rest) = match el.value().attr("data-commodity") {
        Some(attr) => (attr.to_string(), &lines[..]),
        None => (lines.first()?.clone(), lines.get(1..).unwrap_or_default()),
    };
    let commodity = Commodity::from_label(&label)?;

    let mut numeric = rest.iter().filter(|l| l.chars().any(|c| c.is_ascii_digit()));
    let price = numeric.next().or_else(|| rest.first())?.clone();
    let basis = numeric.next().cloned();

    Some((
        commodity,
        RawBid {
            price,
            basis,
            futures_change: None,
            delivery: None,
            snapshot: lines.join(" | "),
        },
    ))
}

/// Parses a cash bid page into a sheet of raw bids.
#[derive(Debug, Clone, Default)]
pub struct BidPageParser {
    location: Option<String>,
}

impl BidPageParser {
    #[must_use]
    pub fn new(location: Option<String>) -> Self {
        Self { location }
    }

    /// # Errors
    /// `LayoutChanged` when neither tables nor widgets yield a known commodity.
    pub fn parse(
        &self,
        html: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<RawBidSheet, ExtractionError> {
        let document = Html::parse_document(html);
        let scope = LocationScope::resolve(&document, self.location.as_deref());
        let mut sheet = RawBidSheet::new(fetched_at);

        if let Some(cells) = selector("td, th") {
            for css in ROW_SELECTORS {
                let Some(rows) = selector(css) else { continue };
                for row in document.select(&rows).filter(|r| scope.admits(*r)) {
                    if let Some((commodity, bid)) = parse_row(row, &cells) {
                        sheet.insert_first(commodity, bid);
                    }
                }
                if !sheet.is_empty() {
                    tracing::debug!("Found {} bid rows with selector {}", sheet.len(), css);
                    return Ok(sheet);
                }
            }
        }

        for css in WIDGET_SELECTORS {
            let Some(widgets) = selector(css) else { continue };
            for el in document.select(&widgets).filter(|w| scope.admits(*w)) {
                if let Some((commodity, bid)) = parse_widget(el) {
                    sheet.insert_first(commodity, bid);
                }
            }
            if !sheet.is_empty() {
                tracing::debug!("Found {} bid widgets with selector {}", sheet.len(), css);
                return Ok(sheet);
            }
        }

        Err(ExtractionError::LayoutChanged(
            "no cash bid rows for any known commodity".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap()
    }

    const TABLE_PAGE: &str = r#"
        <html><body>
        <h1>Cash Bids</h1>
        <table class="cash-bids">
          <tr><th>Commodity</th><th>Delivery</th><th>Cash</th><th>Basis</th><th>Change</th></tr>
          <tr><td>Corn</td><td>Oct 2026</td><td>$4.12</td><td>-0.45</td><td>+0.0275</td></tr>
          <tr><td>Soybeans</td><td>Oct 2026</td><td>$10.05</td><td>-0.90</td><td>-0.04</td></tr>
          <tr><td>HRS Wheat 14%</td><td>Oct 2026</td><td>$5.80</td><td>-0.70</td><td></td></tr>
          <tr><td>Canola</td><td>Oct 2026</td><td>N/A</td><td></td><td></td></tr>
          <tr><td>Corn</td><td>Nov 2026</td><td>$4.20</td><td>-0.40</td><td>+0.0275</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parses_table_rows() {
        let sheet = BidPageParser::default().parse(TABLE_PAGE, t()).unwrap();

        assert_eq!(sheet.fetched_at, t());
        assert_eq!(sheet.len(), 4);

        let corn = sheet.get(Commodity::Corn).unwrap();
        assert_eq!(corn.price, "$4.12");
        assert_eq!(corn.basis.as_deref(), Some("-0.45"));
        assert_eq!(corn.futures_change.as_deref(), Some("+0.0275"));
        assert_eq!(corn.delivery.as_deref(), Some("Oct 2026"));
        assert_eq!(corn.snapshot, "Corn | Oct 2026 | $4.12 | -0.45 | +0.0275");

        let wheat = sheet.get(Commodity::SpringWheat14Pro).unwrap();
        assert_eq!(wheat.futures_change, None);

        // present with unparseable text; the normalizer decides
        assert_eq!(sheet.get(Commodity::Canola).unwrap().price, "N/A");
        assert!(sheet.get(Commodity::WinterWheat12Pro).is_none());
    }

    #[test]
    fn test_location_headings_select_one_table() {
        let page = r#"
            <html><body>
            <h3>Dunseith</h3>
            <table><tr><td>Corn</td><td>Oct</td><td>$3.99</td></tr></table>
            <h3>Rolla</h3>
            <table><tr><td>Corn</td><td>Oct</td><td>$4.05</td></tr></table>
            </body></html>
        "#;

        let rolla = BidPageParser::new(Some("Rolla".to_string()))
            .parse(page, t())
            .unwrap();
        assert_eq!(rolla.get(Commodity::Corn).unwrap().price, "$4.05");

        let dunseith = BidPageParser::new(Some("dunseith".to_string()))
            .parse(page, t())
            .unwrap();
        assert_eq!(dunseith.get(Commodity::Corn).unwrap().price, "$3.99");
    }

    #[test]
    fn test_unmentioned_location_reads_every_table() {
        let sheet = BidPageParser::new(Some("Rolla".to_string()))
            .parse(TABLE_PAGE, t())
            .unwrap();
        assert_eq!(sheet.len(), 4);
    }

    #[test]
    fn test_data_location_attribute() {
        let page = r#"
            <div data-location="Belcourt"><table>
              <tr><td>Canola</td><td>Oct</td><td>$19.10</td></tr></table></div>
            <div data-location="Rolla"><table>
              <tr><td>Canola</td><td>Oct</td><td>$19.45</td></tr></table></div>
        "#;
        let sheet = BidPageParser::new(Some("Rolla".to_string()))
            .parse(page, t())
            .unwrap();
        assert_eq!(sheet.get(Commodity::Canola).unwrap().price, "$19.45");
    }

    #[test]
    fn test_location_picker_does_not_hide_unlabelled_table() {
        let page = r#"
            <div class="location-select">
              <button data-location="Rolla">Rolla</button>
              <button data-location="Belcourt">Belcourt</button>
            </div>
            <table class="cash-bids">
              <tr><td>Corn</td><td>Oct</td><td>$4.12</td></tr>
            </table>
        "#;

        let sheet = BidPageParser::new(Some("Rolla".to_string()))
            .parse(page, t())
            .unwrap();
        assert_eq!(sheet.get(Commodity::Corn).unwrap().price, "$4.12");
    }

    #[test]
    fn test_generic_heading_inside_labelled_container() {
        let page = r#"
            <div data-location="Belcourt">
              <h4>Cash Bids</h4>
              <table><tr><td>Corn</td><td>Oct</td><td>$3.99</td></tr></table>
            </div>
            <div data-location="Rolla">
              <h4>Cash Bids</h4>
              <table><tr><td>Corn</td><td>Oct</td><td>$4.12</td></tr></table>
            </div>
        "#;

        let sheet = BidPageParser::new(Some("Rolla".to_string()))
            .parse(page, t())
            .unwrap();
        assert_eq!(sheet.get(Commodity::Corn).unwrap().price, "$4.12");

        let only_rolla = &page[page.find("<div data-location=\"Rolla\">").unwrap()..];
        let sheet = BidPageParser::new(Some("Rolla".to_string()))
            .parse(only_rolla, t())
            .unwrap();
        assert_eq!(sheet.get(Commodity::Corn).unwrap().price, "$4.12");
    }

    #[test]
    fn test_widget_fallback() {
        let page = r#"
            <div class="dtn">
              <div class="commodity-row">
                <span>Corn</span><span>$4.12</span><span>-0.45</span>
              </div>
              <div data-commodity="Winter Wheat 12%">
                <span>$5.55</span>
              </div>
              <div class="commodity-row"><span>Oats</span><span>$3.00</span></div>
            </div>
        "#;

        let sheet = BidPageParser::default().parse(page, t()).unwrap();

        assert_eq!(sheet.len(), 1, "first matching selector wins");
        let wheat = sheet.get(Commodity::WinterWheat12Pro).unwrap();
        assert_eq!(wheat.price, "$5.55");

        let sheet = BidPageParser::default()
            .parse(&page.replace("data-commodity", "data-x"), t())
            .unwrap();
        let corn = sheet.get(Commodity::Corn).unwrap();
        assert_eq!(corn.price, "$4.12");
        assert_eq!(corn.basis.as_deref(), Some("-0.45"));
    }

    #[test]
    fn test_unrecognised_layout() {
        let err = BidPageParser::default()
            .parse("<html><body><p>Maintenance</p></body></html>", t())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::LayoutChanged(_)));
    }
}
