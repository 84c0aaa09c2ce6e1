//! Order details extraction from Document Intelligence invoice results
//!
//! The provider returns a loosely-typed bag of named fields. This module
//! validates that bag once into [`FieldBag`], keyed by the closed
//! [`DocumentField`] and [`ItemField`] enums, and maps it onto
//! [`OrderDetails`]. Unknown field names are ignored and missing fields are a
//! normal condition: extraction never fails, it degrades to defaults.
//!
//! Both the REST (`valueArray` / `valueObject`) and SDK (`values` /
//! `properties`) spellings of the line item containers are accepted.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::confidence::{aggregate, ConfidenceWeights};
use crate::models::{Customer, LineItem, OrderDetails, Vendor};

/// Quantity used when the document's quantity text is missing or unparseable
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Amount used for a recognized total whose text holds no number
pub const DEFAULT_AMOUNT: f64 = 0.0;

/// Confidence of a line item with no scored fields
pub const NEUTRAL_ITEM_CONFIDENCE: f64 = 0.5;

/// Document-level invoice fields read by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    CustomerName,
    CustomerAddressRecipient,
    CustomerAddress,
    VendorName,
    VendorAddress,
    InvoiceId,
    InvoiceDate,
    DueDate,
    SubTotal,
    TotalTax,
    InvoiceTotal,
    CurrencyCode,
}

impl DocumentField {
    /// Provider field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerName => "CustomerName",
            Self::CustomerAddressRecipient => "CustomerAddressRecipient",
            Self::CustomerAddress => "CustomerAddress",
            Self::VendorName => "VendorName",
            Self::VendorAddress => "VendorAddress",
            Self::InvoiceId => "InvoiceId",
            Self::InvoiceDate => "InvoiceDate",
            Self::DueDate => "DueDate",
            Self::SubTotal => "SubTotal",
            Self::TotalTax => "TotalTax",
            Self::InvoiceTotal => "InvoiceTotal",
            Self::CurrencyCode => "CurrencyCode",
        }
    }

    pub fn all() -> &'static [DocumentField] {
        &[
            Self::CustomerName,
            Self::CustomerAddressRecipient,
            Self::CustomerAddress,
            Self::VendorName,
            Self::VendorAddress,
            Self::InvoiceId,
            Self::InvoiceDate,
            Self::DueDate,
            Self::SubTotal,
            Self::TotalTax,
            Self::InvoiceTotal,
            Self::CurrencyCode,
        ]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.as_str() == name)
    }
}

/// Per-item fields inside the `Items` array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Description,
    ProductDescription,
    Item,
    ProductCode,
    ItemCode,
    Code,
    Quantity,
    Unit,
    UnitPrice,
    Amount,
}

impl ItemField {
    /// Provider field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "Description",
            Self::ProductDescription => "ProductDescription",
            Self::Item => "Item",
            Self::ProductCode => "ProductCode",
            Self::ItemCode => "ItemCode",
            Self::Code => "Code",
            Self::Quantity => "Quantity",
            Self::Unit => "Unit",
            Self::UnitPrice => "UnitPrice",
            Self::Amount => "Amount",
        }
    }

    pub fn all() -> &'static [ItemField] {
        &[
            Self::Description,
            Self::ProductDescription,
            Self::Item,
            Self::ProductCode,
            Self::ItemCode,
            Self::Code,
            Self::Quantity,
            Self::Unit,
            Self::UnitPrice,
            Self::Amount,
        ]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.as_str() == name)
    }
}

/// Text and confidence of one recognized field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValue {
    pub content: Option<String>,
    pub confidence: Option<f64>,
}

impl FieldValue {
    fn from_json(value: &Value) -> Self {
        Self {
            content: value
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_string),
            confidence: value.get("confidence").and_then(Value::as_f64),
        }
    }

    /// Content, if present and non-empty
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|s| !s.is_empty())
    }
}

/// Recognized fields of one line item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFields {
    fields: HashMap<ItemField, FieldValue>,
}

impl ItemFields {
    fn from_json(item: &Value) -> Self {
        let properties = item
            .get("properties")
            .or_else(|| item.get("valueObject"))
            .and_then(Value::as_object);

        let mut fields = HashMap::new();
        if let Some(properties) = properties {
            for (name, value) in properties {
                if value.is_null() {
                    continue;
                }
                if let Some(field) = ItemField::from_name(name) {
                    fields.insert(field, FieldValue::from_json(value));
                }
            }
        }
        Self { fields }
    }

    pub fn get(&self, field: ItemField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// First non-empty text among the candidates, in priority order
    fn first_text(&self, candidates: &[ItemField]) -> Option<&str> {
        candidates
            .iter()
            .find_map(|field| self.get(*field).and_then(FieldValue::text))
    }
}

/// Typed view of the first analyzed document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    fields: HashMap<DocumentField, FieldValue>,
    /// `None` when the document has no `Items` array at all
    items: Option<Vec<ItemFields>>,
}

impl FieldBag {
    /// Validate the provider's `analyzeResult` into a field bag
    ///
    /// Returns `None` when the result contains no document. A document without
    /// a usable `fields` object yields an empty bag.
    pub fn from_analyze_result(result: &Value) -> Option<Self> {
        let document = result
            .get("documents")
            .and_then(Value::as_array)
            .and_then(|docs| docs.first())?;

        let Some(raw_fields) = document.get("fields").and_then(Value::as_object) else {
            debug!("Document has no fields container");
            return Some(Self::default());
        };

        let mut fields = HashMap::new();
        for (name, value) in raw_fields {
            if value.is_null() {
                continue;
            }
            if let Some(field) = DocumentField::from_name(name) {
                fields.insert(field, FieldValue::from_json(value));
            }
        }

        let items = raw_fields
            .get("Items")
            .and_then(|items| items.get("values").or_else(|| items.get("valueArray")))
            .and_then(Value::as_array)
            .map(|values| values.iter().map(ItemFields::from_json).collect());

        Some(Self { fields, items })
    }

    pub fn get(&self, field: DocumentField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn items(&self) -> Option<&[ItemFields]> {
        self.items.as_deref()
    }

    fn content(&self, field: DocumentField) -> Option<String> {
        self.get(field).and_then(|f| f.content.clone())
    }
}

/// Parse a decimal from free-form text
///
/// Every character outside `[0-9.]` is dropped, then the longest leading
/// decimal (`digits[.digits]`) is parsed: `"$1,234.56 USD"` gives `1234.56`
/// and `"1.2.3"` gives `1.2`. Returns `None` when no digit survives.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in cleaned.char_indices() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + 1;
    }

    if !seen_digit {
        return None;
    }
    cleaned[..end].parse::<f64>().ok()
}

/// Quantity from optional text; missing, unparseable and zero all give [`DEFAULT_QUANTITY`]
pub fn parse_quantity(raw: Option<&str>) -> f64 {
    raw.and_then(parse_decimal)
        .filter(|q| *q != 0.0)
        .unwrap_or(DEFAULT_QUANTITY)
}

/// Amount of a recognized total field; unparseable text gives [`DEFAULT_AMOUNT`]
pub fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(parse_decimal).unwrap_or(DEFAULT_AMOUNT)
}

/// Extract order details from a raw `analyzeResult`
///
/// A result with no recognized document yields an empty record.
pub fn extract_order_details(result: &Value, weights: &ConfidenceWeights) -> OrderDetails {
    match FieldBag::from_analyze_result(result) {
        Some(bag) => order_details_from_fields(&bag, weights),
        None => {
            warn!("No structured document found in result");
            OrderDetails::default()
        }
    }
}

/// Map a validated field bag onto order details
pub fn order_details_from_fields(bag: &FieldBag, weights: &ConfidenceWeights) -> OrderDetails {
    use DocumentField::*;

    let mut customer = Customer::default();
    let mut customer_scores = Vec::new();

    if let Some(name) = bag.get(CustomerName) {
        customer.name = name.content.clone();
        customer_scores.push(name.confidence.unwrap_or(0.0));
    }
    if let Some(address) = bag.get(CustomerAddress) {
        customer.address = address.content.clone();
        customer_scores.push(address.confidence.unwrap_or(0.0));
    }
    if customer.name.as_deref().map_or(true, str::is_empty) {
        if let Some(recipient) = bag.get(CustomerAddressRecipient) {
            customer.name = recipient.content.clone();
        }
    }

    let vendor = bag.get(VendorName).map(|name| Vendor {
        name: name.content.clone(),
        address: bag.content(VendorAddress),
        phone: None,
    });

    let line_items: Vec<LineItem> = bag
        .items()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, item)| extract_line_item(index, item))
        .collect();
    debug!(count = line_items.len(), "Extracted line items");

    let item_scores: Vec<f64> = line_items.iter().map(|item| item.confidence).collect();

    let mut totals_scores = Vec::new();
    let mut total_of = |field: DocumentField| {
        bag.get(field).map(|value| {
            totals_scores.push(value.confidence.unwrap_or(0.0));
            parse_amount(value.content.as_deref())
        })
    };
    let subtotal = total_of(SubTotal);
    let tax = total_of(TotalTax);
    let total = total_of(InvoiceTotal);

    let confidence = weights.score(
        aggregate(&customer_scores),
        aggregate(&item_scores),
        aggregate(&totals_scores),
    );

    OrderDetails {
        order_id: bag.content(InvoiceId),
        order_date: bag.content(InvoiceDate),
        due_date: bag.content(DueDate),
        customer,
        vendor,
        line_items,
        subtotal,
        tax,
        total,
        currency: bag.content(CurrencyCode),
        confidence,
    }
}

fn extract_line_item(index: usize, item: &ItemFields) -> LineItem {
    use ItemField::*;

    let description = item
        .first_text(&[Description, ProductDescription, Item])
        .unwrap_or_default()
        .to_string();
    let product_code = item
        .first_text(&[ProductCode, ItemCode, Code])
        .map(str::to_string);

    let scores: Vec<f64> = [Description, Quantity, ProductCode]
        .iter()
        .filter_map(|field| item.get(*field).and_then(|f| f.confidence))
        .collect();
    let confidence = if scores.is_empty() {
        NEUTRAL_ITEM_CONFIDENCE
    } else {
        aggregate(&scores)
    };

    LineItem {
        line_number: index as u32 + 1,
        product_code,
        description,
        quantity: parse_quantity(item.get(Quantity).and_then(FieldValue::text)),
        unit: item.get(Unit).and_then(|f| f.content.clone()),
        unit_price: item
            .get(UnitPrice)
            .and_then(FieldValue::text)
            .and_then(parse_decimal),
        total_price: item
            .get(Amount)
            .and_then(FieldValue::text)
            .and_then(parse_decimal),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(content: &str, confidence: f64) -> Value {
        json!({ "content": content, "confidence": confidence })
    }

    fn result_with(fields: Value) -> Value {
        json!({ "documents": [{ "docType": "invoice", "fields": fields }] })
    }

    fn extract(fields: Value) -> OrderDetails {
        extract_order_details(&result_with(fields), &ConfidenceWeights::default())
    }

    #[test]
    fn test_parse_decimal_strips_formatting() {
        assert_eq!(parse_decimal("$1,234.56 USD"), Some(1234.56));
        assert_eq!(parse_decimal("12"), Some(12.0));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("5."), Some(5.0));
    }

    #[test]
    fn test_parse_decimal_takes_leading_number() {
        assert_eq!(parse_decimal("1.2.3"), Some(1.2));
        assert_eq!(parse_decimal("v2.0 (3 units)"), Some(2.03));
    }

    #[test]
    fn test_parse_decimal_rejects_text_without_digits() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal("..5"), None);
    }

    #[test]
    fn test_parse_quantity_defaults_to_one() {
        assert_eq!(parse_quantity(Some("abc")), 1.0);
        assert_eq!(parse_quantity(Some("")), 1.0);
        assert_eq!(parse_quantity(None), 1.0);
        assert_eq!(parse_quantity(Some("0")), 1.0);
        assert_eq!(parse_quantity(Some("3 pcs")), 3.0);
    }

    #[test]
    fn test_parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount(Some("n/a")), 0.0);
        assert_eq!(parse_amount(None), 0.0);
        assert_eq!(parse_amount(Some("$99.90")), 99.9);
    }

    #[test]
    fn test_no_documents_gives_empty_order() {
        let details =
            extract_order_details(&json!({ "documents": [] }), &ConfidenceWeights::default());
        assert_eq!(details, OrderDetails::default());

        let details = extract_order_details(&json!({}), &ConfidenceWeights::default());
        assert_eq!(details, OrderDetails::default());
    }

    #[test]
    fn test_missing_fields_container_gives_empty_order() {
        let details = extract_order_details(
            &json!({ "documents": [{ "docType": "invoice" }] }),
            &ConfidenceWeights::default(),
        );
        assert_eq!(details, OrderDetails::default());
    }

    #[test]
    fn test_customer_and_vendor_mapping() {
        let details = extract(json!({
            "CustomerName": field("Acme Corp", 0.9),
            "CustomerAddress": field("1 Main St", 0.7),
            "VendorName": field("Supplies Inc", 0.95),
            "VendorAddress": field("2 Side Rd", 0.9),
            "InvoiceId": field("INV-100", 0.99),
            "InvoiceDate": field("2024-01-15", 0.98),
            "DueDate": field("2024-02-15", 0.97),
            "CurrencyCode": field("USD", 0.9),
        }));

        assert_eq!(details.customer.name.as_deref(), Some("Acme Corp"));
        assert_eq!(details.customer.address.as_deref(), Some("1 Main St"));
        let vendor = details.vendor.unwrap();
        assert_eq!(vendor.name.as_deref(), Some("Supplies Inc"));
        assert_eq!(vendor.address.as_deref(), Some("2 Side Rd"));
        assert_eq!(details.order_id.as_deref(), Some("INV-100"));
        assert_eq!(details.order_date.as_deref(), Some("2024-01-15"));
        assert_eq!(details.due_date.as_deref(), Some("2024-02-15"));
        assert_eq!(details.currency.as_deref(), Some("USD"));
        assert!((details.confidence.customer_info - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_recipient_fills_missing_customer_name() {
        let details = extract(json!({
            "CustomerAddressRecipient": field("Jane Doe", 0.6),
        }));
        assert_eq!(details.customer.name.as_deref(), Some("Jane Doe"));
        // Recipient does not contribute to the customer score
        assert_eq!(details.confidence.customer_info, 0.0);
    }

    #[test]
    fn test_vendor_requires_vendor_name() {
        let details = extract(json!({ "VendorAddress": field("2 Side Rd", 0.9) }));
        assert!(details.vendor.is_none());
    }

    #[test]
    fn test_no_items_field_gives_zero_line_item_confidence() {
        let details = extract(json!({ "CustomerName": field("Acme", 0.9) }));
        assert!(details.line_items.is_empty());
        assert_eq!(details.confidence.line_items, 0.0);
    }

    #[test]
    fn test_line_items_from_sdk_shape() {
        let details = extract(json!({
            "Items": { "values": [
                { "properties": {
                    "Description": field("Widget", 0.9),
                    "ProductCode": field("W-1", 0.8),
                    "Quantity": field("2", 0.7),
                    "Unit": field("ea", 0.9),
                    "UnitPrice": field("$10.00", 0.9),
                    "Amount": field("$20.00", 0.9),
                }},
                { "properties": {
                    "ProductDescription": field("Gadget", 0.6),
                    "ItemCode": field("G-2", 0.5),
                    "Quantity": field("abc", 0.4),
                }},
            ]}
        }));

        assert_eq!(details.line_items.len(), 2);
        let first = &details.line_items[0];
        assert_eq!(first.line_number, 1);
        assert_eq!(first.description, "Widget");
        assert_eq!(first.product_code.as_deref(), Some("W-1"));
        assert_eq!(first.quantity, 2.0);
        assert_eq!(first.unit.as_deref(), Some("ea"));
        assert_eq!(first.unit_price, Some(10.0));
        assert_eq!(first.total_price, Some(20.0));
        assert!((first.confidence - 0.8).abs() < 1e-12);

        let second = &details.line_items[1];
        assert_eq!(second.line_number, 2);
        assert_eq!(second.description, "Gadget");
        assert_eq!(second.product_code.as_deref(), Some("G-2"));
        assert_eq!(second.quantity, 1.0);
        assert_eq!(second.unit_price, None);
        assert_eq!(second.total_price, None);
        // Only Quantity is a scored field here; ProductDescription and ItemCode are not
        assert!((second.confidence - 0.4).abs() < 1e-12);

        let expected = (first.confidence + second.confidence) / 2.0;
        assert!((details.confidence.line_items - expected).abs() < 1e-12);
    }

    #[test]
    fn test_line_items_from_rest_shape() {
        let details = extract(json!({
            "Items": { "type": "array", "valueArray": [
                { "type": "object", "valueObject": {
                    "Item": field("Bolt", 0.9),
                    "Code": field("B-7", 0.9),
                }},
            ]}
        }));
        let item = &details.line_items[0];
        assert_eq!(item.description, "Bolt");
        assert_eq!(item.product_code.as_deref(), Some("B-7"));
        // No Description/Quantity/ProductCode confidence: neutral prior
        assert_eq!(item.confidence, 0.5);
    }

    #[test]
    fn test_item_without_properties_uses_defaults() {
        let details = extract(json!({ "Items": { "values": [ {} ] } }));
        let item = &details.line_items[0];
        assert_eq!(item.description, "");
        assert_eq!(item.quantity, 1.0);
        assert!(item.product_code.is_none());
        assert_eq!(item.confidence, 0.5);
    }

    #[test]
    fn test_line_numbers_follow_provider_order() {
        let details = extract(json!({
            "Items": { "values": [
                { "properties": { "Description": field("zeta", 0.5) } },
                { "properties": { "Description": field("alpha", 0.5) } },
                { "properties": { "Description": field("mu", 0.5) } },
            ]}
        }));
        let names: Vec<(u32, &str)> = details
            .line_items
            .iter()
            .map(|i| (i.line_number, i.description.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "zeta"), (2, "alpha"), (3, "mu")]);
    }

    #[test]
    fn test_totals_default_to_zero_when_unparseable() {
        let details = extract(json!({
            "SubTotal": field("$1,234.56 USD", 0.9),
            "TotalTax": field("n/a", 0.6),
            "InvoiceTotal": { "confidence": 0.3 },
        }));
        assert_eq!(details.subtotal, Some(1234.56));
        assert_eq!(details.tax, Some(0.0));
        assert_eq!(details.total, Some(0.0));
        assert!((details.confidence.totals - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_absent_totals_stay_absent() {
        let details = extract(json!({ "CustomerName": field("Acme", 0.9) }));
        assert!(details.subtotal.is_none());
        assert!(details.tax.is_none());
        assert!(details.total.is_none());
        assert_eq!(details.confidence.totals, 0.0);
    }

    #[test]
    fn test_overall_uses_weights() {
        let details = extract(json!({
            "CustomerName": field("Acme", 0.9),
            "Items": { "values": [
                { "properties": { "Description": field("Widget", 0.7) } },
            ]},
            "InvoiceTotal": field("10", 0.5),
        }));
        let c = &details.confidence;
        assert_eq!(c.overall, c.customer_info * 0.2 + c.line_items * 0.6 + c.totals * 0.2);
    }

    #[test]
    fn test_confidences_stay_in_unit_interval() {
        let details = extract(json!({
            "CustomerName": field("A", 1.0),
            "CustomerAddress": field("B", 1.0),
            "Items": { "values": [
                { "properties": {
                    "Description": field("x", 1.0),
                    "Quantity": field("1", 1.0),
                    "ProductCode": field("p", 1.0),
                }},
            ]},
            "SubTotal": field("1", 1.0),
            "TotalTax": field("1", 1.0),
            "InvoiceTotal": field("1", 1.0),
        }));
        let c = details.confidence;
        for score in [c.overall, c.customer_info, c.line_items, c.totals] {
            assert!((0.0..=1.0 + 1e-12).contains(&score));
        }
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let bag = FieldBag::from_analyze_result(&result_with(json!({
            "PaymentTerm": field("Net 30", 0.9),
            "CustomerName": field("Acme", 0.9),
        })))
        .unwrap();
        assert!(bag.get(DocumentField::CustomerName).is_some());
        assert_eq!(bag.items(), None);
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in DocumentField::all() {
            assert_eq!(DocumentField::from_name(field.as_str()), Some(*field));
        }
        for field in ItemField::all() {
            assert_eq!(ItemField::from_name(field.as_str()), Some(*field));
        }
        assert_eq!(DocumentField::from_name("Items"), None);
    }
}
