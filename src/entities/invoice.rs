use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Client,
    endpoints::LexofficeEndpoint,
    entities::ResourceReference,
    error::{ErrorResponse, Result},
    utils::date_format::lexoffice_datetime_format_option,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Draft,
    Open,
    Paid,
    Voided,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemType {
    Custom,
    Material,
    Service,
    Text,
}

/// The recipient of an invoice: either an existing contact (`contact_id`) or an
/// address given inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPrice {
    pub currency: String,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub net_amount: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub gross_amount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_rate_percentage: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub r#type: LineItemType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<UnitPrice>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount_percentage: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_item_amount: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPrice {
    pub currency: String,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_net_amount: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_gross_amount: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_tax_amount: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_discount_absolute: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::arbitrary_precision_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_discount_percentage: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxAmount {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_rate_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxConditions {
    /// e.g. `net`, `gross`, `vatfree`, `intraCommunitySupply`
    pub tax_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_type_note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDiscountConditions {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub discount_percentage: Decimal,
    pub discount_range: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_term_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_term_duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_discount_conditions: Option<PaymentDiscountConditions>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingConditions {
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping_date: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping_end_date: Option<OffsetDateTime>,
    /// e.g. `service`, `delivery`, `none`
    pub shipping_type: String,
}

/// An invoice. Read-only fields (`id`, `version`, totals computed by lexoffice, ...)
/// are optional so the same type can be sent to create one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_date: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_status: Option<VoucherStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_number: Option<String>,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub voucher_date: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub total_price: TotalPrice,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tax_amounts: Vec<TaxAmount>,
    #[serde(default)]
    pub tax_conditions: TaxConditions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_conditions: Option<PaymentConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_conditions: Option<ShippingConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// What a new invoice is created from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvoiceSource {
    /// A full invoice sent as the request body.
    Body(Box<Invoice>),
    /// An existing sales voucher (e.g. an order confirmation) to pursue; no body is sent.
    PrecedingSalesVoucher(Uuid),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOptions {
    /// Create the invoice in status `open` instead of `draft`.
    pub finalize: bool,
    pub source: InvoiceSource,
}

impl CreateOptions {
    #[must_use]
    pub fn from_body(invoice: Invoice) -> Self {
        Self {
            finalize: false,
            source: InvoiceSource::Body(Box::new(invoice)),
        }
    }

    #[must_use]
    pub fn pursue(preceding_sales_voucher_id: Uuid) -> Self {
        Self {
            finalize: false,
            source: InvoiceSource::PrecedingSalesVoucher(preceding_sales_voucher_id),
        }
    }

    #[must_use]
    pub fn finalized(mut self) -> Self {
        self.finalize = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFileReference {
    pub document_file_id: Uuid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeeplinkKind {
    View,
    Edit,
}

impl DeeplinkKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

/// Get a single invoice by ID.
#[instrument(skip(client))]
pub async fn get(client: &Client, invoice_id: Uuid) -> Result<Invoice> {
    client
        .request(Method::GET, LexofficeEndpoint::Invoice(invoice_id))
        .fetch::<_, ErrorResponse>()
        .await
        .map_err(|e| e.context("error getting invoice"))
}

/// Create an invoice from a body, or pursue a preceding sales voucher to an invoice.
#[instrument(skip(client, options), fields(finalize = options.finalize))]
pub async fn create(client: &Client, options: CreateOptions) -> Result<ResourceReference> {
    let mut request = client.request(Method::POST, LexofficeEndpoint::Invoices);
    if options.finalize {
        request = request.param("finalize", true);
    }

    request = match &options.source {
        InvoiceSource::PrecedingSalesVoucher(id) => {
            request.param("precedingSalesVoucherId", id)
        }
        InvoiceSource::Body(invoice) => {
            trace!(json = ?serde_json::to_string(invoice).ok(), "creating invoice");
            request.json(invoice)
        }
    };

    request
        .fetch::<_, ErrorResponse>()
        .await
        .map_err(|e| e.context("error creating invoice"))
}

/// Render the invoice document (PDF). The returned file id can be passed to
/// [`crate::file::download`].
#[instrument(skip(client))]
pub async fn render_document(client: &Client, invoice_id: Uuid) -> Result<DocumentFileReference> {
    client
        .request(Method::GET, LexofficeEndpoint::InvoiceDocument(invoice_id))
        .fetch::<_, ErrorResponse>()
        .await
        .map_err(|e| e.context("error rendering invoice document"))
}

/// The URL that opens the invoice in the lexoffice web app. No request is made.
#[must_use]
pub fn deeplink_url(client: &Client, invoice_id: Uuid, kind: DeeplinkKind) -> String {
    format!(
        "{}/permalink/invoices/{}/{invoice_id}",
        client.base_url().as_str().trim_end_matches('/'),
        kind.as_str()
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn deserializes_invoice_with_exact_amounts() {
        let invoice: Invoice = serde_json::from_value(json!({
            "id": "e9066f04-8cc7-4616-93f8-ac9ecc8479c8",
            "version": 1,
            "voucherStatus": "open",
            "voucherNumber": "RE1019",
            "voucherDate": "2023-02-22T00:00:00.000+01:00",
            "address": { "contactId": "97c5794f-8ab2-43ad-b459-c5980b055e4d", "name": "Bike & Ride GmbH & Co. KG" },
            "lineItems": [{
                "type": "custom",
                "name": "Energieriegel Testpaket",
                "quantity": 1,
                "unitName": "Stück",
                "unitPrice": { "currency": "EUR", "netAmount": 5, "grossAmount": 5.95, "taxRatePercentage": 19 },
                "discountPercentage": 0,
                "lineItemAmount": 5.95
            }],
            "totalPrice": { "currency": "EUR", "totalNetAmount": 5, "totalGrossAmount": 5.95, "totalTaxAmount": 0.95 },
            "taxAmounts": [{ "taxRatePercentage": 19, "taxAmount": 0.95, "amount": 5.95 }],
            "taxConditions": { "taxType": "net" },
            "shippingConditions": { "shippingDate": "2023-04-22T00:00:00.000+02:00", "shippingType": "delivery" },
            "paymentConditions": {
                "paymentTermLabel": "10 Tage - 3 %, 30 Tage netto",
                "paymentTermDuration": 30,
                "paymentDiscountConditions": { "discountPercentage": 3, "discountRange": 10 }
            }
        }))
        .unwrap();

        assert_eq!(invoice.voucher_status, Some(VoucherStatus::Open));
        assert_eq!(invoice.voucher_date, Some(datetime!(2023-02-22 00:00:00 +01:00)));
        assert_eq!(invoice.total_price.total_gross_amount, Some(dec!(5.95)));
        assert_eq!(invoice.total_price.total_tax_amount, Some(dec!(0.95)));
        assert_eq!(invoice.line_items[0].r#type, LineItemType::Custom);
        assert_eq!(
            invoice.line_items[0].unit_price.as_ref().unwrap().gross_amount,
            Some(dec!(5.95))
        );
        assert_eq!(
            invoice
                .payment_conditions
                .unwrap()
                .payment_discount_conditions
                .unwrap()
                .discount_range,
            10
        );
    }

    #[test]
    fn amounts_keep_every_digit() {
        let total = TotalPrice {
            currency: "EUR".to_string(),
            total_net_amount: Some(dec!(12345678901234.5678)),
            ..TotalPrice::default()
        };

        let encoded = serde_json::to_string(&total).unwrap();
        assert_eq!(
            encoded,
            r#"{"currency":"EUR","totalNetAmount":12345678901234.5678}"#
        );

        let decoded: TotalPrice = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.total_net_amount, Some(dec!(12345678901234.5678)));

        let tax: TaxAmount = serde_json::from_str(
            r#"{"taxRatePercentage":19,"taxAmount":0.1234567890123456789,"amount":1}"#,
        )
        .unwrap();
        assert_eq!(tax.tax_amount, dec!(0.1234567890123456789));
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let status: VoucherStatus = serde_json::from_value(json!("sepadebit")).unwrap();
        assert_eq!(status, VoucherStatus::Unknown);
    }

    #[test]
    fn new_invoice_serializes_only_given_fields() {
        let invoice = Invoice {
            voucher_date: Some(datetime!(2023-02-22 00:00:00 +01:00)),
            address: Address {
                contact_id: Some(Uuid::nil()),
                ..Address::default()
            },
            line_items: vec![LineItem {
                id: None,
                r#type: LineItemType::Text,
                name: "Hinweis".to_string(),
                description: None,
                quantity: None,
                unit_name: None,
                unit_price: None,
                discount_percentage: None,
                line_item_amount: None,
            }],
            total_price: TotalPrice {
                currency: "EUR".to_string(),
                ..TotalPrice::default()
            },
            tax_conditions: TaxConditions {
                tax_type: "net".to_string(),
                tax_type_note: None,
            },
            ..Invoice::default()
        };

        assert_eq!(
            serde_json::to_value(&invoice).unwrap(),
            json!({
                "voucherDate": "2023-02-22T00:00:00.000+01:00",
                "address": { "contactId": "00000000-0000-0000-0000-000000000000" },
                "lineItems": [{ "type": "text", "name": "Hinweis" }],
                "totalPrice": { "currency": "EUR" },
                "taxConditions": { "taxType": "net" }
            })
        );
    }

    #[test]
    fn deeplinks_use_base_url() {
        let client = Client::new(
            "token",
            crate::ClientConfig::default().with_base_url("https://app.lexoffice.de/"),
        )
        .unwrap();
        let id = Uuid::parse_str("e9066f04-8cc7-4616-93f8-ac9ecc8479c8").unwrap();

        assert_eq!(
            deeplink_url(&client, id, DeeplinkKind::View),
            "https://app.lexoffice.de/permalink/invoices/view/e9066f04-8cc7-4616-93f8-ac9ecc8479c8"
        );
        assert_eq!(
            deeplink_url(&client, id, DeeplinkKind::Edit),
            "https://app.lexoffice.de/permalink/invoices/edit/e9066f04-8cc7-4616-93f8-ac9ecc8479c8"
        );
    }
}
