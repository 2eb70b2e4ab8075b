// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message type selection and numbered template variables.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use dunning_core::{Invoice, InvoiceKind, MessageType};

const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Sales invoices remind the retailer to pay; purchase invoices notify the vendor.
pub fn message_type_for(kind: InvoiceKind) -> MessageType {
    match kind {
        InvoiceKind::Sales => MessageType::PaymentReminder,
        InvoiceKind::Purchase => MessageType::PaymentNotification,
    }
}

/// Value written to the attempt's `reference_type`.
pub fn reference_type_for(kind: InvoiceKind) -> &'static str {
    match kind {
        InvoiceKind::Sales => "sales_invoice",
        InvoiceKind::Purchase => "purchase_invoice",
    }
}

/// Variables `1`..`6`: recipient, invoice number, amount, invoice date, days
/// overdue, tenant name.
pub fn template_variables(
    tenant_name: &str,
    invoice: &Invoice,
    today: NaiveDate,
) -> BTreeMap<String, String> {
    let days_overdue = (today - invoice.invoice_date).num_days().max(0);
    let amount = invoice.outstanding_amount.round_dp(2);

    BTreeMap::from([
        ("1".to_string(), invoice.recipient.name.clone()),
        ("2".to_string(), invoice.invoice_number.clone()),
        ("3".to_string(), format!("{amount:.2}")),
        (
            "4".to_string(),
            invoice.invoice_date.format(DISPLAY_DATE_FORMAT).to_string(),
        ),
        ("5".to_string(), days_overdue.to_string()),
        ("6".to_string(), tenant_name.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dunning_core::{InvoiceStatus, Recipient, RecipientType};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn invoice(amount: &str) -> Invoice {
        Invoice {
            id: "inv-7".into(),
            kind: InvoiceKind::Sales,
            invoice_number: "S-0007".into(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            status: InvoiceStatus::PartiallyPaid,
            outstanding_amount: Decimal::from_str(amount).unwrap(),
            recipient: Recipient {
                recipient_type: RecipientType::Retailer,
                id: "r1".into(),
                name: "Corner Shop".into(),
                phone: Some("9876543210".into()),
            },
        }
    }

    #[test]
    fn renders_all_six_variables() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let vars = template_variables("Acme Traders", &invoice("1234.5"), today);

        assert_eq!(vars.len(), 6);
        assert_eq!(vars["1"], "Corner Shop");
        assert_eq!(vars["2"], "S-0007");
        assert_eq!(vars["3"], "1234.50");
        assert_eq!(vars["4"], "20-02-2026");
        assert_eq!(vars["5"], "18");
        assert_eq!(vars["6"], "Acme Traders");
    }

    #[test]
    fn whole_amounts_get_two_decimals() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let vars = template_variables("Acme", &invoice("10"), today);
        assert_eq!(vars["3"], "10.00");
    }

    #[test]
    fn kinds_map_to_message_and_reference_types() {
        assert_eq!(message_type_for(InvoiceKind::Sales), MessageType::PaymentReminder);
        assert_eq!(
            message_type_for(InvoiceKind::Purchase),
            MessageType::PaymentNotification
        );
        assert_eq!(reference_type_for(InvoiceKind::Purchase), "purchase_invoice");
    }
}
