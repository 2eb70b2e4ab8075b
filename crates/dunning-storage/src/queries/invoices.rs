// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counterparties and the overdue-invoice queries.

use chrono::NaiveDate;
use dunning_core::{
    DunningError, Invoice, InvoiceKind, InvoiceStatus, Recipient, RecipientType, TenantId,
};
use rust_decimal::Decimal;
use rusqlite::params;

use crate::database::{Database, get_parsed, map_tr_err};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inserts or updates a retailer (sales counterparty) or vendor (purchase
/// counterparty).
pub async fn upsert_counterparty(
    db: &Database,
    tenant_id: &TenantId,
    recipient: &Recipient,
) -> Result<(), DunningError> {
    let sql = match recipient.recipient_type {
        RecipientType::Retailer => {
            "INSERT INTO retailers (id, tenant_id, name, phone) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, phone = excluded.phone"
        }
        RecipientType::Vendor => {
            "INSERT INTO vendors (id, tenant_id, name, phone) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, phone = excluded.phone"
        }
    };
    let tenant_id = tenant_id.0.clone();
    let recipient = recipient.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                sql,
                params![recipient.id, tenant_id, recipient.name, recipient.phone],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts an invoice row. The counterparty must already exist.
pub async fn insert_invoice(
    db: &Database,
    tenant_id: &TenantId,
    invoice: &Invoice,
    total_amount: Decimal,
) -> Result<(), DunningError> {
    let sql = match invoice.kind {
        InvoiceKind::Sales => {
            "INSERT INTO sales_invoices (id, tenant_id, retailer_id, invoice_number,
                 invoice_date, status, total_amount, balance_due)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        }
        InvoiceKind::Purchase => {
            "INSERT INTO purchase_invoices (id, tenant_id, vendor_id, invoice_number,
                 invoice_date, status, total_amount, amount_due)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        }
    };
    let tenant_id = tenant_id.0.clone();
    let invoice = invoice.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                sql,
                params![
                    invoice.id,
                    tenant_id,
                    invoice.recipient.id,
                    invoice.invoice_number,
                    invoice.invoice_date.format(DATE_FORMAT).to_string(),
                    invoice.status.to_string(),
                    total_amount.to_string(),
                    invoice.outstanding_amount.to_string(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Overdue sales invoices, oldest first, uncapped.
pub async fn overdue_sales(
    db: &Database,
    tenant_id: &TenantId,
    before: NaiveDate,
) -> Result<Vec<Invoice>, DunningError> {
    overdue(
        db,
        tenant_id,
        before,
        InvoiceKind::Sales,
        "SELECT i.id, i.invoice_number, i.invoice_date, i.status, i.balance_due,
                r.id, r.name, r.phone
         FROM sales_invoices i
         JOIN retailers r ON r.id = i.retailer_id
         WHERE i.tenant_id = ?1
           AND i.status IN ('unpaid', 'partially_paid')
           AND CAST(i.balance_due AS REAL) > 0
           AND i.invoice_date < ?2
         ORDER BY i.invoice_date ASC, i.invoice_number ASC, i.id ASC",
    )
    .await
}

/// Overdue purchase invoices, oldest first, uncapped.
pub async fn overdue_purchases(
    db: &Database,
    tenant_id: &TenantId,
    before: NaiveDate,
) -> Result<Vec<Invoice>, DunningError> {
    overdue(
        db,
        tenant_id,
        before,
        InvoiceKind::Purchase,
        "SELECT i.id, i.invoice_number, i.invoice_date, i.status, i.amount_due,
                v.id, v.name, v.phone
         FROM purchase_invoices i
         JOIN vendors v ON v.id = i.vendor_id
         WHERE i.tenant_id = ?1
           AND i.status IN ('unpaid', 'partially_paid')
           AND CAST(i.amount_due AS REAL) > 0
           AND i.invoice_date < ?2
         ORDER BY i.invoice_date ASC, i.invoice_number ASC, i.id ASC",
    )
    .await
}

async fn overdue(
    db: &Database,
    tenant_id: &TenantId,
    before: NaiveDate,
    kind: InvoiceKind,
    sql: &'static str,
) -> Result<Vec<Invoice>, DunningError> {
    let tenant_id = tenant_id.0.clone();
    let before = before.format(DATE_FORMAT).to_string();
    let recipient_type = match kind {
        InvoiceKind::Sales => RecipientType::Retailer,
        InvoiceKind::Purchase => RecipientType::Vendor,
    };
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(sql)?;
            let invoices = stmt
                .query_map(params![tenant_id, before], |row| {
                    Ok(Invoice {
                        id: row.get(0)?,
                        kind,
                        invoice_number: row.get(1)?,
                        invoice_date: get_parsed::<NaiveDate>(row, 2)?,
                        status: get_parsed::<InvoiceStatus>(row, 3)?,
                        outstanding_amount: get_parsed::<Decimal>(row, 4)?,
                        recipient: Recipient {
                            recipient_type,
                            id: row.get(5)?,
                            name: row.get(6)?,
                            phone: row.get(7)?,
                        },
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(invoices)
        })
        .await
        .map_err(map_tr_err)
}
