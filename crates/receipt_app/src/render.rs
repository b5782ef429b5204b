use std::fmt::Write as _;

use chrono::{DateTime, Local};
use receipt_core::{
    format_money, PreviewView, QrModalView, QrVariant, ScannerView, TokenPreview, TokenStatus,
    ViewState,
};

pub fn render_qr(view: &QrModalView) -> String {
    if !view.open {
        return String::new();
    }
    match &view.state {
        ViewState::Idle => "No receipt token to show.\n".to_string(),
        ViewState::Loading => match view.variant {
            QrVariant::Plain => "Generating QR code…\n".to_string(),
            QrVariant::Branded => "Composing branded QR code…\n".to_string(),
        },
        ViewState::Ready(image) => format!("{}\n{}\n", image.terminal, image.link),
        ViewState::Error { message, fallback } => format!(
            "Could not generate QR code: {message}\nOpen the receipt directly: {fallback}\n"
        ),
    }
}

pub fn render_preview(view: &PreviewView) -> String {
    match &view.state {
        ViewState::Idle => String::new(),
        ViewState::Loading => "Loading receipt…\n".to_string(),
        ViewState::Ready(preview) => render_receipt(preview),
        ViewState::Error { message, .. } => {
            format!("Could not load receipt: {message}\nTry again later.\n")
        }
    }
}

pub fn render_scanner(view: &ScannerView) -> String {
    match (&view.error, &view.handled) {
        (Some(error), _) => format!("{error}. Scan a receipt QR code.\n"),
        (None, Some(token)) => format!("Found receipt token {token}.\n"),
        (None, None) => String::new(),
    }
}

fn render_receipt(preview: &TokenPreview) -> String {
    let receipt = &preview.receipt;
    let mut out = String::new();
    let _ = writeln!(out, "Receipt from {}", receipt.retailer_id);
    if let Some(store) = &receipt.store_id {
        let _ = writeln!(out, "Store: {store}");
    }
    let _ = writeln!(out, "Issued: {}", format_timestamp(&receipt.issued_at));
    match preview.token.status {
        TokenStatus::Active => {
            let _ = writeln!(out, "Token: active");
        }
        TokenStatus::Consumed => {
            let when = preview
                .token
                .consumed_at
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "unknown time".to_string());
            let _ = writeln!(out, "Token: consumed at {when}");
        }
    }
    out.push('\n');

    let mut items: Vec<_> = receipt.items.iter().collect();
    items.sort_by_key(|item| item.line_no);
    for item in items {
        let _ = writeln!(
            out,
            "{:>3}. {:<28} {:>6} x {:>10} = {:>12}",
            item.line_no,
            item.name,
            format_qty(item.qty),
            format_money(item.unit_price, &receipt.currency),
            format_money(item.line_total, &receipt.currency),
        );
        if let (Some(rate), Some(amount)) = (item.vat_rate, item.vat_amount) {
            let _ = writeln!(
                out,
                "     VAT {}% {}",
                format_qty(rate),
                format_money(amount, &receipt.currency)
            );
        }
    }

    out.push('\n');
    let _ = writeln!(out, "Subtotal: {}", format_money(receipt.subtotal, &receipt.currency));
    let _ = writeln!(out, "VAT:      {}", format_money(receipt.vat_total, &receipt.currency));
    let _ = writeln!(out, "Total:    {}", format_money(receipt.total, &receipt.currency));
    out
}

fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Whole quantities print without decimals.
fn format_qty(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{qty:.0}")
    } else {
        format!("{qty}")
    }
}
