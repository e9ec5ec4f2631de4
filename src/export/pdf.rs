//! A plain text PDF report of a user's transactions.
//!
//! The document is written directly as PDF 1.4 using the Helvetica base font,
//! so no font files are embedded. Text is encoded as WinAnsi, which covers
//! Latin-1.

use crate::transaction::{Transaction, format_day_month_year};

/// The title printed at the top of the first page.
pub const REPORT_TITLE: &str = "Transaction Report";

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const TITLE_FONT_SIZE: u32 = 18;
const BODY_FONT_SIZE: u32 = 12;
const LINE_HEIGHT: u32 = 16;
/// The title and the gap below it take up this many body lines.
const TITLE_LINES: usize = 2;

/// Lays out `transactions` as the lines of the report body.
///
/// Every transaction is a block of labelled lines followed by a blank line.
/// Empty optional fields are printed as "N/A".
pub fn report_lines(transactions: &[Transaction], currency_symbol: &str) -> Vec<String> {
    let or_not_available = |text: &str| {
        if text.is_empty() {
            "N/A".to_owned()
        } else {
            text.to_owned()
        }
    };

    let mut lines = Vec::with_capacity(transactions.len() * 10);

    for (index, transaction) in transactions.iter().enumerate() {
        lines.push(format!("Transaction {}:", index + 1));
        lines.push(format!("Type: {}", transaction.transaction_type));
        lines.push(format!("Category: {}", transaction.category));
        lines.push(format!("Amount: {currency_symbol}{}", transaction.amount));
        lines.push(format!("Date: {}", format_day_month_year(transaction.date)));
        lines.push(format!("Note: {}", or_not_available(&transaction.note)));
        lines.push(format!(
            "Payment Method: {}",
            or_not_available(&transaction.payment_method)
        ));
        lines.push(format!(
            "Recurring: {}",
            if transaction.recurring { "Yes" } else { "No" }
        ));
        lines.push(format!(
            "Recurrence Interval: {}",
            or_not_available(transaction.recurrence_interval.as_str())
        ));
        lines.push(String::new());
    }

    lines
}

/// Renders a PDF document with `title` followed by `lines`, adding pages as needed.
pub fn render_pdf(title: &str, lines: &[String]) -> Vec<u8> {
    let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT) as usize;

    let mut pages: Vec<&[String]> = Vec::new();
    let first_page_len = lines.len().min(lines_per_page - TITLE_LINES);
    pages.push(&lines[..first_page_len]);
    pages.extend(lines[first_page_len..].chunks(lines_per_page));

    let mut writer = PdfWriter::new();

    // Objects 1 to 3 are the catalog, page tree and font. Each page then
    // takes two objects, the page itself and its content stream.
    let page_ids: Vec<usize> = (0..pages.len()).map(|index| 4 + 2 * index).collect();

    writer.add_object(b"<< /Type /Catalog /Pages 2 0 R >>");

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    writer.add_object(
        format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            page_ids.len()
        )
        .as_bytes(),
    );

    writer.add_object(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (index, page_lines) in pages.iter().enumerate() {
        let content_id = page_ids[index] + 1;
        writer.add_object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .as_bytes(),
        );

        let page_title = if index == 0 { Some(title) } else { None };
        writer.add_stream(&page_content(page_title, page_lines));
    }

    writer.finish()
}

fn page_content(title: Option<&str>, lines: &[String]) -> Vec<u8> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut content = Vec::new();

    content.extend_from_slice(b"BT\n");

    if let Some(title) = title {
        content.extend_from_slice(
            format!("/F1 {TITLE_FONT_SIZE} Tf\n{MARGIN} {top} Td\n").as_bytes(),
        );
        push_text(&mut content, title);
        content.extend_from_slice(
            format!(
                "/F1 {BODY_FONT_SIZE} Tf\n0 -{} Td\n",
                LINE_HEIGHT as usize * TITLE_LINES
            )
            .as_bytes(),
        );
    } else {
        content.extend_from_slice(
            format!("/F1 {BODY_FONT_SIZE} Tf\n{MARGIN} {top} Td\n").as_bytes(),
        );
    }

    content.extend_from_slice(format!("{LINE_HEIGHT} TL\n").as_bytes());

    for line in lines {
        push_text(&mut content, line);
        content.extend_from_slice(b"T*\n");
    }

    content.extend_from_slice(b"ET\n");
    content
}

/// Appends a text show operator for `text` as a WinAnsi string literal.
fn push_text(content: &mut Vec<u8>, text: &str) {
    content.push(b'(');

    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                content.push(b'\\');
                content.push(c as u8);
            }
            '₹' => content.extend_from_slice(b"Rs."),
            c if c.is_control() => content.push(b' '),
            c if (c as u32) <= 0xFF => content.push(c as u32 as u8),
            _ => content.push(b'?'),
        }
    }

    content.extend_from_slice(b") Tj\n");
}

/// Writes numbered objects and the cross-reference table that indexes them.
struct PdfWriter {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"%PDF-1.4\n");
        // Binary marker so that tools treat the file as binary.
        buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        Self {
            buffer,
            offsets: Vec::new(),
        }
    }

    fn begin_object(&mut self) {
        self.offsets.push(self.buffer.len());
        let id = self.offsets.len();
        self.buffer
            .extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    }

    fn add_object(&mut self, body: &[u8]) {
        self.begin_object();
        self.buffer.extend_from_slice(body);
        self.buffer.extend_from_slice(b"\nendobj\n");
    }

    fn add_stream(&mut self, data: &[u8]) {
        self.begin_object();
        self.buffer
            .extend_from_slice(format!("<< /Length {} >>\nstream\n", data.len()).as_bytes());
        self.buffer.extend_from_slice(data);
        self.buffer.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buffer.len();
        let object_count = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {object_count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {object_count} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        ));

        self.buffer.extend_from_slice(xref.as_bytes());
        self.buffer
    }
}
