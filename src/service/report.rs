use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use std::fmt::Write as _;

use crate::db::models::{Entry, Payment};
use crate::error::LedgerError;
use crate::service::summary::MonthlySummary;
use crate::types::Month;

pub const REPORT_TITLE: &str = "Milk Ledger";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_X: f32 = 15.0;
const BOTTOM: f32 = 20.0;
const ROW_H: f32 = 6.0;

/// Everything needed to render one month, for either the PDF or the share text.
#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub month: Month,
    pub summary: MonthlySummary,
    pub entries: Vec<Entry>,
}

impl MonthlyReport {
    pub fn new(month: Month, entries: Vec<Entry>, payments: &[Payment]) -> Self {
        let summary = MonthlySummary::compute(&entries, payments);
        Self {
            month,
            summary,
            entries,
        }
    }

    pub fn filename(&self) -> String {
        format!("Milk_Report_{}.pdf", self.month)
    }

    /// Plain-text message suitable for a chat app.
    pub fn share_text(&self) -> String {
        let s = &self.summary;
        let mut text = String::new();
        let _ = writeln!(text, "*🥛 {REPORT_TITLE} - {} Report*", self.month.label());
        text.push('\n');
        text.push_str("*📊 SUMMARY*\n");
        text.push_str("--------------------------\n");
        let _ = writeln!(text, "Total Liters: {:.2} L", s.total_liters);
        let _ = writeln!(text, "Total Amount: ₹{:.2}", s.total_amount);
        let _ = writeln!(text, "Paid Amount: ₹{:.2}", s.paid_amount);
        let _ = writeln!(text, "*Balance Due: ₹{:.2}*", s.balance);
        text.push('\n');
        text.push_str("*📅 DAILY ENTRIES*\n");
        text.push_str("--------------------------\n");

        if self.entries.is_empty() {
            text.push_str("No entries found.\n");
        }
        for e in &self.entries {
            let _ = writeln!(
                text,
                "{}: {}L x ₹{} = ₹{:.1}",
                e.date.format("%d %b"),
                e.quantity,
                e.rate,
                e.amount()
            );
        }

        let _ = write!(text, "\n_Generated via {REPORT_TITLE}_");
        text
    }

    /// `wa.me` link carrying the share text.
    pub fn share_url(&self) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(self.share_text().as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        format!("https://wa.me/?text={encoded}")
    }

    /// Render an A4 report: summary table, then one row per entry.
    pub fn to_pdf(&self) -> Result<Vec<u8>, LedgerError> {
        let (doc, page, layer) = PdfDocument::new(
            format!("{REPORT_TITLE} - {}", self.month.label()),
            Mm(PAGE_W),
            Mm(PAGE_H),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| LedgerError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| LedgerError::Pdf(e.to_string()))?;

        let mut pen = Pen {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: 280.0,
        };

        pen.text(&bold, REPORT_TITLE, 20.0, MARGIN_X);
        pen.y -= 10.0;
        pen.text(
            &font,
            &format!("Monthly Report: {}", self.month.label()),
            12.0,
            MARGIN_X,
        );
        pen.y -= 12.0;

        let s = &self.summary;
        pen.row(&bold, &[("Description", MARGIN_X), ("Value", 110.0)]);
        pen.rule();
        let summary_rows = [
            ("Total Liters", format!("{:.2} L", s.total_liters)),
            ("Total Amount", format!("Rs. {:.2}", s.total_amount)),
            ("Paid Amount", format!("Rs. {:.2}", s.paid_amount)),
            ("Remaining Balance", format!("Rs. {:.2}", s.balance)),
        ];
        for (label, value) in &summary_rows {
            pen.row(&font, &[(*label, MARGIN_X), (value.as_str(), 110.0)]);
        }

        pen.y -= 10.0;
        pen.text(&bold, "Daily Entries", 12.0, MARGIN_X);
        pen.y -= 8.0;

        let columns = [MARGIN_X, 70.0, 110.0, 150.0];
        let header = ["Date", "Quantity", "Rate", "Total"];
        let header_cells: Vec<_> = header.iter().copied().zip(columns).collect();
        pen.row(&bold, &header_cells);
        pen.rule();

        for e in &self.entries {
            if pen.y < BOTTOM {
                pen.new_page();
                pen.row(&bold, &header_cells);
                pen.rule();
            }
            let cells = [
                e.date.format("%d %b %Y").to_string(),
                format!("{} L", e.quantity),
                format!("Rs. {}", e.rate),
                format!("Rs. {:.2}", e.amount()),
            ];
            let cells: Vec<_> = cells
                .iter()
                .map(String::as_str)
                .zip(columns)
                .collect();
            pen.row(&font, &cells);
        }
        if self.entries.is_empty() {
            pen.row(&font, &[("No entries found.", MARGIN_X)]);
        }

        doc.save_to_bytes()
            .map_err(|e| LedgerError::Pdf(e.to_string()))
    }
}

/// Cursor over the current page.
struct Pen<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Pen<'_> {
    fn text(&self, font: &IndirectFontRef, text: &str, size: f32, x: f32) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn row(&mut self, font: &IndirectFontRef, cells: &[(&str, f32)]) {
        for (text, x) in cells {
            self.text(font, text, 10.0, *x);
        }
        self.y -= ROW_H;
    }

    fn rule(&mut self) {
        let y = self.y + ROW_H - 2.0;
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_X), Mm(y)), false),
                (Point::new(Mm(PAGE_W - MARGIN_X), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - 20.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march() -> MonthlyReport {
        let entries = vec![
            Entry {
                id: 1,
                date: "2024-03-01".parse().unwrap(),
                quantity: 1.0,
                rate: 60.0,
            },
            Entry {
                id: 2,
                date: "2024-03-02".parse().unwrap(),
                quantity: 2.5,
                rate: 60.0,
            },
        ];
        let payments = [Payment {
            id: 1,
            date: "2024-03-01".parse().unwrap(),
            amount: 100.0,
        }];
        MonthlyReport::new("2024-03".parse().unwrap(), entries, &payments)
    }

    #[test]
    fn share_text_lists_summary_and_days() {
        let text = march().share_text();
        assert!(text.starts_with("*🥛 Milk Ledger - March 2024 Report*"));
        assert!(text.contains("Total Liters: 3.50 L\n"));
        assert!(text.contains("Total Amount: ₹210.00\n"));
        assert!(text.contains("Paid Amount: ₹100.00\n"));
        assert!(text.contains("*Balance Due: ₹110.00*\n"));
        assert!(text.contains("01 Mar: 1L x ₹60 = ₹60.0\n"));
        assert!(text.contains("02 Mar: 2.5L x ₹60 = ₹150.0\n"));
        assert!(text.ends_with("_Generated via Milk Ledger_"));
    }

    #[test]
    fn empty_month_says_so() {
        let report = MonthlyReport::new("2024-04".parse().unwrap(), Vec::new(), &[]);
        assert!(report.share_text().contains("No entries found.\n"));
        assert_eq!(report.filename(), "Milk_Report_2024-04.pdf");
    }

    #[test]
    fn share_url_is_fully_encoded() {
        let url = march().share_url();
        assert!(url.starts_with("https://wa.me/?text="));
        assert!(!url.contains(' '));
        assert!(!url.contains('+'));
        assert!(!url.contains('\n'));
    }

    #[test]
    fn pdf_output_is_a_pdf() {
        let bytes = march().to_pdf().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_months_paginate() {
        let month: Month = "2024-01".parse().unwrap();
        let entries = month
            .days()
            .chain(month.next().days())
            .enumerate()
            .map(|(i, date)| Entry {
                id: i as i64,
                date,
                quantity: 1.0,
                rate: 60.0,
            })
            .collect();
        let report = MonthlyReport::new(month, entries, &[]);
        assert!(report.to_pdf().unwrap().starts_with(b"%PDF"));
    }
}
