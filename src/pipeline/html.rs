//! Field mapping → styled HTML report.
//!
//! The page is laid out at exactly the output page width so the rasterised
//! bitmap maps one-to-one onto PDF pages. Rows whose value is empty or a
//! placeholder ("Not Specified", "N/A", ...) are omitted.

use crate::config::PageGeometry;
use crate::fields::{FieldMap, FieldValue};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Substrings (lower-case) that mark a value as a placeholder.
pub const HIDDEN_MARKERS: &[&str] = &["not specified", "n/a", "null", "undefined", "none"];

/// Required-documents text is cut to this many characters.
pub const REQUIRED_DOCS_LIMIT: usize = 400;

/// Whether a value is worth a table row.
///
/// Matching is by substring, so "None of the above" is hidden too.
pub fn should_show_value(value: Option<&FieldValue>) -> bool {
    match value {
        None => false,
        Some(v) if v.is_empty() => false,
        Some(v) => should_show_text(&v.display_text()),
    }
}

fn should_show_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    !lower.is_empty() && !HIDDEN_MARKERS.iter().any(|m| lower.contains(m))
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds the report document.
pub struct ReportHtml<'a> {
    data: &'a FieldMap,
    geometry: PageGeometry,
    background_png: Option<&'a [u8]>,
}

impl<'a> ReportHtml<'a> {
    pub fn new(data: &'a FieldMap, geometry: PageGeometry) -> Self {
        Self {
            data,
            geometry,
            background_png: None,
        }
    }

    /// Tile this PNG behind every page.
    pub fn background(mut self, png: Option<&'a [u8]>) -> Self {
        self.background_png = png;
        self
    }

    pub fn render(&self) -> String {
        let d = self.data;
        let mut body = String::new();

        body.push_str("<h1>Bid Analysis Report</h1>\n");
        let summary = d
            .get("Executive_Summary")
            .map(FieldValue::display_text)
            .unwrap_or_else(|| "N/A".to_string());
        body.push_str(&format!(
            "<div class=\"exec-summary\">\n<h4>Executive Summary</h4>\n<p>{}</p>\n</div>\n",
            escape_html(&summary)
        ));

        section(
            &mut body,
            "Basic Information",
            None,
            &[
                ("Tender Reference", d.get("Tender_Reference")),
                ("Issuing Authority", d.get("Issuing_Authority")),
                ("Project Name", d.get("Project_Name")),
                ("Location", d.get("Location")),
            ],
        );
        section(
            &mut body,
            "Project Details",
            None,
            &[
                ("Scope of Work", d.get("Scope_of_Work")),
                ("Contract Period", d.get("Contract_Period")),
                ("Technical Specifications", d.get("Technical_Specifications")),
            ],
        );
        section(
            &mut body,
            "Financials",
            Some(60),
            &[
                ("Estimated Value", d.get("Estimated_Value")),
                ("EMD Amount", d.get("EMD_Amount")),
                ("Tender Fee", d.get("Tender_Fee")),
                ("Payment Terms", d.get("Payment_Terms")),
            ],
        );

        let dates: Vec<(&str, Option<&FieldValue>)> = d
            .get("Important_Dates")
            .and_then(FieldValue::as_map)
            .map(|m| m.iter().map(|(k, v)| (k, Some(v))).collect())
            .unwrap_or_default();
        section(&mut body, "Important Dates", Some(80), &dates);

        let eligibility = d.get("Eligibility").and_then(FieldValue::as_map);
        let nested_or_top = |key: &str| match eligibility {
            Some(e) => e.get(key),
            None => d.get(key),
        };
        let docs = required_docs(d.get("Required_Documents"));
        section(
            &mut body,
            "Eligibility Criteria",
            Some(60),
            &[
                ("Min Turnover", nested_or_top("Min_Turnover")),
                ("Experience Required", nested_or_top("Experience_Required")),
                (
                    "Other Criteria",
                    eligibility.and_then(|e| e.get("Other_Eligibility_Criteria")),
                ),
                ("Required Docs", docs.as_ref()),
            ],
        );
        section(
            &mut body,
            "Submission Information",
            None,
            &[
                ("Submission Method", d.get("Submission_Method")),
                ("Contact Details", d.get("Contact_Details")),
            ],
        );

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{}</head>\n<body>\n<div class=\"page-container\">\n{}</div>\n</body>\n</html>\n",
            self.css(),
            body
        )
    }

    fn css(&self) -> String {
        let background = match self.background_png {
            Some(png) if !png.is_empty() => format!(
                "background-image: url('data:image/png;base64,{}');",
                STANDARD.encode(png)
            ),
            _ => "background-color: #ffffff;".to_string(),
        };
        let PageGeometry { width, height } = self.geometry;

        format!(
            r#"<style>
body {{ font-family: 'Segoe UI', Tahoma, sans-serif; margin: 0; padding: 0; background-color: #ffffff; }}
.page-container {{
    position: relative; width: {width}px; min-height: {height}px;
    {background}
    background-size: {width}px {height}px; background-repeat: repeat-y;
    box-sizing: border-box; padding: 100px 80px 60px 80px;
    display: flex; flex-direction: column;
}}
h1 {{ text-align: center; color: #1a202c; font-size: 3.5rem; margin: 0 0 40px 0; font-weight: 900;
     text-transform: uppercase; letter-spacing: 2px; text-shadow: 2px 2px 4px rgba(255,255,255,1); }}
.exec-summary {{ background: rgba(255,255,255,0.95); padding: 30px 35px; border-radius: 12px; margin-bottom: 35px;
                border-left: 8px solid #4c51bf; box-shadow: 0 4px 6px rgba(0,0,0,0.08); }}
.exec-summary h4 {{ color: #4c51bf; margin: 0 0 15px 0; font-size: 1.8rem; border-bottom: 2px solid #e2e8f0; padding-bottom: 10px; }}
.exec-summary p {{ font-size: 1.4rem; line-height: 1.6; color: #1a202c; font-weight: 500; margin: 0; }}
.section-header {{ color: #2c5282; font-size: 1.8rem; font-weight: 800; margin: 25px 0 15px 0;
                  border-bottom: 3px solid #aecdbf; padding-bottom: 8px; text-transform: uppercase; }}
table {{ width: 100%; border-collapse: separate; border-spacing: 0; margin-bottom: 20px; font-size: 1.4rem;
        border-radius: 8px; overflow: hidden; }}
th {{ background: #2d3748; color: white; padding: 18px 20px; text-align: left; font-weight: 700; width: 35%;
     border-bottom: 2px solid #ed8936; }}
td {{ background: rgba(255,255,255,0.95); color: #000; padding: 18px 20px; border-bottom: 2px solid #e2e8f0; font-weight: 500; }}
tr:last-child td {{ border-bottom: none; }}
</style>
"#
        )
    }
}

fn required_docs(value: Option<&FieldValue>) -> Option<FieldValue> {
    let value = value.filter(|v| !v.is_empty())?;
    let text = value.display_text();
    let cut: String = text.chars().take(REQUIRED_DOCS_LIMIT).collect();
    Some(FieldValue::Text(format!("{cut}...")))
}

fn section(out: &mut String, title: &str, margin_bottom: Option<u32>, rows: &[(&str, Option<&FieldValue>)]) {
    out.push_str(&format!("<div class=\"section-header\">{}</div>\n", escape_html(title)));
    match margin_bottom {
        Some(px) => out.push_str(&format!("<table style=\"margin-bottom: {px}px;\">\n")),
        None => out.push_str("<table>\n"),
    }
    out.push_str("<tr><th>Field</th><th>Value</th></tr>\n");
    for (label, value) in rows {
        if should_show_value(*value) {
            let text = value.map(FieldValue::display_text).unwrap_or_default();
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(label),
                escape_html(&text)
            ));
        }
    }
    out.push_str("</table>\n");
}
