use crate::aggregate::KpiSnapshot;
use crate::error::{QualityCostError, Result};
use crate::util::format_currency;
use chrono::Local;
use log::info;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::image_crate::ImageDecoder;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Fixed name of the exported report file.
pub const REPORT_FILE_NAME: &str = "Monthly_Quality_Report.pdf";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const CHART_WIDTH_MM: f32 = 160.0;
const BODY_WRAP_COLUMNS: usize = 92;

/// Assembles the monthly report PDF from the KPI snapshot, the previously
/// generated insight text and the previously rasterized KPI chart image.
///
/// Both artifacts must already exist: an absent insight or chart is a
/// missing-prerequisite error directing the user to the step that produces
/// it, and no bytes are produced. Currency symbols are substituted with an
/// ASCII-safe equivalent before embedding; the built-in document font does
/// not cover them.
pub fn build_report(
    kpis: &KpiSnapshot,
    insight: Option<&str>,
    chart_image: Option<&Path>,
) -> Result<Vec<u8>> {
    let insight = insight.ok_or_else(|| {
        QualityCostError::MissingPrerequisite(
            "generate the monthly report text before exporting".to_string(),
        )
    })?;
    let chart_path = chart_image.ok_or_else(|| {
        QualityCostError::MissingPrerequisite(
            "visit the dashboard view first so the KPI chart is rendered".to_string(),
        )
    })?;
    if !chart_path.exists() {
        return Err(QualityCostError::MissingPrerequisite(format!(
            "KPI chart image {} not found; visit the dashboard view first",
            chart_path.display()
        )));
    }

    let (doc, page, layer) = PdfDocument::new(
        "Monthly Quality Performance Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(report_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(report_err)?;

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT_MM - MARGIN_MM,
    };

    cursor.centered_line("Monthly Quality Performance Report", &bold, 16.0, 12.0);
    cursor.advance(4.0);

    let today = Local::now().format("%B %Y").to_string();
    cursor.line(&format!("Date: {}", today), &regular, 12.0, 8.0);
    cursor.advance(3.0);

    cursor.line(
        &format!("COGQ: Rs.{}", format_currency(kpis.cogq)),
        &regular,
        12.0,
        7.0,
    );
    cursor.line(
        &format!("COPQ: Rs.{}", format_currency(kpis.copq)),
        &regular,
        12.0,
        7.0,
    );
    cursor.line(
        &format!("Total Cost: Rs.{}", format_currency(kpis.total)),
        &regular,
        12.0,
        7.0,
    );
    cursor.advance(4.0);

    cursor.line("KPI Comparison Chart:", &bold, 13.0, 9.0);
    embed_chart(&mut cursor, chart_path)?;
    cursor.advance(6.0);

    cursor.line("AI-Generated Insights:", &bold, 13.0, 9.0);
    let safe_insight = sanitize_for_font(insight);
    for paragraph in safe_insight.lines() {
        if paragraph.trim().is_empty() {
            cursor.advance(4.0);
            continue;
        }
        for line in wrap_text(paragraph, BODY_WRAP_COLUMNS) {
            cursor.line(&line, &regular, 12.0, 6.0);
        }
    }
    cursor.advance(5.0);

    cursor.centered_line(
        "Generated by Smart Quality Cost Monitoring Dashboard",
        &regular,
        11.0,
        6.0,
    );

    let mut bytes: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut bytes);
        doc.save(&mut writer).map_err(report_err)?;
    }
    info!("assembled report PDF ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Substitutes glyphs the built-in fonts cannot render: the rupee sign
/// becomes `Rs.` and other characters outside Latin-1 are downgraded to
/// their closest ASCII stand-in.
pub fn sanitize_for_font(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.replace('₹', "Rs.").chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('-'),
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor<'_> {
    fn ensure(&mut self, needed: f32) {
        if self.y - needed < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn line(&mut self, text: &str, font: &IndirectFontRef, size: f32, advance: f32) {
        self.ensure(advance);
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= advance;
    }

    fn centered_line(&mut self, text: &str, font: &IndirectFontRef, size: f32, advance: f32) {
        self.ensure(advance);
        let x = ((PAGE_WIDTH_MM - approx_text_width_mm(text, size)) / 2.0).max(MARGIN_MM);
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= advance;
    }

    fn advance(&mut self, amount: f32) {
        self.y -= amount;
    }
}

fn embed_chart(cursor: &mut PageCursor<'_>, chart_path: &Path) -> Result<()> {
    let file = File::open(chart_path)?;
    let mut reader = BufReader::new(file);
    let decoder = PngDecoder::new(&mut reader).map_err(report_err)?;
    let (px_width, px_height) = decoder.dimensions();
    let image = Image::try_from(decoder).map_err(report_err)?;

    // Scale the bitmap so it spans CHART_WIDTH_MM on the page.
    let dpi = px_width as f32 * 25.4 / CHART_WIDTH_MM;
    let height_mm = px_height as f32 * 25.4 / dpi;

    cursor.ensure(height_mm + 4.0);
    image.add_to_layer(
        cursor.layer.clone(),
        ImageTransform {
            translate_x: Some(Mm((PAGE_WIDTH_MM - CHART_WIDTH_MM) / 2.0)),
            translate_y: Some(Mm(cursor.y - height_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    cursor.y -= height_mm + 4.0;
    Ok(())
}

/// Greedy word wrap to a fixed column width; words longer than the width
/// get a line of their own.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn approx_text_width_mm(text: &str, font_size_pt: f32) -> f32 {
    // Helvetica averages roughly half an em per glyph; close enough for
    // centering headings.
    text.chars().count() as f32 * font_size_pt * 0.5 * 0.352_778
}

fn report_err<E: std::fmt::Display>(e: E) -> QualityCostError {
    QualityCostError::Report(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_kpis() -> KpiSnapshot {
        KpiSnapshot {
            cogq: 150.0,
            copq: 30.0,
            total: 180.0,
        }
    }

    #[test]
    fn test_missing_insight_is_a_prerequisite_error() {
        let err = build_report(&sample_kpis(), None, Some(Path::new("kpi_chart.png")))
            .unwrap_err();
        assert!(matches!(err, QualityCostError::MissingPrerequisite(_)));
    }

    #[test]
    fn test_missing_chart_is_a_prerequisite_error() {
        let err = build_report(&sample_kpis(), Some("all good"), None).unwrap_err();
        assert!(matches!(err, QualityCostError::MissingPrerequisite(_)));

        let gone = std::env::temp_dir().join("qcm_report_no_such_chart.png");
        let err = build_report(&sample_kpis(), Some("all good"), Some(&gone)).unwrap_err();
        assert!(matches!(err, QualityCostError::MissingPrerequisite(_)));
    }

    #[test]
    fn test_sanitize_replaces_rupee_and_non_latin1() {
        assert_eq!(sanitize_for_font("COGQ: ₹150"), "COGQ: Rs.150");
        assert_eq!(sanitize_for_font("“smart” – fix"), "\"smart\" - fix");
        assert_eq!(sanitize_for_font("• bullet"), "- bullet");
        assert_eq!(sanitize_for_font("漢"), "?");
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let wrapped = wrap_text("improve prevention training to lower failure cost", 20);
        assert!(wrapped.iter().all(|l| l.len() <= 20));
        assert_eq!(
            wrapped.join(" "),
            "improve prevention training to lower failure cost"
        );
    }
}
