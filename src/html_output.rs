//! HTML output format for analysis reports
//!
//! Self-contained document: embedded CSS, styled tables and inline SVG for
//! the mpg-by-transmission boxplot and the four residual diagnostic plots.

use crate::diagnostics::{CookContour, Diagnostics};
use crate::pipeline::AnalysisReport;
use crate::summary::BoxplotStats;
use crate::text_output::format_p_value;

const PLOT_WIDTH: f64 = 420.0;
const PLOT_HEIGHT: f64 = 320.0;
const MARGIN: f64 = 48.0;
const TICKS: usize = 5;

/// Escape HTML special characters to prevent XSS
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate embedded CSS styles
fn generate_styles() -> &'static str {
    r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #f5f5f5;
        }
        h1, h2 {
            color: #333;
        }
        table {
            border-collapse: collapse;
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 6px 10px;
            text-align: right;
        }
        td.text, th.text {
            text-align: left;
        }
        th {
            background-color: #4a90d9;
            color: white;
            font-weight: bold;
        }
        tr:nth-child(even) {
            background-color: #f9f9f9;
        }
        tr.selected {
            background-color: #dff0d8;
            font-weight: bold;
        }
        .formula {
            font-family: monospace;
        }
        .plots {
            display: grid;
            grid-template-columns: repeat(2, max-content);
            gap: 12px;
        }
        svg {
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }
        svg text {
            font-size: 11px;
            fill: #333;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
        "#
}

/// Linear map from data space into the plot area
#[derive(Debug, Clone, Copy)]
struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (-1.0, 1.0);
    }
    if (max - min).abs() < 1e-12 {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

impl Frame {
    fn fit(points: &[(f64, f64)]) -> Self {
        let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
        let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn x(&self, v: f64) -> f64 {
        MARGIN + (v - self.x_min) / (self.x_max - self.x_min) * (PLOT_WIDTH - 1.5 * MARGIN)
    }

    fn y(&self, v: f64) -> f64 {
        PLOT_HEIGHT - MARGIN - (v - self.y_min) / (self.y_max - self.y_min) * (PLOT_HEIGHT - 1.5 * MARGIN)
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    /// Axes, ticks, labels and title
    fn axes(&self, title: &str, x_label: &str, y_label: &str, x_ticks: bool) -> String {
        let mut svg = String::new();
        let left = MARGIN;
        let bottom = PLOT_HEIGHT - MARGIN;
        let right = PLOT_WIDTH - MARGIN / 2.0;
        let top = MARGIN / 2.0;

        svg.push_str(&format!(
            r##"<rect x="{left:.1}" y="{top:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#999"/>"##,
            right - left,
            bottom - top
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="16" text-anchor="middle" font-weight="bold">{}</text>"#,
            PLOT_WIDTH / 2.0,
            escape_html(title)
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            (left + right) / 2.0,
            PLOT_HEIGHT - 8.0,
            escape_html(x_label)
        ));
        svg.push_str(&format!(
            r#"<text x="12" y="{:.1}" text-anchor="middle" transform="rotate(-90 12 {:.1})">{}</text>"#,
            (top + bottom) / 2.0,
            (top + bottom) / 2.0,
            escape_html(y_label)
        ));

        for i in 0..TICKS {
            let t = i as f64 / (TICKS - 1) as f64;
            let yv = self.y_min + t * (self.y_max - self.y_min);
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{:.1}</text>"#,
                left - 4.0,
                self.y(yv) + 4.0,
                yv
            ));
            if x_ticks {
                let xv = self.x_min + t * (self.x_max - self.x_min);
                svg.push_str(&format!(
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{:.2}</text>"#,
                    self.x(xv),
                    bottom + 14.0,
                    xv
                ));
            }
        }
        svg
    }

    fn line(&self, from: (f64, f64), to: (f64, f64), style: &str) -> String {
        format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" {}/>"#,
            self.x(from.0),
            self.y(from.1),
            self.x(to.0),
            self.y(to.1),
            style
        )
    }
}

fn svg_open() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PLOT_WIDTH}" height="{PLOT_HEIGHT}" viewBox="0 0 {PLOT_WIDTH} {PLOT_HEIGHT}">"#
    )
}

/// Side-by-side boxplots, one per group
pub fn boxplot_svg(boxplots: &[BoxplotStats]) -> String {
    let values: Vec<(f64, f64)> = boxplots
        .iter()
        .enumerate()
        .flat_map(|(i, b)| {
            [b.lower_whisker, b.upper_whisker]
                .into_iter()
                .chain(b.outliers.iter().copied())
                .map(move |v| (i as f64, v))
        })
        .collect();
    let (y_min, y_max) = padded_range(values.iter().map(|p| p.1));
    let frame = Frame {
        x_min: -0.5,
        x_max: boxplots.len() as f64 - 0.5,
        y_min,
        y_max,
    };

    let mut svg = svg_open();
    svg.push_str(&frame.axes("Fuel efficiency by transmission", "Transmission", "mpg", false));

    let box_half = 0.2;
    for (i, b) in boxplots.iter().enumerate() {
        let center = i as f64;
        let (left, right) = (center - box_half, center + box_half);
        let solid = r##"stroke="#333" stroke-width="1.5""##;
        let dashed = r##"stroke="#333" stroke-dasharray="4 3""##;

        svg.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="#cfe2f3" stroke="#333"/>"##,
            frame.x(left),
            frame.y(b.upper_hinge),
            frame.x(right) - frame.x(left),
            frame.y(b.lower_hinge) - frame.y(b.upper_hinge)
        ));
        svg.push_str(&frame.line((left, b.median), (right, b.median), r##"stroke="#333" stroke-width="3""##));
        svg.push_str(&frame.line((center, b.upper_hinge), (center, b.upper_whisker), dashed));
        svg.push_str(&frame.line((center, b.lower_hinge), (center, b.lower_whisker), dashed));
        svg.push_str(&frame.line((center - 0.1, b.upper_whisker), (center + 0.1, b.upper_whisker), solid));
        svg.push_str(&frame.line((center - 0.1, b.lower_whisker), (center + 0.1, b.lower_whisker), solid));
        for outlier in &b.outliers {
            svg.push_str(&format!(
                r##"<circle cx="{:.1}" cy="{:.1}" r="3" fill="none" stroke="#333"/>"##,
                frame.x(center),
                frame.y(*outlier)
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{} (n={})</text>"#,
            frame.x(center),
            PLOT_HEIGHT - MARGIN + 14.0,
            escape_html(&b.group),
            b.n
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Reference drawn behind a scatter plot
enum Reference<'a> {
    HorizontalZero,
    Identity,
    CookContours(&'a [CookContour]),
}

struct Scatter<'a> {
    title: &'a str,
    x_label: &'a str,
    y_label: &'a str,
    points: Vec<(f64, f64)>,
    labels: Vec<&'a str>,
    highlighted: &'a [String],
    reference: Reference<'a>,
}

fn scatter_svg(plot: &Scatter<'_>) -> String {
    let finite: Vec<(f64, f64)> = plot
        .points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let frame = Frame::fit(&finite);

    let mut svg = svg_open();
    svg.push_str(&frame.axes(plot.title, plot.x_label, plot.y_label, true));

    let guide = r##"stroke="#aaa" stroke-dasharray="3 3""##;
    match plot.reference {
        Reference::HorizontalZero => {
            svg.push_str(&frame.line((frame.x_min, 0.0), (frame.x_max, 0.0), guide));
        }
        Reference::Identity => {
            let lo = frame.x_min.max(frame.y_min);
            let hi = frame.x_max.min(frame.y_max);
            if lo < hi {
                svg.push_str(&frame.line((lo, lo), (hi, hi), guide));
            }
        }
        Reference::CookContours(contours) => {
            svg.push_str(&frame.line((frame.x_min, 0.0), (frame.x_max, 0.0), guide));
            for contour in contours {
                for sign in [1.0, -1.0] {
                    let path: Vec<String> = contour
                        .points
                        .iter()
                        .map(|(h, r)| (*h, sign * r))
                        .filter(|(h, r)| frame.contains(*h, *r))
                        .map(|(h, r)| format!("{:.1},{:.1}", frame.x(h), frame.y(r)))
                        .collect();
                    if path.len() > 1 {
                        svg.push_str(&format!(
                            r##"<polyline points="{}" fill="none" stroke="#d9534f" stroke-dasharray="5 3"/>"##,
                            path.join(" ")
                        ));
                    }
                }
            }
        }
    }

    for ((x, y), label) in plot.points.iter().zip(&plot.labels) {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        svg.push_str(&format!(
            r##"<circle cx="{:.1}" cy="{:.1}" r="3" fill="#4a90d9"><title>{}</title></circle>"##,
            frame.x(*x),
            frame.y(*y),
            escape_html(label)
        ));
        if plot.highlighted.iter().any(|h| h == label) {
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
                frame.x(*x) + 5.0,
                frame.y(*y) - 4.0,
                escape_html(label)
            ));
        }
    }

    svg.push_str("</svg>");
    svg
}

/// The four diagnostic plots in reading order
pub fn diagnostic_svgs(diagnostics: &Diagnostics) -> Vec<String> {
    let obs = &diagnostics.observations;
    let labels: Vec<&str> = obs.iter().map(|o| o.label.as_str()).collect();

    let plots = [
        Scatter {
            title: "Residuals vs Fitted",
            x_label: "Fitted values",
            y_label: "Residuals",
            points: obs.iter().map(|o| (o.fitted, o.residual)).collect(),
            labels: labels.clone(),
            highlighted: &diagnostics.extreme_residuals,
            reference: Reference::HorizontalZero,
        },
        Scatter {
            title: "Normal Q-Q",
            x_label: "Theoretical quantiles",
            y_label: "Standardized residuals",
            points: diagnostics.qq.iter().map(|q| (q.theoretical, q.sample)).collect(),
            labels: diagnostics.qq.iter().map(|q| q.label.as_str()).collect(),
            highlighted: &diagnostics.extreme_standardized,
            reference: Reference::Identity,
        },
        Scatter {
            title: "Scale-Location",
            x_label: "Fitted values",
            y_label: "sqrt(|Standardized residuals|)",
            points: obs
                .iter()
                .map(|o| (o.fitted, o.sqrt_abs_standardized()))
                .collect(),
            labels: labels.clone(),
            highlighted: &diagnostics.extreme_standardized,
            reference: Reference::HorizontalZero,
        },
        Scatter {
            title: "Residuals vs Leverage",
            x_label: "Leverage",
            y_label: "Standardized residuals",
            points: obs
                .iter()
                .map(|o| (o.leverage, o.standardized_residual))
                .collect(),
            labels,
            highlighted: &diagnostics.extreme_cooks,
            reference: Reference::CookContours(&diagnostics.cook_contours),
        },
    ];

    plots.iter().map(scatter_svg).collect()
}

/// HTML output formatter
#[derive(Debug)]
pub struct HtmlOutput<'a> {
    report: &'a AnalysisReport,
}

impl<'a> HtmlOutput<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self { report }
    }

    fn render_summary(&self) -> String {
        let summary = &self.report.summary;
        let mut html = String::new();

        html.push_str("    <h2>Fuel efficiency by transmission</h2>\n");
        html.push_str("    <table>\n");
        html.push_str("        <tr><th class=\"text\">group</th><th>n</th><th>mean</th><th>sd</th><th>median</th></tr>\n");
        for g in &summary.groups {
            html.push_str(&format!(
                "        <tr><td class=\"text\">{}</td><td>{}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td></tr>\n",
                escape_html(&g.group),
                g.n,
                g.mean,
                g.sd,
                g.median
            ));
        }
        html.push_str("    </table>\n");
        html.push_str("    ");
        html.push_str(&boxplot_svg(&summary.boxplots));
        html.push('\n');

        let w = &summary.welch;
        html.push_str(&format!(
            "    <p>Welch two-sample t-test: t = {:.4}, df = {:.4}, p = {}; {:.0}% CI for {} minus {}: [{:.4}, {:.4}].</p>\n",
            w.statistic,
            w.df,
            format_p_value(w.pvalue),
            w.confidence_level * 100.0,
            escape_html(&w.first_group),
            escape_html(&w.second_group),
            w.ci_lower,
            w.ci_upper
        ));
        html
    }

    fn render_comparison(&self) -> String {
        let mut html = String::new();
        html.push_str(&format!(
            "    <h2>Model comparison (alpha = {})</h2>\n",
            self.report.config.significance_level
        ));
        html.push_str("    <table>\n");
        html.push_str("        <tr><th class=\"text\">model</th><th class=\"text\">formula</th><th>adj R²</th><th>am p-value</th></tr>\n");
        for (i, row) in self.report.comparison.iter().enumerate() {
            let class = if i == self.report.selected {
                " class=\"selected\""
            } else {
                ""
            };
            html.push_str(&format!(
                "        <tr{}><td class=\"text\">{}</td><td class=\"text formula\">{}</td><td>{:.4}</td><td>{:.4}</td></tr>\n",
                class,
                escape_html(&row.name),
                escape_html(&row.formula.to_string()),
                row.adj_r_squared,
                row.transmission_p
            ));
        }
        html.push_str("    </table>\n");
        html
    }

    fn render_winner(&self) -> String {
        let winner = &self.report.winner;
        let fit = &winner.fit;
        let mut html = String::new();

        html.push_str(&format!(
            "    <h2>Selected model: <span class=\"formula\">{}</span></h2>\n",
            escape_html(&winner.formula.to_string())
        ));
        html.push_str("    <table>\n");
        html.push_str("        <tr><th class=\"text\">term</th><th>estimate</th><th>std. error</th><th>t</th><th>p-value</th></tr>\n");
        for c in &fit.coefficients {
            html.push_str(&format!(
                "        <tr><td class=\"text\">{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.3}</td><td>{}</td></tr>\n",
                escape_html(&c.name),
                c.estimate,
                c.std_error,
                c.t_value,
                format_p_value(c.p_value)
            ));
        }
        html.push_str("    </table>\n");

        let f_text = fit
            .f_test
            .as_ref()
            .map(|f| {
                format!(
                    " F = {:.2} on {} and {} DF, p = {}.",
                    f.statistic,
                    f.df_model,
                    f.df_residual,
                    format_p_value(f.p_value)
                )
            })
            .unwrap_or_default();
        html.push_str(&format!(
            "    <p>Residual standard error {:.4} on {} DF. R² = {:.4}, adjusted R² = {:.4}.{}</p>\n",
            fit.sigma, fit.df_residual, fit.r_squared, fit.adj_r_squared, f_text
        ));

        html.push_str("    <h2>Residual diagnostics</h2>\n");
        html.push_str("    <div class=\"plots\">\n");
        for svg in diagnostic_svgs(&self.report.diagnostics) {
            html.push_str("        ");
            html.push_str(&svg);
            html.push('\n');
        }
        html.push_str("    </div>\n");
        html
    }

    /// Generate complete HTML document
    pub fn to_html(&self) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");

        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str("    <title>Transmission and Fuel Efficiency</title>\n");
        html.push_str("    <style>");
        html.push_str(generate_styles());
        html.push_str("</style>\n");
        html.push_str("</head>\n");

        html.push_str("<body>\n");
        html.push_str("    <h1>Transmission and Fuel Efficiency</h1>\n");

        html.push_str(&self.render_summary());
        html.push_str(&self.render_comparison());
        html.push_str(&self.render_winner());

        html.push_str("    <h2>Findings</h2>\n");
        for paragraph in &self.report.narrative.paragraphs {
            html.push_str(&format!("    <p>{}</p>\n", escape_html(paragraph)));
        }

        html.push_str("    <div class=\"footer\">\n");
        html.push_str(&format!(
            "        Generated by mtreport {}\n",
            env!("CARGO_PKG_VERSION")
        ));
        html.push_str("    </div>\n");

        html.push_str("</body>\n");
        html.push_str("</html>\n");

        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxplot(group: &str, outliers: Vec<f64>) -> BoxplotStats {
        BoxplotStats {
            group: group.to_string(),
            n: 5,
            lower_whisker: 10.0,
            lower_hinge: 12.0,
            median: 14.0,
            upper_hinge: 16.0,
            upper_whisker: 18.0,
            outliers,
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"test\""), "&quot;test&quot;");
        assert_eq!(escape_html("'test'"), "&#39;test&#39;");
    }

    #[test]
    fn test_padded_range() {
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);

        assert_eq!(padded_range([3.0, 3.0].into_iter()), (2.0, 4.0));
        assert_eq!(padded_range([f64::NAN].into_iter()), (-1.0, 1.0));
    }

    #[test]
    fn test_frame_maps_into_plot_area() {
        let frame = Frame::fit(&[(0.0, 0.0), (1.0, 1.0)]);
        for (x, y) in [(0.0, 0.0), (1.0, 1.0), (0.5, 0.5)] {
            assert!(frame.x(x) >= MARGIN && frame.x(x) <= PLOT_WIDTH);
            assert!(frame.y(y) >= 0.0 && frame.y(y) <= PLOT_HEIGHT - MARGIN);
        }
        assert!(frame.y(1.0) < frame.y(0.0));
    }

    #[test]
    fn test_boxplot_svg() {
        let svg = boxplot_svg(&[boxplot("Automatic", vec![]), boxplot("Manual", vec![25.0])]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 3); // frame + 2 boxes
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("Manual (n=5)"));
    }

    #[test]
    fn test_boxplot_svg_escapes_group() {
        let svg = boxplot_svg(&[boxplot("<b>", vec![])]);
        assert!(svg.contains("&lt;b&gt;"));
        assert!(!svg.contains("<b>"));
    }
}
