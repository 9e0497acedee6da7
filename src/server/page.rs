//! HTML rendering of the screening form

use crate::ensemble::EnsemblePrediction;
use std::fmt::Write as _;

/// What the page shows below the form
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Blank,
    Error(String),
    Prediction(EnsemblePrediction),
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Diabetes Screening</title>
<style>
body { font-family: sans-serif; margin: 2em auto; max-width: 760px; background: #f5f5f5; color: #333; }
.card { background: white; border-radius: 8px; padding: 1.5em; margin: 1em 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 1em; }
label { display: block; font-weight: bold; margin-bottom: 0.3em; }
input { width: 100%; padding: 0.5em; box-sizing: border-box; }
button { margin-top: 1em; padding: 0.7em 2em; background: #2563eb; color: white; border: none; border-radius: 4px; }
.alert { border-radius: 8px; padding: 1em 1.5em; margin: 1em 0; }
.alert-danger { background: #fde8e8; border: 1px solid #f05252; }
.alert-success { background: #def7ec; border: 1px solid #31c48d; }
.alert-error { background: #fdf6b2; border: 1px solid #c27803; }
.verdict { font-size: 1.6em; font-weight: bold; }
.detail { color: #555; margin-top: 0.5em; }
</style></head><body>
<h1>Diabetes Screening</h1>
<p>SVM and Random Forest, combined by soft voting.</p>
"#;

/// Render the full page. `values` echoes a successful submission back into
/// the fields, in feature order.
pub fn render_page(feature_names: &[String], values: Option<&[f64]>, outcome: &PageOutcome) -> String {
    let mut html = String::from(PAGE_HEAD);

    html.push_str("<form class=\"card\" method=\"post\" action=\"/predict\">\n<div class=\"grid\">\n");
    for (i, name) in feature_names.iter().enumerate() {
        let name = escape_html(name);
        let value = values
            .and_then(|v| v.get(i))
            .map(|v| format!(" value=\"{}\"", v))
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<div><label for=\"{name}\">{name}</label><input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\"{value} required></div>"
        );
    }
    html.push_str("</div>\n<button type=\"submit\">Predict</button>\n</form>\n");

    match outcome {
        PageOutcome::Blank => {}
        PageOutcome::Error(message) => {
            let _ = writeln!(
                html,
                "<div class=\"alert alert-error\" role=\"alert\">Error: {}</div>",
                escape_html(message)
            );
        }
        PageOutcome::Prediction(prediction) => {
            let verdict = prediction.verdict;
            let _ = write!(
                html,
                concat!(
                    "<div class=\"alert alert-{style}\" role=\"status\">\n",
                    "<div class=\"verdict\">{icon} {label}</div>\n",
                    "<div>Confidence: <strong>{confidence}%</strong></div>\n",
                    "<div class=\"detail\">SVM probability: {svm}% | Random Forest probability: {rf}%</div>\n",
                    "</div>\n"
                ),
                style = verdict.style(),
                icon = verdict.icon(),
                label = verdict.label(),
                confidence = prediction.confidence_percent(),
                svm = prediction.svm_percent(),
                rf = prediction.forest_percent(),
            );
        }
    }

    html.push_str("</body></html>\n");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::soft_vote;

    fn names() -> Vec<String> {
        vec!["Glucose".to_string(), "BMI".to_string()]
    }

    #[test]
    fn test_blank_page_has_one_field_per_feature() {
        let html = render_page(&names(), None, &PageOutcome::Blank);
        assert_eq!(html.matches("<input").count(), 2);
        assert!(html.contains("name=\"Glucose\""));
        assert!(!html.contains("role=\"alert\""));
        assert!(!html.contains("role=\"status\""));
    }

    #[test]
    fn test_prediction_page() {
        let html = render_page(&names(), Some(&[148.0, 33.6][..]), &PageOutcome::Prediction(soft_vote(0.8, 0.6)));
        assert!(html.contains("POSITIF DIABETES"));
        assert!(html.contains("class=\"alert alert-danger\""));
        assert!(html.contains("70.00%"));
        assert!(html.contains("80.00%"));
        assert!(html.contains("value=\"148\""));
        assert!(html.contains("value=\"33.6\""));
    }

    #[test]
    fn test_error_is_escaped() {
        let html = render_page(&names(), None, &PageOutcome::Error("<b>bad</b>".to_string()));
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(!html.contains("value="));
    }
}
