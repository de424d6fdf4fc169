//! Prompt and summary templates
//!
//! Rendered with MiniJinja. A fresh environment is built per render so the
//! templates stay plain `&'static str` constants.

use crate::error::Result;
use minijinja::Environment;
use serde::Serialize;

/// System prompt for document extraction
pub const EXTRACTION_SYSTEM: &str = "You are an analyst that extracts structured company data \
from pitch decks, memos and financial summaries. Respond with a single JSON object and nothing else.";

/// User prompt for document extraction; expects `document` and `fields`
pub const EXTRACTION_USER: &str = r#"Extract the following fields from the document below.
Use the exact keys listed. Copy values as written (keep currency symbols and units such as L, Cr, M).
Omit a key when the document does not state it.

Keys:
{% for field in fields %}- {{ field }}
{% endfor %}
Document:
"""
{{ document }}
"""
"#;

/// System prompt for qualitative secondary calls
pub const QUALITATIVE_SYSTEM: &str = "You are a venture analyst. Respond with a single JSON \
object whose values are arrays of short strings. Do not add commentary.";

/// Qualitative prompt; expects `task`, `instruction`, `company` and `keys`
pub const QUALITATIVE_USER: &str = r#"{{ task }} for {{ company.name or "the company" }}.
{{ instruction }}

Company facts:
{% for key, value in company | items %}{% if value %}- {{ key }}: {{ value }}
{% endif %}{% endfor %}
Return a JSON object with these keys, each an array of at most 4 short strings:
{% for key in keys %}- {{ key }}
{% endfor %}"#;

/// Executive summary; expects `company`, `industry`, `stage`, `score`, `tier`,
/// `confidence`, `headlines` and `degraded`
pub const EXECUTIVE_SUMMARY: &str = "{{ company }} ({{ industry }}, {{ stage }}) receives a weighted \
score of {{ score }}/10, rated {{ tier }} at {{ confidence }}% confidence. \
{% for item in headlines %}{{ item.label }}: {{ item.headline }}. {% endfor %}\
{% if degraded %}Degraded analyses: {{ degraded | join(\", \") }}.{% endif %}";

/// Render `template` with `vars`
pub fn render(template: &str, vars: impl Serialize) -> Result<String> {
    let env = Environment::new();
    let rendered = env.render_str(template, minijinja::Value::from_serialize(&vars))?;
    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_extraction_prompt() {
        let prompt = render(
            EXTRACTION_USER,
            json!({ "fields": ["companyName", "revenue"], "document": "Acme earns ₹14L" }),
        )
        .unwrap();
        assert!(prompt.contains("- companyName"));
        assert!(prompt.contains("- revenue"));
        assert!(prompt.contains("Acme earns ₹14L"));
    }

    #[test]
    fn test_render_qualitative_skips_empty_facts() {
        let prompt = render(
            QUALITATIVE_USER,
            json!({
                "task": "Risk assessment",
                "instruction": "List the key risks.",
                "company": { "name": "Acme", "revenue": "₹14L", "runway": null },
                "keys": ["key_risk_factors"],
            }),
        )
        .unwrap();
        assert!(prompt.starts_with("Risk assessment for Acme."));
        assert!(prompt.contains("- revenue: ₹14L"));
        assert!(!prompt.contains("runway"));
        assert!(prompt.contains("- key_risk_factors"));

        let unnamed = render(
            QUALITATIVE_USER,
            json!({
                "task": "Risk assessment",
                "instruction": "List the key risks.",
                "company": deal_core::CompanyRecord::new(),
                "keys": ["key_risk_factors"],
            }),
        )
        .unwrap();
        assert!(unnamed.starts_with("Risk assessment for the company."));
        assert!(!unnamed.contains("None"));
    }

    #[test]
    fn test_render_summary() {
        let summary = render(
            EXECUTIVE_SUMMARY,
            json!({
                "company": "Acme",
                "industry": "Technology",
                "stage": "Seed",
                "score": "5.5",
                "tier": "PASS",
                "confidence": "71",
                "headlines": [{ "label": "Market", "headline": "revenue at 40th percentile" }],
                "degraded": ["Risk"],
            }),
        )
        .unwrap();
        assert!(summary.starts_with("Acme (Technology, Seed)"));
        assert!(summary.contains("Market: revenue at 40th percentile."));
        assert!(summary.ends_with("Degraded analyses: Risk."));
    }

    #[test]
    fn test_render_error_is_template_error() {
        let err = render("{% if %}", json!({})).unwrap_err();
        assert!(matches!(err, crate::EngineError::Template(_)));
    }
}
