//! Response Validation
//!
//! Model output is text that claims to be JSON. Extraction tolerates the
//! usual decoration (code fences, preamble prose) and category
//! normalization repairs the structural weaknesses planning models exhibit
//! in practice: dumping every page into one generic bucket.

use serde_json::Value;

use crate::ai::provider::PlannedSection;
use crate::types::{DocloomError, GenerationPhase, Result};

/// Categories too generic to navigate; replaced by title heuristics.
const REJECTED_CATEGORIES: &[&str] = &["", "project docs", "general", "documentation", "docs"];

/// Title-keyword rules, checked in order; first hit wins.
const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (
        &["intro", "start", "install", "setup", "getting started", "overview"],
        "Getting Started",
    ),
    (
        &["api", "reference", "interface", "type", "schema", "sdk"],
        "API Reference",
    ),
    (
        &["architect", "system", "design", "structure", "pattern", "flow"],
        "Architecture",
    ),
    (
        &["component", "ui", "view", "page", "screen"],
        "Components",
    ),
    (
        &["util", "lib", "helper", "shared", "common"],
        "Utilities",
    ),
    (
        &["hook", "state", "store", "context", "provider"],
        "State Management",
    ),
    (
        &["config", "env", "setting", "option"],
        "Configuration",
    ),
    (
        &["deploy", "ci", "cd", "build", "release", "docker"],
        "Deployment & DevOps",
    ),
    (&["test", "spec", "e2e", "coverage"], "Testing"),
    (
        &[
            "auth", "service", "controller", "backend", "server", "database", "model",
        ],
        "Backend & Services",
    ),
    (
        &["guide", "tutorial", "how", "example", "walkthrough"],
        "Guides",
    ),
    (
        &["advanced", "deep", "internal", "core", "engine", "optimization"],
        "Advanced Topics",
    ),
];

const FALLBACK_CATEGORY: &str = "General Documentation";

/// Extract the first JSON array embedded in a model response.
///
/// Handles raw JSON, fenced JSON, and arrays surrounded by prose.
pub fn extract_json_array(text: &str) -> Result<Value> {
    let candidate = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim(),
    };

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        DocloomError::generation(
            GenerationPhase::Plan,
            format!("response is not a JSON array: {}", e),
        )
    })?;

    if !value.is_array() {
        return Err(DocloomError::generation(
            GenerationPhase::Plan,
            "response JSON is not an array",
        ));
    }

    Ok(value)
}

/// Parse and repair a planned structure from raw model text.
pub fn parse_planned_sections(text: &str) -> Result<Vec<PlannedSection>> {
    let value = extract_json_array(text)?;
    let sections: Vec<PlannedSection> = serde_json::from_value(value).map_err(|e| {
        DocloomError::generation(
            GenerationPhase::Plan,
            format!("section objects malformed: {}", e),
        )
    })?;

    if sections.is_empty() {
        return Err(DocloomError::generation(
            GenerationPhase::Plan,
            "plan produced no sections",
        ));
    }

    Ok(normalize_categories(sections))
}

/// Repair generic or missing categories using title keywords.
///
/// When the whole plan collapses into fewer than two distinct categories,
/// every section is re-bucketed - one giant category is exactly the failure
/// mode this guards against.
pub fn normalize_categories(sections: Vec<PlannedSection>) -> Vec<PlannedSection> {
    let distinct = sections
        .iter()
        .map(|s| s.category.to_lowercase())
        .collect::<std::collections::HashSet<_>>()
        .len();
    let low_diversity = distinct < 2;

    sections
        .into_iter()
        .map(|mut section| {
            if section.id.is_empty() {
                section.id = slugify(&section.title);
            }

            let rejected = REJECTED_CATEGORIES
                .contains(&section.category.to_lowercase().trim());
            if rejected || low_diversity {
                section.category = categorize_by_title(&section.title);
            }
            section
        })
        .collect()
}

fn categorize_by_title(title: &str) -> String {
    let lower = title.to_lowercase();
    for (keywords, category) in CATEGORY_RULES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return (*category).to_string();
        }
    }
    FALLBACK_CATEGORY.to_string()
}

/// Kebab-case slug from a section title.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_raw_array() {
        let value = extract_json_array(r#"[{"title": "A"}]"#).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_fenced_array() {
        let text = "```json\n[{\"title\": \"A\"}]\n```";
        let value = extract_json_array(text).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_extract_array_with_preamble() {
        let text = "Here is the plan you asked for:\n[{\"title\": \"A\"}]\nEnjoy!";
        let value = extract_json_array(text).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_extract_rejects_non_array() {
        assert!(extract_json_array(r#"{"title": "A"}"#).is_err());
        assert!(extract_json_array("no json here").is_err());
    }

    #[test]
    fn test_parse_backfills_missing_ids() {
        let text = r#"[
            {"title": "Quick Start", "category": "Getting Started", "description": "d"},
            {"id": "arch", "title": "Architecture", "category": "Architecture", "description": "d"}
        ]"#;
        let sections = parse_planned_sections(text).unwrap();
        assert_eq!(sections[0].id, "quick-start");
        assert_eq!(sections[1].id, "arch");
    }

    #[test]
    fn test_parse_rejects_empty_plan() {
        assert!(parse_planned_sections("[]").is_err());
    }

    #[test]
    fn test_rejected_category_rebucketed() {
        let sections = vec![
            PlannedSection {
                id: "a".into(),
                title: "API Reference".into(),
                category: "General".into(),
                description: String::new(),
            },
            PlannedSection {
                id: "b".into(),
                title: "Deployment Guide".into(),
                category: "Architecture".into(),
                description: String::new(),
            },
        ];
        let fixed = normalize_categories(sections);
        assert_eq!(fixed[0].category, "API Reference");
        // Healthy category untouched when diversity is fine
        assert_eq!(fixed[1].category, "Architecture");
    }

    #[test]
    fn test_low_diversity_forces_rebucket() {
        let make = |title: &str| PlannedSection {
            id: String::new(),
            title: title.into(),
            category: "Everything".into(),
            description: String::new(),
        };
        let fixed = normalize_categories(vec![
            make("Getting Started"),
            make("API Types"),
            make("Docker Deployment"),
        ]);
        assert_eq!(fixed[0].category, "Getting Started");
        assert_eq!(fixed[1].category, "API Reference");
        assert_eq!(fixed[2].category, "Deployment & DevOps");
    }

    #[test]
    fn test_unmatched_title_gets_fallback() {
        let fixed = normalize_categories(vec![
            PlannedSection {
                id: String::new(),
                title: "Miscellany".into(),
                category: "docs".into(),
                description: String::new(),
            },
            PlannedSection {
                id: String::new(),
                title: "Setup".into(),
                category: "Getting Started".into(),
                description: String::new(),
            },
        ]);
        assert_eq!(fixed[0].category, FALLBACK_CATEGORY);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Quick Start"), "quick-start");
        assert_eq!(slugify("API & Reference!"), "api-reference");
        assert_eq!(slugify("  spaced  "), "spaced");
    }
}
