//! Prompt assembly
//!
//! The fixed specialist preamble, the schema constraining the reply to
//! the verdict shape, and the per-chunk rendering of evidence into
//! ordered text and image parts.

use serde_json::{json, Value};

use crate::criteria::Criterion;
use crate::evidence::{EvidenceCollection, EvidenceItem};

/// Instruction preamble shared by every criterion check.
pub const SYSTEM_PROMPT: &str = "You are an Accessibility Expert (WCAG Specialist) responsible \
for detecting WCAG 2.2 violations on websites. Your expertise is crucial in making the web more \
accessible for everyone. Analyze the provided, related HTML and CSS elements for compliance with \
the specified WCAG success criterion. Be confident in your expertise and do not omit any issue. \
After analyzing all elements, do not provide individual element-by-element analysis; summarize \
the overall result. Your output must be a JSON object of the form:\n\
{\n\
  \"overall_violation\": \"Yes or No\",\n\
  \"violated_elements_and_reasons\": [\n\
    {\n\
      \"element\": \"outerHTML of the element\",\n\
      \"reason\": \"Explanation of why it violates the criterion\",\n\
      \"recommendation\": \"Recommendation to fix the violation for this specific element\"\n\
    }\n\
  ]\n\
}\n\
If there are no violations, respond with:\n\
{ \"overall_violation\": \"No\", \"violated_elements_and_reasons\": [] }\n\
Provide the outerHTML of each element without any of its children: only the opening tag with its \
attributes, excluding nested elements or content.";

/// One part of a user message: plain text or an inline screenshot.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    InlineImage { media_type: String, base64: String },
}

/// `response_format` value for schema-constrained generation, matching
/// the verdict wire shape exactly.
pub fn verdict_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "accessibility_violation_report",
            "description": "Report of accessibility violations",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "overall_violation": {
                        "type": "string",
                        "description": "Indicates whether there is an overall violation",
                        "enum": ["Yes", "No"]
                    },
                    "violated_elements_and_reasons": {
                        "type": "array",
                        "description": "List of elements that violated accessibility criteria and the reasons",
                        "items": {
                            "type": "object",
                            "properties": {
                                "element": {
                                    "type": "string",
                                    "description": "OuterHTML of the violated element"
                                },
                                "reason": {
                                    "type": "string",
                                    "description": "Explanation of why it violates the criterion and the criterion number"
                                },
                                "recommendation": {
                                    "type": "string",
                                    "description": "Recommendation to fix the violation for this specific element"
                                }
                            },
                            "required": ["element", "reason", "recommendation"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["overall_violation", "violated_elements_and_reasons"],
                "additionalProperties": false
            }
        }
    })
}

/// Render one evidence chunk as the user message for a completion call.
/// Text and record items collapse into text parts; images stay inline at
/// their original position in the sequence.
pub fn build_chunk_prompt(criterion: &Criterion, chunk: &EvidenceCollection) -> Vec<PromptPart> {
    let mut parts = Vec::new();
    let mut text = format!(
        "Determine whether the evidence below violates WCAG SC {} ({}). Focus solely on this \
         criterion. The information for your assessment begins after the dashed line.\n\
         ----------------------------------\n",
        criterion.id, criterion.label
    );

    match chunk {
        EvidenceCollection::Mapping(entries) => {
            for (key, value) in entries {
                text.push_str(&format!("{}: {}\n", key, value));
            }
            parts.push(PromptPart::Text(text));
        }
        EvidenceCollection::Sequence(items) => {
            for item in items {
                match item {
                    EvidenceItem::Image { media_type, base64 } => {
                        if !text.is_empty() {
                            parts.push(PromptPart::Text(std::mem::take(&mut text)));
                        }
                        parts.push(PromptPart::InlineImage {
                            media_type: media_type.clone(),
                            base64: base64.clone(),
                        });
                    }
                    other => {
                        text.push_str(&other.render());
                        text.push('\n');
                    }
                }
            }
            if !text.is_empty() {
                parts.push(PromptPart::Text(text));
            }
        }
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria;

    fn sample_criterion() -> &'static Criterion {
        criteria::registry()
            .iter()
            .find(|c| c.id == "1.1.1")
            .expect("1.1.1 is always registered")
    }

    #[test]
    fn test_response_format_shape() {
        let format = verdict_response_format();
        assert_eq!(format["type"], "json_schema");
        let schema = &format["json_schema"]["schema"];
        assert_eq!(schema["properties"]["overall_violation"]["enum"][0], "Yes");
        assert_eq!(
            schema["required"][1],
            "violated_elements_and_reasons"
        );
    }

    #[test]
    fn test_mapping_chunk_renders_key_value_lines() {
        let chunk = EvidenceCollection::Mapping(vec![(
            "<img src=\"a.png\">".to_string(),
            "no alt attribute".to_string(),
        )]);
        let parts = build_chunk_prompt(sample_criterion(), &chunk);
        assert_eq!(parts.len(), 1);
        match &parts[0] {
            PromptPart::Text(t) => {
                assert!(t.contains("WCAG SC 1.1.1"));
                assert!(t.contains("<img src=\"a.png\">: no alt attribute"));
            }
            _ => panic!("mapping chunk must render as text"),
        }
    }

    #[test]
    fn test_sequence_chunk_keeps_image_position() {
        let chunk = EvidenceCollection::Sequence(vec![
            EvidenceItem::Text("intro".to_string()),
            EvidenceItem::Image {
                media_type: "image/png".to_string(),
                base64: "QUJD".to_string(),
            },
            EvidenceItem::Text("outro".to_string()),
        ]);
        let parts = build_chunk_prompt(sample_criterion(), &chunk);
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], PromptPart::Text(_)));
        assert!(matches!(parts[1], PromptPart::InlineImage { .. }));
        match &parts[2] {
            PromptPart::Text(t) => assert!(t.contains("outro")),
            _ => panic!("trailing text part expected"),
        }
    }
}
