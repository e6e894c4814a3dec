//! Structural JSON repair
//!
//! Best-effort recovery for truncated or lightly malformed model output.
//! The recognized malformations are exactly:
//!
//! 1. an unterminated quoted string at end of input (typically an element
//!    snippet cut off before its closing quote) — the quote is appended;
//! 2. an unterminated markup tag inside that string (`<img ...` with no
//!    `>`) — the angle bracket is appended before the quote;
//! 3. object literals left open before a `,`, a `]`, or end of input —
//!    the missing `}` is inserted at that point;
//! 4. an unclosed outer envelope — remaining `}`/`]` are appended in
//!    nesting order.
//!
//! Anything outside this list stays malformed and the caller drops the
//! response. This is deliberately not a general JSON fixer.

use regex::Regex;
use std::sync::OnceLock;

/// Tail of a string value that looks like a markup tag cut off before its
/// closing angle bracket.
fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[a-zA-Z][^<>]*\z").expect("static regex"))
}

pub fn repair_json(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // Single pass rebuilding the text, tracking string/escape state and
    // the open-bracket stack so missing `}` can be inserted in place.
    let chars: Vec<char> = trimmed.chars().collect();
    let mut out = String::with_capacity(trimmed.len() + 4);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut string_start = 0usize;

    for (idx, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
                string_start = out.len();
            }
            '{' => {
                stack.push('}');
                out.push(ch);
            }
            '[' => {
                stack.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                // A mismatched closer means the objects above it were
                // never closed; emit their braces first.
                while stack.last().is_some_and(|&c| c != ch) && stack.contains(&ch) {
                    let missing = stack.pop().unwrap_or_default();
                    out.push(missing);
                }
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
                out.push(ch);
            }
            ',' => {
                // In valid JSON a comma directly followed by `{` only
                // separates array elements, so an object still open here
                // is missing its brace.
                if stack.last() == Some(&'}')
                    && stack.len() >= 2
                    && stack[stack.len() - 2] == ']'
                    && chars[idx + 1..]
                        .iter()
                        .find(|c| !c.is_whitespace())
                        .is_some_and(|&c| c == '{')
                {
                    stack.pop();
                    out.push('}');
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        // A trailing backslash is half of an escape sequence; drop it so
        // the appended quote terminates the string instead of vanishing.
        if escaped {
            out.pop();
        }
        if open_tag_re().is_match(&out[string_start..]) {
            out.push('>');
        }
        out.push('"');
    }

    // A truncation right after a separator leaves a dangling comma or
    // colon that would still be invalid once the brackets are closed.
    loop {
        let tail = out.trim_end();
        if tail.ends_with(',') || tail.ends_with(':') {
            let cut = tail.len() - 1;
            out.truncate(cut);
        } else {
            break;
        }
    }

    while let Some(close) = stack.pop() {
        out.push(close);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{parse_verdict, YesNo};

    const WELL_FORMED: &str = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<img src=\"hero.png\">", "reason": "missing alt text", "recommendation": "add a descriptive alt attribute"}]}"#;

    #[test]
    fn test_well_formed_passes_through_parse() {
        let v = parse_verdict(WELL_FORMED).unwrap();
        assert_eq!(v.violated_elements_and_reasons.len(), 1);
    }

    #[test]
    fn test_truncated_mid_string_recovers() {
        // Cut inside the recommendation value.
        let truncated = &WELL_FORMED[..WELL_FORMED.len() - 10];
        assert!(serde_json::from_str::<serde_json::Value>(truncated).is_err());

        let v = parse_verdict(truncated).expect("repair should recover");
        assert_eq!(v.overall_violation, YesNo::Yes);
        assert_eq!(v.violated_elements_and_reasons.len(), 1);
    }

    #[test]
    fn test_unterminated_img_tag_gets_closed() {
        let truncated = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<img src=\"hero.png\"", "reason": "missing alt text", "recommendation": "add alt"}]}"#;
        // The element string holds `<img src="hero.png"` with no `>`;
        // strict parse succeeds here, so drive repair directly.
        let cut = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<img src=\"hero.png\""#;
        let repaired = repair_json(cut);
        let v = parse_verdict(&repaired).expect("repaired tag should parse");
        assert_eq!(v.violated_elements_and_reasons.len(), 1);
        assert_eq!(
            v.violated_elements_and_reasons[0].element,
            "<img src=\"hero.png\">"
        );
        // And the already-complete variant is untouched by repair.
        assert!(parse_verdict(truncated).is_some());
    }

    #[test]
    fn test_missing_closing_brackets_recover() {
        let missing_tail = &WELL_FORMED[..WELL_FORMED.len() - 2];
        let v = parse_verdict(missing_tail).expect("envelope close should recover");
        assert_eq!(v.violated_elements_and_reasons.len(), 1);
    }

    #[test]
    fn test_object_missing_brace_before_closing_bracket() {
        let cut = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<a>", "reason": "r", "recommendation": "c"]}"#;
        let v = parse_verdict(cut).expect("missing brace before ] should recover");
        assert_eq!(v.violated_elements_and_reasons.len(), 1);
        assert_eq!(v.violated_elements_and_reasons[0].element, "<a>");
    }

    #[test]
    fn test_object_missing_brace_before_comma() {
        let cut = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<a>", "reason": "r", "recommendation": "c", {"element": "<b>", "reason": "r2", "recommendation": "c2"}]}"#;
        let v = parse_verdict(cut).expect("missing brace before , should recover");
        assert_eq!(v.violated_elements_and_reasons.len(), 2);
        assert_eq!(v.violated_elements_and_reasons[1].element, "<b>");
    }

    #[test]
    fn test_key_separating_commas_stay_untouched() {
        // Commas between an object's own pairs must never trigger brace
        // insertion, including right before a nested object value.
        let nested = r#"{"overall_violation": "No", "violated_elements_and_reasons": []}"#;
        assert_eq!(repair_json(nested), nested);
    }

    #[test]
    fn test_dangling_comma_is_stripped() {
        let cut = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<a>", "reason": "vague", "recommendation": "rename"},"#;
        let v = parse_verdict(cut).expect("dangling comma should be stripped");
        assert_eq!(v.violated_elements_and_reasons.len(), 1);
    }

    #[test]
    fn test_repaired_count_matches_well_formed() {
        let expected = parse_verdict(WELL_FORMED).unwrap();
        for cut_at in [
            WELL_FORMED.len() - 2,  // envelope
            WELL_FORMED.len() - 10, // shallow cut inside the last value
            WELL_FORMED.len() - 20, // deeper cut inside the last value
        ] {
            let v = parse_verdict(&WELL_FORMED[..cut_at]).expect("recover");
            assert_eq!(
                v.violated_elements_and_reasons.len(),
                expected.violated_elements_and_reasons.len(),
                "cut at {}",
                cut_at
            );
        }
    }

    #[test]
    fn test_trailing_escape_is_dropped() {
        let cut = r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<img src=\"#;
        let repaired = repair_json(cut);
        assert!(parse_verdict(&repaired).is_some());
    }

    #[test]
    fn test_hopeless_input_stays_unparsable() {
        assert!(parse_verdict("I could not find any violations.").is_none());
    }
}
