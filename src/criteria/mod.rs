//! Criterion Registry
//!
//! The canonical set of success criteria audited per page, fixed at
//! process start. Each criterion binds an id and label to an evidence
//! extractor; extractors are deterministic data gathering over a
//! [`PageSession`](crate::browser::PageSession) with no control-flow
//! complexity of their own.

mod probes;

use serde_json::Value;

use crate::browser::{BrowserError, PageSession};
use crate::evidence::{EvidenceCollection, EvidenceItem};

/// How one criterion's evidence is gathered.
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    /// outerHTML of every element matching the selectors, in order.
    Elements { selectors: &'static [&'static str] },
    /// Opening tag of each match keyed to the requested attribute facts.
    Attributes {
        selector: &'static str,
        attributes: &'static [&'static str],
    },
    /// Element snippets followed by a full-page screenshot.
    ElementsWithScreenshot { selectors: &'static [&'static str] },
    /// A single full-page screenshot.
    Screenshot,
    /// Screenshots of the page rendered at several viewport widths.
    ViewportProbe { widths: &'static [u32] },
    /// A page script returning an array of serialized facts.
    Script { script: &'static str },
}

pub struct Criterion {
    pub id: &'static str,
    pub label: &'static str,
    pub extractor: Extractor,
}

impl Criterion {
    /// Gather this criterion's evidence from a rendered page.
    pub async fn extract(
        &self,
        session: &dyn PageSession,
    ) -> Result<EvidenceCollection, BrowserError> {
        match self.extractor {
            Extractor::Elements { selectors } => {
                let mut items = Vec::new();
                for selector in selectors {
                    for html in session.outer_html_by_css(selector).await? {
                        items.push(EvidenceItem::Text(html));
                    }
                }
                Ok(EvidenceCollection::Sequence(items))
            }
            Extractor::Attributes {
                selector,
                attributes,
            } => {
                let entries = session.attributes_by_css(selector, attributes).await?;
                Ok(EvidenceCollection::Mapping(entries))
            }
            Extractor::ElementsWithScreenshot { selectors } => {
                let mut items = Vec::new();
                for selector in selectors {
                    for html in session.outer_html_by_css(selector).await? {
                        items.push(EvidenceItem::Text(html));
                    }
                }
                // Screenshot only matters when there is markup to judge.
                if !items.is_empty() {
                    items.push(screenshot_item(session).await?);
                }
                Ok(EvidenceCollection::Sequence(items))
            }
            Extractor::Screenshot => {
                Ok(EvidenceCollection::Sequence(vec![
                    screenshot_item(session).await?,
                ]))
            }
            Extractor::ViewportProbe { widths } => {
                let mut items = Vec::new();
                for &width in widths {
                    session.set_window_size(width, 1080).await?;
                    session.scroll_to(0, 0).await?;
                    items.push(EvidenceItem::Record {
                        label: "viewport".to_string(),
                        fields: vec![
                            ("width".to_string(), format!("{}px", width)),
                            ("height".to_string(), "1080px".to_string()),
                        ],
                    });
                    items.push(screenshot_item(session).await?);
                }
                Ok(EvidenceCollection::Sequence(items))
            }
            Extractor::Script { script } => {
                let value = session.execute_script(script, Vec::new()).await?;
                Ok(script_result_to_collection(value))
            }
        }
    }
}

async fn screenshot_item(session: &dyn PageSession) -> Result<EvidenceItem, BrowserError> {
    Ok(EvidenceItem::Image {
        media_type: "image/png".to_string(),
        base64: session.screenshot_png_base64().await?,
    })
}

fn script_result_to_collection(value: Value) -> EvidenceCollection {
    let items = match value {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(EvidenceItem::Text(s)),
                Value::Null => None,
                other => Some(EvidenceItem::Text(other.to_string())),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => vec![EvidenceItem::Text(other.to_string())],
    };
    EvidenceCollection::Sequence(items)
}

/// The canonical criterion set. Order is stable but carries no meaning;
/// checks run independently.
pub fn registry() -> &'static [Criterion] {
    &REGISTRY
}

static REGISTRY: [Criterion; 38] = [
    Criterion {
        id: "1.1.1",
        label: "Non-text Content",
        extractor: Extractor::Attributes {
            selector: "img, svg, video, audio, object, area, input[type='image'], [role='img']",
            attributes: &["alt", "aria-label", "aria-labelledby", "aria-hidden", "role", "title"],
        },
    },
    Criterion {
        id: "1.3.1",
        label: "Info and Relationships",
        extractor: Extractor::ElementsWithScreenshot {
            selectors: &["table", "ul, ol, dl", "h1, h2, h3, h4, h5, h6", "label, fieldset, legend"],
        },
    },
    Criterion {
        id: "1.3.2",
        label: "Meaningful Sequence",
        extractor: Extractor::Script {
            script: probes::TABLE_LINEARIZE_JS,
        },
    },
    Criterion {
        id: "1.3.3",
        label: "Sensory Characteristics",
        extractor: Extractor::Elements {
            selectors: &["p, li, caption, figcaption"],
        },
    },
    Criterion {
        id: "1.3.4",
        label: "Orientation",
        extractor: Extractor::ViewportProbe {
            widths: &[1920, 480],
        },
    },
    Criterion {
        id: "1.3.5",
        label: "Identify Input Purpose",
        extractor: Extractor::Attributes {
            selector: "input, select, textarea",
            attributes: &["type", "name", "autocomplete", "id"],
        },
    },
    Criterion {
        id: "1.4.1",
        label: "Use of Color",
        extractor: Extractor::ElementsWithScreenshot {
            selectors: &["a[href]", "form"],
        },
    },
    Criterion {
        id: "1.4.2",
        label: "Audio Control",
        extractor: Extractor::Attributes {
            selector: "audio, video",
            attributes: &["autoplay", "controls", "loop", "muted", "src"],
        },
    },
    Criterion {
        id: "1.4.3",
        label: "Contrast (Minimum)",
        extractor: Extractor::Script {
            script: probes::CONTRAST_PROBE_JS,
        },
    },
    Criterion {
        id: "1.4.4",
        label: "Resize Text",
        extractor: Extractor::ViewportProbe {
            widths: &[1920, 960],
        },
    },
    Criterion {
        id: "1.4.5",
        label: "Images of Text",
        extractor: Extractor::Attributes {
            selector: "img",
            attributes: &["src", "alt"],
        },
    },
    Criterion {
        id: "1.4.6",
        label: "Contrast (Enhanced)",
        extractor: Extractor::Script {
            script: probes::CONTRAST_PROBE_JS,
        },
    },
    Criterion {
        id: "1.4.8",
        label: "Visual Presentation",
        extractor: Extractor::Script {
            script: probes::VISUAL_PRESENTATION_JS,
        },
    },
    Criterion {
        id: "1.4.10",
        label: "Reflow",
        extractor: Extractor::ViewportProbe {
            widths: &[1280, 320],
        },
    },
    Criterion {
        id: "1.4.11",
        label: "Non-text Contrast",
        extractor: Extractor::Script {
            script: probes::FOCUS_STYLE_JS,
        },
    },
    Criterion {
        id: "1.4.12",
        label: "Text Spacing",
        extractor: Extractor::ElementsWithScreenshot {
            selectors: &["p, li, h1, h2, h3"],
        },
    },
    Criterion {
        id: "2.2.1",
        label: "Timing Adjustable",
        extractor: Extractor::Attributes {
            selector: "meta[http-equiv='refresh']",
            attributes: &["content"],
        },
    },
    Criterion {
        id: "2.2.2",
        label: "Pause, Stop, Hide",
        extractor: Extractor::Elements {
            selectors: &["marquee, blink, video[autoplay], [class*='carousel'], [class*='slider']"],
        },
    },
    Criterion {
        id: "2.4.1",
        label: "Bypass Blocks",
        extractor: Extractor::Elements {
            selectors: &[
                "a[href^='#']",
                "nav, main, header, [role='navigation'], [role='main'], [role='banner']",
            ],
        },
    },
    Criterion {
        id: "2.4.2",
        label: "Page Titled",
        extractor: Extractor::Script {
            script: probes::PAGE_TITLE_JS,
        },
    },
    Criterion {
        id: "2.4.4",
        label: "Link Purpose (In Context)",
        extractor: Extractor::Script {
            script: probes::LINK_CONTEXT_JS,
        },
    },
    Criterion {
        id: "2.4.5",
        label: "Multiple Ways",
        extractor: Extractor::ElementsWithScreenshot {
            selectors: &[
                "nav",
                "form[role='search'], input[type='search']",
                "[class*='sitemap'], a[href*='sitemap']",
            ],
        },
    },
    Criterion {
        id: "2.4.6",
        label: "Headings and Labels",
        extractor: Extractor::Elements {
            selectors: &["h1, h2, h3, h4, h5, h6", "label"],
        },
    },
    Criterion {
        id: "2.4.8",
        label: "Location",
        extractor: Extractor::Elements {
            selectors: &["[class*='breadcrumb'], nav[aria-label*='breadcrumb']", "nav"],
        },
    },
    Criterion {
        id: "2.4.9",
        label: "Link Purpose (Link Only)",
        extractor: Extractor::Elements {
            selectors: &["a[href]"],
        },
    },
    Criterion {
        id: "2.4.10",
        label: "Section Headings",
        extractor: Extractor::Script {
            script: probes::SECTION_HEADING_JS,
        },
    },
    Criterion {
        id: "2.5.3",
        label: "Label in Name",
        extractor: Extractor::Attributes {
            selector: "button, a[href], [role='button'], input[type='submit']",
            attributes: &["aria-label", "aria-labelledby", "value", "title"],
        },
    },
    Criterion {
        id: "2.5.5",
        label: "Target Size (Enhanced)",
        extractor: Extractor::Script {
            script: probes::TARGET_SIZE_JS,
        },
    },
    Criterion {
        id: "2.5.8",
        label: "Target Size (Minimum)",
        extractor: Extractor::Script {
            script: probes::TARGET_SIZE_JS,
        },
    },
    Criterion {
        id: "3.1.1",
        label: "Language of Page",
        extractor: Extractor::Attributes {
            selector: "html, [lang]",
            attributes: &["lang", "xml:lang"],
        },
    },
    Criterion {
        id: "3.1.2",
        label: "Language of Parts",
        extractor: Extractor::Attributes {
            selector: "body [lang]",
            attributes: &["lang"],
        },
    },
    Criterion {
        id: "3.1.4",
        label: "Abbreviations",
        extractor: Extractor::ElementsWithScreenshot {
            selectors: &["abbr, acronym"],
        },
    },
    Criterion {
        id: "3.2.2",
        label: "On Input",
        extractor: Extractor::Attributes {
            selector: "input, select, textarea",
            attributes: &["type", "onchange", "oninput", "onfocus", "onblur"],
        },
    },
    Criterion {
        id: "3.2.5",
        label: "Change on Request",
        extractor: Extractor::Attributes {
            selector: "[onclick], [onblur]",
            attributes: &["onclick", "onblur"],
        },
    },
    Criterion {
        id: "3.3.1",
        label: "Error Identification",
        extractor: Extractor::Screenshot,
    },
    Criterion {
        id: "3.3.2",
        label: "Labels or Instructions",
        extractor: Extractor::Script {
            script: probes::FORM_LABEL_JS,
        },
    },
    Criterion {
        id: "3.3.3",
        label: "Error Suggestion",
        extractor: Extractor::Screenshot,
    },
    Criterion {
        id: "4.1.2",
        label: "Name, Role, Value",
        extractor: Extractor::Attributes {
            selector: "[role], input, button, select, textarea, iframe",
            attributes: &["role", "aria-label", "aria-labelledby", "name", "title"],
        },
    },
];
