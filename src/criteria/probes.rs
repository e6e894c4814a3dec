//! Page probe scripts
//!
//! Synchronous snippets run inside the page to serialize computed facts
//! the plain selector extractors cannot reach. Every probe returns an
//! array of strings and caps its own output so a pathological page does
//! not flood the evidence collection.

/// Text-bearing elements with their computed color, background, and font
/// metrics. Shared by both contrast criteria.
pub const CONTRAST_PROBE_JS: &str = "\
return Array.from(document.querySelectorAll(\
  'p, span, a, li, h1, h2, h3, h4, h5, h6, td, th, label, button'))\
  .filter(function (el) { return el.innerText && el.innerText.trim().length > 0; })\
  .slice(0, 400)\
  .map(function (el) {\
    var s = window.getComputedStyle(el);\
    return el.outerHTML.slice(0, el.outerHTML.indexOf('>') + 1) +\
      ' | color: ' + s.color + ' | background: ' + s.backgroundColor +\
      ' | font-size: ' + s.fontSize + ' | font-weight: ' + s.fontWeight;\
  });";

/// Tables linearized row by row, cell text joined left to right.
pub const TABLE_LINEARIZE_JS: &str = "\
return Array.from(document.querySelectorAll('table')).slice(0, 20)\
  .map(function (t) {\
    return Array.from(t.rows).map(function (r) {\
      return Array.from(r.cells).map(function (c) {\
        return c.innerText.trim();\
      }).join(' | ');\
    }).join('\\n');\
  });";

/// Document title plus the leading body text it should describe.
pub const PAGE_TITLE_JS: &str = "\
return [\
  'Title: ' + document.title,\
  'Portion text: ' + document.body.innerText.slice(0, 1500)\
];";

/// Anchors with the text of their nearest block-level context.
pub const LINK_CONTEXT_JS: &str = "\
return Array.from(document.querySelectorAll('a[href]')).slice(0, 300)\
  .map(function (a) {\
    var ctx = a.closest('p, li, td, div');\
    return a.outerHTML + ' | context: ' +\
      (ctx ? ctx.innerText.trim().slice(0, 160) : '<none>');\
  });";

/// Sections paired with their first heading, if any.
pub const SECTION_HEADING_JS: &str = "\
return Array.from(document.querySelectorAll('section, article, main, aside'))\
  .slice(0, 100)\
  .map(function (s) {\
    var h = s.querySelector('h1, h2, h3, h4, h5, h6');\
    return s.tagName.toLowerCase() + (s.id ? '#' + s.id : '') +\
      ' | heading: ' + (h ? h.outerHTML : '<none>');\
  });";

/// Clickable targets with their rendered bounding-box dimensions.
pub const TARGET_SIZE_JS: &str = "\
return Array.from(document.querySelectorAll(\
  'a[href], button, input, select, [role=\"button\"], [onclick]'))\
  .slice(0, 300)\
  .map(function (el) {\
    var r = el.getBoundingClientRect();\
    return el.outerHTML.slice(0, el.outerHTML.indexOf('>') + 1) +\
      ' | width: ' + Math.round(r.width) + 'px' +\
      ' | height: ' + Math.round(r.height) + 'px';\
  });";

/// Focusable controls with the computed styles that carry their visual
/// boundary.
pub const FOCUS_STYLE_JS: &str = "\
return Array.from(document.querySelectorAll('a[href], button, input, select, textarea'))\
  .slice(0, 300)\
  .map(function (el) {\
    var s = window.getComputedStyle(el);\
    return el.outerHTML.slice(0, el.outerHTML.indexOf('>') + 1) +\
      ' | outline: ' + s.outline + ' | border: ' + s.border +\
      ' | background: ' + s.backgroundColor;\
  });";

/// Text blocks with the presentation metrics WCAG 1.4.8 cares about.
pub const VISUAL_PRESENTATION_JS: &str = "\
return Array.from(document.querySelectorAll('p')).slice(0, 200)\
  .filter(function (el) { return el.innerText.trim().length > 80; })\
  .map(function (el) {\
    var s = window.getComputedStyle(el);\
    var r = el.getBoundingClientRect();\
    return el.outerHTML.slice(0, el.outerHTML.indexOf('>') + 1) +\
      ' | text-align: ' + s.textAlign + ' | line-height: ' + s.lineHeight +\
      ' | width: ' + Math.round(r.width) + 'px';\
  });";

/// Form controls with their associated labels and placeholder fallbacks.
pub const FORM_LABEL_JS: &str = "\
return Array.from(document.querySelectorAll('input, select, textarea')).slice(0, 200)\
  .map(function (el) {\
    var labels = el.labels ? Array.from(el.labels).map(function (l) {\
      return l.innerText.trim();\
    }).filter(function (t) { return t.length > 0; }).join(', ') : '';\
    return el.outerHTML.slice(0, el.outerHTML.indexOf('>') + 1) +\
      ' | labels: ' + (labels || '<none>') +\
      ' | placeholder: ' + (el.getAttribute('placeholder') || '<absent>');\
  });";
