//! The in-page candidate-gathering script (spec §4.4). Evaluated once per
//! page; everything downstream (visibility gating, long-text rejection,
//! dedup, danger filtering, id assignment) happens in pure Rust in
//! [`super::extractor`].

/// CSS selector families the extractor sweeps, in priority order. Mirrors
/// the teacher's practice of keeping selector lists as plain data rather
/// than inline string literals scattered through the walker.
pub const SELECTOR_FAMILIES: &[&str] = &[
    "a[href]",
    "button",
    "[role=\"button\"]",
    "[role=\"tab\"]",
    "[role=\"menuitem\"]",
    "[role=\"link\"]",
    "nav a, .nav-link, .navbar-item, .menu-item",
    "[data-testid]",
    "[data-test-id]",
    "#root [role], #root button, #root a",
    ".dataframe-dashboard button, .dataframe-dashboard [role=\"tab\"]",
];

/// Raw element candidate as handed back from the browser, pre-gating.
/// `kind` is a coarse string tag the script assigns from the selector that
/// matched; Rust maps it onto [`crate::model::ElementKind`].
pub const ELEMENT_EXTRACTION_SCRIPT: &str = r#"
(() => {
  const SELECTORS = [
    { sel: 'a[href]', kind: 'link' },
    { sel: 'button', kind: 'button' },
    { sel: '[role="button"]', kind: 'button' },
    { sel: '[role="tab"]', kind: 'tab' },
    { sel: '[role="menuitem"]', kind: 'other' },
    { sel: '[role="link"]', kind: 'link' },
    { sel: 'nav a, .nav-link, .navbar-item, .menu-item', kind: 'nav_item' },
    { sel: '[data-testid]', kind: 'other' },
    { sel: '[data-test-id]', kind: 'other' },
    { sel: '#root [role], #root button, #root a', kind: 'other' },
    { sel: '.dataframe-dashboard button, .dataframe-dashboard [role="tab"]', kind: 'tab' },
  ];

  const cssPath = (el) => {
    const segments = [];
    let node = el;
    while (node && node.nodeType === 1 && node !== document.body) {
      if (node.id) {
        segments.unshift(`#${node.id}`);
        break;
      }
      let selector = node.tagName.toLowerCase();
      const parent = node.parentElement;
      if (parent) {
        const siblings = Array.from(parent.children).filter(
          (c) => c.tagName === node.tagName
        );
        if (siblings.length > 1) {
          const index = siblings.indexOf(node) + 1;
          selector += `:nth-of-type(${index})`;
        }
      }
      segments.unshift(selector);
      node = node.parentElement;
    }
    return segments.join(' > ');
  };

  const isVisible = (el, rect, style) => {
    if (rect.width < 5 || rect.height < 5) return false;
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    if (parseFloat(style.opacity) === 0) return false;
    return true;
  };

  const seen = new Set();
  const out = [];
  for (const { sel, kind } of SELECTORS) {
    let nodes;
    try {
      nodes = document.querySelectorAll(sel);
    } catch (e) {
      continue;
    }
    for (const el of nodes) {
      if (seen.has(el)) continue;
      seen.add(el);
      const rect = el.getBoundingClientRect();
      const style = window.getComputedStyle(el);
      if (!isVisible(el, rect, style)) continue;
      const ariaLabel = el.getAttribute('aria-label') || '';
      const text = (el.innerText || el.textContent || ariaLabel || '').trim().slice(0, 100);
      if (!text) continue;
      out.push({
        kind,
        text,
        href: el.getAttribute('href') || null,
        ariaLabel: ariaLabel || null,
        testId: el.getAttribute('data-testid') || el.getAttribute('data-test-id') || null,
        cssPath: cssPath(el),
        x: rect.x + rect.width / 2,
        y: rect.y + rect.height / 2,
        w: rect.width,
        h: rect.height,
      });
    }
  }
  return out;
})()
"#;
