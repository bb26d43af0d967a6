use std::borrow::Cow;

use ego_tree::NodeRef;
use lazy_regex::{lazy_regex, Lazy, Regex};
use scraper::node::Node;
use scraper::Html;

/// Elements whose boundaries separate words in the rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Skipped along with their content. The raw-text ones would otherwise leak
/// literal tags into the output.
const SKIPPED_TAGS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "template",
    "textarea", "title", "xmp",
];

/// Character references that decode to `&` or `<`.
static MARKUP_REFERENCE: Lazy<Regex> =
    lazy_regex!(r"(?i)&(?:amp|lt|#0*(?:38|60)|#x0*(?:26|3c))");

/// Plain text of an HTML fragment with whitespace collapsed.
///
/// Entities are decoded and block boundaries become spaces. References to
/// `&` and `<` are left as written, so the output never holds markup the
/// input did not show as text, and applying it to its own output returns
/// the same string.
pub fn strip_markup(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html);
    }
    let fragment = Html::parse_fragment(&keep_markup_references(html));
    let mut text = String::with_capacity(html.len());
    for child in fragment.tree.root().children() {
        visit(child, &mut text);
    }
    collapse_whitespace(&text)
}

/// Escapes the `&` of every reference to `&` or `<` so the parser yields it
/// verbatim.
fn keep_markup_references(html: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut last = 0;
    for found in MARKUP_REFERENCE.find_iter(html) {
        let hex = found.as_str().contains(['x', 'X']);
        let continues = html[found.end()..].chars().next().is_some_and(|c| {
            if hex {
                c.is_ascii_hexdigit()
            } else {
                c.is_ascii_digit()
            }
        });
        // `&#380;` is `ż`, not `&` followed by `0;`.
        if found.as_str().contains('#') && continues {
            continue;
        }
        out.push_str(&html[last..found.start()]);
        out.push_str("&amp;");
        last = found.start() + 1;
    }
    if last == 0 {
        return Cow::Borrowed(html);
    }
    out.push_str(&html[last..]);
    Cow::Owned(out)
}

fn visit(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let tag = element.name();
            if SKIPPED_TAGS.contains(&tag) {
                return;
            }
            let block = BLOCK_TAGS.contains(&tag);
            if block {
                out.push(' ');
            }
            for child in node.children() {
                visit(child, out);
            }
            if block {
                out.push(' ');
            }
        }
        _ => {
            for child in node.children() {
                visit(child, out);
            }
        }
    }
}

/// Replaces every whitespace run, newlines and non-breaking spaces included,
/// with a single space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
