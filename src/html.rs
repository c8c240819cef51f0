//! Small helpers over `scraper`. Everything takes markup as `&str` and
//! returns owned data, so no parsed document lives across an `.await`.

use scraper::{ElementRef, Html, Selector};

pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: &ElementRef) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Plain text of an HTML fragment with whitespace collapsed. Entity-escaped
/// markup (as the Greenhouse API returns it) is decoded and stripped too.
pub fn html_to_text(fragment: &str) -> String {
    let text = fragment_text(fragment);
    if fragment.contains("&lt;") {
        fragment_text(&text)
    } else {
        text
    }
}

fn fragment_text(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    collapse_ws(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Collapsed text of the first element matching `css`, if non-empty.
pub fn select_text(html: &str, css: &str) -> Option<String> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let text = doc.select(&sel).next().map(|el| element_text(&el))?;
    (!text.is_empty()).then_some(text)
}

/// Text nodes of the first element matching `css`, one per line.
pub fn select_lines(html: &str, css: &str) -> Option<String> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let el = doc.select(&sel).next()?;
    Some(
        el.text()
            .map(collapse_ws)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Collapsed, non-empty texts of every element matching `css`.
pub fn select_all_text(html: &str, css: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    doc.select(&sel)
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Values of `attr` on every element matching `css`.
pub fn select_attr(html: &str, css: &str, attr: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    doc.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .collect()
}

/// Texts of the elements matching `block_css` inside the first `container_css`.
/// `None` when the container is absent.
pub fn blocks_within(html: &str, container_css: &str, block_css: &str) -> Option<Vec<String>> {
    let container_sel = selector(container_css)?;
    let block_sel = selector(block_css)?;
    let doc = Html::parse_document(html);
    let container = doc.select(&container_sel).next()?;
    Some(
        container
            .select(&block_sel)
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

/// Texts of the direct element children of the first `container_css`, or the
/// container's own text when it has no element children.
pub fn child_blocks(html: &str, container_css: &str) -> Option<Vec<String>> {
    let sel = selector(container_css)?;
    let doc = Html::parse_document(html);
    let container = doc.select(&sel).next()?;

    let children: Vec<String> = container
        .children()
        .filter_map(ElementRef::wrap)
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect();

    if children.is_empty() {
        let own = element_text(&container);
        Some(if own.is_empty() { Vec::new() } else { vec![own] })
    } else {
        Some(children)
    }
}

/// An element picked out by a locator.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub text: String,
    /// Own `href`, or the first descendant link's.
    pub href: Option<String>,
}

/// Elements matching `css` whose text contains `containing`, in document order.
pub fn find_elements(html: &str, css: &str, containing: Option<&str>) -> Vec<Element> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    let link_sel = selector("a[href]");
    let doc = Html::parse_document(html);

    doc.select(&sel)
        .map(|el| {
            let href = el.value().attr("href").map(str::to_string).or_else(|| {
                link_sel
                    .as_ref()
                    .and_then(|ls| el.select(ls).next())
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string)
            });
            Element {
                text: element_text(&el),
                href,
            }
        })
        .filter(|e| containing.map_or(true, |needle| e.text.contains(needle)))
        .collect()
}
