use std::collections::HashSet;

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Node, Selector};

use crate::util::text;

/// 不會顯示在畫面上的標籤，取文字時略過
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// 取得文件中第一個符合 CSS 選擇器的元素
///
/// 選擇器本身不合法時回傳錯誤，找不到元素時回傳 `Ok(None)`。
pub fn select_first<'a>(document: &'a Html, css_selector: &str) -> Result<Option<ElementRef<'a>>> {
    let selector = Selector::parse(css_selector)
        .map_err(|why| anyhow!("Failed to Selector::parse({}) because: {:?}", css_selector, why))?;

    Ok(document.select(&selector).next())
}

/// 讀取元素的屬性值並去除前後空白，空字串視為不存在
pub fn attr(element: &ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// 取得元素在畫面上看得到的文字
///
/// 略過 script/style 等標籤內的文字，文字節點之間以空白相隔後再壓縮空白。
pub fn visible_text(element: ElementRef) -> String {
    let mut pieces: Vec<&str> = Vec::new();

    for node in element.descendants() {
        let Node::Text(t) = node.value() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| HIDDEN_TAGS.contains(&a.value().name()));
        if !hidden {
            pieces.push(&**t);
        }
    }

    text::normalize_whitespace(&pieces.join(" "))
}

/// 找出可見文字包含 `needle` 的元素(不分大小寫)，回傳它們的文字
///
/// 由最內層的元素開始，依序往外加入父元素直到 `body` 為止，
/// 同一個元素只會出現一次。`body` 本身的文字由呼叫端另外處理。
pub fn texts_containing(document: &Html, needle: &str) -> Vec<String> {
    let needle = needle.to_lowercase();
    let contains = |el: ElementRef| visible_text(el).to_lowercase().contains(&needle);
    let mut seen = HashSet::new();
    let mut texts = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        if HIDDEN_TAGS.contains(&element.value().name()) || !contains(element) {
            continue;
        }

        let innermost = !element.children().filter_map(ElementRef::wrap).any(contains);
        if !innermost {
            continue;
        }

        let chain = std::iter::once(element).chain(element.ancestors().filter_map(ElementRef::wrap));
        for el in chain {
            if matches!(el.value().name(), "html" | "body") {
                break;
            }

            if seen.insert(el.id()) {
                texts.push(visible_text(el));
            }
        }
    }

    texts
}

/// 取得整份文件 `body` 的可見文字，沒有 `body` 時回傳空字串
pub fn body_text(document: &Html) -> String {
    match select_first(document, "body") {
        Ok(Some(body)) => visible_text(body),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><style>.x { color: red }</style><script>var gold = "24k gold 1 Indian Rupee";</script></head>
        <body>
            <div id="card">
                <div class="title">10g of <b>24K gold</b> in Bengaluru</div>
                <div class="price"><span>75,000</span><span>Indian Rupee</span></div>
            </div>
            <span class="goldpurity-rate" data-goldrate22kt=" 6,800 " data-goldrate24kt=""></span>
        </body></html>
    "#;

    #[test]
    fn test_visible_text_skips_scripts() {
        let document = Html::parse_document(PAGE);
        let body = body_text(&document);

        assert!(body.starts_with("10g of 24K gold in Bengaluru 75,000 Indian Rupee"));
        assert!(!body.contains("var gold"));
    }

    #[test]
    fn test_texts_containing() {
        let document = Html::parse_document(PAGE);
        let texts = texts_containing(&document, "24k gold");

        assert_eq!(
            texts,
            vec![
                "24K gold".to_string(),
                "10g of 24K gold in Bengaluru".to_string(),
                "10g of 24K gold in Bengaluru 75,000 Indian Rupee".to_string(),
            ]
        );
    }

    #[test]
    fn test_attr() {
        let document = Html::parse_document(PAGE);
        let span = select_first(&document, "span.goldpurity-rate").unwrap().unwrap();

        assert_eq!(attr(&span, "data-goldrate22kt"), Some("6,800".to_string()));
        assert_eq!(attr(&span, "data-goldrate24kt"), None);
        assert_eq!(attr(&span, "data-goldrate18kt"), None);
    }

    #[test]
    fn test_select_first() {
        let document = Html::parse_document(PAGE);
        let price = select_first(&document, "#card .price").unwrap().unwrap();

        assert_eq!(visible_text(price), "75,000 Indian Rupee");
        assert!(select_first(&document, ".missing").unwrap().is_none());
        assert!(select_first(&document, "<<").is_err());
    }
}
