use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::links;

const IGNORED_CONTAINERS: [&str; 7] = [
    "nav", "footer", "script", "style", "noscript", "template", "svg",
];

const CONTENT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li";

/// Readable text pulled from one page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub url: Url,
    pub title: Option<String>,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBlock {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem(String),
}

/// Parses `html` served from `url`, returning the page text and the raw
/// outgoing links resolved against the page.
pub fn extract_page(url: &Url, html: &str) -> (PageContent, Vec<Url>) {
    let document = Html::parse_document(html);

    let title = select_all(&document, "title")
        .into_iter()
        .map(collapsed_text)
        .find(|text| !text.is_empty());

    let mut blocks: Vec<TextBlock> = Vec::new();
    for element in select_all(&document, CONTENT_SELECTOR) {
        if inside_ignored(&element) {
            continue;
        }
        let name = element.value().name();
        // List items already carry the text of nested paragraphs.
        if name != "li" && has_ancestor(&element, &["li"]) {
            continue;
        }
        let text = collapsed_text(element);
        if text.is_empty() {
            continue;
        }
        let block = match name {
            "p" => TextBlock::Paragraph(text),
            "li" => TextBlock::ListItem(text),
            heading => TextBlock::Heading {
                level: heading[1..].parse().unwrap_or(2),
                text,
            },
        };
        if blocks.last() != Some(&block) {
            blocks.push(block);
        }
    }

    let title = title.or_else(|| {
        blocks.iter().find_map(|block| match block {
            TextBlock::Heading { level: 1, text } => Some(text.clone()),
            _ => None,
        })
    });

    let links = select_all(&document, "a[href]")
        .into_iter()
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| links::resolve(url, href))
        .collect();

    (
        PageContent {
            url: url.clone(),
            title,
            blocks,
        },
        links,
    )
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn inside_ignored(element: &ElementRef<'_>) -> bool {
    has_ancestor(element, &IGNORED_CONTAINERS)
}

fn has_ancestor(element: &ElementRef<'_>, names: &[&str]) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|ancestor| names.contains(&ancestor.name()))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>  BuyBox | Invest   in property  </title>
            <style>.hero { color: red }</style>
          </head>
          <body>
            <nav><a href="/sellers">Sellers</a><p>Menu text</p></nav>
            <h1>Fractional property investing</h1>
            <p>Buy into curated
               portfolios.</p>
            <ul>
              <li><p>Vetted deals</p></li>
              <li>Quarterly reporting</li>
            </ul>
            <script>console.log("ignored")</script>
            <a href="how-it-works?ref=home#steps">How it works</a>
            <a href="mailto:team@buybox.example">Mail</a>
            <footer><p>Copyright</p></footer>
          </body>
        </html>
    "#;

    #[test]
    fn extracts_readable_blocks_in_order() {
        let url = Url::parse("https://buybox.example/").expect("valid url");
        let (content, _) = extract_page(&url, PAGE);

        assert_eq!(content.title.as_deref(), Some("BuyBox | Invest in property"));
        assert_eq!(
            content.blocks,
            vec![
                TextBlock::Heading {
                    level: 1,
                    text: "Fractional property investing".to_string()
                },
                TextBlock::Paragraph("Buy into curated portfolios.".to_string()),
                TextBlock::ListItem("Vetted deals".to_string()),
                TextBlock::ListItem("Quarterly reporting".to_string()),
            ]
        );
    }

    #[test]
    fn links_include_navigation_but_not_foreign_schemes() {
        let url = Url::parse("https://buybox.example/").expect("valid url");
        let (_, links) = extract_page(&url, PAGE);
        let links: Vec<String> = links.into_iter().map(|link| link.to_string()).collect();
        assert_eq!(
            links,
            vec![
                "https://buybox.example/sellers".to_string(),
                "https://buybox.example/how-it-works?ref=home#steps".to_string(),
            ]
        );
    }

    #[test]
    fn falls_back_to_first_heading_for_title() {
        let url = Url::parse("https://buybox.example/faq").expect("valid url");
        let (content, _) = extract_page(&url, "<body><h1>FAQ</h1><p>Answers.</p></body>");
        assert_eq!(content.title.as_deref(), Some("FAQ"));
    }
}
