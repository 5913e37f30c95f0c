//! Result formatting and web-content cleanup.
//!
//! `clean_raw_content` strips the usual noise from extracted pages: markdown
//! image references, navigation links, boilerplate lines, repeated
//! separators, and excess whitespace. It is lossy by design; the output feeds
//! an LLM prompt, not an archive.

use lazy_static::lazy_static;
use regex::Regex;
use tavily_client::SearchResult;

/// Link texts that are navigation chrome, not content.
const NAV_TERMS: &[&str] = &[
    "home", "menu", "search", "sign in", "sign out", "subscribe", "newsletter", "view", "more",
    "skip", "rss", "premium", "forums", "contact", "about", "privacy", "terms", "cookies",
    "advertise", "careers",
];

lazy_static! {
    // Markdown image references: ![alt](url)
    static ref MD_IMAGE: Regex = Regex::new(r"!\[(?:Image\s*\d*:?\s*)?[^\]]*\]\([^)]+\)").unwrap();
    // Markdown links: [text](url)
    static ref MD_LINK: Regex = Regex::new(r"\[([^\]]*)\]\([^)]+\)").unwrap();
    // Bare URLs outside markdown syntax
    static ref BARE_URL: Regex = Regex::new(r"https?://[^\s\)\]]+").unwrap();
    static ref HTML_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref CHECKBOX: Regex = Regex::new(r"- \[[ x]\]\s*").unwrap();

    // Whole lines that are navigation or boilerplate
    static ref BOILERPLATE_LINE: Regex = Regex::new(
        r"(?mi)^\s*(?:open menu|close|sign in|sign out|view profile|subscribe|newsletter|rss|premium|forums?|advertisement|sponsored|trending|popular|related|share|reply|read more|load more|show more|back to top|table of contents|on this page|in this article|topics?|tags?|latest news|recommended|see also|about us|careers|privacy policy|terms and conditions|cookies? policy|all rights reserved.*|©\s*\d{4}.*|\d+ comments?|comments?\s*\(\d*\)|skip to .*content.*|jump to.*|you may (?:also )?like|more from.*|when you purchase through links.*|we may earn.*affiliate.*)\s*$"
    ).unwrap();
    // Social platform names and share buttons on their own line
    static ref SOCIAL_LINE: Regex = Regex::new(
        r"(?mi)^\s*(?:facebook|twitter|x|instagram|youtube|linkedin|reddit|pinterest|whatsapp|flipboard|email|link|copied|share)\s*$"
    ).unwrap();
    // Empty list bullets and number-only lines
    static ref EMPTY_LIST_ITEM: Regex = Regex::new(r"(?m)^\s*[\*\-\+]\s*$").unwrap();
    static ref NUMBER_ONLY_LINE: Regex = Regex::new(r"(?m)^\s*\d+\.?\s*$").unwrap();
    // Table rules and stray quote markers on their own line
    static ref PUNCT_ONLY_LINE: Regex = Regex::new(r"(?m)^\s*[\|><]+\s*$").unwrap();

    static ref DASHES: Regex = Regex::new(r"-{3,}").unwrap();
    static ref EQUALS: Regex = Regex::new(r"={3,}").unwrap();
    static ref UNDERSCORES: Regex = Regex::new(r"_{3,}").unwrap();
    static ref STARS: Regex = Regex::new(r"\*{3,}").unwrap();
    static ref HASHES: Regex = Regex::new(r"#{3,}").unwrap();
    static ref HASHES2: Regex = Regex::new(r"#{2,}").unwrap();

    static ref EMPTY_TABLE_CELL: Regex = Regex::new(r"\|\s*\|").unwrap();
    static ref EMPTY_TABLE_ROW: Regex = Regex::new(r"\n\s*\|\s*\n").unwrap();
    static ref ELLIPSIS_MARKER: Regex = Regex::new(r"\s*\[(?:\.\.\.|…)\]\s*").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r" {2,}").unwrap();
    static ref TABS: Regex = Regex::new(r"\t+").unwrap();
    static ref MULTI_NEWLINE: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref MULTI_NEWLINE2: Regex = Regex::new(r"\n{2,}").unwrap();
}

/// Format search results as prompt context, one block per source.
pub fn format_web_results(results: &[SearchResult]) -> String {
    let mut output = String::from("Search results: \n\n");
    for (i, item) in results.iter().enumerate() {
        output.push_str(&format!("\n\n--- SOURCE {}: {} ---\n", i + 1, item.title));
        output.push_str(&format!("URL: {}\n\n", item.url));
        output.push_str(&format!("SUMMARY OF WEBPAGE:\n{}\n\n", item.content));
        output.push('\n');
    }
    output
}

/// Strip web noise from raw page content.
pub fn clean_raw_content(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let cleaned = MD_IMAGE.replace_all(content, "");

    // Keep link text for real links; drop it for navigation-style ones.
    let cleaned = MD_LINK.replace_all(&cleaned, |caps: &regex::Captures| {
        let text = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let lowered = text.trim().to_lowercase();
        if text.len() < 4 || NAV_TERMS.contains(&lowered.as_str()) {
            String::new()
        } else {
            text.to_string()
        }
    });

    let cleaned = BARE_URL.replace_all(&cleaned, "");
    let cleaned = HTML_COMMENT.replace_all(&cleaned, "");
    let cleaned = CHECKBOX.replace_all(&cleaned, "");

    let cleaned = BOILERPLATE_LINE.replace_all(&cleaned, "");
    let cleaned = SOCIAL_LINE.replace_all(&cleaned, "");
    let cleaned = EMPTY_LIST_ITEM.replace_all(&cleaned, "");
    let cleaned = NUMBER_ONLY_LINE.replace_all(&cleaned, "");

    let cleaned = DASHES.replace_all(&cleaned, "--");
    let cleaned = EQUALS.replace_all(&cleaned, "==");
    let cleaned = UNDERSCORES.replace_all(&cleaned, "__");
    let cleaned = STARS.replace_all(&cleaned, "**");
    let cleaned = HASHES.replace_all(&cleaned, "##");

    let cleaned = PUNCT_ONLY_LINE.replace_all(&cleaned, "");
    let cleaned = EMPTY_TABLE_CELL.replace_all(&cleaned, "|");
    let cleaned = EMPTY_TABLE_ROW.replace_all(&cleaned, "\n");
    let cleaned = ELLIPSIS_MARKER.replace_all(&cleaned, " ");

    let cleaned = MULTI_SPACE.replace_all(&cleaned, " ");
    let cleaned = TABS.replace_all(&cleaned, " ");
    let cleaned = MULTI_NEWLINE.replace_all(&cleaned, "\n\n");

    // Strip per-line whitespace, then collapse the blank lines that leaves.
    let cleaned: String = cleaned
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = MULTI_NEWLINE.replace_all(&cleaned, "\n\n");

    cleaned.trim().to_string()
}

/// Tighten already-formatted output before it goes into a prompt.
pub fn clean_formatted_output(formatted: &str) -> String {
    let cleaned = DASHES.replace_all(formatted, "--");
    let cleaned = EQUALS.replace_all(&cleaned, "==");
    let cleaned = UNDERSCORES.replace_all(&cleaned, "__");
    let cleaned = MULTI_NEWLINE2.replace_all(&cleaned, "\n");
    let cleaned = ELLIPSIS_MARKER.replace_all(&cleaned, " ");
    let cleaned = MULTI_SPACE.replace_all(&cleaned, " ");
    let cleaned = TABS.replace_all(&cleaned, " ");
    let cleaned = HASHES2.replace_all(&cleaned, "#");
    let cleaned = EMPTY_TABLE_CELL.replace_all(&cleaned, "|");
    let cleaned = EMPTY_TABLE_ROW.replace_all(&cleaned, "\n");
    cleaned.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_blocks_are_numbered() {
        let results = vec![
            SearchResult {
                url: "https://a.com".into(),
                title: "First".into(),
                content: "alpha".into(),
                score: 0.9,
                raw_content: None,
                published_date: None,
                favicon: None,
            },
            SearchResult {
                url: "https://b.com".into(),
                title: "Second".into(),
                content: "beta".into(),
                score: 0.8,
                raw_content: None,
                published_date: None,
                favicon: None,
            },
        ];

        let formatted = format_web_results(&results);
        assert!(formatted.contains("--- SOURCE 1: First ---"));
        assert!(formatted.contains("--- SOURCE 2: Second ---"));
        assert!(formatted.contains("URL: https://b.com"));
    }

    #[test]
    fn strips_markdown_images_and_nav_links() {
        let input = "Intro ![Image 3: chart](https://img) text [Subscribe](https://x) and [a real article title](https://y) end";
        let cleaned = clean_raw_content(input);
        assert!(!cleaned.contains("img"));
        assert!(!cleaned.contains("Subscribe"));
        assert!(cleaned.contains("a real article title"));
    }

    #[test]
    fn drops_boilerplate_lines() {
        let input = "Real paragraph.\nSign in\nAdvertisement\nAnother real line.\n© 2026 SomeCorp";
        let cleaned = clean_raw_content(input);
        assert!(cleaned.contains("Real paragraph."));
        assert!(cleaned.contains("Another real line."));
        assert!(!cleaned.contains("Sign in"));
        assert!(!cleaned.contains("Advertisement"));
        assert!(!cleaned.contains("SomeCorp"));
    }

    #[test]
    fn collapses_separators_and_whitespace() {
        let input = "title\n----------\nbody    with   spaces\n\n\n\n\nend";
        let cleaned = clean_raw_content(input);
        assert!(cleaned.contains("--"));
        assert!(!cleaned.contains("----"));
        assert!(cleaned.contains("body with spaces"));
        assert!(!cleaned.contains("\n\n\n"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_raw_content(""), "");
    }

    #[test]
    fn formatted_output_newlines_collapse_to_one() {
        let cleaned = clean_formatted_output("a\n\n\nb  c\t\td");
        assert_eq!(cleaned, "a\nb c d");
    }
}
