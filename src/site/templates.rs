// src/site/templates.rs
//! HTML page shells. Bodies arrive pre-rendered; everything else is escaped here.

use chrono::NaiveDate;

use super::cards::SummaryCard;
use crate::render::render;
use crate::store::DISCLAIMER;

pub const STYLESHEET: &str = include_str!("../../assets/style.css");

const SUBTITLE: &str = "Automated trading intelligence from public market, congressional, insider, SEC and prediction-market data";

fn head(title: &str, css_href: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"{css_href}\">\n\
         </head>\n<body>\n",
        html_escape::encode_text(title)
    )
}

fn footer() -> String {
    format!(
        "<footer>\n<div class=\"container\">\n{}\n</div>\n</footer>\n</body>\n</html>\n",
        render(DISCLAIMER)
    )
}

pub fn archive_label(date: NaiveDate) -> String {
    format!("{} Trading Brief", date.format("%Y-%m-%d"))
}

pub fn archive_href(date: NaiveDate) -> String {
    format!("briefs/{}.html", date.format("%Y-%m-%d"))
}

/// Dashboard: cards, the latest brief, then the archive list (already windowed).
pub fn index_page(
    title: &str,
    cards: &[SummaryCard],
    brief_html: &str,
    archive: &[NaiveDate],
) -> String {
    let mut out = head(title, "css/style.css");
    out.push_str(&format!(
        "<header>\n<div class=\"container\">\n<h1>{}</h1>\n<p class=\"subtitle\">{SUBTITLE}</p>\n</div>\n</header>\n",
        html_escape::encode_text(title)
    ));
    out.push_str("<main class=\"container\">\n<section class=\"dashboard\">\n");
    for card in cards {
        out.push_str(&card.to_html());
        out.push('\n');
    }
    out.push_str("</section>\n<section class=\"brief-content\">\n");
    out.push_str(brief_html);
    out.push_str("\n</section>\n<section class=\"archive\">\n<h2>Archive</h2>\n<ul class=\"archive-list\">\n");
    for date in archive {
        out.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            archive_href(*date),
            archive_label(*date)
        ));
    }
    out.push_str("</ul>\n</section>\n</main>\n");
    out.push_str(&footer());
    out
}

/// Standalone page for one brief, linking back to the dashboard.
pub fn brief_page(date: NaiveDate, brief_html: &str) -> String {
    let title = archive_label(date);
    let mut out = head(&title, "../css/style.css");
    out.push_str(&format!(
        "<header>\n<div class=\"container\">\n<h1>{}</h1>\n\
         <p class=\"subtitle\"><a href=\"../index.html\">&larr; Back to dashboard</a></p>\n\
         </div>\n</header>\n",
        html_escape::encode_text(&title)
    ));
    out.push_str("<main class=\"container\">\n<section class=\"brief-content\">\n");
    out.push_str(brief_html);
    out.push_str("\n</section>\n</main>\n");
    out.push_str(&footer());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brief_page_links_home_and_carries_disclaimer() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let html = brief_page(d, "<p>x</p>");
        assert!(html.contains(r#"href="../index.html""#));
        assert!(html.contains(r#"href="../css/style.css""#));
        assert!(html.contains("<title>2026-01-02 Trading Brief</title>"));
        assert!(html.contains("not investment advice"));
    }

    #[test]
    fn index_escapes_title_and_lists_archive() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let html = index_page("A <b> & C", &[], "", &[d]);
        assert!(html.contains("<h1>A &lt;b&gt; &amp; C</h1>"));
        assert!(html.contains(r#"<a href="briefs/2026-01-02.html">2026-01-02 Trading Brief</a>"#));
    }
}
