use market_watch::extractor::{
    build_page, content_hash, extract, extract_html_text, Extraction, is_feed_like, normalize,
    normalized_lines,
};
use market_watch::types::{Platform, SiteSpec, SourceType};
use pretty_assertions::assert_eq;

mod common;

const REDDIT_FEED_URL: &str = "https://www.reddit.com/r/devops/.rss";

const REDDIT_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>r/devops</title>
    <link>https://www.reddit.com/r/devops/</link>
    <description>DevOps discussions</description>
    <item>
      <title>Jenkins   pipelines are slow</title>
      <link>https://www.reddit.com/r/devops/comments/abc/</link>
      <pubDate>Mon, 06 Oct 2025 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Moving to GitHub Actions</title>
      <link>https://blog.example.com/moving</link>
    </item>
    <item>
      <description>An item without a title</description>
      <link>https://www.reddit.com/r/devops/comments/def/</link>
    </item>
  </channel>
</rss>"#;

const CHANGELOG_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Changelog</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2025-10-01T00:00:00Z</updated>
  <entry>
    <title>Release 4.2</title>
    <id>https://example.com/changelog/4-2</id>
    <updated>2025-10-01T00:00:00Z</updated>
  </entry>
  <entry>
    <title>Release 4.1</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2025-09-01T00:00:00Z</updated>
  </entry>
</feed>"#;

#[test]
fn normalization_is_idempotent() {
    let messy = "  Hello World \n\n\tHELLO world\nSecond   line  \n second   LINE\n\n";
    let once = normalize(messy);
    assert_eq!(normalize(&once), once);
    assert_eq!(once, "hello world\nsecond   line");
}

#[test]
fn dedup_keeps_first_occurrence_order() {
    assert_eq!(normalized_lines("b\na\nb\nc\na"), vec!["b", "a", "c"]);
}

#[test]
fn feed_markers_are_detected() {
    assert!(is_feed_like(REDDIT_RSS));
    assert!(is_feed_like(CHANGELOG_ATOM));
    assert!(is_feed_like("content-type: APPLICATION/RSS+XML"));
    assert!(!is_feed_like("<html><body>plain page</body></html>"));
}

#[test]
fn rss_items_become_quotes_and_lines() {
    common::init_tracing();

    let extraction = extract(REDDIT_RSS, REDDIT_FEED_URL);

    assert_eq!(extraction.quotes.len(), 2, "untitled item must be dropped");

    let first = &extraction.quotes[0];
    assert_eq!(first.summary, "Jenkins pipelines are slow");
    assert_eq!(first.link, "https://www.reddit.com/r/devops/comments/abc/");
    assert_eq!(first.platform, Platform::Reddit);
    assert!(first.publication_date.is_some());

    // Off-platform link falls back to the feed's platform.
    let second = &extraction.quotes[1];
    assert_eq!(second.link, "https://blog.example.com/moving");
    assert_eq!(second.platform, Platform::Reddit);
    assert_eq!(second.publication_date, None);

    assert_eq!(
        extraction.text,
        "[reddit] jenkins pipelines are slow (https://www.reddit.com/r/devops/comments/abc/)\n\
         [reddit] moving to github actions (https://blog.example.com/moving)"
    );
}

#[test]
fn atom_entry_link_prefers_id_then_feed_url() {
    let feed_url = "https://example.com/changelog.atom";
    let extraction = extract(CHANGELOG_ATOM, feed_url);

    let links: Vec<&str> = extraction.quotes.iter().map(|q| q.link.as_str()).collect();
    assert_eq!(links, vec!["https://example.com/changelog/4-2", feed_url]);
    assert!(extraction
        .quotes
        .iter()
        .all(|q| q.platform == Platform::Other));
}

#[test]
fn html_prefers_main_landmark_and_drops_scripts() {
    let html = r#"<html>
<head><title>Blog</title><style>.x { color: red }</style>
<script>var a = "<p>hidden</p>";</script></head>
<body>
<nav>Home | Pricing</nav>
<main id="content">
  <h1>New Release</h1>
  <p>We shipped &amp; improved pipelines.</p>
  <div><p>NEW RELEASE</p></div>
  <!-- build 1234 -->
</main>
<footer>Copyright</footer>
</body></html>"#;

    let extraction = extract(html, "https://example.com/blog");
    assert!(extraction.quotes.is_empty());
    assert_eq!(extraction.text, "new release\nwe shipped & improved pipelines.");
}

#[test]
fn html_role_main_region_is_balanced() {
    let html = r#"<body><div class="menu">Menu</div>
<div role="main"><div><p>Alpha</p></div><p>Beta</p></div>
<div>Footer</div></body>"#;

    assert_eq!(extract_html_text(html), "Alpha\nBeta");
}

#[test]
fn inline_markup_stays_on_one_line() {
    let html = r#"<body><p>We now support <a href="/x">GitLab</a> and <b>Bitbucket</b> runners.</p><p>Pricing <em>and</em> plans</p><ul><li>Free<br/>tier</li></ul></body>"#;

    let extraction = extract(html, "https://example.com/pricing");

    assert_eq!(
        extraction.text,
        "we now support gitlab and bitbucket runners.\npricing and plans\nfree\ntier"
    );
}

#[test]
fn role_values_that_only_start_with_main_are_ignored() {
    let html = r#"<body><div role="mainnav">Menu</div><p>Real article body</p></body>"#;
    assert_eq!(extract_html_text(html), "Menu\nReal article body");

    let unquoted = "<body><nav>Skip</nav><section role=main class=x><p>Article</p></section></body>";
    assert_eq!(extract_html_text(unquoted), "Article");
}

#[test]
fn custom_elements_named_main_are_not_the_landmark() {
    let html = "<body><main-content>Widget</main-content><p>Article</p></body>";
    assert_eq!(extract_html_text(html), "Widget\nArticle");
}

#[test]
fn html_without_landmark_uses_body() {
    let html = "<html><head><title>Ignored</title></head><body><p>One</p>\n<p>  Two </p></body></html>";
    assert_eq!(extract_html_text(html), "One\nTwo");
    assert_eq!(extract_html_text("plain text\n\n line two "), "plain text\nline two");
}

#[test]
fn malformed_payloads_degrade_without_panicking() {
    common::init_tracing();

    let broken_feed = extract("<rss this is not xml at all", REDDIT_FEED_URL);
    assert_eq!(broken_feed, Extraction::default());

    let garbage = extract("<<<>>> <div", "https://example.com");
    assert!(garbage.quotes.is_empty());

    let empty = extract("", "https://example.com");
    assert_eq!(empty.text, "");
}

#[test]
fn build_page_resolves_type_and_hash() {
    let site = SiteSpec {
        url: "https://example.com/news".to_string(),
        explicit_type: Some(SourceType::Analyst),
    };
    let page = build_page(&site, "<body><p>Hello</p></body>", 42);

    assert_eq!(page.url, site.url);
    assert_eq!(page.raw_text, "hello");
    assert_eq!(page.source_type, SourceType::Analyst);
    assert_eq!(page.fetched_at, 42);
    assert_eq!(page.content_hash, content_hash("hello"));
    assert_eq!(page.content_hash.len(), 64);

    let inferred = build_page(
        &SiteSpec {
            url: REDDIT_FEED_URL.to_string(),
            explicit_type: None,
        },
        REDDIT_RSS,
        42,
    );
    assert_eq!(inferred.source_type, SourceType::Social);
    assert_eq!(inferred.quotes.len(), 2);
}
