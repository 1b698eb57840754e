//! Markdown to standalone-HTML rendering.

use tracing::error;

/// Render a markdown document into a self-contained HTML page.
///
/// GFM syntax (tables, strikethrough, task lists, autolinks, footnotes) is
/// enabled and raw HTML passes through untouched; the input is the user's
/// own local file. Code highlighting and mermaid diagrams are done in the
/// browser by the CDN scripts baked into the page template.
pub fn render_document(source: &str) -> String {
    let options = markdown::Options {
        parse: markdown::ParseOptions::gfm(),
        compile: markdown::CompileOptions {
            allow_dangerous_html: true,
            ..markdown::CompileOptions::default()
        },
    };

    let body = markdown::to_html_with_options(source, &options).unwrap_or_else(|err| {
        error!(%err, "markdown rendering failed");
        format!("<p>Unable to render markdown: {err}</p>")
    });
    let body = promote_mermaid_blocks(&body);

    PAGE_TEMPLATE.replace("{{CONTENT}}", &body)
}

/// Rewrite fenced mermaid code blocks into the `<div class="mermaid">`
/// elements the client-side mermaid runtime picks up. Block contents are
/// already HTML-escaped by the renderer and are kept verbatim.
fn promote_mermaid_blocks(html: &str) -> String {
    const OPEN: &str = "<pre><code class=\"language-mermaid\">";
    const CLOSE: &str = "</code></pre>";

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        match after.find(CLOSE) {
            Some(end) => {
                out.push_str("<div class=\"mermaid\">");
                out.push_str(&after[..end]);
                out.push_str("</div>");
                rest = &after[end + CLOSE.len()..];
            }
            None => {
                // Unterminated block: leave the tail as-is.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Inline page template so the binary has no runtime file dependencies.
const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Markdown Preview</title>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/styles/github.min.css">
    <script src="https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Helvetica Neue', Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            background-color: #fff;
            padding: 20px;
            max-width: 1200px;
            margin: 0 auto;
        }
        h1, h2, h3, h4, h5, h6 { margin-top: 24px; margin-bottom: 16px; font-weight: 600; line-height: 1.25; }
        h1 { font-size: 2em; border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
        h2 { font-size: 1.5em; border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
        h3 { font-size: 1.25em; }
        p { margin-bottom: 16px; }
        ul, ol { margin-bottom: 16px; padding-left: 2em; }
        blockquote { padding: 0 1em; color: #6a737d; border-left: 0.25em solid #dfe2e5; margin-bottom: 16px; }
        code { padding: 0.2em 0.4em; margin: 0; font-size: 85%; background-color: rgba(27, 31, 35, 0.05); border-radius: 3px; font-family: 'SFMono-Regular', Consolas, 'Liberation Mono', Menlo, monospace; }
        pre { padding: 16px; overflow: auto; font-size: 85%; line-height: 1.45; background-color: #f6f8fa; border-radius: 6px; margin-bottom: 16px; }
        pre code { display: inline; padding: 0; margin: 0; overflow: visible; line-height: inherit; word-wrap: normal; background-color: transparent; border: 0; }
        table { border-collapse: collapse; border-spacing: 0; width: 100%; margin-bottom: 16px; display: block; overflow-x: auto; }
        table th, table td { padding: 6px 13px; border: 1px solid #dfe2e5; }
        table th { font-weight: 600; background-color: #f6f8fa; }
        table tr:nth-child(2n) { background-color: #f6f8fa; }
        a { color: #0366d6; text-decoration: none; }
        a:hover { text-decoration: underline; }
        img { max-width: 100%; height: auto; margin-bottom: 16px; }
        hr { height: 0.25em; padding: 0; margin: 24px 0; background-color: #e1e4e8; border: 0; }
        .mermaid { text-align: center; margin: 20px 0; }
        .hljs { display: block; overflow-x: auto; padding: 16px; background: #f6f8fa; }
    </style>
</head>
<body>
    <div id="markdown-content">{{CONTENT}}</div>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/highlight.min.js"></script>
    <script>
        mermaid.initialize({ startOnLoad: true, theme: 'default', securityLevel: 'loose' });
        document.addEventListener('DOMContentLoaded', function() {
            document.querySelectorAll('pre code').forEach((block) => { hljs.highlightElement(block); });
            mermaid.run();
        });
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_paragraphs() {
        let html = render_document("# Title\n\nSome text.\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Some text.</p>"));
    }

    #[test]
    fn renders_gfm_tables() {
        let html = render_document("| a | b |\n| - | - |\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = render_document("before\n\n<div class=\"note\">hi</div>\n");
        assert!(html.contains("<div class=\"note\">hi</div>"));
    }

    #[test]
    fn mermaid_fences_become_divs() {
        let html = render_document("```mermaid\ngraph TD;\n  A-->B;\n```\n");
        assert!(html.contains("<div class=\"mermaid\">"));
        assert!(html.contains("A--&gt;B;"), "diagram text should stay escaped");
        assert!(!html.contains("language-mermaid"));
    }

    #[test]
    fn other_fences_keep_pre_code() {
        let html = render_document("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre><code class=\"language-rust\">"));
    }

    #[test]
    fn template_is_fully_substituted() {
        let html = render_document("hello");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("{{CONTENT}}"));
        assert_eq!(html.matches("<p>hello</p>").count(), 1);
    }

    #[test]
    fn promotes_multiple_mermaid_blocks() {
        let input = "```mermaid\na\n```\n\ntext\n\n```mermaid\nb\n```\n";
        let html = render_document(input);
        assert_eq!(html.matches("<div class=\"mermaid\">").count(), 2);
    }

    #[test]
    fn unterminated_block_is_left_alone() {
        let mangled = "<pre><code class=\"language-mermaid\">no close";
        assert_eq!(promote_mermaid_blocks(mangled), mangled);
    }
}
