//! 記事本文の変換モジュール
//!
//! アシスタントから渡されるプレーンテキストを、JoomlaのHTMLベースの
//! 本文フィールドに変換する。Joomlaは保存されたHTMLをそのまま訪問者に
//! 表示するため、書き込み経路では必ず`sanitize`を通す。
//!
//! サニタイズは文字列置換ではなく、`scraper`でパースしたツリーを
//! 許可リストに従って再シリアライズする。

use scraper::{ElementRef, Html, Node};

/// 出力に残すタグ
const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "b",
    "em",
    "i",
    "u",
    "a",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "blockquote",
    "hr",
];

/// 子要素ごと捨てるタグ
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "svg", "math", "head",
    "title",
];

/// 終了タグを持たない要素
const VOID_TAGS: &[&str] = &["br", "hr"];

/// プレーンテキスト抽出時に改行を挟むブロック要素
const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "br",
    "hr",
    "li",
    "blockquote",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
];

/// Joomlaの「続きを読む」区切り（`<hr id="system-readmore">`）のID
pub const READMORE_ID: &str = "system-readmore";

/// 本文入力に現れうるその他のHTML要素（判定専用）
const OTHER_KNOWN_TAGS: &[&str] = &[
    "span", "div", "img", "pre", "code", "table", "thead", "tbody", "tfoot", "tr", "td", "th",
    "caption", "figure", "figcaption", "section", "article", "aside", "header", "footer", "nav",
    "sub", "sup", "s", "small", "mark", "cite", "q", "dl", "dt", "dd", "form", "input", "button",
    "link", "meta", "base", "video", "audio", "source", "frame", "frameset",
];

fn is_known_tag(name: &str) -> bool {
    ALLOWED_TAGS.contains(&name)
        || DROPPED_TAGS.contains(&name)
        || BLOCK_TAGS.contains(&name)
        || OTHER_KNOWN_TAGS.contains(&name)
}

/// テキストにHTML要素が含まれるかどうかを判定する
///
/// フラグメントとしてパースし、既知のHTML要素が1つでもあればHTMLとみなす。
/// `<john@example.com>` や `x<y and y>z` はパーサー上は要素になるが、
/// 実在しないタグ名なのでプレーンテキストのまま扱う。
pub fn looks_like_html(text: &str) -> bool {
    let fragment = Html::parse_fragment(text);
    let root = fragment.root_element();
    let found = root
        .descendants()
        .skip(1)
        .filter_map(|node| node.value().as_element())
        .any(|element| is_known_tag(element.name()));
    found
}

/// プレーンテキストを段落タグで囲んだHTMLに変換する
///
/// `already_html`が真、またはHTMLと判定された入力はそのまま返す。
/// 空行で段落を区切り、段落内の単一改行は`<br>`にする。
/// 見出しやリストの推測は行わない。
pub fn to_html(text: &str, already_html: bool) -> String {
    if already_html || looks_like_html(text) {
        return text.to_string();
    }

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in normalized.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(render_paragraph(&current));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(render_paragraph(&current));
    }

    paragraphs.join("\n")
}

fn render_paragraph(lines: &[&str]) -> String {
    let escaped: Vec<String> = lines.iter().map(|line| escape_text(line)).collect();
    format!("<p>{}</p>", escaped.join("<br>"))
}

/// HTMLを許可リストに従ってサニタイズする
///
/// - 許可タグ以外は外し、中身のテキストは残す
/// - script/style等は中身ごと削除
/// - 属性は`a`の`href`（http/https/相対のみ）と
///   `hr`の`id="system-readmore"`以外すべて削除
/// - コメントは削除
pub fn sanitize(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    write_element(child_element, out);
                }
            }
            // コメント、doctype、処理命令は出力しない
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();

    if DROPPED_TAGS.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if let Some(safe_value) = allowed_attribute(name, attr, value) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&escape_attribute(safe_value));
            out.push('"');
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// 残してよい属性なら出力する値を返す
fn allowed_attribute<'a>(tag: &str, attr: &str, value: &'a str) -> Option<&'a str> {
    match (tag, attr) {
        ("a", "href") => {
            let value = value.trim();
            if !value.is_empty() && is_safe_href(value) {
                Some(value)
            } else {
                None
            }
        }
        ("hr", "id") if value.trim() == READMORE_ID => Some(READMORE_ID),
        _ => None,
    }
}

/// hrefのスキームがhttp/httpsまたは相対URLかどうか
///
/// ブラウザはURL中のタブや改行を無視するため、空白・制御文字を
/// 取り除いてからスキームを判定する（`java\tscript:`対策）。
fn is_safe_href(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match cleaned.find([':', '/', '?', '#']) {
        Some(index) if cleaned.as_bytes()[index] == b':' => {
            let scheme = &cleaned[..index];
            scheme == "http" || scheme == "https"
        }
        _ => true,
    }
}

/// HTMLフラグメントから表示テキストを取り出す
///
/// ブロック要素の後には改行を入れる。script/style等の中身は含めない。
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if DROPPED_TAGS.contains(&name) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if BLOCK_TAGS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// CMSへ書き込む本文を準備する
///
/// 変換の有無にかかわらず必ずサニタイズする。
pub fn prepare_body(text: &str, convert_plain_text: bool) -> String {
    sanitize(&to_html(text, !convert_plain_text))
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
