//! 日志记录渲染
//!
//! 1. 按JSON美化输出，失败则保留原文
//! 2. 用JSON词法切分并按主题套上CSS类
//! 3. 原文在任何情况下都先做HTML转义，再作为可信标记输出

use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::llcommon::{AppError, RawLogRecord, RenderedLogEntry, Result};

/// 词法单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Key,
    String,
    Integer,
    Float,
    Constant,
    Punctuation,
    Whitespace,
}

impl TokenKind {
    /// 对应的CSS类名，空白不加标记
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            TokenKind::Key => Some("nt"),
            TokenKind::String => Some("s2"),
            TokenKind::Integer => Some("mi"),
            TokenKind::Float => Some("mf"),
            TokenKind::Constant => Some("kc"),
            TokenKind::Punctuation => Some("p"),
            TokenKind::Whitespace => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// 高亮主题
#[derive(Debug)]
pub struct Theme {
    pub name: &'static str,
    pub background: &'static str,
    pub foreground: &'static str,
    pub line_number: &'static str,
    pub classes: &'static [(&'static str, &'static str)],
}

/// Monokai 配色
pub const MONOKAI: Theme = Theme {
    name: "monokai",
    background: "#272822",
    foreground: "#f8f8f2",
    line_number: "#7f7f7f",
    classes: &[
        ("nt", "color: #f92672"),
        ("s2", "color: #e6db74"),
        ("mi", "color: #ae81ff"),
        ("mf", "color: #ae81ff"),
        ("kc", "color: #66d9ef"),
        ("p", "color: #f8f8f2"),
    ],
};

impl Theme {
    /// 生成样式表
    pub fn stylesheet(&self) -> String {
        let mut css = String::new();
        let _ = writeln!(css, "/* {} */", self.name);
        let _ = writeln!(
            css,
            ".chroma {{ color: {}; background-color: {}; }}",
            self.foreground, self.background
        );
        let _ = writeln!(css, ".chroma .line {{ display: flex; }}");
        let _ = writeln!(css, ".chroma .cl {{ white-space: pre; }}");
        let _ = writeln!(
            css,
            ".chroma .ln {{ white-space: pre; user-select: none; margin-right: 0.4em; padding: 0 0.4em 0 0.4em; color: {}; }}",
            self.line_number
        );
        for (class, declarations) in self.classes {
            let _ = writeln!(css, ".chroma .{} {{ {} }}", class, declarations);
        }
        css
    }
}

/// 记录渲染器
#[derive(Debug, Clone, Copy)]
pub struct RecordRenderer {
    theme: &'static Theme,
}

impl Default for RecordRenderer {
    fn default() -> Self {
        Self::new(&MONOKAI)
    }
}

impl RecordRenderer {
    pub fn new(theme: &'static Theme) -> Self {
        Self { theme }
    }

    /// 当前主题的样式表，每个请求计算一次
    pub fn stylesheet(&self) -> String {
        self.theme.stylesheet()
    }

    /// 渲染一条记录，永不失败；出错时退化为转义后的原文
    pub fn render(&self, record: &RawLogRecord) -> RenderedLogEntry {
        let body = match pretty_print(&record.message) {
            Ok(pretty) => match highlight(&pretty) {
                Ok(html) => html,
                Err(e) => {
                    warn!(
                        target: "render",
                        message = "高亮失败，按原文显示",
                        error.summary = e.get_error_type_summary(),
                        error.details = %e
                    );
                    escape_html(&pretty)
                }
            },
            Err(e) => {
                debug!(target: "render", message = "非JSON日志，按原文显示", error.details = %e);
                escape_html(&record.message)
            }
        };
        RenderedLogEntry::from_trusted_markup(wrap_lines(&body))
    }
}

const INDENT: &str = "  ";

/// JSON美化输出（两空格缩进）
///
/// 只重排空白，每个词法单元原样保留：大整数、`1E5`、`1.50` 和重复键都不变
pub fn pretty_print(message: &str) -> Result<String> {
    serde_json::from_str::<serde::de::IgnoredAny>(message)?;

    let tokens: Vec<Token<'_>> = tokenize(message)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect();

    let mut out = String::with_capacity(message.len() * 2);
    let mut depth = 0usize;
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        match token.text {
            "{" | "[" => {
                out.push_str(token.text);
                let closes_at_once = matches!(iter.peek(), Some(next) if next.text == "}" || next.text == "]");
                if closes_at_once {
                    if let Some(close) = iter.next() {
                        out.push_str(close.text);
                    }
                } else {
                    depth += 1;
                    newline(&mut out, depth);
                }
            }
            "}" | "]" => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push_str(token.text);
            }
            "," => {
                out.push(',');
                newline(&mut out, depth);
            }
            ":" => out.push_str(": "),
            text => out.push_str(text),
        }
    }
    Ok(out)
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// 高亮为内联HTML片段，不含行号
pub fn highlight(text: &str) -> Result<String> {
    let tokens = tokenize(text)?;
    let mut out = String::with_capacity(text.len() * 2);
    for token in tokens {
        match token.kind.css_class() {
            Some(class) => {
                let _ = write!(out, r#"<span class="{}">{}</span>"#, class, escape_html(token.text));
            }
            None => out.push_str(&escape_html(token.text)),
        }
    }
    Ok(out)
}

/// JSON词法切分
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let start = i;
        let kind = match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => {
                while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r' | b'\n') {
                    i += 1;
                }
                TokenKind::Whitespace
            }
            b'{' | b'}' | b'[' | b']' | b':' | b',' => {
                i += 1;
                TokenKind::Punctuation
            }
            b'"' => {
                i = scan_string(bytes, i)?;
                if next_significant(bytes, i) == Some(b':') {
                    TokenKind::Key
                } else {
                    TokenKind::String
                }
            }
            b'-' | b'0'..=b'9' => {
                let (end, is_float) = scan_number(bytes, i);
                i = end;
                if is_float {
                    TokenKind::Float
                } else {
                    TokenKind::Integer
                }
            }
            b't' | b'f' | b'n' => {
                let literal = ["true", "false", "null"]
                    .into_iter()
                    .find(|lit| text[i..].starts_with(lit))
                    .ok_or_else(|| unexpected(text, i))?;
                i += literal.len();
                TokenKind::Constant
            }
            _ => return Err(unexpected(text, i)),
        };
        tokens.push(Token { kind, text: &text[start..i] });
    }

    Ok(tokens)
}

fn unexpected(text: &str, offset: usize) -> AppError {
    let found = text[offset..].chars().next().unwrap_or_default();
    AppError::RenderError(format!("位置 {} 出现意外字符 {:?}", offset, found))
}

/// 返回字符串结束引号之后的位置
fn scan_string(bytes: &[u8], start: usize) -> Result<usize> {
    let mut i = start + 1;
    let mut escaped = false;
    while i < bytes.len() {
        match bytes[i] {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return Ok(i + 1),
            _ => {}
        }
        i += 1;
    }
    Err(AppError::RenderError(format!("位置 {} 的字符串未结束", start)))
}

fn scan_number(bytes: &[u8], start: usize) -> (usize, bool) {
    let mut i = start;
    let mut is_float = false;
    if bytes[i] == b'-' {
        i += 1;
    }
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => {}
            b'.' | b'e' | b'E' => is_float = true,
            b'+' | b'-' if matches!(bytes[i - 1], b'e' | b'E') => {}
            _ => break,
        }
        i += 1;
    }
    (i, is_float)
}

fn next_significant(bytes: &[u8], from: usize) -> Option<u8> {
    bytes[from..].iter().copied().find(|b| !b.is_ascii_whitespace())
}

/// 加上行号包装，输入必须已经转义
fn wrap_lines(body: &str) -> String {
    let body = body.strip_suffix('\n').unwrap_or(body);
    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(r#"<pre class="chroma"><code>"#);
    for (index, line) in body.split('\n').enumerate() {
        let _ = write!(
            out,
            r#"<span class="line"><span class="ln">{}</span><span class="cl">{}</span></span>"#,
            index + 1,
            line
        );
        out.push('\n');
    }
    out.push_str("</code></pre>");
    out
}

/// 转义HTML特殊字符
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
