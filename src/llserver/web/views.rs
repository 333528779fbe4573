//! 页面模板
//!
//! 启动时加载一次，之后只读共享

use std::path::Path;

use tracing::{info, warn};

use crate::llcommon::{Result, ViewModel};
use crate::lookup::render::escape_html;

const BUILTIN_INDEX: &str = include_str!("../../../templates/index.html");
const BUILTIN_LOG_OUTPUT: &str = include_str!("../../../templates/logoutput.html");

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Clone)]
pub struct Views {
    index: String,
    log_output: String,
}

impl Views {
    /// 内置模板
    pub fn builtin() -> Self {
        Self {
            index: BUILTIN_INDEX.to_string(),
            log_output: BUILTIN_LOG_OUTPUT.to_string(),
        }
    }

    /// 从模板目录加载，目录不存在时使用内置模板
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            warn!(target: "web", "模板目录 {:?} 不存在，使用内置模板", dir);
            return Ok(Self::builtin());
        }

        let views = Self {
            index: std::fs::read_to_string(dir.join("index.html"))?,
            log_output: std::fs::read_to_string(dir.join("logoutput.html"))?,
        };
        info!(target: "web", "已从 {:?} 加载模板", dir);
        Ok(views)
    }

    pub fn render_index(&self) -> String {
        self.index.clone()
    }

    /// 渲染结果页
    pub fn render_log_output(&self, view: &ViewModel) -> String {
        let identifier = view
            .query
            .request_id
            .as_deref()
            .or(view.query.correlation_id.as_deref())
            .unwrap_or("errors");
        let format_time = |time: Option<chrono::DateTime<chrono::Utc>>| {
            time.map(|t| t.format(TIME_FORMAT).to_string()).unwrap_or_default()
        };

        let mut logs = String::new();
        for entry in &view.entries {
            logs.push_str(r#"<div class="entry">"#);
            logs.push_str(entry.markup());
            logs.push_str("</div>\n");
        }

        let identifier = escape_html(identifier);
        let start = format_time(view.window.start_time());
        let end = format_time(view.window.end_time());
        let count = view.entries.len().to_string();

        fill(
            &self.log_output,
            &[
                ("css", view.stylesheet.as_str()),
                ("identifier", identifier.as_str()),
                ("env", view.query.environment_or_default().as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("count", count.as_str()),
                ("logs", logs.as_str()),
            ],
        )
    }
}

/// 单遍替换 `{{ name }}` 占位符，替换进来的内容不会被再次展开
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let name = after[..close].trim();
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
