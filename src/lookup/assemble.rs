use crate::llcommon::{LookupQuery, RenderedLogEntry, TimeWindow, ViewModel};

/// 组装视图模型，保持记录顺序
pub fn assemble(
    query: LookupQuery,
    window: TimeWindow,
    entries: Vec<RenderedLogEntry>,
    stylesheet: String,
) -> ViewModel {
    ViewModel { entries, stylesheet, query, window }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llcommon::RawLogRecord;
    use crate::lookup::render::RecordRenderer;

    #[test]
    fn test_assemble_keeps_order() {
        let renderer = RecordRenderer::default();
        let entries: Vec<_> = ["first", "second", "third"]
            .iter()
            .map(|m| renderer.render(&RawLogRecord::new(*m)))
            .collect();
        let window = TimeWindow { start_epoch_millis: 1_000_000, end_epoch_millis: 2_000_000 };

        let view = assemble(LookupQuery::default(), window, entries.clone(), renderer.stylesheet());

        assert_eq!(view.entries, entries);
        assert!(view.entries[0].markup().contains("first"));
        assert!(view.entries[2].markup().contains("third"));
        assert_eq!(view.window, window);
    }
}
