use super::{MarkupCache, escape_html, patch_html};
use crate::state::{Player, QuestEntry};

pub const LIST_ID: &str = "quest-list";

pub fn render(log: &[QuestEntry]) -> String {
    if log.is_empty() {
        return "<div style=\"color: #666; font-style: italic; padding:5px;\">No active quests.</div>".into();
    }
    log.iter()
        .map(|q| {
            format!(
                "<div class=\"interaction-item\" style=\"border-left:3px solid #ffd700; padding:5px; margin-bottom:5px; background-color:rgba(40,40,40,0.5);\">\
                 <div style=\"color: #ffd700; font-weight: bold; font-size: 0.95em;\">{}</div>\
                 <div style=\"font-size: 0.85em; color: #aaa;\">{}</div></div>",
                escape_html(q.title()),
                escape_html(q.description())
            )
        })
        .collect()
}

pub fn update(player: &Player, cache: &mut MarkupCache) {
    patch_html(cache, LIST_ID, &render(&player.quest_log));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_detailed_entries() {
        let log: Vec<QuestEntry> = serde_json::from_str(
            r#"["Find the key", {"title": "Rats!"}, {"description": "Talk to Gareth"}]"#,
        )
        .unwrap();
        let html = render(&log);
        assert!(html.contains(">Find the key<"));
        assert!(html.contains(">Rats!<"));
        assert!(html.contains(">In Progress<"));
        assert!(html.contains(">Active Quest<"));
        assert!(html.contains(">Talk to Gareth<"));
    }

    #[test]
    fn empty_log() {
        assert!(render(&[]).contains("No active quests."));
    }
}
