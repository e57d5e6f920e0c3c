use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{Medium, QueryDescriptor};

// Capture groups are ordered anime, manga, light novel in both patterns
static DOUBLED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{([^}]*)\}\}|<<([^>]*)>>|\]\]([^\]]*)\[\[").unwrap()
});

pub(super) static SINGLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{([^{}]*)\}|<([^<>]*)>|\]([^\[\]]*)\[").unwrap()
});

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]*`").unwrap());

static DISCORD_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<a?:\w+:\d{15,21}>",              // custom emoji
        r"|<@[!&]?\d+>",                     // user and role mentions
        r"|<#\d+>",                          // channel mentions
        r"|</[\w -]+:\d+>",                  // slash command mentions
        r"|<t:-?\d+(?::[tTdDfFR])?>",        // timestamps
    ))
    .unwrap()
});

/// Strip code and Discord markup so it never reads as a `<manga>` tag
pub fn clean_message(content: &str) -> String {
    let text = CODE_BLOCK.replace_all(content, "");
    let text = INLINE_CODE.replace_all(&text, "");
    DISCORD_MARKUP.replace_all(&text, "").into_owned()
}

/// Lazily scan `text` for bracket tags.
///
/// Doubled tags come first. At most one of them can be expanded per message, so
/// a message holding two or more doubled tags gets no expanded card at all.
pub fn searches(text: &str, expanded_allowed: bool) -> Searches<'_> {
    let doubled = DOUBLED_TAG.find_iter(text).take(2).count();

    Searches {
        text,
        remaining: String::new(),
        phase: Phase::Doubled,
        pos: 0,
        expanded: expanded_allowed && doubled == 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Doubled,
    Single,
    Done,
}

pub struct Searches<'a> {
    text: &'a str,
    /// `text` with every doubled tag erased, filled in when the doubled pass ends
    remaining: String,
    phase: Phase,
    pos: usize,
    expanded: bool,
}

impl Iterator for Searches<'_> {
    type Item = QueryDescriptor;

    fn next(&mut self) -> Option<QueryDescriptor> {
        loop {
            match self.phase {
                Phase::Doubled => {
                    let Some(caps) = DOUBLED_TAG.captures_at(self.text, self.pos) else {
                        self.remaining = DOUBLED_TAG.replace_all(self.text, "").into_owned();
                        self.phase = Phase::Single;
                        self.pos = 0;
                        continue;
                    };
                    self.pos = caps.get(0).map_or(self.text.len(), |m| m.end());
                    if let Some(query) = descriptor(&caps, self.expanded) {
                        return Some(query);
                    }
                }
                Phase::Single => {
                    let Some(caps) = SINGLE_TAG.captures_at(&self.remaining, self.pos) else {
                        self.phase = Phase::Done;
                        return None;
                    };
                    self.pos = caps.get(0).map_or(self.remaining.len(), |m| m.end());
                    if let Some(query) = descriptor(&caps, false) {
                        return Some(query);
                    }
                }
                Phase::Done => return None,
            }
        }
    }
}

fn descriptor(caps: &Captures<'_>, expanded: bool) -> Option<QueryDescriptor> {
    let (medium, inner) = if let Some(m) = caps.get(1) {
        (Medium::Anime, m)
    } else if let Some(m) = caps.get(2) {
        (Medium::Manga, m)
    } else {
        (Medium::LightNovel, caps.get(3)?)
    };

    let search_text = inner.as_str().trim();
    if search_text.is_empty() {
        return None;
    }

    Some(QueryDescriptor {
        medium,
        search_text: search_text.to_string(),
        expanded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<QueryDescriptor> {
        searches(text, true).collect()
    }

    fn query(medium: Medium, search_text: &str, expanded: bool) -> QueryDescriptor {
        QueryDescriptor {
            medium,
            search_text: search_text.to_string(),
            expanded,
        }
    }

    #[test]
    fn test_no_brackets() {
        assert!(collect("just chatting about shows").is_empty());
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_single_tags_map_to_medium() {
        assert_eq!(collect("{Nisekoi}"), vec![query(Medium::Anime, "Nisekoi", false)]);
        assert_eq!(collect("<Bonnouji>"), vec![query(Medium::Manga, "Bonnouji", false)]);
        assert_eq!(
            collect("]Utsuro no Hako["),
            vec![query(Medium::LightNovel, "Utsuro no Hako", false)]
        );
    }

    #[test]
    fn test_doubled_tags_map_to_medium() {
        assert_eq!(collect("{{Nisekoi}}"), vec![query(Medium::Anime, "Nisekoi", true)]);
        assert_eq!(collect("<<Bonnouji>>"), vec![query(Medium::Manga, "Bonnouji", true)]);
        assert_eq!(
            collect("]]Utsuro no Hako[["),
            vec![query(Medium::LightNovel, "Utsuro no Hako", true)]
        );
    }

    #[test]
    fn test_one_doubled_tag_is_expanded() {
        let found = collect("try {{Monster}} and {Frieren}");
        assert_eq!(
            found,
            vec![
                query(Medium::Anime, "Monster", true),
                query(Medium::Anime, "Frieren", false),
            ]
        );
    }

    #[test]
    fn test_two_doubled_tags_are_not_expanded() {
        let found = collect("{{Monster}} vs <<Berserk>>");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|q| !q.expanded));
        assert_eq!(found[0].medium, Medium::Anime);
        assert_eq!(found[1].medium, Medium::Manga);
    }

    #[test]
    fn test_expanded_not_allowed() {
        let found: Vec<_> = searches("{{Monster}}", false).collect();
        assert_eq!(found, vec![query(Medium::Anime, "Monster", false)]);
    }

    #[test]
    fn test_doubled_span_not_rescanned() {
        // the inner `{Monster}` must not come back as a second, single query
        let found = collect("{{Monster}}");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_doubled_before_single_in_output() {
        let found = collect("{Frieren} then ]]Zero no Maria[[");
        assert_eq!(found[0], query(Medium::LightNovel, "Zero no Maria", true));
        assert_eq!(found[1], query(Medium::Anime, "Frieren", false));
    }

    #[test]
    fn test_malformed_brackets_ignored() {
        assert!(collect("{unclosed and >reversed<").is_empty());
        assert!(collect("{}  <  >").is_empty());
    }

    #[test]
    fn test_search_text_trimmed_and_multiline() {
        assert_eq!(
            collect("{ Spy x\nFamily }"),
            vec![query(Medium::Anime, "Spy x\nFamily", false)]
        );
    }

    #[test]
    fn test_is_lazy() {
        let mut iter = searches("{a} {b} {c}", true);
        assert_eq!(iter.next().map(|q| q.search_text), Some("a".to_string()));
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn test_clean_message_strips_markup() {
        let cleaned = clean_message("hi <@123456> <:pog:123456789012345678> {Nisekoi} <#42>");
        assert_eq!(collect(&cleaned), vec![query(Medium::Anime, "Nisekoi", false)]);
    }

    #[test]
    fn test_clean_message_strips_code() {
        let cleaned =
            clean_message("```rust\nlet x: Vec<u8> = vec![];\n```\nuse `Option<T>` and <Berserk>");
        assert_eq!(collect(&cleaned), vec![query(Medium::Manga, "Berserk", false)]);
    }
}
