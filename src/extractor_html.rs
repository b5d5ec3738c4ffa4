//! Markup-format (HTML) activity extraction.
//!
//! The markup-era export renders one logged event per `outer-cell` block.
//! Within a block the first anchor carries the video or query title and its
//! href, and the timestamp sits in a line-break-delimited text run near the
//! end of the block. Exact placement varies across vintages, so the
//! timestamp is recovered with a fixed date pattern over the whole block
//! text rather than by position.
//!
//! Sponsored entries are mislabeled as real events in the search-history
//! document; they lack the literal "Searched" marker and are dropped without
//! error. Output is explicitly sorted by normalized timestamp instead of
//! relying on the source's newest-first ordering.

use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::models::{ActivityEvent, ActivityKind, Extracted};
use crate::timefmt::CanonicalTimestamp;

/// Structural marker delimiting one logged event.
const BLOCK_CLASS: &str = "outer-cell";
/// Literal present in genuine search entries; sponsored blocks lack it.
const SEARCH_MARKER: &str = "Searched";

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d{1,2} [A-Z][a-z]{2} \d{4}, \d{2}:\d{2}:\d{2} GMT[+-]\d{2}:\d{2}")
            .expect("markup date pattern")
    })
}

/// One event block in mid-parse.
#[derive(Default)]
struct Block {
    div_depth: usize,
    runs: Vec<String>,
    current_run: String,
    anchor_href: Option<String>,
    anchor_text: String,
    in_anchor: bool,
    anchor_done: bool,
}

impl Block {
    fn break_run(&mut self) {
        if !self.current_run.is_empty() {
            self.runs.push(std::mem::take(&mut self.current_run));
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_anchor && !self.anchor_done {
            self.anchor_text.push_str(text);
        }
        if !self.current_run.is_empty() {
            self.current_run.push(' ');
        }
        self.current_run.push_str(text);
    }

    fn full_text(&mut self) -> String {
        self.break_run();
        self.runs.join("\n")
    }
}

/// Walks the document and extracts one event per recognized block,
/// chronologically ordered. Blocks that are advertisements or that lack a
/// parseable title or timestamp are skipped, never fatal.
pub fn extract(document: &str, kind: ActivityKind) -> Result<Extracted<ActivityEvent>> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().check_end_names = false;
    reader.config_mut().trim_text(true);

    let mut out = Extracted::default();
    let mut block: Option<Block> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"div" => match block.as_mut() {
                    Some(b) => b.div_depth += 1,
                    None if has_block_class(&e) => {
                        block = Some(Block {
                            div_depth: 1,
                            ..Block::default()
                        });
                    }
                    None => {}
                },
                b"br" => {
                    if let Some(b) = block.as_mut() {
                        b.break_run();
                    }
                }
                b"a" => {
                    if let Some(b) = block.as_mut() {
                        if !b.anchor_done && !b.in_anchor {
                            b.in_anchor = true;
                            b.anchor_href = attr_value(&e, b"href");
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(b) = block.as_mut() {
                    let text = match t.unescape() {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => String::from_utf8_lossy(t.as_ref()).into_owned(),
                    };
                    b.push_text(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"div" => {
                    let closed = match block.as_mut() {
                        Some(b) => {
                            b.div_depth -= 1;
                            b.div_depth == 0
                        }
                        None => false,
                    };
                    if closed {
                        if let Some(mut done) = block.take() {
                            match finish_block(&mut done, kind) {
                                Some(event) => out.records.push(event),
                                None => out.skipped += 1,
                            }
                        }
                    }
                }
                b"a" => {
                    if let Some(b) = block.as_mut() {
                        if b.in_anchor {
                            b.in_anchor = false;
                            b.anchor_done = true;
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::FormatMismatch(format!("markup parse: {e}"))),
        }
    }

    // Source lists newest-first; order explicitly instead of reversing.
    out.records.sort_by_key(|e| e.timestamp.epoch_seconds());
    Ok(out)
}

fn has_block_class(e: &BytesStart) -> bool {
    attr_value(e, b"class").is_some_and(|c| c.contains(BLOCK_CLASS))
}

/// Ad heuristic for the markup format: sponsored entries surface in the
/// search document without the "Searched" marker. Kept behind one predicate
/// so a future export vintage can swap it without touching extraction.
fn is_advertisement(block_text: &str, kind: ActivityKind) -> bool {
    kind == ActivityKind::Search && !block_text.contains(SEARCH_MARKER)
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == key {
            Some(match a.unescape_value() {
                Ok(cow) => cow.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
            })
        } else {
            None
        }
    })
}

fn finish_block(block: &mut Block, kind: ActivityKind) -> Option<ActivityEvent> {
    let text = block.full_text();

    if is_advertisement(&text, kind) {
        // Sponsored entry mislabeled as an event; drop without error.
        debug!(kind = kind.label(), "discarding advertisement block");
        return None;
    }

    let title = block.anchor_text.trim();
    if title.is_empty() {
        debug!(kind = kind.label(), "skipping block without title anchor");
        return None;
    }

    // Titles can contain date-like text; the block timestamp is the last
    // match in the block.
    let raw_date = match date_re().find_iter(&text).last() {
        Some(m) => m.as_str(),
        None => {
            debug!(kind = kind.label(), "skipping block without a timestamp");
            return None;
        }
    };
    let timestamp = match CanonicalTimestamp::parse(raw_date) {
        Ok(ts) => ts,
        Err(err) => {
            debug!(kind = kind.label(), %err, "skipping block with unparseable timestamp");
            return None;
        }
    };

    Some(ActivityEvent {
        title: title.to_string(),
        link: block.anchor_href.clone(),
        timestamp,
        description: None,
        details: vec![],
        products: vec![],
    })
}
