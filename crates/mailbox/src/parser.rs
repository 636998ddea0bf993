use crate::types::{Headers, RawMessage};

/// Literal token that opens a new message at the start of a line
pub const FROM_DELIMITER: &str = "From ";

/// Result of parsing one archive
#[derive(Debug, Clone, Default)]
pub struct ParsedArchive {
    pub messages: Vec<RawMessage>,

    /// Blocks dropped because they had no header/body boundary
    pub skipped_malformed: usize,
}

/// Splits `From `-delimited mailbox text into [`RawMessage`]s.
///
/// Lines quoted as `>From ` are left as-is: they neither split messages nor
/// get unescaped in bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailboxParser;

struct Block<'a> {
    envelope: Option<&'a str>,
    lines: Vec<&'a str>,
}

impl<'a> Block<'a> {
    fn is_empty(&self) -> bool {
        self.envelope.map_or(true, |e| e.trim().is_empty())
            && self.lines.iter().all(|line| line.trim().is_empty())
    }
}

impl MailboxParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse archive text, returning only the messages
    pub fn parse(&self, text: &str, source: &str) -> Vec<RawMessage> {
        self.parse_archive(text, source).messages
    }

    /// Parse archive text, keeping a count of malformed blocks
    pub fn parse_archive(&self, text: &str, source: &str) -> ParsedArchive {
        let mut archive = ParsedArchive::default();

        for block in split_blocks(text) {
            match parse_block(&block, source, archive.messages.len()) {
                Some(message) => archive.messages.push(message),
                None => {
                    archive.skipped_malformed += 1;
                    log::debug!(
                        "Skipping malformed message in {source} (no header/body boundary, envelope {:?})",
                        block.envelope.unwrap_or("")
                    );
                }
            }
        }

        archive
    }
}

fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current = Block {
        envelope: None,
        lines: Vec::new(),
    };

    for line in text.lines() {
        if let Some(envelope) = line.strip_prefix(FROM_DELIMITER) {
            let next = Block {
                envelope: Some(envelope.trim()),
                lines: Vec::new(),
            };
            blocks.push(std::mem::replace(&mut current, next));
        } else {
            current.lines.push(line);
        }
    }
    blocks.push(current);

    blocks.retain(|block| !block.is_empty());
    blocks
}

fn parse_block(block: &Block<'_>, source: &str, position: usize) -> Option<RawMessage> {
    let boundary = block.lines.iter().position(|line| line.trim().is_empty())?;

    let mut headers = Headers::new();
    for line in &block.lines[..boundary] {
        if line.starts_with([' ', '\t']) {
            headers.append_to_last(line.trim());
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().is_empty() {
            continue;
        }
        headers.insert(name, value.trim());
    }

    let body = block.lines[boundary + 1..].join("\n").trim().to_string();

    Some(RawMessage {
        envelope: block
            .envelope
            .filter(|e| !e.is_empty())
            .map(str::to_string),
        headers,
        body,
        source: source.to_string(),
        position,
    })
}
