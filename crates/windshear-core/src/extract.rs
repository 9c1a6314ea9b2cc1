//! Candidate extraction interface
//!
//! The real scanner is an external collaborator: given file content and an
//! extension hint it returns raw candidate strings with byte offsets, nothing
//! more. [`SplitExtractor`] is a deliberately naive stand-in for the CLI and
//! tests; it over-extracts, which is harmless because the naming context
//! decides eligibility per token.

/// One scanned token: the raw text and its byte offset in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub raw: String,
    pub start: usize,
}

pub trait CandidateExtractor {
    fn extract(&self, content: &str, extension: &str) -> Vec<RawCandidate>;
}

/// Splits on whitespace, quotes and common markup/code delimiters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitExtractor;

fn is_boundary(c: char) -> bool {
    c.is_whitespace()
        || matches!(c, '"' | '\'' | '`' | '<' | '>' | '{' | '}' | ';' | '=' | '$' | '\\')
}

impl CandidateExtractor for SplitExtractor {
    fn extract(&self, content: &str, _extension: &str) -> Vec<RawCandidate> {
        let mut out = Vec::new();
        let mut start: Option<usize> = None;
        for (i, c) in content.char_indices() {
            if is_boundary(c) {
                if let Some(s) = start.take() {
                    out.push(RawCandidate { raw: content[s..i].to_string(), start: s });
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            out.push(RawCandidate { raw: content[s..].to_string(), start: s });
        }
        out
    }
}
