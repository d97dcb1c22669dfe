//! Java/Kotlin chunker (§4.3.2). Only splits once the buffer already holds
//! more than 0.3 * token_target, so annotations and small members accumulate
//! with the member they decorate. Force-split has no overlap.

use super::new_chunk;
use crate::domain::Chunk;
use crate::utils::estimate_tokens;

const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "catch"];
const TYPE_KEYWORDS: &[&str] = &["class", "interface", "enum", "record"];

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_header_line(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with("package ") || t.starts_with("import ") || t.starts_with("//")
        || t.starts_with("/*") || t.starts_with('*')
}

fn is_block_start(line: &str) -> bool {
    if indent_of(line) > 8 {
        return false;
    }
    let t = line.trim();
    if t.is_empty() {
        return false;
    }
    if t.starts_with('@') || t.starts_with("import ") || t.starts_with("package ") {
        return true;
    }
    if TYPE_KEYWORDS.iter().any(|kw| t.contains(&format!("{kw} "))) {
        return true;
    }
    let first_word = t.split_whitespace().next().unwrap_or("");
    if CONTROL_KEYWORDS.contains(&first_word) {
        return false;
    }
    t.contains('(') && (t.ends_with('{') || t.ends_with(")") || t.ends_with(");"))
}

fn extract_symbol(line: &str) -> Option<(String, String)> {
    let t = line.trim();
    for kw in TYPE_KEYWORDS {
        if let Some(idx) = t.find(&format!("{kw} ")) {
            let rest = &t[idx + kw.len() + 1..];
            let name: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
            if !name.is_empty() {
                return Some((name, kw.to_string()));
            }
        }
    }
    if let Some(paren) = t.find('(') {
        let before = &t[..paren];
        let name: String = before
            .trim_end()
            .rsplit(|c: char| c.is_whitespace())
            .next()
            .unwrap_or("")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !name.is_empty() {
            return Some((name, "method".to_string()));
        }
    }
    None
}

pub fn chunk(content: &str, token_target: usize, _overlap_tokens: usize) -> Vec<Chunk> {
    let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let split_floor = (token_target as f64 * 0.3) as usize;
    let force_cap = (token_target as f64 * 1.5) as usize;

    let mut idx = 0usize;
    let mut chunks = Vec::new();

    let mut header_end = 0usize;
    while header_end < lines.len() && is_header_line(&lines[header_end]) {
        header_end += 1;
    }
    if header_end > 0 {
        let header: String = lines[..header_end].concat();
        if estimate_tokens(&header) > 10 {
            chunks.push(new_chunk(header, 1, header_end));
        }
        idx = header_end;
    }

    let mut buffer: Vec<String> = Vec::new();
    let mut current_tokens = 0usize;
    let mut start_line = idx + 1;
    let mut symbol: Option<(String, String)> = None;

    while idx < lines.len() {
        let line = &lines[idx];
        let line_no = idx + 1;
        let line_tokens = estimate_tokens(line).max(1);

        if is_block_start(line) && !buffer.is_empty() && current_tokens > split_floor {
            emit(&mut chunks, &buffer, start_line, &symbol);
            buffer = Vec::new();
            current_tokens = 0;
            start_line = line_no;
            symbol = extract_symbol(line);
        } else if current_tokens + line_tokens > force_cap && !buffer.is_empty() {
            emit(&mut chunks, &buffer, start_line, &symbol);
            buffer = Vec::new();
            current_tokens = 0;
            start_line = line_no;
            symbol = None;
        } else if buffer.is_empty() {
            symbol = extract_symbol(line);
        }

        buffer.push(line.clone());
        current_tokens += line_tokens;
        idx += 1;
    }

    if !buffer.is_empty() {
        emit(&mut chunks, &buffer, start_line, &symbol);
    }

    chunks
}

fn emit(
    chunks: &mut Vec<Chunk>,
    buffer: &[String],
    start_line: usize,
    symbol: &Option<(String, String)>,
) {
    let text = buffer.concat();
    if text.trim().is_empty() {
        return;
    }
    let end_line = start_line + buffer.len() - 1;
    let mut c = new_chunk(text, start_line, end_line);
    if let Some((name, kind)) = symbol {
        c.symbol_name = Some(name.clone());
        c.symbol_type = Some(kind.clone());
    }
    chunks.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_class_declaration() {
        let content = "package com.example;\n\npublic class Foo {\n    private int x;\n\n    public void bar() {\n        doWork();\n    }\n}\n";
        let chunks = chunk(content, 30, 8);
        let names: Vec<_> = chunks.iter().filter_map(|c| c.symbol_name.clone()).collect();
        assert!(names.iter().any(|n| n == "Foo"));
    }

    #[test]
    fn does_not_split_on_control_flow_keywords() {
        let content = "package com.example;\n\npublic void run() {\n    if (true) {\n        doThing();\n    }\n}\n";
        let chunks = chunk(content, 500, 64);
        assert!(!chunks.iter().any(|c| c.symbol_name.as_deref() == Some("if")));
    }
}
