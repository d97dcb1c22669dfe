//! Python chunker (§4.3.2). Force-split has no overlap; consecutive
//! decorator lines stay attached to the declaration they precede.

use super::new_chunk;
use crate::domain::Chunk;
use crate::utils::estimate_tokens;

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_header_line(line: &str) -> bool {
    let t = line.trim();
    t.is_empty()
        || t.starts_with("import ")
        || t.starts_with("from ")
        || t.starts_with('#')
        || t.starts_with("\"\"\"")
        || t.starts_with("'''")
}

fn is_decorator(line: &str) -> bool {
    indent_of(line) <= 4 && line.trim_start().starts_with('@')
}

fn is_def_or_class(line: &str) -> bool {
    if indent_of(line) > 4 {
        return false;
    }
    let t = line.trim_start();
    t.starts_with("def ") || t.starts_with("async def ") || t.starts_with("class ")
}

fn extract_symbol(line: &str) -> Option<(String, String)> {
    let t = line.trim_start();
    let (rest, kind) = if let Some(r) = t.strip_prefix("async def ") {
        (r, "function")
    } else if let Some(r) = t.strip_prefix("def ") {
        (r, "function")
    } else if let Some(r) = t.strip_prefix("class ") {
        (r, "class")
    } else {
        return None;
    };
    let name: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
    if name.is_empty() {
        None
    } else {
        Some((name, kind.to_string()))
    }
}

pub fn chunk(content: &str, token_target: usize, _overlap_tokens: usize) -> Vec<Chunk> {
    let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let force_cap = ((token_target as f64) * 1.5) as usize;

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
    let mut has_decorator = false;
    let mut current_tokens = 0usize;
    let mut start_line = idx + 1;
    let mut symbol: Option<(String, String)> = None;

    while idx < lines.len() {
        let line = &lines[idx];
        let line_no = idx + 1;
        let line_tokens = estimate_tokens(line).max(1);

        if is_decorator(line) {
            if !buffer.is_empty() && !has_decorator {
                emit(&mut chunks, &buffer, start_line, &symbol);
                buffer = Vec::new();
                current_tokens = 0;
                start_line = line_no;
                symbol = None;
            }
            has_decorator = true;
        } else if is_def_or_class(line) {
            if !buffer.is_empty() && !has_decorator {
                emit(&mut chunks, &buffer, start_line, &symbol);
                buffer = Vec::new();
                current_tokens = 0;
                start_line = line_no;
            }
            symbol = extract_symbol(line);
        } else if current_tokens + line_tokens > force_cap && !buffer.is_empty() {
            emit(&mut chunks, &buffer, start_line, &symbol);
            buffer = Vec::new();
            current_tokens = 0;
            start_line = line_no;
            symbol = None;
            has_decorator = false;
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
