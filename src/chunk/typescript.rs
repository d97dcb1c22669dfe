//! TypeScript/JavaScript chunker (§4.3.2).

use super::{new_chunk, trailing_overlap};
use crate::domain::Chunk;
use crate::utils::estimate_tokens;

fn is_header_line(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with("import ") || t.starts_with("import{") || t.starts_with("//")
}

fn is_block_start(line: &str) -> bool {
    let t = line.trim_start();
    if t.starts_with("import ") {
        return true;
    }
    let t = t.strip_prefix("export ").unwrap_or(t);
    let t = t.strip_prefix("default ").unwrap_or(t);
    t.starts_with("function ")
        || t.starts_with("async function ")
        || t.starts_with("class ")
        || t.starts_with("interface ")
        || t.starts_with("type ")
        || t.starts_with("enum ")
        || (t.starts_with("const ") && is_arrow_or_function_const(t))
        || (t.starts_with("let ") && is_arrow_or_function_const(t))
}

fn is_arrow_or_function_const(t: &str) -> bool {
    t.contains("=>") || t.contains("= function")
}

fn extract_symbol(line: &str) -> Option<(String, String)> {
    let t = line.trim_start();
    let t = t.strip_prefix("export ").unwrap_or(t);
    let t = t.strip_prefix("default ").unwrap_or(t);

    for (prefix, kind) in [
        ("async function ", "function"),
        ("function ", "function"),
        ("class ", "class"),
        ("interface ", "interface"),
        ("enum ", "enum"),
        ("type ", "type"),
        ("const ", "const"),
        ("let ", "const"),
    ] {
        if let Some(rest) = t.strip_prefix(prefix) {
            let name: String =
                rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$').collect();
            if !name.is_empty() {
                return Some((name, kind.to_string()));
            }
        }
    }
    None
}

pub fn chunk(content: &str, token_target: usize, overlap_tokens: usize) -> Vec<Chunk> {
    let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let force_cap = ((token_target as f64) * 1.5) as usize;

    let mut chunks = Vec::new();
    let mut idx = 0usize;

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

        if is_block_start(line) && !buffer.is_empty() {
            emit(&mut chunks, &buffer, start_line, &symbol);
            buffer = Vec::new();
            current_tokens = 0;
            start_line = line_no;
            symbol = extract_symbol(line);
        } else if current_tokens + line_tokens > force_cap && !buffer.is_empty() {
            emit(&mut chunks, &buffer, start_line, &symbol);
            let overlap = trailing_overlap(&buffer, overlap_tokens);
            start_line = line_no - overlap.len();
            current_tokens = overlap.iter().map(|l| estimate_tokens(l).max(1)).sum();
            buffer = overlap;
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
    fn splits_at_exported_function_and_extracts_symbol() {
        let content = "import { a } from 'a';\n\nexport function foo() {\n  return 1;\n}\n\nexport function bar() {\n  return 2;\n}\n";
        let chunks = chunk(content, 500, 64);
        let names: Vec<_> = chunks.iter().filter_map(|c| c.symbol_name.clone()).collect();
        assert!(names.contains(&"foo".to_string()));
        assert!(names.contains(&"bar".to_string()));
    }

    #[test]
    fn arrow_const_is_recognised_as_block_start() {
        let content = "const handler = () => {\n  doThing();\n};\n\nconst other = () => {\n  doOther();\n};\n";
        let chunks = chunk(content, 500, 64);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn header_emitted_as_first_chunk_when_substantial() {
        let mut content = String::new();
        for i in 0..10 {
            content.push_str(&format!("import {{ m{i} }} from './m{i}';\n"));
        }
        content.push_str("\nexport function run() {}\n");
        let chunks = chunk(&content, 500, 64);
        assert!(chunks[0].content.contains("import"));
    }
}
