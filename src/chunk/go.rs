//! Go chunker (§4.3.2). Only top-level (column 0) declarations are block
//! starts; receiver methods are named `Receiver.Method`. Force-split has no
//! overlap.

use super::new_chunk;
use crate::domain::Chunk;
use crate::utils::estimate_tokens;

fn is_top_level(line: &str) -> bool {
    !line.starts_with(' ') && !line.starts_with('\t')
}

fn is_block_start(line: &str) -> bool {
    if !is_top_level(line) {
        return false;
    }
    let t = line.trim();
    t.starts_with("func ")
        || t.starts_with("type ")
        || t.starts_with("var ")
        || t.starts_with("const ")
        || t.starts_with("import ")
        || t.starts_with("import(")
        || t.starts_with("package ")
}

fn extract_symbol(line: &str) -> Option<(String, String)> {
    let t = line.trim();
    if let Some(rest) = t.strip_prefix("func ") {
        let rest = rest.trim_start();
        if let Some(after_paren) = rest.strip_prefix('(') {
            // func (r *Receiver) Method(...)
            let recv_end = after_paren.find(')')?;
            let receiver_decl = &after_paren[..recv_end];
            let receiver_type = receiver_decl
                .trim()
                .rsplit(|c: char| c.is_whitespace())
                .next()
                .unwrap_or("")
                .trim_start_matches('*');
            let method_part = after_paren[recv_end + 1..].trim_start();
            let method_name: String =
                method_part.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
            if !method_name.is_empty() {
                return Some((format!("{receiver_type}.{method_name}"), "method".to_string()));
            }
        } else {
            let name: String =
                rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
            if !name.is_empty() {
                return Some((name, "function".to_string()));
            }
        }
    } else if let Some(rest) = t.strip_prefix("type ") {
        let mut parts = rest.split_whitespace();
        let name = parts.next()?.to_string();
        let kind = match parts.next() {
            Some("struct") => "struct",
            Some("interface") => "interface",
            _ => "type",
        };
        return Some((name, kind.to_string()));
    }
    None
}

pub fn chunk(content: &str, token_target: usize, _overlap_tokens: usize) -> Vec<Chunk> {
    let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let force_cap = (token_target as f64 * 1.5) as usize;

    let mut idx = 0usize;
    let mut chunks = Vec::new();

    let mut in_import_block = false;
    let mut header_end = 0usize;
    while header_end < lines.len() {
        let t = lines[header_end].trim();
        if in_import_block {
            header_end += 1;
            if t.starts_with(')') {
                in_import_block = false;
            }
            continue;
        }
        if t.starts_with("import (") {
            in_import_block = true;
            header_end += 1;
            continue;
        }
        if t.is_empty() || t.starts_with("package ") || t.starts_with("import ") || t.starts_with("//") {
            header_end += 1;
            continue;
        }
        break;
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

        if is_block_start(line) && !buffer.is_empty() && current_tokens > 0 {
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
    fn receiver_methods_are_named_receiver_dot_method() {
        let content = "package main\n\ntype Server struct {\n    addr string\n}\n\nfunc (s *Server) Start() error {\n    return nil\n}\n";
        let chunks = chunk(content, 500, 64);
        let names: Vec<_> = chunks.iter().filter_map(|c| c.symbol_name.clone()).collect();
        assert!(names.contains(&"Server.Start".to_string()));
        assert!(names.contains(&"Server".to_string()));
    }

    #[test]
    fn nested_blocks_do_not_trigger_new_chunk() {
        let content = "package main\n\nfunc Outer() {\n    func() {\n        inner()\n    }()\n}\n";
        let chunks = chunk(content, 500, 64);
        assert_eq!(chunks.iter().filter(|c| c.symbol_name.as_deref() == Some("Outer")).count(), 1);
    }

    #[test]
    fn import_block_collected_into_header() {
        let content = "package main\n\nimport (\n    \"fmt\"\n    \"os\"\n)\n\nfunc Main() {\n    fmt.Println(\"hi\")\n}\n";
        let chunks = chunk(content, 500, 64);
        assert!(chunks[0].content.contains("import ("));
    }
}
