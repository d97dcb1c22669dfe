//! Generic line-based chunker used for any extension without a dedicated
//! language heuristic (§4.3.1).

use super::{new_chunk, trailing_overlap};
use crate::domain::Chunk;
use crate::utils::estimate_tokens;

pub fn chunk(content: &str, token_target: usize, overlap_tokens: usize) -> Vec<Chunk> {
    let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let hard_cap = ((token_target as f64) * 1.2) as usize;
    let soft_floor = ((token_target as f64) * 0.6) as usize;

    let mut chunks = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut current_tokens = 0usize;
    let mut start_line = 1usize;

    for (i, line) in lines.iter().enumerate() {
        let line_tokens = estimate_tokens(line).max(1);
        let line_no = i + 1;

        if current_tokens + line_tokens > hard_cap && !buffer.is_empty() {
            let end_line = start_line + buffer.len() - 1;
            chunks.push(new_chunk(buffer.concat(), start_line, end_line));

            let overlap = trailing_overlap(&buffer, overlap_tokens);
            start_line = line_no - overlap.len();
            current_tokens = overlap.iter().map(|l| estimate_tokens(l).max(1)).sum();
            buffer = overlap;
        } else if line.trim().is_empty() && current_tokens >= soft_floor && !buffer.is_empty() {
            let end_line = start_line + buffer.len() - 1;
            chunks.push(new_chunk(buffer.concat(), start_line, end_line));
            buffer = Vec::new();
            current_tokens = 0;
            start_line = line_no + 1;
            continue;
        }

        buffer.push(line.clone());
        current_tokens += line_tokens;
    }

    if !buffer.is_empty() {
        let end_line = start_line + buffer.len() - 1;
        let text = buffer.concat();
        if !text.trim().is_empty() {
            chunks.push(new_chunk(text, start_line, end_line));
        }
    }

    chunks
}
