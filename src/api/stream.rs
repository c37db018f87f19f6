use super::logging::emit_sse_parse_error;
use crate::types::GenerateContentResponse;

/// Incremental decoder for `alt=sse` generation streams.
///
/// Bytes are buffered until a blank line closes a frame, so JSON payloads and
/// multi-byte characters split across network chunks decode correctly.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
    /// Bytes already searched for a frame terminator.
    scanned: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<GenerateContentResponse> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
        let mut responses = Vec::new();
        let mut start = 0;
        // The terminator may straddle the previous chunk boundary.
        let mut from = self.scanned.saturating_sub(1);

        while let Some(end) = find_frame_end(&self.buffer[from..]) {
            let frame_end = from + end;
            let frame = String::from_utf8_lossy(&self.buffer[start..frame_end]).into_owned();
            if let Some(response) = parse_frame(&frame) {
                responses.push(response);
            }
            start = frame_end + 2;
            from = start;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        self.scanned = self.buffer.len();

        responses
    }

    /// Decodes whatever is left once the transport closes. Servers normally end
    /// on a blank line, but a final unterminated frame is still honoured.
    pub fn finish(&mut self) -> Vec<GenerateContentResponse> {
        let rest = self.flush();
        parse_frame(&rest).into_iter().collect()
    }

    pub fn flush(&mut self) -> String {
        self.scanned = 0;
        let bytes = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn find_frame_end(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|pair| pair == b"\n\n")
}

fn parse_frame(frame: &str) -> Option<GenerateContentResponse> {
    let mut data = String::new();
    for line in frame.lines() {
        let Some(rest) = line.strip_prefix("data:") else {
            continue;
        };
        if !data.is_empty() {
            data.push('\n');
        }
        data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
    }

    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(response) => Some(response),
        Err(error) => {
            emit_sse_parse_error(data, &error);
            None
        }
    }
}
