use serde_json::Value;

use vercelscope_types::LogEvent;

/// Line prefix marking significant lines within a record
const DATA_PREFIX: &str = "data:";

/// Sentinel payload marking the end of a stream segment
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental parser for the deployment events byte stream
///
/// The stream is a sequence of records separated by a blank line. Chunk
/// boundaries are arbitrary: a record may be split across chunks and a chunk
/// may carry several records, so the not-yet-terminated tail is buffered
/// between calls. The buffer is kept as raw bytes because a chunk boundary
/// may also fall inside a multi-byte UTF-8 sequence.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk, returning the events completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<LogEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = find_delimiter(&self.buffer) {
            let rest = self.buffer.split_off(pos + 2);
            let record = std::mem::replace(&mut self.buffer, rest);
            events.extend(parse_record(&String::from_utf8_lossy(&record)));
        }
        events
    }

    /// Flush any buffered tail through the same record-splitting logic
    ///
    /// Called on stream end: a trailing record without its delimiter is
    /// still parsed.
    pub fn finish(self) -> Vec<LogEvent> {
        let tail = String::from_utf8_lossy(&self.buffer);
        tail.split("\n\n").flat_map(parse_record).collect()
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Parse one delimiter-separated record into zero or more events
///
/// Only `data:`-prefixed lines are significant; stripped and trimmed, they
/// are joined by a line break to reconstruct the JSON payload. An empty or
/// `[DONE]` payload is not an event. A malformed payload is dropped without
/// aborting the stream.
fn parse_record(record: &str) -> Vec<LogEvent> {
    let payload = record
        .lines()
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if payload.is_empty() || payload == DONE_SENTINEL {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(&payload) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Ok(value) if value.is_object() => serde_json::from_value(value).ok().into_iter().collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to parse streamed log event: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str) -> Vec<LogEvent> {
        let mut parser = EventStreamParser::new();
        let mut events = parser.feed(input.as_bytes());
        events.extend(parser.finish());
        events
    }

    #[test]
    fn test_single_record() {
        let events = parse_all("data: {\"type\":\"stdout\",\"created\":1,\"text\":\"a\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "stdout");
        assert_eq!(events[0].created, Some(1));
        assert_eq!(events[0].text(), "a");
    }

    #[test]
    fn test_records_across_chunks_preserve_order() {
        let mut parser = EventStreamParser::new();
        let mut events = parser.feed(b"data: {\"type\":\"stdout\",\"created\":1,\"text\":\"a\"}\n\n");
        events.extend(parser.feed(b"data: {\"type\":\"stdout\",\"created\":2,\"text\":\"b\"}\n\n"));
        events.extend(parser.finish());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].created, Some(1));
        assert_eq!(events[1].created, Some(2));
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        // Multi-byte characters included so splits can land mid-codepoint
        let stream = "data: {\"type\":\"stdout\",\"created\":1,\"text\":\"héllo → wörld\"}\n\n\
                      data: [{\"type\":\"stderr\",\"created\":2},{\"type\":\"stdout\",\"created\":3}]\n\n\
                      data: {\"type\":\"command\",\"payload\":{\"created\":4,\"text\":\"npm build\"}}\n\n";
        let expected = parse_all(stream);
        assert_eq!(expected.len(), 4);

        let bytes = stream.as_bytes();
        for split in 0..=bytes.len() {
            let mut parser = EventStreamParser::new();
            let mut events = parser.feed(&bytes[..split]);
            events.extend(parser.feed(&bytes[split..]));
            events.extend(parser.finish());
            assert_eq!(events, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_multiple_records_in_one_chunk() {
        let events = parse_all(
            "data: {\"type\":\"stdout\",\"created\":1}\n\ndata: {\"type\":\"stdout\",\"created\":2}\n\n",
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_empty_and_done_payloads_are_discarded() {
        assert!(parse_all("\n\n").is_empty());
        assert!(parse_all("data:\n\n").is_empty());
        assert!(parse_all("data: [DONE]\n\n").is_empty());
        assert!(parse_all("ignored line without prefix\n\n").is_empty());
    }

    #[test]
    fn test_multiline_payload_joined() {
        // A payload split across several data: lines within one record
        let events = parse_all("data: {\"type\":\"stdout\",\ndata: \"created\":7}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].created, Some(7));
    }

    #[test]
    fn test_malformed_record_does_not_abort_stream() {
        let events = parse_all(
            "data: {not valid json\n\ndata: {\"type\":\"stdout\",\"created\":9}\n\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].created, Some(9));
    }

    #[test]
    fn test_array_payload_expands_in_order() {
        let events = parse_all(
            "data: [{\"type\":\"stdout\",\"created\":1},null,42,{\"type\":\"stdout\",\"created\":2}]\n\n",
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].created, Some(1));
        assert_eq!(events[1].created, Some(2));
    }

    #[test]
    fn test_non_object_payload_filtered() {
        assert!(parse_all("data: \"just a string\"\n\n").is_empty());
        assert!(parse_all("data: 123\n\n").is_empty());
    }

    #[test]
    fn test_trailing_record_without_delimiter_flushed() {
        let mut parser = EventStreamParser::new();
        let events = parser.feed(b"data: {\"type\":\"stdout\",\"created\":5}");
        assert!(events.is_empty());

        let flushed = parser.finish();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].created, Some(5));
    }
}
