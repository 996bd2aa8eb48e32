/// Splits decoded text into newline-terminated records.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
}

impl LineFramer {
    /// Append `text` and drain every complete, non-blank line.
    ///
    /// Each byte is scanned once and the buffer is compacted once per call.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut search_from = self.scanned;

        while let Some(offset) = self.buffer[search_from..].find('\n') {
            let line_end = search_from + offset;
            let line = self.buffer[line_start..line_end].trim_end_matches('\r');
            if !line.trim().is_empty() {
                lines.push(line.to_owned());
            }
            line_start = line_end + 1;
            search_from = line_start;
        }

        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();
        lines
    }

    /// Flush the unterminated remainder at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches('\r');
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest.to_owned())
        }
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::LineFramer;

    #[test]
    fn keeps_trailing_fragment_until_newline() {
        let mut framer = LineFramer::default();
        assert_eq!(framer.push("{\"a\":1}\n{\"b\""), vec!["{\"a\":1}"]);
        assert!(!framer.is_empty_buffer());
        assert_eq!(framer.push(":2}\n"), vec!["{\"b\":2}"]);
        assert!(framer.is_empty_buffer());
    }

    #[test]
    fn blank_lines_and_carriage_returns_are_dropped() {
        let mut framer = LineFramer::default();
        assert_eq!(framer.push("\n  \r\nx\r\n\n"), vec!["x"]);
    }

    #[test]
    fn many_lines_in_one_push_come_out_in_order() {
        let mut framer = LineFramer::default();
        let body: String = (0..1_000).map(|n| format!("{{\"n\":{n}}}\n")).collect();

        let lines = framer.push(&body);
        assert_eq!(lines.len(), 1_000);
        assert_eq!(lines[0], "{\"n\":0}");
        assert_eq!(lines[999], "{\"n\":999}");
        assert!(framer.is_empty_buffer());
    }

    #[test]
    fn long_line_fed_bytewise_is_emitted_whole() {
        let mut framer = LineFramer::default();
        let line = format!("{{\"content\":\"{}\"}}", "x".repeat(4_096));

        for ch in line.chars() {
            assert!(framer.push(&ch.to_string()).is_empty());
        }
        assert_eq!(framer.push("\r\nnext"), vec![line]);
        assert_eq!(framer.finish().as_deref(), Some("next"));
    }

    #[test]
    fn finish_returns_unterminated_remainder_once() {
        let mut framer = LineFramer::default();
        assert!(framer.push("tail").is_empty());
        assert_eq!(framer.finish().as_deref(), Some("tail"));
        assert_eq!(framer.finish(), None);
    }
}
