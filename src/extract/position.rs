// src/extract/position.rs
// =============================================================================
// Turns byte offsets (what regex and pulldown-cmark give us) into the
// 1-based line/column pairs we show to users.
//
// Columns are counted in characters, not bytes, so a URL after an emoji or
// an accented letter still points at the right spot in an editor.
// =============================================================================

// Start offset of every line, computed once per file
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        LineIndex { text, line_starts }
    }

    // Returns (line, column), both starting at 1
    //
    // Offsets past the end are clamped to the end of the text.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());

        // partition_point gives the number of line starts <= offset,
        // which is exactly the 1-based line number
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];

        let column = match self.text.get(line_start..offset) {
            Some(prefix) => prefix.chars().count() + 1,
            // offset inside a multi-byte char; fall back to bytes
            None => offset - line_start + 1,
        };

        (line, column)
    }
}
