//! Byte-offset to line-number mapping for a loaded source file.

/// Precomputed line table over one source text.
///
/// Lines are 1-based, matching what users pass on the command line.
#[derive(Debug, Clone)]
pub struct SourceMap {
    /// Byte offset of the first character of each line.
    line_starts: Vec<u32>,
}

impl SourceMap {
    pub fn new(src: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        SourceMap { line_starts }
    }

    /// 1-based line containing `offset`. Offsets past the end map to the
    /// last line.
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// Number of the last line in the file.
    pub fn max_line(&self) -> u32 {
        self.line_starts.len() as u32
    }
}
