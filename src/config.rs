//! Formatter settings
//!
//! The output style itself is fixed. These knobs only affect how columns
//! are measured when reporting lines that run past the length limit.

/// Default display width of a tab.
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Default line length limit.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Columns a tab advances to (the next multiple of this width).
    pub tab_width: usize,
    /// Lines wider than this are reported as overlong.
    pub max_line_length: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl FormatConfig {
    /// Display column reached after writing `ch` at `column`.
    pub fn advance_column(&self, column: usize, ch: char) -> usize {
        match ch {
            '\t' if self.tab_width > 0 => (column / self.tab_width + 1) * self.tab_width,
            '\t' => column,
            _ => column + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_stops() {
        let config = FormatConfig::default();
        assert_eq!(config.advance_column(0, '\t'), 8);
        assert_eq!(config.advance_column(3, '\t'), 8);
        assert_eq!(config.advance_column(8, '\t'), 16);
        assert_eq!(config.advance_column(8, 'x'), 9);

        let narrow = FormatConfig {
            tab_width: 4,
            ..FormatConfig::default()
        };
        assert_eq!(narrow.advance_column(5, '\t'), 8);
    }
}
