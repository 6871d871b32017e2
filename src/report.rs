use std::io::{self, Write};

/// In-memory table written out with elastic tab stops.
///
/// Rows are buffered as text: every cell is followed by a tab and every row by a
/// newline, so a tab or newline inside a cell opens a new column or line. A
/// column block is a run of consecutive lines that have a tab-terminated cell in
/// that column; its width is the widest cell in the block plus `padding`. Cells
/// are right-aligned. Text after the last tab of a line is written unaligned.
/// Nothing reaches the writer until [`Table::write_to`].
#[derive(Debug, Default)]
pub struct Table {
    text: String,
    rows: usize,
    padding: usize,
}

impl Table {
    pub fn new(padding: usize) -> Self {
        Table {
            text: String::new(),
            rows: 0,
            padding,
        }
    }

    /// Appends one row. Each cell is terminated by a column separator.
    pub fn push_row(&mut self, cells: Vec<String>) {
        for cell in cells {
            self.text.push_str(&cell);
            self.text.push('\t');
        }
        self.text.push('\n');
        self.rows += 1;
    }

    /// Number of rows pushed.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Writes all rows and flushes the writer.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let lines: Vec<Vec<&str>> = self
            .text
            .split_terminator('\n')
            .map(|line| line.split('\t').collect())
            .collect();

        let mut rendered = String::new();
        self.format(&mut rendered, &mut Vec::new(), &lines);
        out.write_all(rendered.as_bytes())?;
        out.flush()
    }

    fn format(&self, out: &mut String, widths: &mut Vec<usize>, lines: &[Vec<&str>]) {
        let column = widths.len();
        let mut start = 0;
        let mut this = 0;

        while this < lines.len() {
            if column + 1 >= lines[this].len() {
                this += 1;
                continue;
            }

            // Lines before the block only use the columns already fixed.
            Self::write_lines(out, widths, &lines[start..this]);
            start = this;

            let mut width = 0;
            while this < lines.len() && column + 1 < lines[this].len() {
                width = width.max(lines[this][column].chars().count() + self.padding);
                this += 1;
            }

            widths.push(width);
            self.format(out, widths, &lines[start..this]);
            widths.pop();
            start = this;
        }

        Self::write_lines(out, widths, &lines[start..]);
    }

    fn write_lines(out: &mut String, widths: &[usize], lines: &[Vec<&str>]) {
        for line in lines {
            for (j, cell) in line.iter().enumerate() {
                if let Some(width) = widths.get(j) {
                    let fill = width.saturating_sub(cell.chars().count());
                    out.extend(std::iter::repeat_n(' ', fill));
                }
                out.push_str(cell);
            }
            out.push('\n');
        }
    }
}
