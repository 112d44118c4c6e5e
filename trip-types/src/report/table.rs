//! Plain-text grid tables.
//!
//! ```text
//! +----------+----------+
//! | Category |   Amount |
//! +==========+==========+
//! | Food     |    50.00 |
//! +----------+----------+
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Creates a table whose columns are all left-aligned.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let align = vec![Align::Left; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
        }
    }

    /// Right-aligns the given columns. Out-of-range indexes are ignored.
    pub fn right_align(mut self, columns: &[usize]) -> Self {
        for &col in columns {
            if let Some(a) = self.align.get_mut(col) {
                *a = Align::Right;
            }
        }
        self
    }

    /// Appends a row. Short rows are padded with empty cells, extra cells
    /// are dropped.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .map(Into::into)
            .take(self.headers.len())
            .collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row[col].chars().count())
                    .chain(std::iter::once(self.headers[col].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&self.border(&widths, '-'));
        out.push_str(&self.line(&self.headers, &widths));
        out.push_str(&self.border(&widths, '='));
        for row in &self.rows {
            out.push_str(&self.line(row, &widths));
            out.push_str(&self.border(&widths, '-'));
        }
        // no trailing newline
        out.pop();
        out
    }

    fn border(&self, widths: &[usize], fill: char) -> String {
        let mut line = String::from("+");
        for w in widths {
            line.extend(std::iter::repeat_n(fill, w + 2));
            line.push('+');
        }
        line.push('\n');
        line
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        let mut line = String::from("|");
        for ((cell, w), align) in cells.iter().zip(widths).zip(&self.align) {
            let padded = match align {
                Align::Left => format!(" {:<w$} |", cell, w = *w),
                Align::Right => format!(" {:>w$} |", cell, w = *w),
            };
            line.push_str(&padded);
        }
        line.push('\n');
        line
    }
}
