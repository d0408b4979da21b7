use crate::{BspErr, Result, Sample};

/// A labelled dataset held in memory.
///
/// Rows are stored flat: `x_size` features followed by a single label.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Vec<f64>,
    x_size: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `data` - Row-major `[x_0, .., x_{k-1}, y]` rows.
    /// * `x_size` - The amount of features per row.
    ///
    /// # Returns
    /// A new `Dataset` or an error if `data` can't be split in rows of `x_size + 1`.
    pub fn new(data: Vec<f64>, x_size: usize) -> Result<Self> {
        if x_size == 0 {
            return Err(BspErr::InvalidDataset("rows need at least one feature".into()));
        }

        if data.len() % (x_size + 1) != 0 {
            return Err(BspErr::InvalidDataset(format!(
                "{} values can't be split into rows of {} features and a label",
                data.len(),
                x_size
            )));
        }

        Ok(Self { data, x_size })
    }

    /// Parses comma separated rows, the last column being the label.
    ///
    /// Blank lines and lines starting with `#` are skipped. When `x_size` is
    /// `None` it's taken from the first row.
    pub fn from_csv(text: &str, x_size: Option<usize>) -> Result<Self> {
        let mut data = Vec::new();
        let mut width = x_size.map(|k| k + 1);

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let row = line
                .split(',')
                .map(|field| field.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| BspErr::InvalidDataset(format!("line {}: {e}", lineno + 1)))?;

            let expected = *width.get_or_insert(row.len());
            if row.len() != expected {
                return Err(BspErr::InvalidDataset(format!(
                    "line {}: expected {expected} columns, got {}",
                    lineno + 1,
                    row.len()
                )));
            }

            data.extend(row);
        }

        let x_size = width.map(|w| w.saturating_sub(1)).unwrap_or_default();
        Self::new(data, x_size)
    }

    #[inline]
    pub fn x_size(&self) -> usize {
        self.x_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / (self.x_size + 1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Splits the dataset into `num_peers` balanced contiguous partitions.
    pub fn partition(&self, num_peers: usize) -> Vec<Partition> {
        let row = self.x_size + 1;
        let total = self.len();

        // Peer `i` ends at row `total * (i + 1) / num_peers`, which keeps the
        // slices contiguous and their sizes within one row of each other.
        let bound = |i: usize| total * i / num_peers * row;

        (0..num_peers)
            .map(|i| {
                let data = self.data[bound(i)..bound(i + 1)].to_vec();
                Partition::from_rows(data, self.x_size)
            })
            .collect()
    }

    /// Turns the whole dataset into a single partition.
    pub fn into_partition(self) -> Partition {
        Partition::from_rows(self.data, self.x_size)
    }
}

/// The rows owned by one peer, with a restartable read cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    data: Vec<f64>,
    x_size: usize,
    cursor: usize, // row index
}

impl Partition {
    fn from_rows(data: Vec<f64>, x_size: usize) -> Self {
        Self {
            data,
            x_size,
            cursor: 0,
        }
    }

    /// A partition without rows.
    pub fn empty(x_size: usize) -> Self {
        Self::from_rows(Vec::new(), x_size)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / (self.x_size + 1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the next borrowed sample, or None if exhausted.
    pub fn next_sample(&mut self) -> Option<Sample<'_>> {
        if self.cursor >= self.len() {
            return None;
        }

        let row = self.x_size + 1;
        let start = self.cursor * row;
        let (x, y) = self.data[start..start + row].split_at(self.x_size);

        self.cursor += 1;
        Some(Sample { x, y: y[0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_peers_than_rows_leaves_some_empty() {
        let ds = Dataset::new(vec![1.0, 1.0, 2.0, 2.0], 1).unwrap();
        let sizes: Vec<_> = ds.partition(3).iter().map(Partition::len).collect();
        assert_eq!(sizes, vec![0, 1, 1]);
    }

    #[test]
    fn dataset_rejects_ragged_data() {
        assert!(Dataset::new(vec![1.0, 2.0, 3.0], 1).is_err());
        assert!(Dataset::new(vec![1.0, 2.0], 0).is_err());
    }

    #[test]
    fn partitions_cover_every_row_once() {
        let ds = Dataset::new((0..20).map(f64::from).collect(), 1).unwrap();
        let parts = ds.partition(3);

        let sizes: Vec<_> = parts.iter().map(Partition::len).collect();
        assert_eq!(sizes, vec![3, 3, 4]);

        let labels: Vec<f64> = parts
            .into_iter()
            .flat_map(|mut p| {
                let mut ys = Vec::new();
                while let Some(s) = p.next_sample() {
                    ys.push(s.y);
                }
                ys
            })
            .collect();

        let expected: Vec<f64> = (0..10).map(|i| f64::from(2 * i + 1)).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn partition_cursor_restarts() {
        let mut p = Dataset::new(vec![1.0, 2.0, 10.0, 3.0, 4.0, 20.0], 2)
            .unwrap()
            .into_partition();

        assert_eq!(p.next_sample(), Some(Sample { x: &[1.0, 2.0], y: 10.0 }));
        assert_eq!(p.next_sample(), Some(Sample { x: &[3.0, 4.0], y: 20.0 }));
        assert!(p.next_sample().is_none());

        p.reset();
        assert_eq!(p.next_sample().map(|s| s.y), Some(10.0));
    }

    #[test]
    fn csv_infers_width_and_skips_comments() {
        let text = "# x1,x2,y\n1,2,3\n\n4, 5, 6\n";
        let ds = Dataset::from_csv(text, None).unwrap();
        assert_eq!(ds.x_size(), 2);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn csv_reports_bad_lines() {
        let err = Dataset::from_csv("1,2\n1,2,3\n", None).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = Dataset::from_csv("1,x\n", None).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
