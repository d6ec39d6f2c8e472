use std::fmt::{self, Display, Formatter};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

use crate::resample::{Block, BlockPartition};

impl BlockPartition {
    /// Summary table of block count, lengths and coverage.
    pub fn display(&self) -> String {
        let lengths: Vec<usize> = self.iter().map(Block::len).collect();
        let min = lengths.iter().min().copied().unwrap_or(0);
        let max = lengths.iter().max().copied().unwrap_or(0);
        let mean = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        };
        let wrapped = self.iter().filter(|b| b.wraps()).count();

        let coverage = self.coverage();
        let uncovered = coverage.iter().filter(|&&c| c == 0).count();
        let deepest = coverage.iter().max().copied().unwrap_or(0);
        let layout = if self.is_exact_cover() {
            "🟢 Exact tiling"
        } else if uncovered == 0 {
            "🟡 Overlapping"
        } else {
            "🔴 Rows left uncovered"
        };

        let mut title_table = Table::new();
        title_table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .add_row(vec![Cell::new("Block Partition").set_alignment(CellAlignment::Center)]);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Metric").set_alignment(CellAlignment::Center),
                Cell::new("Value").set_alignment(CellAlignment::Center),
            ]);

        let row = |name: &str, value: String| {
            vec![
                Cell::new(name).set_alignment(CellAlignment::Left),
                Cell::new(value).set_alignment(CellAlignment::Right),
            ]
        };

        table
            .add_row(row("Rows", self.input_length().to_string()))
            .add_row(row("Blocks", self.len().to_string()))
            .add_row(row("Wrapping blocks", wrapped.to_string()));

        // Lengths
        table
            .add_row(row("Min length", min.to_string()))
            .add_row(row("Mean length", format!("{mean:.2}")))
            .add_row(row("Max length", max.to_string()));

        // Coverage
        table
            .add_row(row("Uncovered rows", uncovered.to_string()))
            .add_row(row("Max coverage", deepest.to_string()))
            .add_row(row("Layout", layout.to_string()));

        format!("{title_table}\n{table}")
    }
}

impl Display for BlockPartition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
