use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub label: String,
    #[tabled(rename = "Rows")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Row counts per table, rendered as one rounded table
pub fn stats_table(stats: &[(String, usize)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, count) in stats {
        builder.add_row(label, &count.to_string());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table_lists_every_row() {
        let rendered = stats_table(&[("users".to_string(), 3), ("specialists".to_string(), 12)]);
        assert!(rendered.contains("users"));
        assert!(rendered.contains("12"));
        assert!(TableBuilder::new().build().is_empty());
    }
}
