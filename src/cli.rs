use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::grid::{Features, DEFAULT_PAGE_SIZE};

#[derive(Parser)]
#[command(name = "lotgrid", about = "Terminal back office for car dealership data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub grid: GridOptions,

    /// Write logs to this file. Nothing is logged when unset.
    #[arg(long, env = "LOTGRID_LOG", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Edit a JSON file holding an array of objects
    Open {
        path: PathBuf,

        /// Columns to show, in order. Defaults to the keys of the first row.
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },

    /// Browse built-in dealership data
    Demo {
        #[arg(value_enum)]
        table: DemoTable,

        /// Save edits to this file instead of discarding them
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoTable {
    Cars,
    Sales,
    Maintenance,
    Inquiries,
    /// Purchase and selling price per sold car, with profit
    Report,
}

#[derive(Args, Clone, Debug)]
pub struct GridOptions {
    #[arg(long, env = "LOTGRID_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE, global = true)]
    pub page_size: usize,

    /// Disable the global search box
    #[arg(long, global = true)]
    pub no_search: bool,

    /// Disable per-column filters and the column chooser
    #[arg(long, global = true)]
    pub no_column_filter: bool,

    /// Show every row on one page
    #[arg(long, global = true)]
    pub no_pagination: bool,

    /// Disable the add-row form
    #[arg(long, global = true)]
    pub no_add_row: bool,
}

impl GridOptions {
    pub fn features(&self) -> Features {
        Features {
            enable_search: !self.no_search,
            enable_column_filter: !self.no_column_filter,
            enable_pagination: !self.no_pagination,
            enable_add_row: !self.no_add_row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_open_with_columns() {
        let cli = Cli::parse_from(["lotgrid", "open", "/tmp/cars.json", "--columns", "id,make,year"]);
        let Command::Open { path, columns } = cli.command else {
            panic!("expected Open");
        };
        assert_eq!(path, PathBuf::from("/tmp/cars.json"));
        assert_eq!(
            columns,
            Some(vec!["id".to_string(), "make".to_string(), "year".to_string()])
        );
    }

    #[test]
    fn parse_open_without_columns() {
        let cli = Cli::parse_from(["lotgrid", "open", "/tmp/cars.json"]);
        let Command::Open { columns, .. } = cli.command else {
            panic!("expected Open");
        };
        assert_eq!(columns, None);
    }

    #[test]
    fn parse_demo_with_out() {
        let cli = Cli::parse_from(["lotgrid", "demo", "sales", "--out", "/tmp/sales.json"]);
        let Command::Demo { table, out } = cli.command else {
            panic!("expected Demo");
        };
        assert_eq!(table, DemoTable::Sales);
        assert_eq!(out, Some(PathBuf::from("/tmp/sales.json")));
    }

    #[test]
    fn parse_demo_inquiries_and_report() {
        let cli = Cli::parse_from(["lotgrid", "demo", "inquiries"]);
        let Command::Demo { table, out } = cli.command else {
            panic!("expected Demo");
        };
        assert_eq!(table, DemoTable::Inquiries);
        assert_eq!(out, None);

        let cli = Cli::parse_from(["lotgrid", "demo", "report"]);
        assert!(matches!(cli.command, Command::Demo { table: DemoTable::Report, .. }));
    }

    #[test]
    fn parse_demo_rejects_unknown_table() {
        assert!(Cli::try_parse_from(["lotgrid", "demo", "invoices"]).is_err());
    }

    #[test]
    fn default_page_size() {
        let cli = Cli::parse_from(["lotgrid", "demo", "cars"]);
        assert_eq!(cli.grid.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cli.grid.features(), Features::default());
    }

    #[test]
    fn feature_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "lotgrid",
            "demo",
            "cars",
            "--page-size",
            "25",
            "--no-search",
            "--no-add-row",
        ]);
        assert_eq!(cli.grid.page_size, 25);
        let features = cli.grid.features();
        assert!(!features.enable_search);
        assert!(!features.enable_add_row);
        assert!(features.enable_column_filter);
        assert!(features.enable_pagination);
    }

    #[test]
    fn log_file_flag() {
        let cli = Cli::parse_from(["lotgrid", "--log-file", "/tmp/lotgrid.log", "demo", "cars"]);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/lotgrid.log")));
    }
}
