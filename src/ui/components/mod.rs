pub mod comparison_chart;
pub mod fund_table;
