pub mod fund_source;
