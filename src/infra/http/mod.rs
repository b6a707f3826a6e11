pub mod fund_api;
