//! Market-data sources behind the `Broker` trait.

pub mod binance;
pub mod csv_source;
pub mod memory;
pub mod provider;
pub mod synthetic;

pub use binance::BinanceSource;
pub use csv_source::{read_bars_csv, write_bars_csv, CsvSource};
pub use memory::MemorySource;
pub use provider::{ensure_time_ordered, BarRequest, Broker, DataError, Interval, OrderAck};
pub use synthetic::SyntheticSource;
