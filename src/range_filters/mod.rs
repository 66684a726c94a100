//! Range-based filter algorithms
//!
//! Probabilistic data structures for range-based membership queries.
//! These filters can answer queries like "does the set contain any values
//! in the range [low, high]?" with space-efficient approximations.
//!
//! # Use Cases
//! - Database query optimization (range predicate pushdown)
//! - Spatial data indexing
//! - Time-series data filtering
//! - Multi-dimensional range queries
//!
//! # Available Filters
//!
//! ## Grafite (2024)
//! Optimal range filter with robust FPR bounds: FPR = L / 2^(B-2)
//! - LSM-tree range queries (RocksDB, LevelDB)
//! - Database index optimization
//! - Time-series databases
//! - Financial market data (range lookups on timestamps)
//!
//! ## GRF (Gorilla Range Filter - SIGMOD 2024)
//! Shape-based range filter optimized for LSM-tree workloads with skewed distributions.
//! - RocksDB/LevelDB SSTable filters
//! - Time-series databases (InfluxDB, TimescaleDB)
//! - Log aggregation systems (Elasticsearch, Loki)
//! - Columnar databases (Parquet, ORC)
//! - 30-50% better FPR than Grafite for skewed data
//!
//! ## Memento Filter (2025)
//! First dynamic range filter with insertion support while maintaining FPR guarantees.
//! Splits each key into a prefix (hashed to a home slot + fingerprint) and a
//! memento (range-query coordinate), stored in a packed, rank/select-indexed
//! slot array. Supports insert, delete, point-update, bulk load, and
//! capacity-doubling resize.
//! - MongoDB WiredTiger integration
//! - RocksDB block filters
//! - Dynamic database indexes
//! - Log systems with streaming data
//!
//! # Example
//! ```
//! use sketch_oxide::range_filters::{Grafite, GRF, MementoFilter, OperationFlags};
//! use sketch_oxide::common::RangeFilter;
//!
//! // Static Grafite filter
//! let keys = vec![10, 20, 30, 40, 50];
//! let grafite = Grafite::build(&keys, 6).unwrap();
//! assert!(grafite.may_contain_range(15, 25));
//!
//! // GRF filter (better for skewed distributions)
//! let grf = GRF::build(&keys, 6).unwrap();
//! assert!(grf.may_contain_range(15, 25));
//!
//! // Dynamic Memento filter: n_slots, fingerprint_bits, memento_bits
//! let mut memento = MementoFilter::new(1024, 10, 5).unwrap();
//! memento.insert(42, OperationFlags::NO_LOCK);
//! memento.insert(100, OperationFlags::NO_LOCK);
//! assert!(memento.may_contain_range(40, 50));
//! ```

mod grafite;
mod grf;
mod memento;

pub use grafite::{Grafite, GrafiteStats};
pub use grf::{GRFStats, GRF};
pub use memento::{
    HashIterator, HashMode, IterItem, KeyRangeIterator, MementoConfig, MementoFilter, MementoStats,
    OperationFlags, QueryResult, StatusCode,
};
