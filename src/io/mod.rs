//! Persistence of per-rank sliding-interface data.

pub mod partitioned;

pub use partitioned::{
    InterfacePartition, PARTITION_FORMAT_VERSION, partition_path, read_partition,
    read_partition_for, write_partition,
};
