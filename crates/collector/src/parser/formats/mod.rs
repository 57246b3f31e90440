/// Line parser implementations

pub mod docker;
pub mod plain;

pub use docker::DockerLogParser;
pub use plain::PlainLineParser;
