mod file_system;
mod local;

pub use file_system::{ByteStream, FileStat, FileSystem};
pub use local::{LocalFileSystem, DEFAULT_CHUNK_SIZE};
