use std::path::Path;

/// Final step of a safe edit: put the proposed content on disk.
pub trait ContentWriter {
    fn write(&self, path: &Path, content: &str) -> std::io::Result<()>;
}

/// Overwrites the target in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectWriter;

impl ContentWriter for DirectWriter {
    fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
        std::fs::write(path, content)
    }
}
