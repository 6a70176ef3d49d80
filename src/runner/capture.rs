//! Output capture through anonymous temporary files.
//!
//! The child writes straight into unlinked temp files, so the parent never
//! has to drain pipes while it waits and large outputs cannot block the
//! child. Both files are read back once the child is gone.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::Stdio;

pub(super) struct Capture {
    stdout: File,
    stderr: File,
}

impl Capture {
    pub(super) fn new() -> io::Result<Self> {
        Ok(Self {
            stdout: tempfile::tempfile()?,
            stderr: tempfile::tempfile()?,
        })
    }

    /// Handles for the child's stdout and stderr.
    pub(super) fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        Ok((
            Stdio::from(self.stdout.try_clone()?),
            Stdio::from(self.stderr.try_clone()?),
        ))
    }

    /// Everything written so far, decoded as lossy UTF-8.
    pub(super) fn read(self) -> io::Result<(String, String)> {
        Ok((read_all(self.stdout)?, read_all(self.stderr)?))
    }
}

fn read_all(mut file: File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
