//! Payload sourcing and sinking between files, stdio and the device.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{AppError, Result};

/// Load the bytes to write to a register.
///
/// With a file and no explicit length, the whole file is the payload. With
/// an explicit length, exactly that many bytes are taken from the file or
/// from stdin; fewer is an error.
pub fn load(file: Option<&Path>, len: Option<u32>) -> Result<Vec<u8>> {
    match (file, len) {
        (Some(path), None) => {
            let data = std::fs::read(path)?;
            if u32::try_from(data.len()).is_err() {
                return Err(AppError::InputLength(format!(
                    "{} is {} bytes, more than a single transaction can carry",
                    path.display(),
                    data.len()
                )));
            }
            debug!("loaded {} bytes from {}", data.len(), path.display());
            Ok(data)
        }
        (Some(path), Some(len)) => {
            let mut data = Vec::with_capacity(len as usize);
            File::open(path)?.take(u64::from(len)).read_to_end(&mut data)?;
            if data.len() != len as usize {
                return Err(AppError::InputLength(format!(
                    "expected {len} bytes from {}, got {}",
                    path.display(),
                    data.len()
                )));
            }
            Ok(data)
        }
        (None, Some(len)) => {
            let mut data = Vec::with_capacity(len as usize);
            io::stdin().lock().take(u64::from(len)).read_to_end(&mut data)?;
            if data.len() != len as usize {
                return Err(AppError::InputLength(format!(
                    "expected {len} bytes on stdin, got {}",
                    data.len()
                )));
            }
            Ok(data)
        }
        (None, None) => Err(AppError::validation(
            "a length is required when writing from stdin",
        )),
    }
}

/// Store bytes read from a register, to a file or to stdout.
pub fn store(file: Option<&Path>, data: &[u8]) -> Result<()> {
    match file {
        Some(path) => {
            std::fs::write(path, data)?;
            debug!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
