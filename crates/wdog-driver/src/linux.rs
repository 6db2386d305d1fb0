//! Linux watchdog character device backend.
//!
//! Maps the status codes onto the kernel watchdog interface without
//! ioctls: opening `/dev/watchdogN` arms the watchdog, any write is a
//! keep-alive and writing the magic character `V` before closing stops it.
//! Times and state are read from `/sys/class/watchdog/watchdogN/`.
//!
//! Codes the kernel interface has no counterpart for fail with
//! [`DriverError::UnsupportedCode`].

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::codes::StatusCode;
use crate::device::WdogDevice;
use crate::error::{DriverError, DriverResult};

const SYSFS_CLASS: &str = "/sys/class/watchdog";

/// `WDIOF_CARDRESET` bit of `bootstatus`.
const WDIOF_CARDRESET: i32 = 0x0020;

const KEEPALIVE: &[u8] = b"\0";
const MAGIC_CLOSE: &[u8] = b"V";

#[derive(Debug)]
enum DevFile {
    Idle,
    Running(File),
    Closed,
}

/// Handle to a Linux watchdog device.
#[derive(Debug)]
pub struct LinuxWatchdog {
    name: String,
    dev_path: PathBuf,
    sysfs_dir: PathBuf,
    file: Mutex<DevFile>,
}

impl LinuxWatchdog {
    /// Open a handle to `/dev/watchdogN`.
    ///
    /// The character device itself is not opened until `START`.
    ///
    /// # Errors
    ///
    /// Returns an error if the device node does not exist.
    pub fn open(dev_path: &str) -> DriverResult<Self> {
        let node = Path::new(dev_path)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DriverError::NoDevice(dev_path.to_owned()))?;
        // The legacy node aliases the first watchdog.
        let class_name = if node == "watchdog" { "watchdog0" } else { node };
        Self::with_sysfs_dir(dev_path, Path::new(SYSFS_CLASS).join(class_name))
    }

    /// Open a handle with an explicit sysfs attribute directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the device node does not exist.
    pub fn with_sysfs_dir(dev_path: &str, sysfs_dir: impl Into<PathBuf>) -> DriverResult<Self> {
        let path = PathBuf::from(dev_path);
        if !path.exists() {
            return Err(DriverError::NoDevice(dev_path.to_owned()));
        }
        Ok(Self {
            name: dev_path.to_owned(),
            dev_path: path,
            sysfs_dir: sysfs_dir.into(),
            file: Mutex::new(DevFile::Idle),
        })
    }

    fn read_attr(&self, attr: &str) -> DriverResult<String> {
        let text = std::fs::read_to_string(self.sysfs_dir.join(attr))?;
        Ok(text.trim().to_owned())
    }

    fn read_int_attr(&self, attr: &str) -> DriverResult<i32> {
        let text = self.read_attr(attr)?;
        let value = if let Some(hex) = text.strip_prefix("0x") {
            i32::from_str_radix(hex, 16)
        } else {
            text.parse()
        };
        value.map_err(|err| {
            DriverError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{attr}: {err}"),
            ))
        })
    }

    fn seconds_attr(&self, code: StatusCode, attr: &str, scale: i32) -> DriverResult<i32> {
        let secs = self.read_int_attr(attr)?;
        secs.checked_mul(scale)
            .ok_or_else(|| DriverError::illegal_value(code, secs))
    }

    fn write_running(file: &mut DevFile, bytes: &[u8]) -> DriverResult<()> {
        match file {
            DevFile::Running(f) => {
                f.write_all(bytes)?;
                Ok(())
            }
            DevFile::Idle => Err(DriverError::DeviceState("watchdog not started")),
            DevFile::Closed => Err(DriverError::Closed),
        }
    }
}

impl WdogDevice for LinuxWatchdog {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_status(&self, code: StatusCode) -> DriverResult<i32> {
        if matches!(*self.file.lock(), DevFile::Closed) {
            return Err(DriverError::Closed);
        }
        match code {
            StatusCode::Time => self.seconds_attr(code, "timeout", 1000),
            StatusCode::TimeMax => self.seconds_attr(code, "timeout", 1_000_000),
            StatusCode::TimeIrq => self.seconds_attr(code, "pretimeout", 1_000_000),
            StatusCode::Status => Ok(i32::from(self.read_attr("state")? == "active")),
            StatusCode::Shot => {
                let boot = self.read_int_attr("bootstatus")?;
                Ok(i32::from(boot & WDIOF_CARDRESET != 0))
            }
            StatusCode::Start | StatusCode::Stop | StatusCode::Trig => {
                Err(DriverError::write_only(code))
            }
            _ => Err(DriverError::unsupported(code)),
        }
    }

    fn set_status(&self, code: StatusCode, _value: i32) -> DriverResult<()> {
        let mut file = self.file.lock();
        match code {
            StatusCode::Start => match *file {
                DevFile::Idle => {
                    let f = OpenOptions::new().write(true).open(&self.dev_path)?;
                    *file = DevFile::Running(f);
                    Ok(())
                }
                DevFile::Running(_) => Ok(()),
                DevFile::Closed => Err(DriverError::Closed),
            },
            StatusCode::Trig => Self::write_running(&mut file, KEEPALIVE),
            StatusCode::Stop => {
                Self::write_running(&mut file, MAGIC_CLOSE)?;
                *file = DevFile::Idle;
                Ok(())
            }
            StatusCode::Status | StatusCode::Shot => Err(DriverError::read_only(code)),
            _ if matches!(*file, DevFile::Closed) => Err(DriverError::Closed),
            _ => Err(DriverError::unsupported(code)),
        }
    }

    fn close(&self) -> DriverResult<()> {
        let mut file = self.file.lock();
        if let DevFile::Running(_) = *file {
            // Closing without the magic character leaves the watchdog armed.
            tracing::warn!(device = %self.name, "closing running watchdog without stop");
        }
        match std::mem::replace(&mut *file, DevFile::Closed) {
            DevFile::Closed => Err(DriverError::Closed),
            DevFile::Idle | DevFile::Running(_) => Ok(()),
        }
    }
}
