use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use log::{error, trace};
use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::dup2;

use super::{flush_std_streams, ExecError};
use crate::shell::syntax::Direction;

/// A standard stream rebound to a file. The original descriptor is put back
/// when this is dropped, whichever way the redirected command finished.
#[derive(Debug)]
pub struct Redirect {
    fd: RawFd,
    saved: OwnedFd,
}

impl Redirect {
    pub fn apply(direction: Direction, target: &str) -> Result<Redirect, ExecError> {
        let fd = match direction {
            Direction::In => libc::STDIN_FILENO,
            Direction::Out => libc::STDOUT_FILENO,
        };
        flush_std_streams();
        let saved = fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(3)).map_err(ExecError::Descriptor)?;
        let saved = unsafe { OwnedFd::from_raw_fd(saved) };
        let (flags, mode) = match direction {
            Direction::Out => (
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC | OFlag::O_CLOEXEC,
                Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
            ),
            Direction::In => (OFlag::O_RDONLY | OFlag::O_CLOEXEC, Mode::empty()),
        };
        let file = open(target, flags, mode).map_err(|source| ExecError::RedirectionOpenFailed {
            path: target.to_owned(),
            source,
        })?;
        let file = unsafe { OwnedFd::from_raw_fd(file) };
        dup2(file.as_raw_fd(), fd).map_err(ExecError::Descriptor)?;
        trace!("fd {} now refers to {:?} (saved as {})", fd, target, saved.as_raw_fd());
        Ok(Redirect { fd, saved })
    }
}

impl Drop for Redirect {
    fn drop(&mut self) {
        flush_std_streams();
        if let Err(e) = dup2(self.saved.as_raw_fd(), self.fd) {
            error!("failed to restore fd {}: {}", self.fd, e);
        }
    }
}
