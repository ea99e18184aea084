use core::{
    alloc::Layout,
    fmt::{self, Display, Formatter},
};

use alloc::alloc::handle_alloc_error;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;

/// The error type for fallible deque operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A checked accessor was given an index that is not smaller than the length.
    OutOfRange { index: usize, len: usize },
    /// The requested length, block layout or map layout exceeds `isize::MAX` bytes.
    CapacityOverflow,
    /// The allocator refused a block or block map request.
    AllocError { layout: Layout },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfRange { index, len } => {
                write!(f, "index {index} is out of range for a deque of length {len}")
            }
            Error::CapacityOverflow => f.write_str("capacity overflow"),
            Error::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Turns an error from a fallible internal path into the panic/abort the
/// infallible API promises.
#[cold]
#[inline(never)]
pub(crate) fn handle_error(err: Error) -> ! {
    match err {
        Error::CapacityOverflow => panic!("capacity overflow"),
        Error::AllocError { layout } => handle_alloc_error(layout),
        Error::OutOfRange { index, len } => {
            panic!("index {index} is out of range for a deque of length {len}")
        }
    }
}
