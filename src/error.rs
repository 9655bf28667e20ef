//! Crate-wide error type.

use core::fmt;
use core::result;

#[cfg(feature = "std")]
use std::io;

/// A single reported link-time problem.
///
/// Unlike [`Error`], a `LinkError` never aborts the link in progress: the
/// [`link`](crate::link) engine collects these into a `Vec` so that one run
/// reports every problem instead of stopping at the first one (§7 of the
/// specification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Two entry symbols share an identifier; the first definition wins.
    DuplicateEntry {
        name: alloc::string::String,
    },
    /// An external reference never resolved to an entry symbol, in any
    /// loaded object module or library module.
    UnsatisfiedExternal {
        name: alloc::string::String,
        referencing_module: alloc::string::String,
    },
    /// A BRT/XRT/TXT entry names a block index past the end of its module's
    /// block list.
    BlockIndexOutOfRange {
        module: alloc::string::String,
        index: u32,
    },
    /// A TXT payload would write past the end of the image.
    ImageOverflow {
        offset: usize,
        len: usize,
        image_size: usize,
    },
    /// A library module's PDT was never found even though its DFT entry
    /// promised one.
    MissingLibraryPdt {
        module: alloc::string::String,
        library: alloc::string::String,
    },
    /// A loaded block carried its propagated source error flag (spec §4.D
    /// "Reported but non-fatal": "error flags propagated from input
    /// blocks"; §7: such a propagated flag sets exit status to failure
    /// after emission).
    SourceBlockError {
        module: alloc::string::String,
        block: alloc::string::String,
    },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::DuplicateEntry { name } => {
                write!(f, "duplicate entry point: {name}")
            }
            LinkError::UnsatisfiedExternal { name, referencing_module } => {
                write!(f, "unsatisfied external {name} referenced by module {referencing_module}")
            }
            LinkError::BlockIndexOutOfRange { module, index } => {
                write!(f, "block index {index} out of range in module {module}")
            }
            LinkError::ImageOverflow { offset, len, image_size } => {
                write!(
                    f,
                    "text payload of {len} bytes at offset {offset} overflows image of size {image_size}"
                )
            }
            LinkError::MissingLibraryPdt { module, library } => {
                write!(f, "library module {module} in {library} has no PDT")
            }
            LinkError::SourceBlockError { module, block } => {
                write!(f, "block {block} in module {module} carries a propagated source error flag")
            }
        }
    }
}

/// Crate-wide error type.
///
/// `Io`, `Scroll`, and `Format` are fatal: they abort whatever operation was
/// in progress (§7). `Link` is carried in [`LinkOutput`](crate::link::LinkOutput)
/// rather than returned directly, because link problems are accumulated, not
/// fatal.
#[derive(Debug)]
pub enum Error {
    /// Host file I/O failure.
    #[cfg(feature = "std")]
    Io(io::Error),
    /// A loader-table cursor read past the end of its buffer, or a field
    /// failed to decode.
    Scroll(scroll::Error),
    /// A malformed control word, an impossible table word-count, or a
    /// truncated table.
    Format(alloc::string::String),
    /// A single accumulated link-time problem, surfaced outside the normal
    /// accumulate-and-continue path (for APIs that can only report one
    /// error at a time).
    Link(LinkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "std")]
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Scroll(err) => write!(f, "malformed table data: {err}"),
            Error::Format(msg) => write!(f, "format error: {msg}"),
            Error::Link(err) => write!(f, "link error: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Scroll(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::Scroll(err)
    }
}

impl From<LinkError> for Error {
    fn from(err: LinkError) -> Self {
        Error::Link(err)
    }
}

/// Shorthand alias for a `Result` defaulting its error to [`Error`].
pub type Result<T> = result::Result<T, Error>;

/// Constructs an [`Error::Format`] from a `format!`-style message, the way
/// the teacher's `io_error!` constructs an `io::Error` from a message.
#[macro_export]
macro_rules! format_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Format(alloc::format!($($arg)*))
    };
}
