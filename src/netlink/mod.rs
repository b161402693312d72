//! Generic netlink plumbing for the taskstats family.
//!
//! The wire work is done by the `netlink-packet-*` crates and `netlink-sys`:
//!
//! - [`attr`] adapts attribute lists to owned [`Attribute`] values.
//! - [`message`] wraps [`GenlMessage`] for `netlink-packet-generic` framing.
//! - [`family`] resolves a family name through the `nlctrl` controller.
//! - [`Conn`] (Linux only) owns the `netlink-sys` socket and runs one
//!   request/response exchange at a time.
//!
//! Everything above this layer talks to the kernel through the [`Transport`]
//! trait, so it can be exercised against an in-memory fake.

pub mod attr;
#[cfg(target_os = "linux")]
mod conn;
mod error;
pub mod family;
pub mod message;

pub use attr::{AttrError, Attribute};
#[cfg(target_os = "linux")]
pub use conn::Conn;
pub use error::{Error, Result};
pub use family::Family;
pub use message::{GenlMessage, Header};

/// A generic netlink request/response channel.
pub trait Transport {
    /// Sends `msg` to `family` and collects every reply correlated with it.
    ///
    /// `NLM_F_REQUEST` is always added to `flags`. Kernel error replies are
    /// returned as [`Error::Kernel`] carrying the errno.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if sending, receiving or framing fails, or the
    /// kernel rejects the request.
    fn execute(&mut self, msg: &GenlMessage, family: u16, flags: u16) -> Result<Vec<GenlMessage>>;

    /// Resolves a generic netlink family by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Kernel`] with `ENOENT` if the family is not registered
    /// (e.g. the providing kernel module is not loaded), or any error of
    /// [`Transport::execute`].
    fn get_family(&mut self, name: &str) -> Result<Family> {
        let request = family::get_family_request(name);
        let replies = self.execute(&request, family::GENL_ID_CTRL, message::NLM_F_REQUEST)?;
        family::parse_family_reply(&replies, name)
    }

    /// Releases the transport.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if releasing the underlying resources fails.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    use super::*;

    type Handler = Box<dyn FnMut(&GenlMessage, u16, u16) -> Result<Vec<GenlMessage>>>;

    /// In-memory transport that serves one family and answers requests through
    /// a handler closure.
    pub struct FakeTransport {
        family: Option<Family>,
        handler: Handler,
        closed: Rc<Cell<bool>>,
    }

    impl std::fmt::Debug for FakeTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FakeTransport")
                .field("family", &self.family)
                .field("closed", &self.closed.get())
                .finish_non_exhaustive()
        }
    }

    impl FakeTransport {
        pub fn serve_family(
            family: Family,
            handler: impl FnMut(&GenlMessage, u16, u16) -> Result<Vec<GenlMessage>> + 'static,
        ) -> Self {
            Self {
                family: Some(family),
                handler: Box::new(handler),
                closed: Rc::new(Cell::new(false)),
            }
        }

        /// A transport on which every family lookup fails with `ENOENT`.
        pub fn without_family() -> Self {
            Self {
                family: None,
                handler: Box::new(|_, _, _| Ok(Vec::new())),
                closed: Rc::new(Cell::new(false)),
            }
        }

        /// Shared flag flipped when the transport is closed.
        pub fn closed_flag(&self) -> Rc<Cell<bool>> {
            Rc::clone(&self.closed)
        }
    }

    impl Transport for FakeTransport {
        fn execute(
            &mut self,
            msg: &GenlMessage,
            family: u16,
            flags: u16,
        ) -> Result<Vec<GenlMessage>> {
            (self.handler)(msg, family, flags | message::NLM_F_REQUEST)
        }

        fn get_family(&mut self, name: &str) -> Result<Family> {
            match &self.family {
                Some(family) if family.name == name => Ok(family.clone()),
                _ => Err(Error::Kernel(io::Error::from_raw_os_error(libc::ENOENT))),
            }
        }

        fn close(self) -> Result<()> {
            self.closed.set(true);
            Ok(())
        }
    }
}
