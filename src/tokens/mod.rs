//! Tokens: named, parameterized values rendered from one exchange.
//!
//! - [`registry`] - [`TokenRegistry`] mapping names to tokens
//! - [`builtin`] - The [`BuiltinToken`] set every registry starts with
//! - [`datetime`] - Sub-formats of the `date-time` token
//! - [`host`] - Server identity used by `computer-name` and `server-ip`

pub mod builtin;
pub mod datetime;
pub mod host;
pub mod registry;

pub use builtin::{BuiltinToken, RenderContext, UNRESOLVED};
pub use datetime::DateTimeFormat;
pub use host::HostInfo;
pub use registry::{Clock, Token, TokenFn, TokenRegistry, apply_label};
