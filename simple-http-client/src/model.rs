//! Shape shared by requests and responses.

use crate::headers::Headers;

/// Fields common to every request and response.
///
/// The `id` is generated once per [`Request`](crate::Request) and copied to
/// the [`Response`](crate::Response) produced for it, so log lines for the
/// two sides of an exchange can be correlated.
pub trait RestObject {
    /// Correlation id; stable for the lifetime of the object.
    fn id(&self) -> &str;

    /// Headers attached to this object.
    fn headers(&self) -> &Headers;

    /// Mutable access to the headers.
    fn headers_mut(&mut self) -> &mut Headers;

    /// Body rendered as text, if any.
    fn string_body(&self) -> Option<&str>;
}
