//! 🔒 Bearer auth - the wristband that gets every request past the bouncer.

use reqwest::RequestBuilder;

/// 🔒 Decorates outbound requests with `Authorization: Bearer <token>`.
///
/// The token is fixed for the life of the process. No refresh. No rotation.
/// An empty token adds nothing, and the provider answers with a 401 that the
/// caller gets to read in the logs.
#[derive(Clone)]
pub(crate) struct BearerAuth {
    token: String,
}

// 🙈 Hand-rolled Debug so the token never ends up in a log line.
impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &if self.token.is_empty() { "<empty>" } else { "<redacted>" })
            .finish()
    }
}

impl BearerAuth {
    pub(crate) fn new(token: String) -> Self {
        Self { token }
    }

    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }
}
