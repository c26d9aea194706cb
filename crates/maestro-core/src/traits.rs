use async_trait::async_trait;

use crate::{Request, Response, Result};

/// Callback receiving streamed text chunks in order.
///
/// Returning an error aborts the stream; the error is handed back to the
/// caller of [`ModelProvider::stream`].
pub type StreamCallback<'cb> = dyn FnMut(&str) -> Result<()> + Send + 'cb;

/// Trait for text-generation backends.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider label matched against the model catalog.
    fn name(&self) -> &str;

    /// Checks whether this provider is currently available and ready to process requests.
    async fn is_available(&self) -> bool;

    /// Generates a complete response for the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unavailable, the request fails,
    /// or the response cannot be parsed.
    async fn complete(&self, request: &Request) -> Result<Response>;

    /// Generates a response, delivering text chunks to `callback` as they arrive.
    ///
    /// The default implementation completes the request and delivers the whole
    /// text as a single chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the callback aborts the stream.
    async fn stream(
        &self,
        request: &Request,
        callback: &mut StreamCallback<'_>,
    ) -> Result<Response> {
        let response = self.complete(request).await?;
        callback(&response.text)?;
        Ok(response)
    }

    /// Sends a minimal request to verify the backend answers.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the probe request fails.
    async fn health_check(&self) -> Result<()>;
}
