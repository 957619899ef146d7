use crate::utils::error::Result;

/// Byte-level file sink rooted at some base location.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Where `path` lands, for logging and reporting.
    fn resolve(&self, path: &str) -> String;
}
