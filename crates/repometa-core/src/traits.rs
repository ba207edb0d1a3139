//! Trait seams

use crate::changes::ChangeScope;
use crate::error::Result;
use std::future::Future;

/// Changed-files detection capability.
///
/// Implemented by the local-history and hosting-API strategies; tests
/// substitute their own implementations.
pub trait ChangeDetector {
    /// Short strategy name for diagnostics
    fn name(&self) -> &'static str;

    /// Ordered list of changed paths for `scope`
    fn detect<'a>(
        &'a self,
        scope: &'a ChangeScope,
    ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a;
}
