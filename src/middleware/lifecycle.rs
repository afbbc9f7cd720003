//! Descriptor construction and the guard / validate / match sequence.

use tracing::info;

use crate::descriptor::{Collaborators, DescriptorType};
use crate::failure::Failure;

/// Builds one `kind` instance and runs its checks in order.
///
/// The instance is logged exactly once, before `guard`. The first failing
/// step ends the run; its failure is returned untouched.
pub(crate) async fn run(kind: &DescriptorType, collaborators: Collaborators) -> Result<(), Failure> {
    let mut descriptor = kind.construct(collaborators);
    info!(descriptor = kind.name(), instance = ?descriptor, "request descriptor constructed");

    descriptor.guard().await?;
    descriptor.validate().await?;
    descriptor.r#match().await
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use http::Method;

    use super::*;
    use crate::descriptor::Descriptor;
    use crate::router::Router;
    use crate::services::memory::{MemorySession, MemoryUsers, StaticTokens};
    use crate::services::Services;

    type Calls = Arc<Mutex<Vec<&'static str>>>;

    /// Records each step into the `Calls` extension and fails the step named
    /// by the `x-fail` header.
    #[derive(Debug)]
    struct Scripted {
        calls: Calls,
        fail: Option<String>,
    }

    impl Scripted {
        fn step(&self, name: &'static str) -> Result<(), Failure> {
            self.calls.lock().unwrap().push(name);
            match self.fail.as_deref() {
                Some(f) if f == name => Err(Failure::guard(format!("{name} refused"))),
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Descriptor for Scripted {
        fn construct(deps: Collaborators) -> Self {
            let calls = deps.request.extension::<Calls>().cloned().unwrap_or_default();
            let fail = deps.request.header("x-fail").map(str::to_owned);
            Self { calls, fail }
        }
        async fn guard(&mut self) -> Result<(), Failure> { self.step("guard") }
        async fn validate(&mut self) -> Result<(), Failure> { self.step("validate") }
        async fn r#match(&mut self) -> Result<(), Failure> { self.step("match") }
    }

    async fn run_scripted(fail: Option<&str>) -> (Result<(), Failure>, Vec<&'static str>) {
        let calls = Calls::default();
        let mut builder = http::Request::builder().method(Method::GET).uri("/widgets/1");
        if let Some(step) = fail {
            builder = builder.header("x-fail", step);
        }
        let (mut head, ()) = builder.body(()).unwrap().into_parts();
        head.extensions.insert(Arc::clone(&calls));
        let request = crate::Request::new(head, bytes::Bytes::new());

        let services = Services::new(StaticTokens::default(), MemoryUsers::default(), MemorySession::default());
        let collaborators = Collaborators::bind(request, &services, &Arc::new(Router::new()));
        let result = run(&DescriptorType::of::<Scripted>(), collaborators).await;
        let calls = calls.lock().unwrap().clone();
        (result, calls)
    }

    #[tokio::test]
    async fn runs_all_steps_in_order() {
        let (result, calls) = run_scripted(None).await;
        assert!(result.is_ok());
        assert_eq!(calls, ["guard", "validate", "match"]);
    }

    #[tokio::test]
    async fn guard_failure_skips_the_rest() {
        let (result, calls) = run_scripted(Some("guard")).await;
        assert!(matches!(result, Err(Failure::Guard(ref m)) if m == "guard refused"));
        assert_eq!(calls, ["guard"]);
    }

    #[tokio::test]
    async fn validate_failure_skips_match() {
        let (result, calls) = run_scripted(Some("validate")).await;
        assert!(result.is_err());
        assert_eq!(calls, ["guard", "validate"]);
    }

    #[tokio::test]
    async fn match_failure_is_returned_unmodified() {
        let (result, calls) = run_scripted(Some("match")).await;
        assert!(matches!(result, Err(Failure::Guard(ref m)) if m == "match refused"));
        assert_eq!(calls, ["guard", "validate", "match"]);
    }
}
